//! Link construction for the web app and image CDN

use at_uri_parser::Did;
use atproto_identity::strip_scheme;
use tracing::warn;

use crate::types::ProfileRecord;

/// `<cdn>/<pds host>/image/<did>/<cid>`, or an empty string when the profile
/// has no blob under `field`
pub fn blob_url(
    cdn_base: &str,
    default_pds_host: &str,
    did: &Did,
    record: &ProfileRecord,
    field: &str,
    endpoint: Option<&str>,
) -> String {
    let Some(blob) = record.blob(field) else {
        warn!(did = %did, field, "Blob field not found in profile");
        return String::new();
    };

    let host = endpoint.map(strip_scheme).unwrap_or(default_pds_host);
    format!(
        "{}/{}/image/{}/{}",
        cdn_base.trim_end_matches('/'),
        host.trim_end_matches('/'),
        did,
        blob.cid()
    )
}

/// `<app>/profile/<handle>/post/<rkey>`
pub fn post_url(app_url_prefix: &str, handle: &str, rkey: &str) -> String {
    format!(
        "{}/profile/{}/post/{}",
        app_url_prefix.trim_end_matches('/'),
        handle,
        rkey
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlobRef, CidLink};

    fn profile(avatar: Option<&str>) -> ProfileRecord {
        ProfileRecord {
            display_name: None,
            description: None,
            avatar: avatar.map(|cid| BlobRef::Typed {
                blob_type: "blob".to_string(),
                reference: CidLink {
                    link: cid.to_string(),
                },
                mime_type: "image/jpeg".to_string(),
                size: 10,
            }),
            banner: None,
            created_at: None,
        }
    }

    fn did() -> Did {
        Did::parse("did:plc:abc123").unwrap()
    }

    #[test]
    fn test_blob_url_strips_scheme() {
        assert_eq!(
            blob_url(
                "https://av-cdn.bsky.social",
                "bsky.social",
                &did(),
                &profile(Some("bafkreiavatar")),
                "avatar",
                Some("https://morel.us-east.host.bsky.network")
            ),
            "https://av-cdn.bsky.social/morel.us-east.host.bsky.network/image/did:plc:abc123/bafkreiavatar"
        );
    }

    #[test]
    fn test_blob_url_missing_field_is_empty() {
        let record = profile(None);
        assert_eq!(
            blob_url("https://cdn", "bsky.social", &did(), &record, "avatar", None),
            ""
        );
        assert_eq!(
            blob_url("https://cdn", "bsky.social", &did(), &record, "nonsense", None),
            ""
        );
    }

    #[test]
    fn test_blob_url_bare_endpoint() {
        assert_eq!(
            blob_url(
                "https://cdn/",
                "bsky.social",
                &did(),
                &profile(Some("bafk")),
                "avatar",
                Some("pds.example")
            ),
            "https://cdn/pds.example/image/did:plc:abc123/bafk"
        );
    }

    #[test]
    fn test_post_url() {
        assert_eq!(
            post_url("https://bsky.app/", "alice.bsky.social", "3k2yihcrp6f2c"),
            "https://bsky.app/profile/alice.bsky.social/post/3k2yihcrp6f2c"
        );
    }
}

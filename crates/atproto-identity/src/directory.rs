//! PLC directory client

use at_uri_parser::Did;
use reqwest::Client;
use tracing::debug;

use crate::error::{IdentityError, Result};
use crate::http::{get_success, read_body};
use crate::types::DidDocument;

const LOOKUP_OPERATION: &str = "DID document lookup";
const AUDIT_OPERATION: &str = "DID audit log lookup";

/// Looks up DID documents and audit logs in a PLC-style directory
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the current DID document for `did`
    pub async fn lookup_did_document(&self, did: &Did) -> Result<DidDocument> {
        let did_str = did.to_string();
        let url = format!("{}/{}", self.base_url, did_str);
        debug!(did = %did_str, url = %url, "Looking up DID document");

        let response = match get_success(&self.client, LOOKUP_OPERATION, &did_str, &url).await {
            Ok(response) => response,
            Err(IdentityError::Status { status: 404, .. }) => {
                return Err(IdentityError::IdentityNotFound(did_str));
            }
            Err(e) => {
                return Err(IdentityError::DirectoryUnavailable {
                    did: did_str,
                    cause: Box::new(e),
                });
            }
        };

        let body = read_body(response, LOOKUP_OPERATION, &did_str)
            .await
            .map_err(|e| IdentityError::DirectoryUnavailable {
                did: did_str.clone(),
                cause: Box::new(e),
            })?;

        let doc: DidDocument =
            serde_json::from_slice(&body).map_err(|e| IdentityError::DirectoryMiscontent {
                did: did_str.clone(),
                reason: format!("not a DID document: {e}"),
            })?;

        match doc.id.as_deref() {
            Some(id) if id == did_str => Ok(doc),
            Some(id) => Err(IdentityError::DirectoryMiscontent {
                did: did_str,
                reason: format!("document is for {id}"),
            }),
            None => Err(IdentityError::DirectoryMiscontent {
                did: did_str,
                reason: "document has no id".to_string(),
            }),
        }
    }

    /// Fetch the operation audit log for `did`, returned verbatim
    pub async fn audit_log(&self, did: &Did) -> Result<serde_json::Value> {
        let did_str = did.to_string();
        let url = format!("{}/{}/log/audit", self.base_url, did_str);
        debug!(did = %did_str, url = %url, "Fetching DID audit log");

        let response = match get_success(&self.client, AUDIT_OPERATION, &did_str, &url).await {
            Ok(response) => response,
            Err(IdentityError::Status { status: 404, .. }) => {
                return Err(IdentityError::IdentityNotFound(did_str));
            }
            Err(e) => {
                return Err(IdentityError::DirectoryUnavailable {
                    did: did_str,
                    cause: Box::new(e),
                });
            }
        };

        let body = read_body(response, AUDIT_OPERATION, &did_str).await?;
        serde_json::from_slice(&body).map_err(|e| IdentityError::DirectoryMiscontent {
            did: did_str,
            reason: format!("audit log is not JSON: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    fn did() -> Did {
        Did::parse("did:plc:abc123").unwrap()
    }

    async fn directory(router: Router) -> DirectoryClient {
        let base = spawn_server(router).await;
        DirectoryClient::new(Client::new(), &base)
    }

    #[tokio::test]
    async fn test_lookup_document() {
        let client = directory(Router::new().route(
            "/{did}",
            get(|| async {
                Json(json!({
                    "id": "did:plc:abc123",
                    "alsoKnownAs": ["at://alice.bsky.social"],
                    "service": [{
                        "id": "#atproto_pds",
                        "type": "AtprotoPersonalDataServer",
                        "serviceEndpoint": "https://pds.example"
                    }]
                }))
            }),
        ))
        .await;

        let doc = client.lookup_did_document(&did()).await.unwrap();
        assert_eq!(doc.also_known_as, vec!["at://alice.bsky.social"]);
        assert_eq!(doc.hosting_endpoint().unwrap(), "https://pds.example");
    }

    #[tokio::test]
    async fn test_lookup_without_id_is_miscontent() {
        let client = directory(Router::new().route(
            "/{did}",
            get(|| async { Json(json!({ "alsoKnownAs": ["at://alice.bsky.social"] })) }),
        ))
        .await;

        let err = client.lookup_did_document(&did()).await.unwrap_err();
        assert!(matches!(err, IdentityError::DirectoryMiscontent { .. }));
    }

    #[tokio::test]
    async fn test_lookup_for_other_did_is_miscontent() {
        let client = directory(Router::new().route(
            "/{did}",
            get(|| async { Json(json!({ "id": "did:plc:someoneelse" })) }),
        ))
        .await;

        let err = client.lookup_did_document(&did()).await.unwrap_err();
        assert!(err.to_string().contains("did:plc:someoneelse"));
    }

    #[tokio::test]
    async fn test_lookup_server_error_is_unavailable() {
        let client = directory(Router::new().route(
            "/{did}",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;

        let err = client.lookup_did_document(&did()).await.unwrap_err();
        assert!(matches!(
            err,
            IdentityError::DirectoryUnavailable { ref did, .. } if did == "did:plc:abc123"
        ));
    }

    #[tokio::test]
    async fn test_lookup_unknown_did() {
        let client = directory(Router::new()).await;

        let err = client.lookup_did_document(&did()).await.unwrap_err();
        assert!(matches!(err, IdentityError::IdentityNotFound(_)));
    }

    #[tokio::test]
    async fn test_lookup_unreachable_directory() {
        let client = DirectoryClient::new(Client::new(), "http://127.0.0.1:1");

        let err = client.lookup_did_document(&did()).await.unwrap_err();
        assert!(matches!(err, IdentityError::DirectoryUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_audit_log_passthrough() {
        let client = directory(Router::new().route(
            "/{did}/log/audit",
            get(|| async {
                Json(json!([
                    { "did": "did:plc:abc123", "cid": "bafyone", "nullified": false },
                    { "did": "did:plc:abc123", "cid": "bafytwo", "nullified": false }
                ]))
            }),
        ))
        .await;

        let log = client.audit_log(&did()).await.unwrap();
        assert_eq!(log.as_array().unwrap().len(), 2);
        assert_eq!(log[1]["cid"], "bafytwo");
    }
}

//! AT Protocol record and repo types

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RepoError, Result};

pub const PROFILE_COLLECTION: &str = "app.bsky.actor.profile";
pub const POST_COLLECTION: &str = "app.bsky.feed.post";
/// Record key of the single profile record in a repo
pub const PROFILE_RKEY: &str = "self";

/// A record as returned by `getRecord` / `listRecords`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub uri: String,
    pub cid: Option<String>,
    pub value: Value,
}

/// One page of `listRecords` output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub cursor: Option<String>,
}

/// `app.bsky.actor.profile` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<BlobRef>,
    pub banner: Option<BlobRef>,
    pub created_at: Option<String>,
}

impl ProfileRecord {
    /// Decode a raw record value, checking it is a profile
    pub fn from_value(value: &Value) -> Result<Self> {
        let record_type = value
            .as_object()
            .ok_or_else(|| RepoError::InvalidProfileRecord("not a JSON object".to_string()))?
            .get("$type")
            .and_then(Value::as_str);

        match record_type {
            Some(t) if t == PROFILE_COLLECTION || t == "app.bsky.actor.profile#main" => {}
            Some(t) => {
                return Err(RepoError::InvalidProfileRecord(format!(
                    "unexpected $type {t}"
                )))
            }
            None => {
                return Err(RepoError::InvalidProfileRecord(
                    "missing $type".to_string(),
                ))
            }
        }

        serde_json::from_value(value.clone())
            .map_err(|e| RepoError::InvalidProfileRecord(e.to_string()))
    }

    /// Blob field by name (`avatar` or `banner`)
    pub fn blob(&self, field: &str) -> Option<&BlobRef> {
        match field {
            "avatar" => self.avatar.as_ref(),
            "banner" => self.banner.as_ref(),
            _ => None,
        }
    }
}

/// `app.bsky.feed.post` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub text: String,
    pub created_at: String,
    #[serde(default)]
    pub langs: Vec<String>,
    pub reply: Option<ReplyRef>,
    pub embed: Option<Value>,
    pub facets: Option<Value>,
}

impl PostRecord {
    pub fn from_value(value: &Value) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub root: StrongRef,
    pub parent: StrongRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

/// Reference to a blob stored in a repo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlobRef {
    Typed {
        #[serde(rename = "$type")]
        blob_type: String,
        #[serde(rename = "ref")]
        reference: CidLink,
        #[serde(rename = "mimeType")]
        mime_type: String,
        size: u64,
    },
    /// Pre-2023 blob shape
    Legacy {
        cid: String,
        #[serde(rename = "mimeType")]
        mime_type: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CidLink {
    #[serde(rename = "$link")]
    pub link: String,
}

impl BlobRef {
    pub fn cid(&self) -> &str {
        match self {
            BlobRef::Typed { reference, .. } => &reference.link,
            BlobRef::Legacy { cid, .. } => cid,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            BlobRef::Typed { mime_type, .. } => Some(mime_type),
            BlobRef::Legacy { mime_type, .. } => mime_type.as_deref(),
        }
    }
}

/// Blob bytes fetched from a PDS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl BlobHandle {
    /// `data:` URL embedding the blob, usable anywhere a URL is expected
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.data))
    }
}

/// `com.atproto.repo.describeRepo` output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDescription {
    pub handle: String,
    pub did: String,
    pub did_doc: Value,
    #[serde(default)]
    pub collections: Vec<String>,
    pub handle_is_correct: bool,
}

/// `com.atproto.server.describeServer` output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescription {
    pub did: String,
    #[serde(default)]
    pub available_user_domains: Vec<String>,
    pub invite_code_required: Option<bool>,
    pub phone_verification_required: Option<bool>,
    pub links: Option<ServerLinks>,
    pub contact: Option<ServerContact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerLinks {
    pub privacy_policy: Option<String>,
    pub terms_of_service: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerContact {
    pub email: Option<String>,
}

/// XRPC error body
#[derive(Debug, Deserialize)]
pub(crate) struct XrpcErrorBody {
    pub(crate) error: Option<String>,
}

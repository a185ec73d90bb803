use at_uri_parser::{Did, Handle};
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};
use crate::normalize::normalize;

const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";
const PDS_SERVICE_ID: &str = "#atproto_pds";

/// Result of resolving a handle or DID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub did: Did,
    pub handle: Option<Handle>,
    pub pds_endpoint: Option<String>,
}

/// DID document as served by the PLC directory.
///
/// Some directories label the subject `did` rather than `id`; `id` wins when
/// both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawDidDocument")]
pub struct DidDocument {
    pub id: Option<String>,
    #[serde(default)]
    pub also_known_as: Vec<String>,
    #[serde(default)]
    pub service: Vec<DidService>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidService {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub service_type: String,
    pub service_endpoint: String,
}

impl DidDocument {
    /// Endpoint of the first personal data server service entry
    pub fn hosting_endpoint(&self) -> Result<String> {
        self.service
            .iter()
            .find(|s| s.service_type == PDS_SERVICE_TYPE || s.id == PDS_SERVICE_ID)
            .map(|s| s.service_endpoint.clone())
            .ok_or_else(|| IdentityError::NoHostingEndpoint(self.subject()))
    }

    /// First `alsoKnownAs` entry, canonicalized when `prefer_canonical` is set
    pub fn primary_alias(&self, prefer_canonical: bool, handle_suffix: &str) -> Result<String> {
        let alias = self
            .also_known_as
            .first()
            .ok_or_else(|| IdentityError::NoAliasFound(self.subject()))?;
        if prefer_canonical {
            Ok(normalize(alias, handle_suffix).trim().to_string())
        } else {
            Ok(alias.trim().to_string())
        }
    }

    fn subject(&self) -> String {
        self.id.clone().unwrap_or_default()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDidDocument {
    id: Option<String>,
    did: Option<String>,
    #[serde(default)]
    also_known_as: Vec<String>,
    #[serde(default)]
    service: Vec<DidService>,
}

impl From<RawDidDocument> for DidDocument {
    fn from(raw: RawDidDocument) -> Self {
        Self {
            id: raw.id.or(raw.did),
            also_known_as: raw.also_known_as,
            service: raw.service,
        }
    }
}

/// `com.atproto.identity.resolveHandle` output
#[derive(Debug, Deserialize)]
pub(crate) struct ResolveHandleResponse {
    pub(crate) did: Option<String>,
}

/// `/api/resolve-handle` proxy output
#[derive(Debug, Deserialize)]
pub(crate) struct ResolveProxyResponse {
    #[serde(default)]
    pub(crate) did: Vec<String>,
    pub(crate) error: Option<String>,
}

//! Record, blob, and repo access against a PDS

use std::sync::Arc;

use at_uri_parser::{AtUri, Did, Identifier};
use atproto_identity::{build_client, ClientConfig, IdentityResolver};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{RepoError, Result};
use crate::types::{
    BlobHandle, PostRecord, ProfileRecord, Record, RecordPage, RepoDescription,
    ServerDescription, XrpcErrorBody, POST_COLLECTION, PROFILE_COLLECTION, PROFILE_RKEY,
};
use crate::urls;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Either a raw AT URI or its already-parsed parts
#[derive(Debug, Clone)]
pub enum PostTarget<'a> {
    Uri(&'a str),
    Parts(AtUri),
}

impl<'a> From<&'a str> for PostTarget<'a> {
    fn from(uri: &'a str) -> Self {
        PostTarget::Uri(uri)
    }
}

impl From<AtUri> for PostTarget<'_> {
    fn from(uri: AtUri) -> Self {
        PostTarget::Parts(uri)
    }
}

/// HTTP client for repo records and blobs
pub struct RepoClient {
    client: Client,
    config: Arc<ClientConfig>,
    resolver: Arc<IdentityResolver>,
}

impl RepoClient {
    pub fn new(config: Arc<ClientConfig>, resolver: Arc<IdentityResolver>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            config,
            resolver,
        })
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Fetch a single record
    pub async fn get_record(
        &self,
        endpoint: &str,
        collection: &str,
        repo: &str,
        rkey: &str,
    ) -> Result<Record> {
        let url = format!(
            "{}/xrpc/com.atproto.repo.getRecord?repo={}&collection={}&rkey={}",
            xrpc_base(endpoint),
            urlencoding::encode(repo),
            urlencoding::encode(collection),
            urlencoding::encode(rkey)
        );
        debug!(url = %url, "Fetching record");

        let not_found = || RepoError::RecordNotFound {
            repo: repo.to_string(),
            collection: collection.to_string(),
            rkey: rkey.to_string(),
        };

        match self.xrpc_get("getRecord", repo, &url).await {
            Ok(response) => decode(response, "getRecord", repo).await,
            Err(e) if is_not_found(&e, &["RecordNotFound"]) => Err(not_found()),
            Err(e) => Err(e),
        }
    }

    /// Fetch one page of records. Pagination is up to the caller via `cursor`.
    pub async fn list_records(
        &self,
        endpoint: &str,
        collection: &str,
        repo: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<RecordPage> {
        let max = self.config.max_list_limit.max(1);
        let limit = limit.unwrap_or(max).clamp(1, max);

        let mut url = format!(
            "{}/xrpc/com.atproto.repo.listRecords?repo={}&collection={}&limit={}",
            xrpc_base(endpoint),
            urlencoding::encode(repo),
            urlencoding::encode(collection),
            limit
        );
        if let Some(c) = cursor {
            url.push_str(&format!("&cursor={}", urlencoding::encode(c)));
        }
        debug!(url = %url, "Listing records");

        let response = self.xrpc_get("listRecords", repo, &url).await?;
        decode(response, "listRecords", repo).await
    }

    /// Fetch a blob from the PDS hosting `did`
    pub async fn get_blob(&self, did: &Did, cid: &str) -> Result<BlobHandle> {
        let endpoint = self.resolver.resolve_hosting_endpoint(did).await?;
        self.get_blob_from(&endpoint, did, cid).await
    }

    /// Fetch a blob from a known PDS endpoint
    pub async fn get_blob_from(&self, endpoint: &str, did: &Did, cid: &str) -> Result<BlobHandle> {
        let did_str = did.to_string();
        let url = format!(
            "{}/xrpc/com.atproto.sync.getBlob?did={}&cid={}",
            xrpc_base(endpoint),
            urlencoding::encode(&did_str),
            urlencoding::encode(cid)
        );
        debug!(url = %url, "Fetching blob from PDS");

        let response = match self.xrpc_get("getBlob", &did_str, &url).await {
            Ok(response) => response,
            Err(e) if is_not_found(&e, &["BlobNotFound", "RecordNotFound"]) => {
                return Err(RepoError::BlobNotFound {
                    did: did_str,
                    cid: cid.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| RepoError::Http {
                operation: "getBlob",
                target: did_str.clone(),
                source: Box::new(e),
            })?
            .to_vec();

        debug!(size = data.len(), content_type = %content_type, "Fetched blob from PDS");
        Ok(BlobHandle { data, content_type })
    }

    /// Fetch and decode a post
    pub async fn get_post(&self, endpoint: &str, repo: &str, rkey: &str) -> Result<PostRecord> {
        let record = self.get_record(endpoint, POST_COLLECTION, repo, rkey).await?;
        PostRecord::from_value(&record.value).map_err(|e| RepoError::Decode {
            operation: "getRecord",
            target: record.uri,
            reason: format!("not a post: {e}"),
        })
    }

    /// Fetch and decode the `self` profile record
    pub async fn load_profile(&self, endpoint: &str, repo: &str) -> Result<ProfileRecord> {
        let record = self
            .get_record(endpoint, PROFILE_COLLECTION, repo, PROFILE_RKEY)
            .await?;
        ProfileRecord::from_value(&record.value)
    }

    pub async fn describe_repo(&self, endpoint: &str, repo: &str) -> Result<RepoDescription> {
        let url = format!(
            "{}/xrpc/com.atproto.repo.describeRepo?repo={}",
            xrpc_base(endpoint),
            urlencoding::encode(repo)
        );
        let response = self.xrpc_get("describeRepo", repo, &url).await?;
        decode(response, "describeRepo", repo).await
    }

    pub async fn describe_server(&self, server: &str) -> Result<ServerDescription> {
        let url = format!(
            "{}/xrpc/com.atproto.server.describeServer",
            xrpc_base(server)
        );
        let response = self.xrpc_get("describeServer", server, &url).await?;
        decode(response, "describeServer", server).await
    }

    /// Image CDN URL for a profile blob; empty when the field is absent.
    /// `endpoint` defaults to the configured PDS host.
    pub fn build_blob_url(
        &self,
        cdn_base: &str,
        did: &Did,
        record: &ProfileRecord,
        field: &str,
        endpoint: Option<&str>,
    ) -> String {
        urls::blob_url(
            cdn_base,
            &self.config.default_pds_host(),
            did,
            record,
            field,
            endpoint,
        )
    }

    /// [`Self::build_blob_url`] for an undecoded record value
    pub fn build_blob_url_from_value(
        &self,
        cdn_base: &str,
        did: &Did,
        record: &serde_json::Value,
        field: &str,
        endpoint: Option<&str>,
    ) -> Result<String> {
        let profile = ProfileRecord::from_value(record).inspect_err(|e| {
            warn!(did = %did, field, error = %e, "Rejected profile record");
        })?;
        Ok(self.build_blob_url(cdn_base, did, &profile, field, endpoint))
    }

    /// Web app link to a post. Without `handle`, a DID authority is mapped to
    /// its alias, falling back to the DID itself.
    pub async fn build_post_url(
        &self,
        app_url_prefix: &str,
        target: PostTarget<'_>,
        handle: Option<&str>,
    ) -> Result<String> {
        let uri = match target {
            PostTarget::Uri(raw) => AtUri::parse(raw)?,
            PostTarget::Parts(parts) => parts,
        };

        let handle = match (handle, &uri.authority) {
            (Some(handle), _) => handle.to_string(),
            (None, Identifier::Handle(handle)) => handle.to_string(),
            (None, Identifier::Did(did)) => {
                match self.resolver.resolve_did_to_handle(did, false).await {
                    Ok(handle) => handle,
                    Err(e) => {
                        warn!(did = %did, error = %e, "Handle lookup failed, linking by DID");
                        did.to_string()
                    }
                }
            }
        };

        Ok(urls::post_url(app_url_prefix, &handle, &uri.rkey))
    }

    async fn xrpc_get(&self, operation: &'static str, target: &str, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RepoError::Http {
                operation,
                target: target.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error = response
            .json::<XrpcErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error);
        warn!(operation, target, status = %status, error = ?error, "XRPC request failed");
        Err(RepoError::Status {
            operation,
            target: target.to_string(),
            status: status.as_u16(),
            error,
        })
    }
}

/// Endpoint with any trailing `/` or `/xrpc` removed
fn xrpc_base(endpoint: &str) -> &str {
    let trimmed = endpoint.trim_end_matches('/');
    trimmed.strip_suffix("/xrpc").unwrap_or(trimmed)
}

fn is_not_found(err: &RepoError, xrpc_errors: &[&str]) -> bool {
    match err {
        RepoError::Status { status: 404, .. } => true,
        RepoError::Status {
            error: Some(error), ..
        } => xrpc_errors.contains(&error.as_str()),
        _ => false,
    }
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    operation: &'static str,
    target: &str,
) -> Result<T> {
    let body = response.bytes().await.map_err(|e| RepoError::Http {
        operation,
        target: target.to_string(),
        source: Box::new(e),
    })?;
    serde_json::from_slice(&body).map_err(|e| RepoError::Decode {
        operation,
        target: target.to_string(),
        reason: e.to_string(),
    })
}

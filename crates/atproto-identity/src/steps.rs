//! Handle resolution strategies.
//!
//! Each step turns a handle into a DID or reports why it could not. The
//! resolver tries them in order; see [`crate::IdentityResolver`].

use async_trait::async_trait;
use at_uri_parser::Did;
use reqwest::header::HOST;
use reqwest::Client;

use crate::error::IdentityError;
use crate::http::{get_success, read_body};
use crate::types::{ResolveHandleResponse, ResolveProxyResponse};

/// Outcome of a single resolution step
#[derive(Debug)]
pub enum StepOutcome {
    Resolved(Did),
    /// Recoverable; the next step should be tried
    Retry(IdentityError),
    /// Abort the whole chain with this error
    Fatal(IdentityError),
}

#[async_trait]
pub trait HandleResolutionStep: Send + Sync {
    /// Short name used in logs and error context
    fn name(&self) -> &'static str;

    async fn attempt(&self, handle: &str) -> StepOutcome;
}

/// Parse a DID reported by a resolution source
fn reported_did(operation: &'static str, handle: &str, raw: &str) -> StepOutcome {
    match Did::parse(raw.trim()) {
        Ok(did) => StepOutcome::Resolved(did),
        Err(e) => StepOutcome::Retry(IdentityError::UnexpectedResponse {
            operation,
            target: handle.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn unexpected(operation: &'static str, handle: &str, reason: impl Into<String>) -> StepOutcome {
    StepOutcome::Retry(IdentityError::UnexpectedResponse {
        operation,
        target: handle.to_string(),
        reason: reason.into(),
    })
}

/// `com.atproto.identity.resolveHandle` on a PDS
pub struct XrpcResolveHandle {
    client: Client,
    service_url: String,
}

impl XrpcResolveHandle {
    const NAME: &'static str = "resolveHandle";

    pub fn new(client: Client, service_url: &str) -> Self {
        Self {
            client,
            service_url: service_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl HandleResolutionStep for XrpcResolveHandle {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt(&self, handle: &str) -> StepOutcome {
        let url = format!(
            "{}/xrpc/com.atproto.identity.resolveHandle?handle={}",
            self.service_url,
            urlencoding::encode(handle)
        );

        let response = match get_success(&self.client, Self::NAME, handle, &url).await {
            Ok(response) => response,
            Err(e) => return StepOutcome::Retry(e),
        };
        let body = match read_body(response, Self::NAME, handle).await {
            Ok(body) => body,
            Err(e) => return StepOutcome::Retry(e),
        };

        match serde_json::from_slice::<ResolveHandleResponse>(&body) {
            Ok(ResolveHandleResponse { did: Some(did) }) if !did.trim().is_empty() => {
                reported_did(Self::NAME, handle, &did)
            }
            Ok(_) => unexpected(Self::NAME, handle, "response carried no DID"),
            Err(e) => unexpected(Self::NAME, handle, format!("invalid JSON: {e}")),
        }
    }
}

/// `https://<handle>/.well-known/atproto-did`
pub struct WellKnownDid {
    client: Client,
    origin: Option<String>,
}

impl WellKnownDid {
    const NAME: &'static str = "well-known atproto-did";

    pub fn new(client: Client) -> Self {
        Self {
            client,
            origin: None,
        }
    }

    /// Send every request to `origin` with the handle as the `Host` header,
    /// e.g. through a local reverse proxy
    pub fn via_origin(client: Client, origin: &str) -> Self {
        Self {
            client,
            origin: Some(origin.trim_end_matches('/').to_string()),
        }
    }
}

#[async_trait]
impl HandleResolutionStep for WellKnownDid {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt(&self, handle: &str) -> StepOutcome {
        let request = match &self.origin {
            Some(origin) => self
                .client
                .get(format!("{origin}/.well-known/atproto-did"))
                .header(HOST, handle),
            None => self
                .client
                .get(format!("https://{handle}/.well-known/atproto-did")),
        };

        let response = match request.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                return StepOutcome::Retry(IdentityError::Status {
                    operation: Self::NAME,
                    target: handle.to_string(),
                    status: response.status().as_u16(),
                })
            }
            Err(e) => {
                return StepOutcome::Retry(IdentityError::Transport {
                    operation: Self::NAME,
                    target: handle.to_string(),
                    source: Box::new(e),
                })
            }
        };

        match response.text().await {
            Ok(text) => reported_did(Self::NAME, handle, &text),
            Err(e) => StepOutcome::Retry(IdentityError::Transport {
                operation: Self::NAME,
                target: handle.to_string(),
                source: Box::new(e),
            }),
        }
    }
}

/// `/api/resolve-handle` on a deployment-local proxy (DNS TXT lookup server side)
pub struct ResolveProxy {
    client: Client,
    proxy_url: String,
}

impl ResolveProxy {
    const NAME: &'static str = "resolve-handle proxy";

    pub fn new(client: Client, proxy_url: &str) -> Self {
        Self {
            client,
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl HandleResolutionStep for ResolveProxy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt(&self, handle: &str) -> StepOutcome {
        let url = format!(
            "{}/api/resolve-handle?handle={}",
            self.proxy_url,
            urlencoding::encode(handle)
        );

        let response = match get_success(&self.client, Self::NAME, handle, &url).await {
            Ok(response) => response,
            Err(e) => return StepOutcome::Retry(e),
        };
        let body = match read_body(response, Self::NAME, handle).await {
            Ok(body) => body,
            Err(e) => return StepOutcome::Retry(e),
        };

        match serde_json::from_slice::<ResolveProxyResponse>(&body) {
            Ok(ResolveProxyResponse {
                error: Some(error), ..
            }) => unexpected(Self::NAME, handle, error),
            Ok(ResolveProxyResponse { did, error: None }) => match did.first() {
                Some(first) => reported_did(Self::NAME, handle, first),
                None => unexpected(Self::NAME, handle, "no DID records"),
            },
            Err(e) => unexpected(Self::NAME, handle, format!("invalid JSON: {e}")),
        }
    }
}

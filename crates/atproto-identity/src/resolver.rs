use std::sync::Arc;

use at_uri_parser::{Did, Handle, Identifier, DID_PREFIX};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::directory::DirectoryClient;
use crate::error::{IdentityError, Result};
use crate::http::build_client;
use crate::steps::{HandleResolutionStep, ResolveProxy, StepOutcome, WellKnownDid, XrpcResolveHandle};
use crate::types::ResolveResult;

/// Longest fully-qualified domain name
const MAX_HANDLE_LEN: usize = 253;

/// Resolves AT Protocol identities (handles ↔ DIDs) and their PDS endpoints.
///
/// Handle resolution walks an ordered list of [`HandleResolutionStep`]s, one
/// at a time, each bounded by the configured step timeout. The first step to
/// produce a DID wins. Nothing is cached; wrap in
/// [`CachingResolver`](crate::CachingResolver) for that.
pub struct IdentityResolver {
    config: Arc<ClientConfig>,
    directory: DirectoryClient,
    steps: Vec<Box<dyn HandleResolutionStep>>,
}

impl IdentityResolver {
    /// Create a resolver with the standard step order: resolveHandle on the
    /// configured PDS, the well-known document, then the resolve proxy when
    /// one is configured.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        let client = build_client()?;

        let mut steps: Vec<Box<dyn HandleResolutionStep>> = vec![
            Box::new(XrpcResolveHandle::new(client.clone(), config.service_url.as_str())),
            Box::new(WellKnownDid::new(client.clone())),
        ];
        if let Some(ref proxy_url) = config.resolve_proxy_url {
            steps.push(Box::new(ResolveProxy::new(client.clone(), proxy_url.as_str())));
        }

        let directory = DirectoryClient::new(client, config.directory_url.as_str());
        Ok(Self {
            config,
            directory,
            steps,
        })
    }

    /// Create a resolver with a custom step list
    pub fn with_steps(
        config: Arc<ClientConfig>,
        directory: DirectoryClient,
        steps: Vec<Box<dyn HandleResolutionStep>>,
    ) -> Self {
        Self {
            config,
            directory,
            steps,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn directory(&self) -> &DirectoryClient {
        &self.directory
    }

    /// Resolve a handle to a DID
    pub async fn resolve_handle_to_did(&self, handle: &str) -> Result<Did> {
        validate_handle(handle)?;

        let timeout = self.config.step_timeout;
        let mut last = None;

        for step in &self.steps {
            let outcome = match tokio::time::timeout(timeout, step.attempt(handle)).await {
                Ok(outcome) => outcome,
                Err(_) => StepOutcome::Retry(IdentityError::Timeout {
                    operation: step.name(),
                    target: handle.to_string(),
                    after: timeout,
                }),
            };

            match outcome {
                StepOutcome::Resolved(did) => {
                    debug!(handle, step = step.name(), did = %did, "Resolved handle");
                    return Ok(did);
                }
                StepOutcome::Retry(e) => {
                    debug!(handle, step = step.name(), error = %e, "Resolution step failed");
                    last = Some(e);
                }
                StepOutcome::Fatal(e) => {
                    warn!(handle, step = step.name(), error = %e, "Resolution aborted");
                    return Err(e);
                }
            }
        }

        let last = last.unwrap_or_else(|| {
            IdentityError::Config("no handle resolution steps configured".to_string())
        });
        Err(IdentityError::HandleResolutionFailed {
            handle: handle.to_string(),
            last: Box::new(last),
        })
    }

    /// Map a DID back to its handle via the directory.
    ///
    /// With `only_handle` the first alias is normalized (`at://` stripped);
    /// otherwise it is returned as listed in the document.
    pub async fn resolve_did_to_handle(&self, did: &Did, only_handle: bool) -> Result<String> {
        let doc = self.directory.lookup_did_document(did).await?;
        if doc.also_known_as.is_empty() {
            return Err(IdentityError::IdentityNotFound(did.to_string()));
        }
        doc.primary_alias(only_handle, &self.config.handle_suffix)
    }

    /// Get the PDS endpoint for a DID
    pub async fn resolve_hosting_endpoint(&self, did: &Did) -> Result<String> {
        let doc = self.directory.lookup_did_document(did).await?;
        doc.hosting_endpoint()
    }

    /// Resolve a raw identifier (handle, `@handle`, bare name, DID, or
    /// `at://` form) to a DID
    pub async fn resolve_identifier(&self, raw: &str) -> Result<Did> {
        match Identifier::parse(&self.config.normalize(raw))? {
            Identifier::Did(did) => Ok(did),
            Identifier::Handle(handle) => self.resolve_handle_to_did(handle.as_str()).await,
        }
    }

    /// Resolve a raw identifier to its DID, handle, and PDS endpoint
    pub async fn resolve(&self, raw: &str) -> Result<ResolveResult> {
        match Identifier::parse(&self.config.normalize(raw))? {
            Identifier::Did(did) => {
                let doc = self.directory.lookup_did_document(&did).await?;
                let handle = doc
                    .primary_alias(true, &self.config.handle_suffix)
                    .ok()
                    .map(Handle::new);
                let pds_endpoint = doc.hosting_endpoint().ok();
                Ok(ResolveResult {
                    did,
                    handle,
                    pds_endpoint,
                })
            }
            Identifier::Handle(handle) => {
                let did = self.resolve_handle_to_did(handle.as_str()).await?;
                let pds_endpoint = match self.resolve_hosting_endpoint(&did).await {
                    Ok(endpoint) => Some(endpoint),
                    Err(e) => {
                        warn!(did = %did, error = %e, "No PDS endpoint for resolved handle");
                        None
                    }
                };
                Ok(ResolveResult {
                    did,
                    handle: Some(handle),
                    pds_endpoint,
                })
            }
        }
    }
}

fn validate_handle(handle: &str) -> Result<()> {
    let invalid = |reason| {
        Err(IdentityError::InvalidHandle {
            handle: handle.to_string(),
            reason,
        })
    };

    if handle.starts_with(DID_PREFIX) {
        return invalid("expected a handle, not a DID");
    }
    if handle.is_empty() {
        return invalid("empty handle");
    }
    if handle.len() > MAX_HANDLE_LEN {
        return invalid("longer than 253 characters");
    }
    if !handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return invalid("contains characters not allowed in a domain name");
    }
    Ok(())
}

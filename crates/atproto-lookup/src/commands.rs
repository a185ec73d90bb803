use std::sync::Arc;

use at_uri_parser::Did;
use atproto_identity::{base_url, parse_url, ClientConfig, IdentityResolver, ResolveResult};
use atproto_repo_client::{PostTarget, RepoClient, POST_COLLECTION};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use crate::error::{LookupError, Result};

#[derive(Debug, Parser)]
#[command(name = "atproto-lookup", version, about = "Resolve AT Protocol identities and fetch their records")]
pub struct Cli {
    /// PDS used for resolveHandle (overrides ATPROTO_SERVICE_URL)
    #[arg(long, global = true)]
    pub service: Option<String>,

    /// Suffix appended to bare names (overrides ATPROTO_HANDLE_SUFFIX)
    #[arg(long, global = true)]
    pub suffix: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a handle or DID to DID, handle, and PDS endpoint
    Resolve { identifier: String },
    /// Map a DID to its handle
    Handle {
        did: String,
        /// Print the alias exactly as listed in the DID document
        #[arg(long)]
        raw: bool,
    },
    /// Print the PDS endpoint of a DID
    Endpoint { did: String },
    /// Print the PLC audit log of a DID
    Audit { did: String },
    /// Fetch an identity's profile record
    Profile { identifier: String },
    /// List an identity's posts
    Posts {
        identifier: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Build the web app link for a post URI
    PostUrl {
        uri: String,
        #[arg(long)]
        handle: Option<String>,
    },
    /// Build the image CDN link for a profile's avatar or banner
    BlobUrl { identifier: String, field: String },
    /// Describe a PDS (defaults to the configured service)
    DescribeServer { server: Option<String> },
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    pub fn config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(ref service) = self.service {
            config.service_url = parse_url("--service", service)?;
        }
        if let Some(ref suffix) = self.suffix {
            config.handle_suffix = suffix.trim_start_matches('.').to_string();
        }
        Ok(config)
    }
}

/// Run a command, returning what should be printed
pub async fn run(command: Command, config: Arc<ClientConfig>, repo: &RepoClient) -> Result<String> {
    let resolver = repo.resolver();

    let output = match command {
        Command::Resolve { identifier } => serde_json::to_value(resolver.resolve(&identifier).await?)?,
        Command::Handle { did, raw } => {
            let did = Did::parse(&did)?;
            Value::String(resolver.resolve_did_to_handle(&did, !raw).await?)
        }
        Command::Endpoint { did } => {
            let did = Did::parse(&did)?;
            Value::String(resolver.resolve_hosting_endpoint(&did).await?)
        }
        Command::Audit { did } => {
            let did = Did::parse(&did)?;
            resolver.directory().audit_log(&did).await?
        }
        Command::Profile { identifier } => {
            let (resolved, endpoint) = locate(resolver, &identifier).await?;
            let profile = repo
                .load_profile(&endpoint, &resolved.did.to_string())
                .await?;
            serde_json::to_value(profile)?
        }
        Command::Posts {
            identifier,
            limit,
            cursor,
        } => {
            let (resolved, endpoint) = locate(resolver, &identifier).await?;
            let page = repo
                .list_records(
                    &endpoint,
                    POST_COLLECTION,
                    &resolved.did.to_string(),
                    limit,
                    cursor.as_deref(),
                )
                .await?;
            serde_json::to_value(page)?
        }
        Command::PostUrl { uri, handle } => Value::String(
            repo.build_post_url(base_url(&config.app_url), PostTarget::Uri(&uri), handle.as_deref())
                .await?,
        ),
        Command::BlobUrl { identifier, field } => {
            let (resolved, endpoint) = locate(resolver, &identifier).await?;
            let profile = repo
                .load_profile(&endpoint, &resolved.did.to_string())
                .await?;
            Value::String(repo.build_blob_url(
                base_url(&config.cdn_url),
                &resolved.did,
                &profile,
                &field,
                Some(&endpoint),
            ))
        }
        Command::DescribeServer { server } => {
            let server = server.unwrap_or_else(|| base_url(&config.service_url).to_string());
            let description = repo.describe_server(&server).await?;
            json!({
                "server": server,
                "description": description,
                "adminDid": config.admin_did.to_string(),
            })
        }
    };

    Ok(match output {
        Value::String(s) => s,
        other => serde_json::to_string_pretty(&other)?,
    })
}

async fn locate(resolver: &IdentityResolver, identifier: &str) -> Result<(ResolveResult, String)> {
    let resolved = resolver.resolve(identifier).await?;
    let endpoint = resolved
        .pds_endpoint
        .clone()
        .ok_or_else(|| LookupError::NoEndpoint(resolved.did.to_string()))?;
    Ok((resolved, endpoint))
}

/// Build the resolver and repo client for `config`
pub fn build(config: Arc<ClientConfig>) -> Result<RepoClient> {
    let resolver = Arc::new(IdentityResolver::new(config.clone())?);
    Ok(RepoClient::new(config, resolver)?)
}

use std::env;
use std::time::Duration;

use at_uri_parser::Did;
use url::Url;

use crate::error::{IdentityError, Result};
use crate::normalize::normalize;

const DEFAULT_SERVICE_URL: &str = "https://bsky.social";
const DEFAULT_HANDLE_SUFFIX: &str = "bsky.social";
const DEFAULT_APP_URL: &str = "https://bsky.app";
const DEFAULT_ADMIN_DID: &str = "did:plc:c22jdrqhoajyj5ca7e56a3ke";
const DEFAULT_DIRECTORY_URL: &str = "https://plc.directory";
const DEFAULT_CDN_URL: &str = "https://av-cdn.bsky.social";
const DEFAULT_STEP_TIMEOUT_MS: u64 = 4000;
const DEFAULT_MAX_LIST_LIMIT: u32 = 50;

/// Client configuration, built once at startup and shared read-only.
///
/// Use [`base_url`] to format a URL field without its trailing slash.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// PDS queried by the protocol-native handle resolution step
    pub service_url: Url,
    /// Suffix appended to bare names by [`normalize`]
    pub handle_suffix: String,
    /// Prefix for links into the web app
    pub app_url: Url,
    pub admin_did: Did,
    /// PLC directory base URL
    pub directory_url: Url,
    /// Base URL of the `/api/resolve-handle` proxy, if one is deployed
    pub resolve_proxy_url: Option<Url>,
    /// Image CDN base used for blob URLs
    pub cdn_url: Url,
    /// Upper bound on each handle resolution step
    pub step_timeout: Duration,
    pub max_list_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: default_url(DEFAULT_SERVICE_URL),
            handle_suffix: DEFAULT_HANDLE_SUFFIX.to_string(),
            app_url: default_url(DEFAULT_APP_URL),
            admin_did: Did::parse(DEFAULT_ADMIN_DID).expect("default admin DID is valid"),
            directory_url: default_url(DEFAULT_DIRECTORY_URL),
            resolve_proxy_url: None,
            cdn_url: default_url(DEFAULT_CDN_URL),
            step_timeout: Duration::from_millis(DEFAULT_STEP_TIMEOUT_MS),
            max_list_limit: DEFAULT_MAX_LIST_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let service_url = url_var("ATPROTO_SERVICE_URL", DEFAULT_SERVICE_URL)?;

        let handle_suffix = env::var("ATPROTO_HANDLE_SUFFIX")
            .map(|s| s.trim().trim_start_matches('.').to_string())
            .unwrap_or_else(|_| DEFAULT_HANDLE_SUFFIX.to_string());

        let app_url = url_var("ATPROTO_APP_URL", DEFAULT_APP_URL)?;

        let admin_did =
            env::var("ATPROTO_ADMIN_DID").unwrap_or_else(|_| DEFAULT_ADMIN_DID.to_string());
        let admin_did = Did::parse(admin_did.trim())
            .map_err(|e| IdentityError::Config(format!("ATPROTO_ADMIN_DID: {e}")))?;

        let directory_url = url_var("PLC_DIRECTORY_URL", DEFAULT_DIRECTORY_URL)?;

        let resolve_proxy_url = match env::var("RESOLVE_PROXY_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_url("RESOLVE_PROXY_URL", &raw)?),
            _ => None,
        };

        let cdn_url = url_var("ATPROTO_CDN_URL", DEFAULT_CDN_URL)?;

        let step_timeout = env::var("RESOLVE_STEP_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_STEP_TIMEOUT_MS));

        let max_list_limit = env::var("LIST_RECORDS_MAX_LIMIT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_LIST_LIMIT);

        Ok(Self {
            service_url,
            handle_suffix,
            app_url,
            admin_did,
            directory_url,
            resolve_proxy_url,
            cdn_url,
            step_timeout,
            max_list_limit,
        })
    }

    /// [`normalize`] with the configured handle suffix
    pub fn normalize(&self, raw: &str) -> String {
        normalize(raw, &self.handle_suffix)
    }

    /// Host (and port) of the default PDS, e.g. `bsky.social`
    pub fn default_pds_host(&self) -> String {
        match (self.service_url.host_str(), self.service_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => strip_scheme(base_url(&self.service_url)).to_string(),
        }
    }

    pub fn is_admin(&self, did: &Did) -> bool {
        *did == self.admin_did
    }
}

/// `url` as a string without a trailing slash
pub fn base_url(url: &Url) -> &str {
    url.as_str().trim_end_matches('/')
}

/// Parse a configured URL, naming `name` in the error
pub fn parse_url(name: &str, raw: &str) -> Result<Url> {
    let raw = raw.trim();
    Url::parse(raw).map_err(|e| IdentityError::Config(format!("{name}: invalid URL '{raw}': {e}")))
}

/// Drop a leading `scheme://`, if any
pub fn strip_scheme(endpoint: &str) -> &str {
    match endpoint.find("://") {
        Some(idx) => &endpoint[idx + 3..],
        None => endpoint,
    }
}

fn url_var(name: &str, default: &str) -> Result<Url> {
    match env::var(name) {
        Ok(raw) => parse_url(name, &raw),
        Err(_) => parse_url(name, default),
    }
}

fn default_url(raw: &str) -> Url {
    Url::parse(raw).expect("default URLs are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pds_host() {
        let config = ClientConfig::default();
        assert_eq!(config.default_pds_host(), "bsky.social");

        let config = ClientConfig {
            service_url: Url::parse("http://127.0.0.1:2583").unwrap(),
            ..ClientConfig::default()
        };
        assert_eq!(config.default_pds_host(), "127.0.0.1:2583");
    }

    #[test]
    fn test_normalize_uses_suffix() {
        let config = ClientConfig {
            handle_suffix: "example.com".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.normalize("@alice"), "alice.example.com");
    }

    #[test]
    fn test_is_admin() {
        let config = ClientConfig::default();
        assert!(config.is_admin(&Did::parse(DEFAULT_ADMIN_DID).unwrap()));
        assert!(!config.is_admin(&Did::parse("did:plc:abc123").unwrap()));
    }

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("https://pds.example"), "pds.example");
        assert_eq!(strip_scheme("pds.example"), "pds.example");
    }

    #[test]
    fn test_parse_url() {
        let url = parse_url("X", " https://plc.directory/ ").unwrap();
        assert_eq!(base_url(&url), "https://plc.directory");
        assert!(matches!(
            parse_url("X", "not a url"),
            Err(IdentityError::Config(_))
        ));
    }

    #[test]
    fn test_default_urls_format_without_trailing_slash() {
        let config = ClientConfig::default();
        assert_eq!(base_url(&config.service_url), "https://bsky.social");
        assert_eq!(base_url(&config.directory_url), "https://plc.directory");
        assert_eq!(base_url(&config.cdn_url), "https://av-cdn.bsky.social");
        assert_eq!(config.admin_did.to_string(), DEFAULT_ADMIN_DID);
    }
}

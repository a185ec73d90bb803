//! Error types for the lookup CLI

use std::fmt;

use at_uri_parser::ParseError;
use atproto_identity::IdentityError;
use atproto_repo_client::RepoError;

#[derive(Debug)]
pub enum LookupError {
    Identity(IdentityError),
    Repo(RepoError),
    NoEndpoint(String),
    Json(serde_json::Error),
    Config(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Identity(err) => write!(f, "{}", err),
            LookupError::Repo(err) => write!(f, "{}", err),
            LookupError::NoEndpoint(id) => write!(f, "No PDS endpoint known for {}", id),
            LookupError::Json(err) => write!(f, "JSON error: {}", err),
            LookupError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Identity(err) => Some(err),
            LookupError::Repo(err) => Some(err),
            LookupError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdentityError> for LookupError {
    fn from(err: IdentityError) -> Self {
        LookupError::Identity(err)
    }
}

impl From<RepoError> for LookupError {
    fn from(err: RepoError) -> Self {
        LookupError::Repo(err)
    }
}

impl From<ParseError> for LookupError {
    fn from(err: ParseError) -> Self {
        LookupError::Identity(IdentityError::Parse(err))
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Json(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for LookupError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        LookupError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_endpoint_display() {
        let err = LookupError::NoEndpoint("did:plc:abc123".to_string());
        assert_eq!(format!("{}", err), "No PDS endpoint known for did:plc:abc123");
    }

    #[test]
    fn test_identity_error_passthrough() {
        let err = LookupError::from(IdentityError::IdentityNotFound("did:plc:abc123".to_string()));
        assert_eq!(format!("{}", err), "Identity not found: did:plc:abc123");
    }

    #[test]
    fn test_config_error_display() {
        let err = LookupError::Config("bad filter".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad filter");
    }
}

//! Error types for the AT Protocol repo client

use std::fmt;

use at_uri_parser::ParseError;
use atproto_identity::IdentityError;

#[derive(Debug)]
pub enum RepoError {
    RecordNotFound {
        repo: String,
        collection: String,
        rkey: String,
    },
    BlobNotFound {
        did: String,
        cid: String,
    },
    InvalidProfileRecord(String),
    Http {
        operation: &'static str,
        target: String,
        source: Box<reqwest::Error>,
    },
    Status {
        operation: &'static str,
        target: String,
        status: u16,
        error: Option<String>,
    },
    Decode {
        operation: &'static str,
        target: String,
        reason: String,
    },
    Identity(IdentityError),
    Uri(ParseError),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::RecordNotFound {
                repo,
                collection,
                rkey,
            } => write!(f, "Record not found: {}/{}/{}", repo, collection, rkey),
            RepoError::BlobNotFound { did, cid } => {
                write!(f, "Blob not found: {} in {}", cid, did)
            }
            RepoError::InvalidProfileRecord(reason) => {
                write!(f, "Invalid profile record: {}", reason)
            }
            RepoError::Http {
                operation,
                target,
                source,
            } => write!(f, "HTTP error in {} for {}: {}", operation, target, source),
            RepoError::Status {
                operation,
                target,
                status,
                error,
            } => match error {
                Some(error) => write!(
                    f,
                    "{} for {} returned status {} ({})",
                    operation, target, status, error
                ),
                None => write!(f, "{} for {} returned status {}", operation, target, status),
            },
            RepoError::Decode {
                operation,
                target,
                reason,
            } => write!(f, "Could not decode {} response for {}: {}", operation, target, reason),
            RepoError::Identity(err) => write!(f, "{}", err),
            RepoError::Uri(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RepoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepoError::Http { source, .. } => Some(source.as_ref()),
            RepoError::Identity(err) => Some(err),
            RepoError::Uri(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdentityError> for RepoError {
    fn from(err: IdentityError) -> Self {
        RepoError::Identity(err)
    }
}

impl From<ParseError> for RepoError {
    fn from(err: ParseError) -> Self {
        RepoError::Uri(err)
    }
}

pub type Result<T> = std::result::Result<T, RepoError>;

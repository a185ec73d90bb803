//! Error types for AT URI and DID parsing

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MalformedUri(String),
    MalformedDid(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedUri(uri) => write!(f, "Malformed AT URI: '{}'", uri),
            ParseError::MalformedDid(did) => write!(f, "Malformed DID: '{}'", did),
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_uri_display() {
        let err = ParseError::MalformedUri("at://nope".to_string());
        assert_eq!(format!("{}", err), "Malformed AT URI: 'at://nope'");
    }

    #[test]
    fn test_malformed_did_display() {
        let err = ParseError::MalformedDid("did:".to_string());
        assert_eq!(format!("{}", err), "Malformed DID: 'did:'");
    }
}

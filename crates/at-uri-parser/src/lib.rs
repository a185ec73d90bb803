//! Parser for AT Protocol URIs and DIDs
//!
//! Parses URIs of the form `at://authority/collection/rkey` into their component
//! parts, and DIDs of the form `did:method:identifier`.

mod error;
mod identifier;

pub use error::{ParseError, Result};
pub use identifier::{Did, Handle, Identifier, DID_PREFIX};

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Scheme prefix of every AT URI
pub const AT_URI_PREFIX: &str = "at://";

/// Parsed components of an AT Protocol URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtUri {
    pub authority: Identifier,
    pub collection: String,
    pub rkey: String,
}

static AT_URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^at://([^/]+)/([^/]+)/([^/]+)$").unwrap());

impl AtUri {
    /// Parse an AT Protocol URI like "at://did:plc:xxx/collection/rkey"
    pub fn parse(uri: &str) -> Result<Self> {
        let malformed = || ParseError::MalformedUri(uri.to_string());
        let caps = AT_URI_RE.captures(uri).ok_or_else(malformed)?;
        let authority = Identifier::parse(&caps[1]).map_err(|_| malformed())?;
        Ok(Self {
            authority,
            collection: caps[2].to_string(),
            rkey: caps[3].to_string(),
        })
    }

    /// The authority as a DID, if it is one
    pub fn did(&self) -> Option<&Did> {
        self.authority.as_did()
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}/{}",
            AT_URI_PREFIX, self.authority, self.collection, self.rkey
        )
    }
}

impl std::str::FromStr for AtUri {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

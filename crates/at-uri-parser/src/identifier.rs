//! DIDs, handles, and the identifier union over them

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{ParseError, Result};

/// Prefix shared by every DID string
pub const DID_PREFIX: &str = "did:";

static DID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^did:(?<method>[A-Za-z0-9]+):(?<identifier>[a-z0-9:%-]+)$").unwrap()
});

/// A decentralized identifier, e.g. `did:plc:abc123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    method: String,
    identifier: String,
}

impl Did {
    /// Parse `did:<method>:<identifier>`
    pub fn parse(did: &str) -> Result<Self> {
        let caps = DID_RE
            .captures(did)
            .ok_or_else(|| ParseError::MalformedDid(did.to_string()))?;
        Ok(Self {
            method: caps["method"].to_string(),
            identifier: caps["identifier"].to_string(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", DID_PREFIX, self.method, self.identifier)
    }
}

impl std::str::FromStr for Did {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

/// A human-readable, dot-separated account name, e.g. `alice.bsky.social`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Either a handle or a DID. The `did:` prefix decides which.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Handle(Handle),
    Did(Did),
}

impl Identifier {
    pub fn parse(s: &str) -> Result<Self> {
        if s.starts_with(DID_PREFIX) {
            Did::parse(s).map(Identifier::Did)
        } else {
            Ok(Identifier::Handle(Handle::new(s)))
        }
    }

    pub fn as_did(&self) -> Option<&Did> {
        match self {
            Identifier::Did(did) => Some(did),
            Identifier::Handle(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Handle(handle) => write!(f, "{}", handle),
            Identifier::Did(did) => write!(f, "{}", did),
        }
    }
}

impl From<Did> for Identifier {
    fn from(did: Did) -> Self {
        Identifier::Did(did)
    }
}

impl From<Handle> for Identifier {
    fn from(handle: Handle) -> Self {
        Identifier::Handle(handle)
    }
}

//! AT Protocol Identity Resolver
//!
//! Resolves AT Protocol identities (handles to DIDs and vice versa) and
//! locates the PDS hosting each identity. Handle resolution tries, in order,
//! `com.atproto.identity.resolveHandle`, the `/.well-known/atproto-did`
//! document, and an optional DNS-backed resolve proxy.

mod cache;
mod config;
mod directory;
mod error;
mod http;
mod normalize;
mod resolver;
mod steps;
mod types;

#[cfg(test)]
mod test_support;

pub use cache::CachingResolver;
pub use config::{base_url, parse_url, strip_scheme, ClientConfig};
pub use directory::DirectoryClient;
pub use error::{IdentityError, Result};
pub use http::build_client;
pub use normalize::normalize;
pub use resolver::IdentityResolver;
pub use steps::{HandleResolutionStep, ResolveProxy, StepOutcome, WellKnownDid, XrpcResolveHandle};
pub use types::{DidDocument, DidService, ResolveResult};

pub use at_uri_parser::{AtUri, Did, Handle, Identifier};

//! AT Protocol Repo Client
//!
//! Fetches records and blobs from the PDS hosting an identity, decodes
//! profile and post records, and builds web app and image CDN links.

pub mod client;
pub mod error;
pub mod types;
pub mod urls;

#[cfg(test)]
mod test_support;

pub use client::{PostTarget, RepoClient};
pub use error::{RepoError, Result};
pub use types::{
    BlobHandle, BlobRef, PostRecord, ProfileRecord, Record, RecordPage, RepoDescription,
    ServerDescription, POST_COLLECTION, PROFILE_COLLECTION,
};

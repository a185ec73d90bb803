use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::error::Result;
use crate::resolver::IdentityResolver;
use crate::types::ResolveResult;

const CACHE_TTL_SECS: u64 = 300; // 5 minutes
const CACHE_CAPACITY: u64 = 10_000;

/// [`IdentityResolver`] with a moka cache in front of [`IdentityResolver::resolve`].
///
/// Results are keyed by the normalized input and the DID. A handle key only
/// ever holds a result that came from resolving that handle; the alias a DID
/// document claims for itself is never used as a key.
pub struct CachingResolver {
    inner: Arc<IdentityResolver>,
    cache: Cache<String, ResolveResult>,
}

impl CachingResolver {
    pub fn new(inner: Arc<IdentityResolver>) -> Self {
        Self::with_ttl(inner, Duration::from_secs(CACHE_TTL_SECS))
    }

    pub fn with_ttl(inner: Arc<IdentityResolver>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    pub fn inner(&self) -> &IdentityResolver {
        &self.inner
    }

    pub async fn resolve(&self, raw: &str) -> Result<ResolveResult> {
        let key = self.inner.config().normalize(raw);

        // Check cache
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let result = self.inner.resolve(raw).await?;

        let did_key = result.did.to_string();
        if did_key != key {
            self.cache.insert(did_key, result.clone()).await;
        }
        self.cache.insert(key, result.clone()).await;

        Ok(result)
    }

    /// Drop the cached entry for `raw` along with the DID and handle keys of
    /// the result it held
    pub async fn invalidate(&self, raw: &str) {
        let key = self.inner.config().normalize(raw);
        if let Some(cached) = self.cache.get(&key).await {
            self.cache.invalidate(&cached.did.to_string()).await;
            if let Some(ref handle) = cached.handle {
                self.cache.invalidate(handle.as_str()).await;
            }
        }
        self.cache.invalidate(&key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::directory::DirectoryClient;
    use crate::steps::{HandleResolutionStep, XrpcResolveHandle};
    use crate::test_support::{counting, spawn_server};
    use axum::extract::Path;
    use axum::routing::get;
    use axum::{Json, Router};
    use reqwest::Client;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let (lookups, route) = counting(|| async {
            Json(json!({
                "id": "did:plc:abc123",
                "alsoKnownAs": ["at://alice.bsky.social"],
                "service": []
            }))
        });
        let base = spawn_server(Router::new().route("/{did}", route)).await;
        let inner = IdentityResolver::with_steps(
            Arc::new(ClientConfig::default()),
            DirectoryClient::new(Client::new(), &base),
            vec![],
        );
        let resolver = CachingResolver::new(Arc::new(inner));

        let first = resolver.resolve("did:plc:abc123").await.unwrap();
        let second = resolver.resolve("at://did:plc:abc123").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.handle.unwrap().as_str(), "alice.bsky.social");
        assert_eq!(lookups.load(Ordering::SeqCst), 1);

        // The claimed alias does not answer a handle lookup
        assert!(resolver.resolve("@alice").await.is_err());
        assert!(resolver.cache.get("alice.bsky.social").await.is_none());

        resolver.invalidate("did:plc:abc123").await;
        resolver.resolve("did:plc:abc123").await.unwrap();
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    /// Handle resolution maps alice to did:plc:alice, while did:plc:mallory
    /// publishes a document claiming alice's handle.
    async fn spoofed_alias_resolver() -> CachingResolver {
        let router = Router::new()
            .route(
                "/xrpc/com.atproto.identity.resolveHandle",
                get(|| async { Json(json!({ "did": "did:plc:alice" })) }),
            )
            .route(
                "/{did}",
                get(|Path(did): Path<String>| async move {
                    Json(json!({
                        "id": did,
                        "alsoKnownAs": ["at://alice.bsky.social"],
                        "service": []
                    }))
                }),
            );
        let base = spawn_server(router).await;
        let client = Client::new();
        let steps: Vec<Box<dyn HandleResolutionStep>> =
            vec![Box::new(XrpcResolveHandle::new(client.clone(), &base))];
        let inner = IdentityResolver::with_steps(
            Arc::new(ClientConfig::default()),
            DirectoryClient::new(client, &base),
            steps,
        );
        CachingResolver::new(Arc::new(inner))
    }

    #[tokio::test]
    async fn test_claimed_alias_does_not_poison_handle_key() {
        let resolver = spoofed_alias_resolver().await;

        let mallory = resolver.resolve("did:plc:mallory").await.unwrap();
        assert_eq!(mallory.handle.unwrap().as_str(), "alice.bsky.social");

        let alice = resolver.resolve("alice.bsky.social").await.unwrap();
        assert_eq!(alice.did.to_string(), "did:plc:alice");
        assert_eq!(
            resolver.resolve("@alice").await.unwrap().did.to_string(),
            "did:plc:alice"
        );
    }

    #[tokio::test]
    async fn test_invalidate_drops_every_key() {
        let resolver = spoofed_alias_resolver().await;

        let alice = resolver.resolve("alice.bsky.social").await.unwrap();
        assert_eq!(alice.did.to_string(), "did:plc:alice");
        assert!(resolver.cache.get("alice.bsky.social").await.is_some());
        assert!(resolver.cache.get("did:plc:alice").await.is_some());

        resolver.invalidate("@alice").await;
        assert!(resolver.cache.get("alice.bsky.social").await.is_none());
        assert!(resolver.cache.get("did:plc:alice").await.is_none());
    }
}

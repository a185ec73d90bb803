//! In-process HTTP servers for tests

use std::sync::Arc;

use atproto_identity::{ClientConfig, DirectoryClient, IdentityResolver};
use axum::Router;

/// Serve `router` on an ephemeral local port and return its base URL
pub(crate) async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Resolver whose directory lives at `directory_url` and which has no
/// handle resolution steps
pub(crate) fn resolver_with_directory(
    config: Arc<ClientConfig>,
    directory_url: &str,
) -> IdentityResolver {
    let directory = DirectoryClient::new(reqwest::Client::new(), directory_url);
    IdentityResolver::with_steps(config, directory, vec![])
}

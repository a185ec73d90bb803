//! In-process HTTP servers for tests

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::{get, MethodRouter};
use axum::Router;

pub(crate) type Counter = Arc<AtomicUsize>;

/// Serve `router` on an ephemeral local port and return its base URL
pub(crate) async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// GET route that counts how often it is hit
pub(crate) fn counting<F, Fut, R>(handler: F) -> (Counter, MethodRouter)
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
{
    let counter: Counter = Arc::new(AtomicUsize::new(0));
    let hits = counter.clone();
    let route = get(move || {
        let hits = hits.clone();
        let handler = handler.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            handler().await.into_response()
        }
    });
    (counter, route)
}

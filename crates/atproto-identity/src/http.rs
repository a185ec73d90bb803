use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::{IdentityError, Result};

const USER_AGENT: &str = "atproto-identity-rs/0.1";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the shared HTTP client
pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| IdentityError::Config(format!("Failed to create HTTP client: {e}")))
}

/// GET `url`, mapping transport failures and non-success statuses to errors
/// tagged with the operation and target.
pub(crate) async fn get_success(
    client: &Client,
    operation: &'static str,
    target: &str,
    url: &str,
) -> Result<Response> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| IdentityError::Transport {
            operation,
            target: target.to_string(),
            source: Box::new(e),
        })?;

    if !response.status().is_success() {
        return Err(IdentityError::Status {
            operation,
            target: target.to_string(),
            status: response.status().as_u16(),
        });
    }

    Ok(response)
}

/// Read a response body as bytes, tagging failures like [`get_success`]
pub(crate) async fn read_body(
    response: Response,
    operation: &'static str,
    target: &str,
) -> Result<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| IdentityError::Transport {
            operation,
            target: target.to_string(),
            source: Box::new(e),
        })
}

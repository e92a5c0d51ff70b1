//! Shared HTTP plumbing for the REST clients.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::{debug, warn};

use crate::error::Result;

/// Header Jira requires on multipart uploads to skip its XSRF check.
pub const ATLASSIAN_TOKEN_HEADER: &str = "X-Atlassian-Token";

/// Build a client with a hard per-request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let builder = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("attmig/", env!("CARGO_PKG_VERSION")));
    // Unit tests talk to loopback stubs.
    #[cfg(test)]
    let builder = builder.no_proxy();
    Ok(builder.build()?)
}

/// Read a response body for error reporting, never failing.
pub async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}

/// Perform an authenticated identity check.
///
/// Returns `Ok(false)` for any non-success status and logs the body; only
/// transport faults are errors.
pub async fn check_identity(
    client: &reqwest::Client,
    url: &str,
    auth: &str,
    system: &str,
) -> Result<bool> {
    debug!(%url, system, "Validating connection");

    let response = client
        .get(url)
        .header(AUTHORIZATION, auth)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(true);
    }

    let body = error_body(response).await;
    warn!(system, status = status.as_u16(), %body, "Identity check rejected");
    Ok(false)
}

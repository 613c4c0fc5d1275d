use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::ExtractError;

/// Send a JSON request and decode a JSON response, mapping every failure
/// onto [`ExtractError`] tagged with `provider`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &'static str,
) -> Result<T, ExtractError> {
    let response = request
        .send()
        .await
        .map_err(|source| ExtractError::Request { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ExtractError::Status { provider, status, body });
    }

    let raw = response
        .bytes()
        .await
        .map_err(|source| ExtractError::Request { provider, source })?;

    serde_json::from_slice(&raw).map_err(|source| {
        tracing::error!(provider, raw_response = %String::from_utf8_lossy(&raw), "failed to decode response");
        ExtractError::Decode { provider, source }
    })
}

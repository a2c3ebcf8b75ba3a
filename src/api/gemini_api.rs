use crate::error::ScannerError;
use crate::types::gemini::{GenerateContentRequest, GeminiResponse};
use tracing::{debug, error};
use url::Url;

pub struct GeminiApi;

impl GeminiApi {
    /// `{base}/v1beta/models/{model}:generateContent`
    pub fn generate_url(base: &Url, model: &str) -> Result<Url, ScannerError> {
        Ok(base.join(&format!("v1beta/models/{model}:generateContent"))?)
    }

    /// Single generateContent call. No retry: a failed call is reported as is.
    pub async fn generate_content(
        client: &reqwest::Client,
        url: Url,
        api_key: &str,
        body: &GenerateContentRequest,
    ) -> Result<GeminiResponse, ScannerError> {
        let resp = client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let bytes = resp.bytes().await?;
            error!("Gemini generateContent returned {}", status);
            return Err(ScannerError::from_upstream(status, &bytes));
        }

        let bytes = resp.bytes().await?;
        debug!(len = bytes.len(), "Gemini generateContent response received");
        serde_json::from_slice::<GeminiResponse>(&bytes)
            .map_err(|e| ScannerError::MalformedOutput(format!("unexpected response body: {e}")))
    }
}

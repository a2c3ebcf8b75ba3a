use base64::Engine;
use chrono::Local;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::api::gemini_api::GeminiApi;
use crate::config::Config;
use crate::error::ScannerError;
use crate::types::gemini::{GenerateContentRequest, Part};
use crate::types::receipt::{ExtractionOutcome, ReceiptRecord, parse_model_reply};

/// Instruction sent alongside every receipt image.
pub const EXTRACTION_PROMPT: &str = "You are a data extraction assistant. Analyze the image of the receipt provided. Extract the following information and return it ONLY in JSON format:

store_name (String)
date (DD-MM-YYYY format)
total_amount (Number)
currency (Symbol like $, ৳, etc.)
category (Guess based on items e.g., Food, Electronics, Travel)
items (Array of objects with 'item_name' and 'price')

If any field is blurry or missing, use 'null'. Do not add any markdown formatting.";

/// One uploaded receipt image.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: Option<String>,
}

/// Credentials and target of the vision model.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
}

/// Turns an image into a [`ReceiptRecord`], or the demo record when unconfigured.
#[derive(Clone)]
pub struct ExtractionGateway {
    client: reqwest::Client,
    gemini: Option<GeminiSettings>,
    demo_delay: Duration,
}

impl ExtractionGateway {
    pub fn new(client: reqwest::Client, gemini: Option<GeminiSettings>, demo_delay: Duration) -> Self {
        Self {
            client,
            gemini,
            demo_delay,
        }
    }

    pub fn from_config(client: reqwest::Client, cfg: &Config) -> Self {
        let gemini = cfg.gemini_api_key().map(|key| GeminiSettings {
            api_key: key.to_string(),
            model: cfg.gemini_model.clone(),
            base_url: cfg.gemini_base_url.clone(),
        });
        if gemini.is_none() {
            warn!("GEMINI_API_KEY not set; scans will return the demo record");
        }
        Self::new(client, gemini, cfg.demo_delay())
    }

    pub fn demo_mode(&self) -> bool {
        self.gemini.is_none()
    }

    pub async fn extract(&self, image: &ImageUpload) -> Result<ReceiptRecord, ScannerError> {
        let Some(gemini) = self.gemini.as_ref() else {
            info!(delay_ms = self.demo_delay.as_millis() as u64, "demo mode: returning mock data");
            tokio::time::sleep(self.demo_delay).await;
            return Ok(ReceiptRecord::demo(Local::now().date_naive()));
        };

        let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let body = GenerateContentRequest::user(vec![
            Part::text(EXTRACTION_PROMPT),
            Part::inline(image.mime_type.clone(), encoded),
        ]);
        let url = GeminiApi::generate_url(&gemini.base_url, &gemini.model)?;

        info!(
            model = %gemini.model,
            mime_type = %image.mime_type,
            size = image.bytes.len(),
            "sending receipt to Gemini"
        );
        let response = GeminiApi::generate_content(&self.client, url, &gemini.api_key, &body).await?;

        let Some(text) = response.text() else {
            return Err(ScannerError::MalformedOutput(format!(
                "no text in reply (finish reason {:?})",
                response.finish_reason()
            )));
        };

        match parse_model_reply(&text) {
            ExtractionOutcome::Parsed(record) => Ok(record),
            ExtractionOutcome::Malformed { reason } => Err(ScannerError::MalformedOutput(reason)),
        }
    }
}

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment keys read on top of the defaults (matched case-insensitively).
const ENV_KEYS: &[&str] = &[
    "listen_addr",
    "loglevel",
    "proxy",
    "gemini_api_key",
    "gemini_model",
    "gemini_base_url",
    "demo_delay_ms",
    "database_url",
    "local_store_dir",
    "max_upload_bytes",
];

/// Runtime configuration, resolved once at startup and handed to `ScannerState::build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub loglevel: String,
    pub proxy: Option<Url>,

    /// Absent or blank switches the gateway into demo mode.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: Url,
    pub demo_delay_ms: u64,

    /// Cloud collection backend. Absent means local-only mode.
    pub database_url: Option<String>,
    pub local_store_dir: PathBuf,

    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            proxy: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: Url::parse(DEFAULT_GEMINI_BASE_URL)
                .expect("default Gemini base URL is valid"),
            demo_delay_ms: 2000,
            database_url: None,
            local_store_dir: PathBuf::from("./data"),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Layer process environment variables over the defaults.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn demo_delay(&self) -> Duration {
        Duration::from_millis(self.demo_delay_ms)
    }

    pub fn demo_mode(&self) -> bool {
        self.gemini_api_key().is_none()
    }
}

use serde::Deserialize;

fn default_database_url() -> String {
    "postgres://postgres:postgres@db:5432/coupons?sslmode=disable".into()
}

fn default_message_broker_url() -> String {
    "kafka:9092".into()
}

fn default_directions_api_base() -> String {
    "https://maps.googleapis.com".into()
}

fn default_ocr_lang() -> String {
    "ukr".into()
}

fn default_deferred_recognition() -> bool {
    true
}

/// Environment-driven settings shared by both services.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_message_broker_url")]
    pub message_broker_url: String,
    #[serde(default)]
    pub directions_api_key: String,
    #[serde(default = "default_directions_api_base")]
    pub directions_api_base: String,
    /// Tesseract language pack used for photographed tickets.
    #[serde(default = "default_ocr_lang")]
    pub ocr_lang: String,
    /// When false, image uploads are recognized inline instead of being
    /// handed to the recognition worker.
    #[serde(default = "default_deferred_recognition")]
    pub deferred_recognition: bool,
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()
    }
}

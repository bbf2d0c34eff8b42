use serde::Deserialize;

/// File consulted when `ENV` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "dev.ini";

/// Prefix of environment variables overriding the file, e.g.
/// `ANALYZER__STORE__HOST`.
pub const ENV_PREFIX: &str = "ANALYZER";

fn default_store_host() -> String {
    "localhost".into()
}

fn default_store_port() -> u16 {
    5432
}

fn default_region() -> String {
    "us-east-1".into()
}

fn default_model_id() -> String {
    "amazon.nova-lite-v1:0".into()
}

fn default_max_new_tokens() -> u32 {
    1000
}

fn default_brokers() -> String {
    "kafka:9092".into()
}

fn default_topic() -> String {
    "report-analysis".into()
}

fn default_group_id() -> String {
    "report-analyzer".into()
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_window_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

/// Connection parameters of the relational store holding the reports.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    #[serde(default = "default_store_host")]
    pub host: String,
    #[serde(default = "default_store_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub ssl_mode: SslMode,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            host: default_store_host(),
            port: default_store_port(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            ssl_mode: SslMode::default(),
        }
    }
}

/// Model endpoint, model id and credentials. Either `api_key` or the
/// access key pair has to be present.
#[derive(Debug, Deserialize, Clone)]
pub struct InferenceSettings {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Overrides the regional runtime endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            region: default_region(),
            model_id: default_model_id(),
            endpoint: None,
            api_key: None,
            access_key_id: None,
            secret_access_key: None,
            max_new_tokens: default_max_new_tokens(),
        }
    }
}

impl InferenceSettings {
    /// Base URL requests are sent to.
    pub fn endpoint_url(&self) -> String {
        match self.endpoint.as_deref() {
            Some(e) if !e.trim().is_empty() => e.trim_end_matches('/').to_string(),
            _ => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueSettings {
    #[serde(default = "default_brokers")]
    pub brokers: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic: default_topic(),
            group_id: default_group_id(),
            batch_size: default_batch_size(),
            batch_window_ms: default_batch_window_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub queue: QueueSettings,
}

impl Settings {
    /// Load the file named by `ENV` (falling back to [`DEFAULT_CONFIG_FILE`])
    /// and overlay `ANALYZER__*` environment variables.
    pub fn new() -> Result<Self, config::ConfigError> {
        let file = std::env::var("ENV").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        Self::from_file(&file)
    }

    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub env: Environment,
    pub log_level: String,
    /// Directory backing the local key/value store (cart, last order).
    pub data_dir: PathBuf,
    pub branch_id: u64,
    pub pricing_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("branch_id", &self.branch_id)
            .field("pricing_path", &self.pricing_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}

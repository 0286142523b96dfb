use std::net::SocketAddr;

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

/// Which chat-completions backend serves the secondary discovery branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryLlm {
    OpenAi,
    OpenRouter,
}

impl std::fmt::Display for SecondaryLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecondaryLlm::OpenAi => write!(f, "openai"),
            SecondaryLlm::OpenRouter => write!(f, "openrouter"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub access_password: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub youtube_api_key: String,
    pub youtube_max_results: u32,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub secondary_llm: SecondaryLlm,
    /// Key for whichever backend `secondary_llm` selects.
    pub secondary_api_key: String,
    pub secondary_model: String,
    pub provider_timeout_secs: u64,
    pub discovery_branch_timeout_secs: u64,
    pub provider_max_retries: u32,
    pub provider_backoff_base_ms: u64,
    pub user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("access_password", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("youtube_api_key", &"[redacted]")
            .field("youtube_max_results", &self.youtube_max_results)
            .field("gemini_api_key", &"[redacted]")
            .field("gemini_model", &self.gemini_model)
            .field("secondary_llm", &self.secondary_llm)
            .field("secondary_api_key", &"[redacted]")
            .field("secondary_model", &self.secondary_model)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field(
                "discovery_branch_timeout_secs",
                &self.discovery_branch_timeout_secs,
            )
            .field("provider_max_retries", &self.provider_max_retries)
            .field("provider_backoff_base_ms", &self.provider_backoff_base_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

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

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of the external transcription service. `None` disables
    /// every transcription run without preventing startup.
    pub ai_service_url: Option<String>,
    pub ai_service_timeout_secs: u64,
    pub transcription_submit_cron: String,
    pub transcription_status_cron: String,
    pub scheduler_job_timeout_secs: u64,
    pub transcription_ledger_ttl_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("redis_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("ai_service_url", &self.ai_service_url)
            .field("ai_service_timeout_secs", &self.ai_service_timeout_secs)
            .field("transcription_submit_cron", &self.transcription_submit_cron)
            .field("transcription_status_cron", &self.transcription_status_cron)
            .field(
                "scheduler_job_timeout_secs",
                &self.scheduler_job_timeout_secs,
            )
            .field(
                "transcription_ledger_ttl_secs",
                &self.transcription_ledger_ttl_secs,
            )
            .finish()
    }
}

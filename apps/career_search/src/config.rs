use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub azure_openai_endpoint: String,
    pub azure_openai_key: String,
    pub azure_openai_deployment: String,
    pub azure_openai_api_version: String,
    pub jooble_host: String,
    pub jooble_api_key: String,
    pub serper_api_key: String,
    pub serper_url: String,
    pub agents_config: String,
    pub tasks_config: String,
    /// Directory holding extracted resume text, one `{upload name}.txt` per upload.
    pub resume_dir: String,
    pub default_resume: String,
    /// When set, the web form reads this canned result instead of running the crew.
    pub sample_result_path: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub log_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            azure_openai_endpoint: require_env("AZURE_OPENAI_ENDPOINT")?,
            azure_openai_key: require_env("AZURE_OPENAI_KEY")?,
            azure_openai_deployment: env_or("AZURE_OPENAI_DEPLOYMENT", "gpt-4"),
            azure_openai_api_version: env_or("AZURE_OPENAI_API_VERSION", "2023-12-01-preview"),
            jooble_host: require_env("JOOBLE_HOST")?,
            jooble_api_key: require_env("JOOBLE_API_KEY")?,
            serper_api_key: require_env("SERPER_API_KEY")?,
            serper_url: env_or("SERPER_URL", "https://google.serper.dev/search"),
            agents_config: env_or("AGENTS_CONFIG", "configs/agents.yml"),
            tasks_config: env_or("TASKS_CONFIG", "configs/tasks.yml"),
            resume_dir: env_or("RESUME_DIR", "data/resumes"),
            default_resume: env_or("DEFAULT_RESUME", "data/sample_resume.txt"),
            sample_result_path: std::env::var("SAMPLE_RESULT_PATH")
                .ok()
                .filter(|v| !v.is_empty()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            log_file: std::env::var("LOG_FILE").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        azure_openai_endpoint: "http://127.0.0.1:1".to_string(),
        azure_openai_key: "test-key".to_string(),
        azure_openai_deployment: "gpt-4".to_string(),
        azure_openai_api_version: "2023-12-01-preview".to_string(),
        jooble_host: "127.0.0.1:1".to_string(),
        jooble_api_key: "jooble-key".to_string(),
        serper_api_key: "serper-key".to_string(),
        serper_url: "http://127.0.0.1:1/search".to_string(),
        agents_config: "configs/agents.yml".to_string(),
        tasks_config: "configs/tasks.yml".to_string(),
        resume_dir: "data/resumes".to_string(),
        default_resume: "data/sample_resume.txt".to_string(),
        sample_result_path: None,
        port: 5000,
        rust_log: "info".to_string(),
        log_file: None,
    }
}

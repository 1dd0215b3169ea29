// src/config/mod.rs
// All tunables come from the environment (.env supported); every key has a default.

use once_cell::sync::Lazy;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct TetherConfig {
    // ── Server
    pub host: String,
    pub port: u16,
    pub request_timeout: u64,
    pub cors_origin: String,

    // ── Database
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── LLM backend selection: "anthropic" or "ollama"
    pub completion_backend: String,

    // ── Anthropic
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub anthropic_max_tokens: u32,
    pub anthropic_temperature: f32,

    // ── Ollama
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub ollama_num_predict: u32,

    // ── Voice transcription (Whisper)
    pub openai_api_key: String,
    pub transcription_model: String,

    // ── Assistant
    pub history_window: i64,
    pub history_default_limit: i64,
    pub history_max_limit: i64,

    // ── Breakdown generation quota
    // Single source of truth: the limiter enforces this value and the
    // usage endpoint reports remaining against the same value.
    pub daily_generation_limit: i64,

    // ── Logging
    pub log_level: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            match clean.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl TetherConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            host: env_var_or("TETHER_HOST", "0.0.0.0".to_string()),
            port: env_var_or("TETHER_PORT", 8000),
            request_timeout: env_var_or("TETHER_REQUEST_TIMEOUT", 120),
            cors_origin: env_var_or("TETHER_CORS_ORIGIN", "http://localhost:3000".to_string()),
            database_url: env_var_or("DATABASE_URL", "sqlite:./tether.db".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 5),
            completion_backend: env_var_or("TETHER_COMPLETION_BACKEND", "anthropic".to_string()),
            anthropic_api_key: env_var_or("ANTHROPIC_API_KEY", String::new()),
            anthropic_model: env_var_or(
                "TETHER_ANTHROPIC_MODEL",
                "claude-3-haiku-20240307".to_string(),
            ),
            anthropic_max_tokens: env_var_or("TETHER_ANTHROPIC_MAX_TOKENS", 1000),
            anthropic_temperature: env_var_or("TETHER_ANTHROPIC_TEMPERATURE", 0.5),
            ollama_base_url: env_var_or(
                "TETHER_OLLAMA_BASE_URL",
                "http://localhost:11434".to_string(),
            ),
            ollama_model: env_var_or("TETHER_OLLAMA_MODEL", "llama2".to_string()),
            ollama_num_predict: env_var_or("TETHER_OLLAMA_NUM_PREDICT", 1000),
            openai_api_key: env_var_or("OPENAI_API_KEY", String::new()),
            transcription_model: env_var_or("TETHER_TRANSCRIPTION_MODEL", "whisper-1".to_string()),
            history_window: env_var_or("TETHER_HISTORY_WINDOW", 5),
            history_default_limit: env_var_or("TETHER_HISTORY_DEFAULT_LIMIT", 10),
            history_max_limit: env_var_or("TETHER_HISTORY_MAX_LIMIT", 100),
            daily_generation_limit: env_var_or("TETHER_DAILY_GENERATION_LIMIT", 10),
            log_level: env_var_or("TETHER_LOG_LEVEL", "info".to_string()),
        }
    }
}

pub static CONFIG: Lazy<TetherConfig> = Lazy::new(TetherConfig::from_env);

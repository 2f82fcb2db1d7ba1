// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub ai_api_key: String,
    pub ai_api_base: String,
    pub ai_model: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let ai_api_key = env::var("AI_API_KEY")
            .expect("AI_API_KEY must be set");

        let ai_api_base = env::var("AI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let ai_model = env::var("AI_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            ai_api_key,
            ai_api_base,
            ai_model,
            rust_log,
        }
    }
}

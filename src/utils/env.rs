// src/utils/env.rs

use log::{debug, info};
use std::env;
use std::str::FromStr;

/// Loads `.env` from the working directory (or a parent) if one exists.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}

/// Parses an env var, falling back to `default` when unset or unparsable.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Non-empty, trimmed env var.
pub fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

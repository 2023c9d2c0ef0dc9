use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub motor_count: i32,
    pub sample_retention: i64,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let database_url = env::var("MOTOR_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("MOTOR_DATABASE_URL or DATABASE_URL is required")?;
        let database_url = normalize_database_url(database_url);

        let motor_count = env_u64("MOTOR_COUNT", 4).clamp(1, 1_000) as i32;
        let sample_retention = env_u64("MOTOR_SAMPLE_RETENTION", 300).max(1) as i64;

        Ok(Self {
            database_url,
            motor_count,
            sample_retention,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg://") {
        return format!("postgresql://{stripped}");
    }
    if let Some(stripped) = url.strip_prefix("postgresql+asyncpg://") {
        return format!("postgresql://{stripped}");
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_python_driver_urls() {
        assert_eq!(
            normalize_database_url("postgresql+asyncpg://u@h/db".to_string()),
            "postgresql://u@h/db"
        );
        assert_eq!(
            normalize_database_url("postgresql+psycopg://u@h/db".to_string()),
            "postgresql://u@h/db"
        );
        assert_eq!(
            normalize_database_url("postgresql://u@h/db".to_string()),
            "postgresql://u@h/db"
        );
    }
}

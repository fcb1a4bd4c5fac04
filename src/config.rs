use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

/// Source of configuration values, normally the process environment.
type Vars<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn required(vars: Vars, key: &str) -> Result<String> {
    vars(key).with_context(|| format!("{key} must be set"))
}

fn or_default(vars: Vars, key: &str, default: &str) -> String {
    vars(key).unwrap_or_else(|| default.to_string())
}

fn parsed_or<T>(vars: Vars, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match vars(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

/// Connection settings. Tools that only touch the database load just this.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_vars(&process_env)
    }

    fn from_vars(vars: Vars) -> Result<Self> {
        Ok(Self {
            url: required(vars, "DATABASE_URL")?,
            max_connections: parsed_or(vars, "DB_MAX_CONNECTIONS", 10)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub jwt_secret: String,
    pub server_addr: String,
    /// Seconds.
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_vars(&process_env)
    }

    fn from_vars(vars: Vars) -> Result<Self> {
        Ok(Self {
            server_addr: required(vars, "SERVER_ADDR")?,
            database: DatabaseConfig::from_vars(vars)?,
            jwt_secret: required(vars, "JWT_SECRET")?,
            access_token_ttl: parsed_or(vars, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed_or(vars, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed_or(vars, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parsed_or(vars, "RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parsed_or(vars, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed_or(vars, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: or_default(vars, "API_PREFIX", "/api"),

            upload_dir: or_default(vars, "UPLOAD_DIR", "uploads"),
            max_upload_bytes: parsed_or(vars, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            log_dir: or_default(vars, "LOG_DIR", "logs"),
        })
    }

    #[cfg(test)]
    pub fn for_tests(upload_dir: &std::path::Path) -> Self {
        Self {
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
            },
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            upload_dir: upload_dir.display().to_string(),
            max_upload_bytes: 1024 * 1024,
            log_dir: "logs".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn database_settings_need_only_the_url() {
        let db = DatabaseConfig::from_vars(&vars(&[("DATABASE_URL", "mysql://localhost/wms")]))
            .unwrap();
        assert_eq!(db.url, "mysql://localhost/wms");
        assert_eq!(db.max_connections, 10);

        assert!(DatabaseConfig::from_vars(&vars(&[])).is_err());
        assert!(
            DatabaseConfig::from_vars(&vars(&[
                ("DATABASE_URL", "mysql://localhost/wms"),
                ("DB_MAX_CONNECTIONS", "many"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn server_settings_require_address_and_secret() {
        let db_only = vars(&[("DATABASE_URL", "mysql://localhost/wms")]);
        assert!(Config::from_vars(&db_only).is_err());

        let full = vars(&[
            ("DATABASE_URL", "mysql://localhost/wms"),
            ("SERVER_ADDR", "0.0.0.0:8080"),
            ("JWT_SECRET", "s3cret"),
            ("MAX_UPLOAD_BYTES", "2048"),
        ]);
        let config = Config::from_vars(&full).unwrap();
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(config.access_token_ttl, 900);
    }
}

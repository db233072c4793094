use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// PostgreSQL connection URL. Without it the in-memory store is used.
    #[serde(default)]
    pub postgres_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Token lifetimes, signing secret and admin grants
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    /// Users logging in with one of these ids receive the admin claim
    pub admin_user_ids: Vec<i64>,
    /// Interval between purges of expired revocations
    pub revocation_sweep_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 30 * 24 * 3600,
            admin_user_ids: vec![1],
            revocation_sweep_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?;
        config.apply_env_overrides();
        anyhow::ensure!(
            !config.auth.jwt_secret.is_empty(),
            "auth.jwt_secret is empty; set it in {} or via JWT_SECRET",
            config_path
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// `JWT_SECRET` and `DATABASE_URL` win over the file
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = secret;
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.postgres_url = Some(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: api.log
use_json: false
rotation: never
gateway:
  host: 127.0.0.1
  port: 5000
"#;

    #[test]
    fn test_auth_section_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.gateway.port, 5000);
        assert_eq!(config.auth.access_ttl_secs, 900);
        assert_eq!(config.auth.admin_user_ids, vec![1]);
        assert!(config.postgres_url.is_none());
    }

    #[test]
    fn test_auth_section_parsed() {
        let yaml = format!(
            "{}auth:\n  jwt_secret: s3cret\n  access_ttl_secs: 60\n  refresh_ttl_secs: 120\n  admin_user_ids: [7, 9]\n  revocation_sweep_secs: 5\npostgres_url: postgres://localhost/shop\n",
            MINIMAL
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.admin_user_ids, vec![7, 9]);
        assert_eq!(
            config.postgres_url.as_deref(),
            Some("postgres://localhost/shop")
        );
    }

    #[test]
    fn test_prod_grants_no_admin_by_default() {
        let config = AppConfig::from_yaml(include_str!("../config/prod.yaml")).unwrap();
        assert!(config.auth.admin_user_ids.is_empty());
        assert!(config.use_json);
    }

    #[test]
    fn test_missing_gateway_rejected() {
        assert!(AppConfig::from_yaml("log_level: info").is_err());
    }
}

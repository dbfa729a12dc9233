use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Placeholder secrets that must not unlock the dashboard.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "admin", "password"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "development" | "local" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => anyhow::bail!(
                "{} is not a valid ATELIER_ENV, use `development` or `production`",
                other
            ),
        }
    }
}

pub struct Config {
    pub admin_password: Option<String>,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub environment: Environment,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let admin_password = get("ATELIER_ADMIN_PASSWORD").filter(|p| !p.is_empty());
        let db_path = get("ATELIER_DB_PATH").unwrap_or_else(|| "atelier.db".into());
        let host = get("ATELIER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("ATELIER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("ATELIER_PORT must be a port number")?;
        let environment =
            Environment::parse(&get("ATELIER_ENV").unwrap_or_else(|| "development".into()))?;
        let base_url = get("ATELIER_BASE_URL").unwrap_or_else(|| format!("http://localhost:{}", port));

        if environment == Environment::Production
            && admin_password
                .as_deref()
                .is_some_and(|p| PLACEHOLDER_SECRETS.contains(&p))
        {
            anyhow::bail!("ATELIER_ADMIN_PASSWORD is still a placeholder");
        }

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("ATELIER_HOST/ATELIER_PORT do not form a socket address")?;

        Ok(Self {
            admin_password,
            db_path: db_path.into(),
            addr,
            environment,
            base_url,
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }
}

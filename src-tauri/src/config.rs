use crate::auth::{CredentialPair, Credentials};
use crate::error::ConfigError;

pub const DEFAULT_TOTAL_DUE: f64 = 25_000.0;
pub const DEFAULT_APP_URL: &str = "https://pug307-f22c32c21ecd.herokuapp.com/";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub recipient_phone: String,
    pub total_due: f64,
    pub app_url: String,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` from the working
    /// directory when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let total_due = match lookup("TOTAL_DUE") {
            Some(raw) => parse_total_due(&raw)?,
            None => DEFAULT_TOTAL_DUE,
        };

        Ok(Self {
            credentials: Credentials {
                admin: CredentialPair::new(
                    required("ADMIN_USERNAME")?,
                    required("ADMIN_PASSWORD")?,
                ),
                viewer: CredentialPair::new(
                    required("VIEWER_USERNAME")?,
                    required("VIEWER_PASSWORD")?,
                ),
            },
            recipient_phone: required("RECIPIENT_PHONE")?,
            total_due,
            app_url: lookup("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
        })
    }
}

fn parse_total_due(raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ConfigError::Invalid {
            name: "TOTAL_DUE",
            value: raw.to_string(),
        })
}

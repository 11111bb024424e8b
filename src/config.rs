use std::time::Duration;

use crate::models::workflow::Timeouts;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub backend_url: String,
    pub bind_addr: String,
    pub session_key: Option<String>,
    pub upload_timeout: Duration,
    pub submit_timeout: Duration,
}

impl PortalConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64| -> Duration {
            match lookup(key) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(n) if n > 0 => Duration::from_secs(n),
                    _ => {
                        log::warn!("{key}='{raw}' is not a positive number of seconds, using {default}");
                        Duration::from_secs(default)
                    }
                },
                None => Duration::from_secs(default),
            }
        };

        PortalConfig {
            backend_url: lookup("BACKEND_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            bind_addr: lookup("BIND_ADDR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            session_key: lookup("SESSION_KEY"),
            upload_timeout: secs("UPLOAD_TIMEOUT_SECS", DEFAULT_UPLOAD_TIMEOUT_SECS),
            submit_timeout: secs("SUBMIT_TIMEOUT_SECS", DEFAULT_SUBMIT_TIMEOUT_SECS),
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            upload: self.upload_timeout,
            submit: self.submit_timeout,
        }
    }
}

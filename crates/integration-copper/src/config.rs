use std::fmt;
use std::time::Duration;

use copper_config::CopperSettings;
use copper_core::CoreError;

const ENV_COPPER_API_KEY: &str = "COPPER_API_KEY";
const ENV_COPPER_USER_EMAIL: &str = "COPPER_USER_EMAIL";
const ENV_COPPER_API_URL: &str = "COPPER_API_URL";
const ENV_COPPER_LOOKUP_CACHE_TTL_SECS: &str = "COPPER_LOOKUP_CACHE_TTL_SECS";

#[derive(Clone, PartialEq, Eq)]
pub struct CopperConfig {
    pub api_url: String,
    pub web_url: String,
    pub api_key: String,
    pub user_email: String,
    pub request_timeout: Duration,
    pub lookup_cache_ttl: Duration,
}

impl fmt::Debug for CopperConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CopperConfig")
            .field("api_url", &self.api_url)
            .field("web_url", &self.web_url)
            .field("api_key", &"<redacted>")
            .field("user_email", &self.user_email)
            .field("request_timeout", &self.request_timeout)
            .field("lookup_cache_ttl", &self.lookup_cache_ttl)
            .finish()
    }
}

impl Default for CopperConfig {
    fn default() -> Self {
        Self::with_settings(&CopperSettings::default())
    }
}

impl CopperConfig {
    fn with_settings(settings: &CopperSettings) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            web_url: settings.web_url.clone(),
            api_key: String::new(),
            user_email: settings.user_email.clone().unwrap_or_default(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            lookup_cache_ttl: Duration::from_secs(settings.lookup_cache_ttl_secs),
        }
    }

    /// Defaults plus environment: `COPPER_API_KEY` and `COPPER_USER_EMAIL` are required.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_settings(&CopperSettings::default())
    }

    /// File settings layered under environment overrides.
    pub fn from_settings(settings: &CopperSettings) -> Result<Self, CoreError> {
        let mut config = Self::with_settings(settings);
        config.api_key = required_env(ENV_COPPER_API_KEY)?;

        if let Some(email) = optional_env(ENV_COPPER_USER_EMAIL) {
            config.user_email = email;
        }
        if config.user_email.is_empty() {
            return Err(CoreError::Configuration(
                "COPPER_USER_EMAIL is not set. Export the email of the API key owner or set user_email in COPPER_CONFIG."
                    .to_owned(),
            ));
        }

        if let Some(api_url) = optional_env(ENV_COPPER_API_URL) {
            config.api_url = api_url;
        }
        if let Some(raw) = optional_env(ENV_COPPER_LOOKUP_CACHE_TTL_SECS) {
            let seconds = raw.parse::<u64>().map_err(|_| {
                CoreError::Configuration(
                    "COPPER_LOOKUP_CACHE_TTL_SECS must be an unsigned integer.".to_owned(),
                )
            })?;
            config.lookup_cache_ttl = Duration::from_secs(seconds);
        }

        Ok(config)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        format!("{base}/{suffix}")
    }
}

fn required_env(name: &str) -> Result<String, CoreError> {
    let value = std::env::var(name).map_err(|_| {
        CoreError::Configuration(format!(
            "{name} is not set. Export a valid value before using integration-copper."
        ))
    })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Configuration(format!(
            "{name} is empty. Provide a non-empty value."
        )));
    }
    Ok(value.to_owned())
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

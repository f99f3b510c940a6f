use copper_core::CoreError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_COPPER_CONFIG: &str = "COPPER_CONFIG";

const HOME_VARS: [&str; 2] = ["HOME", "USERPROFILE"];

const DEFAULT_API_URL: &str = "https://api.copper.com/developer_api/v1";
const DEFAULT_WEB_URL: &str = "https://app.copper.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOOKUP_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no home directory: set HOME or USERPROFILE, or point COPPER_CONFIG at a file")]
    NoHomeDirectory,
    #[error("could not read Copper settings at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write Copper settings at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Copper settings at {path} are not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not render Copper settings: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("Copper settings at {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

impl From<ConfigError> for CoreError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

/// File-backed settings. Secrets (the API key) are never read from here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CopperSettings {
    pub api_url: String,
    pub web_url: String,
    pub request_timeout_secs: u64,
    pub lookup_cache_ttl_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl Default for CopperSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            web_url: DEFAULT_WEB_URL.to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            lookup_cache_ttl_secs: DEFAULT_LOOKUP_CACHE_TTL_SECS,
            user_email: None,
        }
    }
}

impl CopperSettings {
    /// Fills blank values with defaults. Returns whether anything changed.
    fn normalize(&mut self) -> Result<bool, String> {
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_owned());
        }

        let before = self.clone();
        if self.api_url.trim().is_empty() {
            self.api_url = DEFAULT_API_URL.to_owned();
        }
        if self.web_url.trim().is_empty() {
            self.web_url = DEFAULT_WEB_URL.to_owned();
        }
        self.user_email = self
            .user_email
            .take()
            .map(|email| email.trim().to_owned())
            .filter(|email| !email.is_empty());

        Ok(*self != before)
    }
}

/// Settings from `$COPPER_CONFIG`, or `~/.config/copper/config.toml` when unset.
pub fn load_from_env() -> Result<CopperSettings, ConfigError> {
    let path = match non_empty_var(ENV_COPPER_CONFIG) {
        Some(explicit) => PathBuf::from(explicit),
        None => default_config_path()?,
    };
    load_from_path(path)
}

/// Reads settings at `path`, writing defaults there first when the file is
/// missing. Normalized values are written back.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<CopperSettings, ConfigError> {
    let path = path.as_ref();
    let Some(raw) = read_if_present(path)? else {
        let settings = CopperSettings::default();
        write_settings(path, &settings)?;
        return Ok(settings);
    };

    let mut settings: CopperSettings =
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let changed = settings
        .normalize()
        .map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
    if changed {
        write_settings(path, &settings)?;
    }
    Ok(settings)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = HOME_VARS
        .into_iter()
        .find_map(non_empty_var)
        .ok_or(ConfigError::NoHomeDirectory)?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("copper")
        .join("config.toml"))
}

fn non_empty_var(name: &str) -> Option<OsString> {
    std::env::var_os(name).filter(|value| !value.to_string_lossy().trim().is_empty())
}

fn read_if_present(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_settings(path: &Path, settings: &CopperSettings) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(settings)?;
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, rendered).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Holds the process-wide env lock and restores overridden variables on drop.
    struct ScopedEnv {
        saved: Vec<(&'static str, Option<OsString>)>,
        _lock: MutexGuard<'static, ()>,
    }

    impl ScopedEnv {
        fn new(overrides: &[(&'static str, Option<&Path>)]) -> Self {
            static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
            let lock = LOCK
                .get_or_init(Mutex::default)
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            let saved = overrides
                .iter()
                .map(|(name, value)| {
                    let previous = std::env::var_os(name);
                    match value {
                        Some(value) => std::env::set_var(name, value),
                        None => std::env::remove_var(name),
                    }
                    (*name, previous)
                })
                .collect();
            Self { saved, _lock: lock }
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            for (name, previous) in self.saved.drain(..) {
                match previous {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }

    /// Scratch directory removed on drop.
    struct Scratch(PathBuf);

    impl Scratch {
        fn new() -> Self {
            static NEXT: AtomicUsize = AtomicUsize::new(0);
            let path = std::env::temp_dir().join(format!(
                "copper-config-test-{}-{}",
                std::process::id(),
                NEXT.fetch_add(1, Ordering::Relaxed)
            ));
            let _ = std::fs::remove_dir_all(&path);
            std::fs::create_dir_all(&path).expect("create scratch dir");
            Self(path)
        }

        fn file(&self, raw: &str) -> PathBuf {
            let path = self.0.join("config.toml");
            std::fs::write(&path, raw).expect("write settings fixture");
            path
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn missing_file_under_home_is_created_with_defaults() {
        let home = Scratch::new();
        let expected = home.0.join(".config").join("copper").join("config.toml");
        let _env = ScopedEnv::new(&[
            ("HOME", Some(home.0.as_path())),
            ("USERPROFILE", None),
            (ENV_COPPER_CONFIG, None),
        ]);

        let settings = load_from_env().expect("load defaults");
        assert_eq!(settings, CopperSettings::default());
        assert!(expected.exists());
    }

    #[test]
    fn explicit_path_wins_over_home() {
        let home = Scratch::new();
        let root = Scratch::new();
        let explicit = root.0.join("nested").join("custom.toml");
        let _env = ScopedEnv::new(&[
            ("HOME", Some(home.0.as_path())),
            ("USERPROFILE", None),
            (ENV_COPPER_CONFIG, Some(explicit.as_path())),
        ]);

        load_from_env().expect("load explicit settings");
        assert!(explicit.exists());
        assert!(!home.0.join(".config").exists());
    }

    #[test]
    fn no_home_and_no_explicit_path_is_an_error() {
        let _env = ScopedEnv::new(&[
            ("HOME", None),
            ("USERPROFILE", None),
            (ENV_COPPER_CONFIG, None),
        ]);

        let error = load_from_env().expect_err("no home");
        assert!(matches!(error, ConfigError::NoHomeDirectory));
    }

    #[test]
    fn partial_file_is_completed_with_defaults() {
        let scratch = Scratch::new();
        let path = scratch.file("lookup_cache_ttl_secs = 60\nuser_email = \"ops@example.com\"\n");

        let settings = load_from_path(&path).expect("load partial settings");
        assert_eq!(settings.lookup_cache_ttl_secs, 60);
        assert_eq!(settings.user_email.as_deref(), Some("ops@example.com"));
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn blank_values_are_normalized_and_written_back() {
        let scratch = Scratch::new();
        let path = scratch.file("api_url = \"  \"\nuser_email = \" \"\n");

        let settings = load_from_path(&path).expect("load settings");
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.user_email, None);

        let rewritten = std::fs::read_to_string(&path).expect("read rewritten settings");
        assert!(rewritten.contains(DEFAULT_API_URL));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let scratch = Scratch::new();
        let path = scratch.file("request_timeout_secs = 0\n");

        let error = load_from_path(&path).expect_err("zero timeout");
        assert!(matches!(error, ConfigError::Invalid { .. }));
        assert!(error.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn malformed_file_surfaces_as_configuration_error() {
        let scratch = Scratch::new();
        let path = scratch.file("api_url = [");

        let error = load_from_path(&path).expect_err("malformed toml");
        assert!(matches!(error, ConfigError::Parse { .. }));

        let core: CoreError = error.into();
        assert!(matches!(core, CoreError::Configuration(message) if message.contains("not valid TOML")));
    }
}

//! Configuration types and loading
//!
//! Config precedence: CLI `--config` > `CONFIG_PATH` env > `admin-console.toml`.
//! `CONSOLE_API_BASE_URL` and `CONSOLE_SUCCESS_CODE` override the file.

use console_auth::REFRESH_PATH;
use console_http::ClientConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Backend gateway settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_success_code")]
    pub success_code: i64,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_credentials_path")]
    pub path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_credentials_path(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_success_code() -> i64 {
    200
}

fn default_refresh_path() -> String {
    REFRESH_PATH.to_owned()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("admin-console-credentials.json")
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(base_url) = std::env::var("CONSOLE_API_BASE_URL") {
            config.api.base_url = base_url;
        }
        if let Ok(code) = std::env::var("CONSOLE_SUCCESS_CODE") {
            config.api.success_code = code.trim().parse().map_err(|e| {
                common::Error::Config(format!("CONSOLE_SUCCESS_CODE must be an integer: {e}"))
            })?;
        }

        if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_ms == 0 {
            return Err(common::Error::Config(
                "timeout_ms must be greater than 0".into(),
            ));
        }

        if !config.api.refresh_path.starts_with('/') {
            return Err(common::Error::Config(format!(
                "refresh_path must start with /, got: {}",
                config.api.refresh_path
            )));
        }

        Ok(config)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api.base_url.clone())
            .with_timeout(Duration::from_millis(self.api.timeout_ms))
            .with_success_code(self.api.success_code)
            .with_refresh_path(self.api.refresh_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_overrides() {
        unsafe {
            remove_env("CONSOLE_API_BASE_URL");
            remove_env("CONSOLE_SUCCESS_CODE");
        }
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("admin-console.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    const MINIMAL: &str = r#"
[api]
base_url = "https://admin.example.com/api"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&write_config(&dir, MINIMAL)).unwrap();

        assert_eq!(config.api.base_url, "https://admin.example.com/api");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.api.success_code, 200);
        assert_eq!(config.api.refresh_path, "/usercenter/auth/refresh");
        assert_eq!(
            config.credentials.path,
            PathBuf::from("admin-console-credentials.json")
        );

        let client = config.client_config();
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(client.refresh_path, "/usercenter/auth/refresh");
    }

    #[test]
    fn full_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
base_url = "http://localhost:8080"
timeout_ms = 2500
success_code = 0
refresh_path = "/auth/refresh"

[credentials]
path = "/var/lib/admin-console/credentials.json"
"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.timeout_ms, 2500);
        assert_eq!(config.api.success_code, 0);
        assert_eq!(config.api.refresh_path, "/auth/refresh");
        assert_eq!(
            config.credentials.path,
            PathBuf::from("/var/lib/admin-console/credentials.json")
        );
    }

    #[test]
    fn env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, MINIMAL);

        unsafe {
            set_env("CONSOLE_API_BASE_URL", "http://staging.internal");
            set_env("CONSOLE_SUCCESS_CODE", "0");
        }
        let config = Config::load(&path).unwrap();
        clear_overrides();

        assert_eq!(config.api.base_url, "http://staging.internal");
        assert_eq!(config.api.success_code, 0);
    }

    #[test]
    fn non_numeric_success_code_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, MINIMAL);

        unsafe { set_env("CONSOLE_SUCCESS_CODE", "ok") };
        let result = Config::load(&path);
        clear_overrides();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("CONSOLE_SUCCESS_CODE"), "got: {err}");
    }

    #[test]
    fn base_url_without_scheme_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"admin.example.com\"\n");

        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("base_url must start with http"), "got: {err}");
    }

    #[test]
    fn zero_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\nbase_url = \"https://a.example\"\ntimeout_ms = 0\n",
        );
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = Config::load(Path::new("/nonexistent/admin-console.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn invalid_toml_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }
}

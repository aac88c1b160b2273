use crate::provider::adb2c::Adb2cConfig;
use crate::provider::cognito::CognitoConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SETTINGS_FILE: &str = "Settings.toml";
const CONFIG_DIR_ENV: &str = "IDLINK_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IdlinkSettings {
    pub backend: BackendSettings,
    pub cognito: CognitoConfig,
    pub adb2c: Adb2cConfig,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Origin the `/api/...` paths are resolved against
    pub base_url: String,
    /// Overall request timeout; `None` keeps the HTTP client default
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9080".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl IdlinkSettings {
    /// Load settings from configuration files and environment variables,
    /// then initialize logging
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A settings file cannot be read or parsed
    /// - Logger initialization fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings(Path::new(SETTINGS_FILE))?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging)?;
        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `IDLINK_CONFIG_DIR` (if specified and exists)
    /// 3. Settings.toml at `default_path` (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or parsed.
    pub fn load_base_settings(default_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        if default_path.exists() {
            settings = Self::from_file(default_path)?;
            println!("✓ Loaded base settings from {}", default_path.display());
        }

        if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
            let override_path = Path::new(&config_dir).join(SETTINGS_FILE);
            if override_path.exists() {
                settings = Self::from_file(&override_path)?;
                println!("✓ Overriding settings from {}", override_path.display());
            } else {
                println!(
                    "ℹ {CONFIG_DIR_ENV} set but no {SETTINGS_FILE} found at: {}",
                    override_path.display()
                );
            }
        }

        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_backend_env_overrides(&mut settings.backend);
        Self::apply_cognito_env_overrides(&mut settings.cognito);
        Self::apply_adb2c_env_overrides(&mut settings.adb2c);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_backend_env_overrides(backend: &mut BackendSettings) {
        Self::apply_string_env_override("BACKEND_BASE_URL", &mut backend.base_url);
        if let Ok(value) = std::env::var("BACKEND_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = value.parse::<u64>() {
                backend.request_timeout_secs = Some(secs);
            }
        }
    }

    fn apply_cognito_env_overrides(cognito: &mut CognitoConfig) {
        Self::apply_string_env_override("COGNITO_REGION", &mut cognito.region);
        Self::apply_string_env_override("COGNITO_USERPOOL_ID", &mut cognito.user_pool_id);
        Self::apply_string_env_override("COGNITO_CLIENT_ID", &mut cognito.client_id);
        Self::apply_string_env_override("COGNITO_DOMAIN", &mut cognito.domain);
        Self::apply_string_env_override("COGNITO_REDIRECT_URL", &mut cognito.redirect_url);
    }

    fn apply_adb2c_env_overrides(adb2c: &mut Adb2cConfig) {
        Self::apply_string_env_override("ADB2C_TENANT", &mut adb2c.tenant);
        Self::apply_string_env_override("ADB2C_APPLICATION_ID", &mut adb2c.application_id);
        Self::apply_string_env_override("ADB2C_SIGNIN_POLICY", &mut adb2c.signin_policy);
        Self::apply_string_env_override("ADB2C_REDIRECT_URL", &mut adb2c.redirect_url);
    }

    fn apply_logging_env_overrides(logging: &mut LoggingSettings) {
        Self::apply_string_env_override("RUST_LOG", &mut logging.level);
    }

    /// Empty values are treated as unset
    fn apply_string_env_override(env_var: &str, target: &mut String) {
        if let Ok(value) = std::env::var(env_var) {
            if !value.is_empty() {
                *target = value;
            }
        }
    }

    fn initialize_logging(logging: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&logging.level))
            .try_init()?;
        Ok(())
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}

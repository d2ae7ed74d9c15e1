//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, SalesConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp Cloud API configuration
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// LLM backend configuration
    #[serde(default)]
    pub llm: LlmSettings,

    /// Sales playbook (prices, links, keyword rules, guard thresholds)
    #[serde(default)]
    pub sales: SalesConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Path of the append-only hot-lead record file
    #[serde(default = "default_lead_log_path")]
    pub lead_log_path: String,
}

fn default_lead_log_path() -> String {
    "leads.log".to_string()
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.sales.link_cooldown_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sales.link_cooldown_seconds".to_string(),
                message: "Link cooldown must be at least 1 second".to_string(),
            });
        }

        if self.sales.reply_max_chars < 10 {
            return Err(ConfigError::InvalidValue {
                field: "sales.reply_max_chars".to_string(),
                message: "Reply cap too small (minimum 10 chars)".to_string(),
            });
        }

        if self.sales.history_window == 0 || self.sales.history_window > self.sales.history_max_turns {
            return Err(ConfigError::InvalidValue {
                field: "sales.history_window".to_string(),
                message: format!(
                    "Must be between 1 and history_max_turns ({})",
                    self.sales.history_max_turns
                ),
            });
        }

        // Secrets are only mandatory in production; development can run
        // against a local mock without them.
        if self.environment.is_production() {
            if self.whatsapp.access_token.is_empty() {
                return Err(ConfigError::MissingField("whatsapp.access_token".to_string()));
            }
            if self.whatsapp.verify_token.is_empty() {
                return Err(ConfigError::MissingField("whatsapp.verify_token".to_string()));
            }
            if self.whatsapp.phone_number_id.is_empty() {
                return Err(ConfigError::MissingField("whatsapp.phone_number_id".to_string()));
            }
            if self.llm.api_key.is_none() {
                return Err(ConfigError::MissingField("llm.api_key".to_string()));
            }
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    10000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// WhatsApp Cloud API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Graph API base URL
    #[serde(default = "default_graph_base")]
    pub api_base: String,

    /// Business phone number id used in the send endpoint path
    #[serde(default)]
    pub phone_number_id: String,

    /// Bearer token for the Cloud API
    #[serde(default)]
    pub access_token: String,

    /// Shared token checked during webhook subscription verification
    #[serde(default)]
    pub verify_token: String,

    /// Phone number of the human operator that receives hand-off alerts
    #[serde(default = "default_operator_number")]
    pub operator_number: String,

    /// Request timeout in seconds
    #[serde(default = "default_whatsapp_timeout")]
    pub timeout_seconds: u64,
}

fn default_graph_base() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}
fn default_operator_number() -> String {
    "393420261950".to_string()
}
fn default_whatsapp_timeout() -> u64 {
    15
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base: default_graph_base(),
            phone_number_id: String::new(),
            access_token: String::new(),
            verify_token: String::new(),
            operator_number: default_operator_number(),
            timeout_seconds: default_whatsapp_timeout(),
        }
    }
}

/// LLM backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// OpenAI-compatible API endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// API key (required in production)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat model
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Speech-to-text model for voice notes
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_transcription_model() -> String {
    "whisper-1".to_string()
}
fn default_max_tokens() -> usize {
    256
}
fn default_temperature() -> f32 {
    0.7
}
fn default_llm_timeout() -> u64 {
    30
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_chat_model(),
            transcription_model: default_transcription_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (ZAP_AGENT__ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("ZAP_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 10000);
        assert_eq!(settings.sales.link_cooldown_seconds, 120);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_port_validation() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_history_window_validation() {
        let mut settings = Settings::default();
        settings.sales.history_window = 0;
        assert!(settings.validate().is_err());

        settings.sales.history_window = settings.sales.history_max_turns + 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_production_requires_secrets() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        assert!(settings.validate().is_err());

        settings.whatsapp.access_token = "token".to_string();
        settings.whatsapp.verify_token = "verify".to_string();
        settings.whatsapp.phone_number_id = "12345".to_string();
        settings.llm.api_key = Some("sk-test".to_string());
        assert!(settings.validate().is_ok());
    }
}

use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use mascot::auth::AuthConfig;
use mascot::providers::configs::{
    GeminiProviderConfig, OpenAiProviderConfig, PerplexityProviderConfig, ProviderConfigs,
};
use mascot::store::StoreConfig;
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Failed to parse socket address")
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub verify_url: String,
    pub api_key: String,
    #[serde(default = "default_true")]
    pub allow_decode_fallback: bool,
}

#[derive(Debug, Deserialize)]
pub struct StoreSettings {
    pub rest_url: String,
    pub service_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderKeySettings {
    #[serde(default)]
    pub host: Option<String>,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ProvidersSettings {
    pub openai: ProviderKeySettings,
    pub gemini: ProviderKeySettings,
    pub perplexity: ProviderKeySettings,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub store: StoreSettings,
    pub providers: ProvidersSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .add_source(
                Environment::with_prefix("MASCOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        // Report missing fields as the env var the operator must set
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else if let config::ConfigError::NotFound(field) = &err {
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            verify_url: self.auth.verify_url.clone(),
            api_key: self.auth.api_key.clone(),
            allow_decode_fallback: self.auth.allow_decode_fallback,
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            rest_url: self.store.rest_url.clone(),
            service_key: self.store.service_key.clone(),
        }
    }

    pub fn provider_configs(&self) -> ProviderConfigs {
        ProviderConfigs {
            openai: OpenAiProviderConfig {
                host: self
                    .providers
                    .openai
                    .host
                    .clone()
                    .unwrap_or_else(default_openai_host),
                api_key: self.providers.openai.api_key.clone(),
            },
            gemini: GeminiProviderConfig {
                host: self
                    .providers
                    .gemini
                    .host
                    .clone()
                    .unwrap_or_else(default_gemini_host),
                api_key: self.providers.gemini.api_key.clone(),
            },
            perplexity: PerplexityProviderConfig {
                host: self
                    .providers
                    .perplexity
                    .host
                    .clone()
                    .unwrap_or_else(default_perplexity_host),
                api_key: self.providers.perplexity.api_key.clone(),
            },
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_openai_host() -> String {
    "https://api.openai.com".to_string()
}

fn default_gemini_host() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_perplexity_host() -> String {
    "https://api.perplexity.ai".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("MASCOT_") {
                env::remove_var(&key);
            }
        }
    }

    fn set_required_env() {
        env::set_var("MASCOT_AUTH__VERIFY_URL", "https://id.example.com/auth/v1");
        env::set_var("MASCOT_AUTH__API_KEY", "anon-key");
        env::set_var("MASCOT_STORE__REST_URL", "https://db.example.com/rest/v1");
        env::set_var("MASCOT_STORE__SERVICE_KEY", "service-key");
        env::set_var("MASCOT_PROVIDERS__OPENAI__API_KEY", "sk-openai");
        env::set_var("MASCOT_PROVIDERS__GEMINI__API_KEY", "sk-gemini");
        env::set_var("MASCOT_PROVIDERS__PERPLEXITY__API_KEY", "sk-pplx");
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        set_required_env();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert!(settings.auth.allow_decode_fallback);

        let providers = settings.provider_configs();
        assert_eq!(providers.openai.host, "https://api.openai.com");
        assert_eq!(
            providers.gemini.host,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(providers.perplexity.host, "https://api.perplexity.ai");
        assert_eq!(providers.perplexity.api_key, "sk-pplx");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        set_required_env();
        env::set_var("MASCOT_SERVER__PORT", "8080");
        env::set_var("MASCOT_AUTH__ALLOW_DECODE_FALLBACK", "false");
        env::set_var(
            "MASCOT_PROVIDERS__OPENAI__HOST",
            "https://proxy.example.com",
        );

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.auth.allow_decode_fallback);
        assert_eq!(
            settings.provider_configs().openai.host,
            "https://proxy.example.com"
        );

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_env_var_reported() {
        clean_env();
        set_required_env();
        env::remove_var("MASCOT_PROVIDERS__GEMINI__API_KEY");
        env::remove_var("MASCOT_PROVIDERS__GEMINI__HOST");

        let err = Settings::new().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar { .. }));

        clean_env();
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        let addr = server_settings.socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }
}

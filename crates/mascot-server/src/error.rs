use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Convert a dotted settings path to the environment variable the
/// operator must set, e.g. `providers.openai.api_key` →
/// `MASCOT_PROVIDERS__OPENAI__API_KEY`.
pub fn to_env_var(field: &str) -> String {
    format!("MASCOT_{}", field.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(
            to_env_var("providers.openai.api_key"),
            "MASCOT_PROVIDERS__OPENAI__API_KEY"
        );
        assert_eq!(to_env_var("auth"), "MASCOT_AUTH");
    }
}

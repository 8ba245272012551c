use crate::routing::ProviderKind;

// Unified enum to wrap different provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
    Gemini(GeminiProviderConfig),
    Perplexity(PerplexityProviderConfig),
}

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct GeminiProviderConfig {
    pub host: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct PerplexityProviderConfig {
    pub host: String,
    pub api_key: String,
}

/// The full set of provider configurations a deployment carries. Hosts
/// are overridable so tests can point adapters at mock servers.
#[derive(Debug, Clone)]
pub struct ProviderConfigs {
    pub openai: OpenAiProviderConfig,
    pub gemini: GeminiProviderConfig,
    pub perplexity: PerplexityProviderConfig,
}

impl ProviderConfigs {
    pub fn for_kind(&self, kind: ProviderKind) -> ProviderConfig {
        match kind {
            ProviderKind::OpenAi => ProviderConfig::OpenAi(self.openai.clone()),
            ProviderKind::Gemini => ProviderConfig::Gemini(self.gemini.clone()),
            ProviderKind::Perplexity => ProviderConfig::Perplexity(self.perplexity.clone()),
        }
    }
}

use anyhow::Result;

use super::base::ProviderAdapter;
use super::configs::ProviderConfig;
use super::gemini::GeminiAdapter;
use super::openai::OpenAiAdapter;
use super::perplexity::PerplexityAdapter;

pub fn get_adapter(config: ProviderConfig) -> Result<Box<dyn ProviderAdapter + Send + Sync>> {
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Box::new(OpenAiAdapter::new(openai_config)?)),
        ProviderConfig::Gemini(gemini_config) => Ok(Box::new(GeminiAdapter::new(gemini_config)?)),
        ProviderConfig::Perplexity(perplexity_config) => {
            Ok(Box::new(PerplexityAdapter::new(perplexity_config)?))
        }
    }
}

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// A concrete upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Perplexity,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Perplexity => "perplexity",
        }
    }
}

/// The client's provider preference. `Auto` defers to the mascot's
/// task category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
    #[default]
    Auto,
    OpenAi,
    Gemini,
    Perplexity,
}

/// A resolved `(provider, model)` pair. Computed per request, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub provider: ProviderKind,
    pub model: &'static str,
}

/// Task categories that route to OpenAI when the client leaves the
/// choice to us; everything else (conversation, quick, unknown) goes
/// to Gemini.
fn provider_for_category(category: Option<&str>) -> ProviderKind {
    match category {
        Some("analysis" | "creative" | "coding" | "ux" | "complex") => ProviderKind::OpenAi,
        _ => ProviderKind::Gemini,
    }
}

/// Fixed model table: `(standard, deep thinking)` per provider.
pub fn model_for(provider: ProviderKind, deep_thinking: bool) -> &'static str {
    match (provider, deep_thinking) {
        (ProviderKind::OpenAi, false) => "gpt-4o-mini",
        (ProviderKind::OpenAi, true) => "gpt-4o",
        (ProviderKind::Gemini, false) => "gemini-2.5-flash",
        (ProviderKind::Gemini, true) => "gemini-2.5-pro",
        (ProviderKind::Perplexity, false) => "sonar",
        (ProviderKind::Perplexity, true) => "sonar-pro",
    }
}

/// Resolve the provider and model for a request. Total function; every
/// input combination yields a valid route.
///
/// Web search forces Gemini whenever the base choice lands on OpenAI,
/// which has no search tool in this design. The override beats an
/// explicit client request; the capability wins over the preference.
pub fn resolve(
    choice: ProviderChoice,
    task_category: Option<&str>,
    web_search: bool,
    deep_thinking: bool,
) -> Route {
    let mut provider = match choice {
        ProviderChoice::Auto => provider_for_category(task_category),
        ProviderChoice::OpenAi => ProviderKind::OpenAi,
        ProviderChoice::Gemini => ProviderKind::Gemini,
        ProviderChoice::Perplexity => ProviderKind::Perplexity,
    };

    if web_search && provider == ProviderKind::OpenAi {
        provider = ProviderKind::Gemini;
    }

    Route {
        provider,
        model: model_for(provider, deep_thinking),
    }
}

use indoc::indoc;

use crate::models::persona::{Persona, Skill};

const SECTION_BREAK: &str = "\n\n---\n\n";

/// Usage contract appended after skill instructions. Stops the model
/// from answering generically when the user has only tapped the skill
/// label and the skill still needs parameters.
const SKILL_USAGE_CONTRACT: &str = indoc! {"
    IMPORTANT: If the user's message is just the name of this skill and the
    skill requires information you have not been given, do not proceed with a
    generic answer. Ask one short clarifying question to gather what you need
    first."};

/// Build the system prompt for a request by layering the persona base
/// line, the stored personality text, and the selected skill. Ordering
/// matters: skill instructions come last so they sit closest to the
/// user turn and take precedence.
pub fn compose_system_prompt(
    persona: &Persona,
    personality: Option<&str>,
    skill: Option<&Skill>,
) -> String {
    let subtitle = persona
        .subtitle
        .as_deref()
        .unwrap_or("a helpful AI assistant");
    let mut prompt = format!("You are {}, {}.", persona.name, subtitle);

    if let Some(text) = personality {
        prompt.push_str(SECTION_BREAK);
        prompt.push_str("YOUR PERSONALITY AND BEHAVIOR:\n\n");
        prompt.push_str(text);
    }

    if let Some(skill) = skill {
        prompt.push_str(SECTION_BREAK);
        prompt.push_str("CURRENT ACTIVE SKILL INSTRUCTIONS:\n\n");
        prompt.push_str(&skill.prompt);
        prompt.push_str("\n\n");
        prompt.push_str(SKILL_USAGE_CONTRACT);
    }

    prompt
}

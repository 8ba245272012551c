use serde::{Deserialize, Serialize};

/// A mascot record as stored in the external store. Read-only input
/// to prompt composition and provider selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub task_category: Option<String>,
}

/// A skill attached to a mascot. Only the skill the client explicitly
/// selected for a turn contributes its prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub mascot_id: String,
    pub label: String,
    pub prompt: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

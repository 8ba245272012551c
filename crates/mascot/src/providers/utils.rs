use serde_json::{json, Value};

use crate::models::message::{ChatTurn, ImageAttachment, Role};

/// Convert a system prompt and conversation turns into the OpenAI chat
/// completion message spec, shared by the OpenAI and Perplexity
/// adapters. An attached image turns the last user turn's content into
/// a multi-part array with a data-URI `image_url` part.
pub fn turns_to_chat_spec(
    system: &str,
    turns: &[ChatTurn],
    image: Option<&ImageAttachment>,
) -> Vec<Value> {
    let mut messages = vec![json!({
        "role": "system",
        "content": system
    })];

    let last_user = turns.iter().rposition(|turn| turn.role == Role::User);

    for (index, turn) in turns.iter().enumerate() {
        if Some(index) == last_user {
            if let Some(image) = image {
                messages.push(json!({
                    "role": "user",
                    "content": [
                        {"type": "text", "text": turn.content},
                        {"type": "image_url", "image_url": {"url": image.data_uri()}}
                    ]
                }));
                continue;
            }
        }
        messages.push(json!({
            "role": turn.role,
            "content": turn.content
        }));
    }

    messages
}

/// Extract the incremental content token from an OpenAI-compatible
/// streaming chunk.
pub fn chat_completion_delta(value: &Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(String::from)
}

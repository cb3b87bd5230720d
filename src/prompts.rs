//! Prompt templates sent alongside the image payloads.

/// Instruction wrapped around the user's prompt. The framing clause tells
/// the model which image is the subject and where the reference image goes.
pub const COMPOSE_INSTRUCTION: &str = "{{prompt}}. The first image is the main subject. The second image should be placed on a card held by the person in the first image.";

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

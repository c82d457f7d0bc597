//! Instruction text sent to the provider.

use crate::options::OptionSet;

fn length_rule(length: &str) -> &'static str {
    match length {
        "Concise" => "Keep the rewritten prompt short and to the point.",
        "Elaborate" => "Expand the rewritten prompt with helpful detail and context.",
        _ => "Keep the rewritten prompt at a natural length.",
    }
}

fn format_rule(format: &str) -> Option<&'static str> {
    match format {
        "JSON" => Some("Ask for the answer as a JSON structure."),
        "List" => Some("Ask for the answer as a bullet list."),
        "Table" => Some("Ask for the answer as a table."),
        "Steps" => Some("Ask for the answer as numbered step-by-step instructions."),
        _ => None,
    }
}

/// System message describing how to rewrite the prompt.
pub fn system_instruction(options: &OptionSet) -> String {
    let options = options.normalized();
    let mut lines = vec![
        "You are a prompt engineer. Rewrite the user's prompt so a language model answers it better.".to_string(),
        "Reply with the rewritten prompt only, without commentary or quotes.".to_string(),
        format!("Use a {} tone.", options.tone.to_lowercase()),
        length_rule(&options.length).to_string(),
        format!(
            "Address the model as a {} writing for a {} audience.",
            options.persona, options.audience
        ),
    ];

    if let Some(rule) = format_rule(&options.format) {
        lines.push(rule.to_string());
    }
    if !options.negative_prompt.is_empty() {
        lines.push(format!("The answer must avoid: {}.", options.negative_prompt));
    }

    lines.join("\n")
}

/// User message carrying the prompt as typed.
pub fn user_message(prompt_text: &str) -> String {
    format!("Prompt to optimize:\n{}", prompt_text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_mentions_options() {
        let options = OptionSet::new()
            .with_tone("Friendly")
            .with_length("Concise")
            .with_persona("Tutor")
            .with_audience("Children");
        let text = system_instruction(&options);
        assert!(text.contains("friendly tone"));
        assert!(text.contains("short and to the point"));
        assert!(text.contains("Tutor writing for a Children audience"));
        assert!(!text.contains("avoid"));
    }

    #[test]
    fn test_instruction_with_elevated_options() {
        let options = OptionSet::new()
            .with_format("Table")
            .with_negative_prompt("jargon");
        let text = system_instruction(&options);
        assert!(text.contains("as a table"));
        assert!(text.ends_with("The answer must avoid: jargon."));
    }

    #[test]
    fn test_user_message() {
        assert_eq!(user_message("  hi "), "Prompt to optimize:\nhi");
    }
}

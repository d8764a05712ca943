//! Prompt construction for schema-guided extraction

use crate::error::ExtractorError;
use crate::schema::Schema;

/// Builds the prompt sent to the generator
///
/// The output is a pure function of the input text, the schema source and
/// any correction feedback: the same inputs always give the same prompt.
pub struct PromptBuilder<'a> {
    text: &'a str,
    schema: &'a Schema,
    correction: Option<String>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(text: &'a str, schema: &'a Schema) -> Self {
        Self {
            text,
            schema,
            correction: None,
        }
    }

    /// Append feedback about a rejected response
    pub fn with_correction(mut self, feedback: impl Into<String>) -> Self {
        self.correction = Some(feedback.into());
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> Result<String, ExtractorError> {
        if self.text.trim().is_empty() {
            return Err(ExtractorError::EmptyInput);
        }

        let source = self.schema.source().trim();
        let mut prompt = String::with_capacity(
            PREAMBLE.len() + source.len() + self.text.len() + CLOSING.len() + 128,
        );

        prompt.push_str(PREAMBLE);
        prompt.push('\n');
        prompt.push_str(source);
        prompt.push_str("\n\n");

        prompt.push_str(INPUT_HEADER);
        prompt.push('\n');
        prompt.push_str(self.text);
        prompt.push_str("\n\n");

        prompt.push_str(CLOSING);

        if let Some(feedback) = &self.correction {
            prompt.push_str("\n\n");
            prompt.push_str(CORRECTION_HEADER);
            prompt.push('\n');
            prompt.push_str(feedback.trim_end());
            prompt.push_str("\n\n");
            prompt.push_str(CORRECTION_REMINDER);
        }

        Ok(prompt)
    }
}

/// Describe why a completion was rejected, one problem per line
pub fn correction_feedback(error: &ExtractorError) -> String {
    match error {
        ExtractorError::SchemaViolation { violations, .. } => violations
            .iter()
            .map(|v| format!("- {}", v))
            .collect::<Vec<_>>()
            .join("\n"),
        ExtractorError::MalformedOutput { reason, .. } => {
            format!("- the response was not valid JSON ({})", reason)
        }
        other => format!("- {}", other),
    }
}

const PREAMBLE: &str = "You are an AI assistant trained to convert structured text into JSON format.

Here is the provided JSON schema:";

const INPUT_HEADER: &str = "Now, based on this schema, convert the following input text into JSON format:

Input Text:";

const CLOSING: &str = "Ensure the output follows the structure defined in the schema. \
If any required fields are missing in the input text, try to infer them from the context. \
Respond with a JSON array whose items match the schema.
Return ONLY valid JSON, no markdown code blocks, no explanations.";

const CORRECTION_HEADER: &str = "Your previous response was rejected:";

const CORRECTION_REMINDER: &str =
    "Correct these problems and answer again with ONLY the JSON array.";

//! System-prompt template filled per request.

use crate::llm::ChatPrompt;

/// Separator placed between retrieved chunks in the `CONTEXT` section.
const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Template rendering `"{system prompt} CONTEXT: {context} LANGUAGE: {language}"` as the system
/// turn and the user's message as the human turn.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system_prompt: String,
}

impl PromptTemplate {
    /// Create a template around the operator-supplied system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into().trim().to_string(),
        }
    }

    /// Fill the template with retrieved chunk texts (in retrieval order), language, and input.
    pub fn render<S: AsRef<str>>(&self, context: &[S], language: &str, input: &str) -> ChatPrompt {
        let context = context
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);
        ChatPrompt {
            system: format!(
                "{} CONTEXT: {context} LANGUAGE: {language}",
                self.system_prompt
            ),
            user: input.to_string(),
        }
    }
}

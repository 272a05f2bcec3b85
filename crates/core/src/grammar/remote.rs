use crate::grammar::{parse_findings, Finding};
use crate::lang::language_name;
use crate::llm::{ChatPrompt, LlmClient, LlmError};

pub const GRAMMAR_SYSTEM_PROMPT: &str =
    "You are a grammar expert that provides contextual examples like Reverso Context.";

pub fn grammar_prompt(text: &str, lang: &str) -> String {
    format!(
        r#"Analyze the grammar in this {language} text:
"{text}"

Return exactly 3 grammatical elements found in the text.

For each element, provide:
1. The name of the grammatical structure or verb tense
2. A brief explanation of how it's used in the text
3. 3 context examples showing how this grammatical structure is used in different contexts (similar to Reverso Context)

Format your response as a JSON array with objects containing 'name', 'explanation', and 'examples' properties.
Examples should be an array of strings.

Example response format:
[
  {{
    "name": "Present Simple",
    "explanation": "In 'I work', present simple is used for habitual actions.",
    "examples": [
      "I work at a bank. (habitual action)",
      "The train leaves at 8:30 AM. (scheduled event)",
      "Water boils at 100°C. (scientific fact)"
    ]
  }}
]"#,
        language = language_name(lang),
    )
}

/// Grammar analysis through a keyed LLM.
///
/// Only transport and provider failures are errors; a reply that is not
/// valid JSON still yields findings.
#[derive(Clone)]
pub struct RemoteGrammarAnalyzer<C> {
    client: C,
}

impl<C: LlmClient> RemoteGrammarAnalyzer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn analyze(&self, text: &str, lang: &str) -> Result<Vec<Finding>, LlmError> {
        tracing::debug!(engine = %self.client.engine(), lang, "requesting grammar analysis");
        let prompt = ChatPrompt::new(GRAMMAR_SYSTEM_PROMPT, grammar_prompt(text, lang));
        let reply = self.client.complete(prompt).await?;
        Ok(parse_findings(&reply))
    }
}

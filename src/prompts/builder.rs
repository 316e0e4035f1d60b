// Prompt builders
//
// Chat-style builders produce a system + user pair; the instruction builder
// produces one `### Instruction / ### Input / ### Response` string for
// completion-style models.

use thiserror::Error;

use super::templates::{render_question, render_system, PromptVersion};
use super::types::{ChatTurn, GeneratedMessage, PromptStyle};
use crate::data::Persona;

#[derive(Debug, Error, PartialEq)]
pub enum PromptError {
    /// Every template has exactly one persona substitution
    #[error("No persona supplied; prompt templates require a persona")]
    MissingPersona,
}

/// Turns a stimulus into a model-ready prompt
pub trait PromptBuilder: Send + Sync {
    /// Build the prompt for one (record, persona) pair.
    ///
    /// `domain` is accepted so domain-conditioned templates can be added
    /// without changing callers; no current template reads it.
    fn build(
        &self,
        prompt_text: &str,
        persona: Option<Persona>,
        domain: &str,
        version: PromptVersion,
    ) -> Result<GeneratedMessage, PromptError>;

    /// Shape of the messages this builder produces
    fn style(&self) -> PromptStyle;
}

/// Builder for chat-completion backends
#[derive(Debug, Clone, Default)]
pub struct ChatPromptBuilder {
    pinned_version: Option<PromptVersion>,
}

impl ChatPromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always render `version`, ignoring the per-run version
    pub fn pinned(version: PromptVersion) -> Self {
        Self {
            pinned_version: Some(version),
        }
    }
}

impl PromptBuilder for ChatPromptBuilder {
    fn build(
        &self,
        prompt_text: &str,
        persona: Option<Persona>,
        _domain: &str,
        version: PromptVersion,
    ) -> Result<GeneratedMessage, PromptError> {
        let persona = persona.ok_or(PromptError::MissingPersona)?;
        let version = self.pinned_version.unwrap_or(version);

        Ok(GeneratedMessage::Chat(vec![
            ChatTurn::system(render_system(version, persona.label())),
            ChatTurn::user(render_question(prompt_text)),
        ]))
    }

    fn style(&self) -> PromptStyle {
        PromptStyle::Chat
    }
}

/// Builder for instruction-tuned completion models
#[derive(Debug, Clone, Default)]
pub struct InstructionPromptBuilder;

impl InstructionPromptBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl PromptBuilder for InstructionPromptBuilder {
    fn build(
        &self,
        prompt_text: &str,
        persona: Option<Persona>,
        _domain: &str,
        version: PromptVersion,
    ) -> Result<GeneratedMessage, PromptError> {
        let persona = persona.ok_or(PromptError::MissingPersona)?;
        let system = render_system(version, persona.label());
        let question = render_question(prompt_text);

        Ok(GeneratedMessage::Instruction(format!(
            "### Instruction:\n{}\n\n### Input:\n{}\n\n### Response:\n",
            system, question
        )))
    }

    fn style(&self) -> PromptStyle {
        PromptStyle::Instruction
    }
}

/// Pick the builder matching a backend's wire shape.
///
/// `pinned` fixes the template of chat prompts. Instruction prompts always
/// follow the run version.
pub fn builder_for_style(style: PromptStyle, pinned: Option<PromptVersion>) -> Box<dyn PromptBuilder> {
    match (style, pinned) {
        (PromptStyle::Chat, Some(version)) => Box::new(ChatPromptBuilder::pinned(version)),
        (PromptStyle::Chat, None) => Box::new(ChatPromptBuilder::new()),
        (PromptStyle::Instruction, pinned) => {
            if pinned.is_some() {
                tracing::warn!("pinned_prompt_version only applies to chat prompts; ignoring it");
            }
            Box::new(InstructionPromptBuilder::new())
        }
    }
}

// Model-ready prompt representations

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged turn of a chat-style prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Prompt for a single (record, persona) pair
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedMessage {
    /// System instruction followed by the user question
    Chat(Vec<ChatTurn>),
    /// Single instruction string ending in a response cue
    Instruction(String),
}

impl GeneratedMessage {
    pub fn style(&self) -> PromptStyle {
        match self {
            Self::Chat(_) => PromptStyle::Chat,
            Self::Instruction(_) => PromptStyle::Instruction,
        }
    }

    pub fn as_chat(&self) -> Option<&[ChatTurn]> {
        match self {
            Self::Chat(turns) => Some(turns),
            Self::Instruction(_) => None,
        }
    }

    pub fn as_instruction(&self) -> Option<&str> {
        match self {
            Self::Instruction(text) => Some(text),
            Self::Chat(_) => None,
        }
    }
}

/// Wire shape a backend expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    #[default]
    Chat,
    Instruction,
}

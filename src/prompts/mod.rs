// Prompt construction
//
// Maps (stimulus, persona, domain, template version) to the message shape a
// model backend expects.

mod builder;
pub mod templates;
mod types;

pub use builder::{
    builder_for_style, ChatPromptBuilder, InstructionPromptBuilder, PromptBuilder, PromptError,
};
pub use templates::PromptVersion;
pub use types::{ChatTurn, GeneratedMessage, PromptStyle, Role};

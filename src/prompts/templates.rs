// Instruction and question templates
//
// Responses are requested in Bangla and emotion answers are limited to a
// single word. `{persona}` and `{text}` are the substitution points.

use serde::{Deserialize, Serialize};

/// Closed emotion vocabulary offered by the version 1 template
pub const EMOTION_VOCABULARY: [&str; 8] = [
    "রাগ",
    "দুঃখ",
    "আনন্দ",
    "বিস্ময়",
    "ভয়",
    "অপরাধবোধ",
    "বিরক্তি",
    "লজ্জা",
];

pub const SYSTEM_INSTRUCTION_V1: &str = "You take the role of a {persona}. \
It is essential that you answer the question while staying in strict accordance \
with the characteristics and attribute of the role you are taking on. \
Your response should be in Bangla. \
If asked about reporting emotion(অনুভূতি), answer with a single word. \
Pick one of the following: রাগ, দুঃখ, আনন্দ, বিস্ময়, ভয়, অপরাধবোধ, বিরক্তি, লজ্জা \
that best fits your emotion.";

pub const SYSTEM_INSTRUCTION_V2: &str = "You are a {persona}. \
You shall get question in Bangla. \
Your response should be in Bangla. \
Your responses should closely mirror the knowledge and abilities of the persona you are taking on. \
If asked about reporting emotion, answer with a single word. \
You are free to use any emotion word from Bangla vocab";

pub const QUESTION_TEMPLATE: &str = "নিম্নোক্ত মন্তব্যটি শুনে আপনার প্রধান অনুভূতি কি হবে?\"{text}\"";

/// Which instruction template a run renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptVersion {
    /// Version 1: answer from [`EMOTION_VOCABULARY`]
    ClosedVocabulary,
    /// Version 2: any Bangla emotion word
    OpenVocabulary,
}

impl PromptVersion {
    /// Map a configured version number.
    ///
    /// Only `1` selects the closed vocabulary; every other value renders the
    /// open-vocabulary template.
    pub fn from_number(version: i64) -> Self {
        match version {
            1 => Self::ClosedVocabulary,
            2 => Self::OpenVocabulary,
            other => {
                tracing::warn!(
                    "Unknown prompt version {}, falling back to version 2 template",
                    other
                );
                Self::OpenVocabulary
            }
        }
    }

    pub fn number(&self) -> i64 {
        match self {
            Self::ClosedVocabulary => 1,
            Self::OpenVocabulary => 2,
        }
    }

    pub fn system_template(&self) -> &'static str {
        match self {
            Self::ClosedVocabulary => SYSTEM_INSTRUCTION_V1,
            Self::OpenVocabulary => SYSTEM_INSTRUCTION_V2,
        }
    }
}

pub(crate) fn render_system(version: PromptVersion, persona_label: &str) -> String {
    version.system_template().replace("{persona}", persona_label)
}

pub(crate) fn render_question(text: &str) -> String {
    QUESTION_TEMPLATE.replace("{text}", text)
}

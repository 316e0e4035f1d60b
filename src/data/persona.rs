// Persona set for role-play generation
//
// Every eligible record is generated once per persona. The set is fixed for
// the whole process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Social role the model is asked to take on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Man,
    Woman,
}

/// All personas, in generation order
pub const PERSONAS: [Persona; 2] = [Persona::Man, Persona::Woman];

impl Persona {
    /// Label substituted into templates and used in artifact file names
    pub fn label(&self) -> &'static str {
        match self {
            Self::Man => "man",
            Self::Woman => "woman",
        }
    }

    pub fn all() -> &'static [Persona] {
        &PERSONAS
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Persona {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "man" => Ok(Self::Man),
            "woman" => Ok(Self::Woman),
            other => anyhow::bail!("Unknown persona: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_order_is_stable() {
        assert_eq!(Persona::all(), &[Persona::Man, Persona::Woman]);
    }

    #[test]
    fn test_persona_labels_round_trip() {
        for persona in Persona::all() {
            let parsed: Persona = persona.label().parse().unwrap();
            assert_eq!(&parsed, persona);
        }
        assert_eq!(" Woman ".parse::<Persona>().unwrap(), Persona::Woman);
    }

    #[test]
    fn test_unknown_persona_rejected() {
        assert!("child".parse::<Persona>().is_err());
    }
}

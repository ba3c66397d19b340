//! Prompt types for Passage.

use serde::{Deserialize, Serialize};

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(system: Option<String>, user: String) -> Self {
        Self { system, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_prompt_creation() {
        let built = BuiltPrompt::new(None, "User message".to_string());
        assert!(built.system.is_none());
        assert_eq!(built.user, "User message");
    }

    #[test]
    fn test_built_prompt_serialization() {
        let built = BuiltPrompt::new(Some("sys".to_string()), "usr".to_string());
        let json = serde_json::to_string(&built).unwrap();
        let back: BuiltPrompt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.system.as_deref(), Some("sys"));
        assert_eq!(back.user, "usr");
    }
}

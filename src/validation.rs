use anyhow::{anyhow, Result};
use std::path::Path;

/// Longest mindfulness session accepted, in minutes
pub const MAX_MINDFULNESS_MINUTES: u32 = 24 * 60;

/// Lowest value on a diary rating scale
pub const MIN_RATING: u8 = 1;
/// Highest value on a diary rating scale
pub const MAX_RATING: u8 = 10;
/// Longest diary note accepted, in characters
pub const MAX_NOTES_LENGTH: usize = 2000;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a chat message before it is analyzed
    ///
    /// Length is counted in characters after sanitizing.
    pub fn validate_message_text(text: &str, max_length: usize) -> Result<String> {
        let sanitized = Self::sanitize_text(text);

        if sanitized.is_empty() {
            return Err(anyhow!("Message cannot be empty"));
        }

        let length = sanitized.chars().count();
        if length > max_length {
            return Err(anyhow!("Message too long ({length} characters, max {max_length})"));
        }

        Ok(sanitized)
    }

    /// Validate persona name
    pub fn validate_persona_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Persona name cannot be empty"));
        }

        if name.len() > 100 {
            return Err(anyhow!("Persona name too long (max 100 characters)"));
        }

        // Check for potentially dangerous characters
        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(anyhow!("Persona name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a 1-10 diary rating
    pub fn validate_rating(label: &str, value: u8) -> Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(anyhow!(
                "{label} must be between {MIN_RATING} and {MAX_RATING}, got {value}"
            ));
        }

        Ok(())
    }

    /// Sanitize free-text diary notes; empty notes are allowed
    pub fn validate_notes(notes: &str) -> Result<String> {
        let sanitized = Self::sanitize_text(notes);
        let length = sanitized.chars().count();
        if length > MAX_NOTES_LENGTH {
            return Err(anyhow!("Notes too long ({length} characters, max {MAX_NOTES_LENGTH})"));
        }

        Ok(sanitized)
    }

    /// Validate a risk threshold
    pub fn validate_risk_threshold(threshold: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!("Risk threshold must be between 0 and 1, got {threshold}"));
        }

        Ok(())
    }

    /// Validate mindfulness session length
    pub fn validate_mindfulness_minutes(minutes: u32) -> Result<()> {
        if minutes == 0 {
            return Err(anyhow!("Mindfulness session must last at least one minute"));
        }

        if minutes > MAX_MINDFULNESS_MINUTES {
            return Err(anyhow!(
                "Mindfulness session too long (max {MAX_MINDFULNESS_MINUTES} minutes)"
            ));
        }

        Ok(())
    }

    /// Validate file path
    pub fn validate_file_path(path: &Path) -> Result<()> {
        if path.to_string_lossy().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        // Check for path traversal attempts
        let path_str = path.to_string_lossy();
        if path_str.contains("..") || path_str.contains('~') {
            return Err(anyhow!("File path contains potentially dangerous characters"));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("File path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_sanitized() {
        let text = InputValidator::validate_message_text("  hello\u{0007} there \n", 100).expect("valid");
        assert_eq!(text, "hello there");
    }

    #[test]
    fn test_whitespace_only_message_rejected() {
        assert!(InputValidator::validate_message_text(" \t\n ", 100).is_err());
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(InputValidator::validate_message_text("💙💙💙", 3).is_ok());
        assert!(InputValidator::validate_message_text("💙💙💙💙", 3).is_err());
    }
}

// Validation Layer - run-level preconditions
// Only the errors defined here abort a whole run; per-document problems are
// recorded and processing continues.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::Path;

/// Validation errors with detailed context
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Precondition failed: {condition}")]
    PreconditionFailed { condition: String, context: String },

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },
}

/// Validation context for better error messages
#[derive(Clone)]
pub struct ValidationContext {
    operation: String,
    attributes: HashMap<String, String>,
}

impl ValidationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn validate(self, condition: bool, message: &str) -> Result<()> {
        if !condition {
            let context = format!(
                "Operation: {}, Attributes: {:?}",
                self.operation, self.attributes
            );
            bail!(ValidationError::PreconditionFailed {
                condition: message.to_string(),
                context,
            });
        }
        Ok(())
    }
}

/// Run target validation
pub mod target {
    use super::*;
    use crate::path_utils::is_markdown;

    /// What a run operates on
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TargetKind {
        File,
        Directory,
    }

    /// A run target must exist; a file target must be a Markdown document
    pub fn validate_target(path: &Path) -> Result<TargetKind> {
        let ctx = ValidationContext::new("validate_target")
            .with_attribute("path", path.display().to_string());

        ctx.clone().validate(path.exists(), "Path does not exist")?;

        if path.is_dir() {
            return Ok(TargetKind::Directory);
        }

        if !is_markdown(path) {
            bail!(ValidationError::InvalidInput {
                field: "path".to_string(),
                reason: format!("Not a Markdown file: {}", path.display()),
            });
        }

        Ok(TargetKind::File)
    }
}

#[cfg(test)]
mod tests {
    use super::target::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_target_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = validate_target(&dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("Path does not exist"));
    }

    #[test]
    fn test_target_kinds() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("a.md");
        let other = dir.path().join("a.txt");
        std::fs::write(&doc, "x").unwrap();
        std::fs::write(&other, "x").unwrap();

        assert_eq!(validate_target(dir.path()).unwrap(), TargetKind::Directory);
        assert_eq!(validate_target(&doc).unwrap(), TargetKind::File);
        assert!(validate_target(&other).is_err());
    }
}

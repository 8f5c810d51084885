use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

/// Class names of the bundled tumor model, in output-index order.
pub const DEFAULT_LABELS: [&str; 4] = ["pituitary", "meningioma", "glioma", "notumor"];

/// Ordered class names; a detection's `class_id` indexes into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<String>) -> DomainResult<Self> {
        if names.is_empty() {
            return Err(DomainError::InvalidInput("label set is empty".into()));
        }
        Ok(Self { names })
    }

    /// One class name per line; blank lines and surrounding whitespace are ignored.
    pub fn parse(text: &str) -> DomainResult<Self> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn from_file(path: &Path) -> DomainResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DomainError::NotFound(format!("label file {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn name(&self, class_id: usize) -> DomainResult<&str> {
        self.names
            .get(class_id)
            .map(String::as_str)
            .ok_or(DomainError::LabelOutOfRange { class_id, len: self.names.len() })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self { names: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect() }
    }
}

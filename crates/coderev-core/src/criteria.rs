//! Review criteria: the single source of truth for the form's choices and the
//! assistant-priming instruction sent with each review.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// (id, description, instruction) for the builtin profile, in display order.
const DEFAULT_CRITERIA: &[(&str, &str, &str)] = &[
    (
        "Code generation",
        "Generate detailed correct code according to the prompt.",
        "Analyze the given prompt and generate detailed correct code according to the prompt.",
    ),
    (
        "Code optimization",
        "Improve the performance, readability, and maintainability of the code.",
        "Analyze the existing code to improve its performance, readability, and maintainability.",
    ),
    (
        "Code debugging",
        "Identify and fix errors in the code, and provide suggestions for improvement.",
        "Identify and fix errors in the code, and provide suggestions for improvement.",
    ),
    (
        "Code analysis",
        "Identify patterns, trends, and areas for improvement in the code.",
        "Analyze the code to identify patterns, trends, and areas for improvement.",
    ),
    (
        "Code documentation",
        "Evaluate and suggest improvements for the code documentation.",
        "Evaluate the documentation of the code, including comments, documentation blocks, \
and other forms of documentation.",
    ),
    (
        "Code testing",
        "Provide suggestions for writing and executing unit tests and testing strategies.",
        "Provide suggestions for writing and executing unit tests, as well as testing strategies.",
    ),
    (
        "Code collaboration",
        "Provide suggestions for collaborating with developers on code projects.",
        "Provide suggestions for collaborating with developers on code projects, ensuring high \
quality and meeting project requirements.",
    ),
];

pub const DEFAULT_PROFILE_NAME: &str = "default";
pub const DEFAULT_PROFILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Criterion {
    pub id: String,
    pub description: String,
    /// Sent verbatim as the assistant-priming message.
    pub instruction: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CriteriaError {
    #[error("failed to read criteria profile {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid criteria profile: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("criteria profile {0:?} has no criteria")]
    Empty(String),
    #[error("criteria profile {0:?} contains an empty id")]
    EmptyId(String),
    #[error("criteria profile {profile:?} defines {id:?} more than once")]
    DuplicateId { profile: String, id: String },
}

/// A named, versioned, ordered set of criteria. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CriteriaRegistry {
    name: String,
    #[serde(default = "default_version")]
    version: u32,
    criteria: Vec<Criterion>,
}

fn default_version() -> u32 {
    DEFAULT_PROFILE_VERSION
}

impl CriteriaRegistry {
    pub fn builtin() -> Self {
        let criteria = DEFAULT_CRITERIA
            .iter()
            .map(|(id, description, instruction)| Criterion {
                id: (*id).to_string(),
                description: (*description).to_string(),
                instruction: (*instruction).to_string(),
            })
            .collect();
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            version: DEFAULT_PROFILE_VERSION,
            criteria,
        }
    }

    /// Parse a JSON profile: `{"name": "...", "version": 1, "criteria": [{"id", "description", "instruction"}]}`.
    pub fn from_json(raw: &str) -> Result<Self, CriteriaError> {
        let registry: CriteriaRegistry = serde_json::from_str(raw)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self, CriteriaError> {
        let raw = fs::read_to_string(path).map_err(|source| CriteriaError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::from_json(&raw)?;
        tracing::info!(
            profile = %registry.name,
            version = registry.version,
            count = registry.criteria.len(),
            "loaded criteria profile from {}",
            path.display()
        );
        Ok(registry)
    }

    fn validate(&self) -> Result<(), CriteriaError> {
        if self.criteria.is_empty() {
            return Err(CriteriaError::Empty(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for c in &self.criteria {
            if c.id.trim().is_empty() {
                return Err(CriteriaError::EmptyId(self.name.clone()));
            }
            if !seen.insert(c.id.as_str()) {
                return Err(CriteriaError::DuplicateId {
                    profile: self.name.clone(),
                    id: c.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(|c| c.id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }

    pub fn instruction(&self, id: &str) -> Option<&str> {
        self.get(id).map(|c| c.instruction.as_str())
    }
}

impl Default for CriteriaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

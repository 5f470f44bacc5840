use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named partition of the knowledge index grouping snippets by topic domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Products,
    Education,
    Reassurance,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Education => "education",
            Self::Reassurance => "reassurance",
        }
    }
}

/// A retrieved text passage plus metadata, used as grounding context for
/// generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub body: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Snippet {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into(), metadata: BTreeMap::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

//! Increment records emitted by the CDM mapping layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::counter::Fragment;
use crate::error::Result;
use crate::key::source_prefix;

/// Provenance descriptor for one destination field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Qualified source name, e.g. `demographics.csv`.
    pub table: String,
    /// Other descriptor attributes (source field, etc.), carried but not read.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SourceFile {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        source_prefix(&self.table)
    }
}

/// Counts produced for one object of one destination table in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncrementRecord {
    /// Object (mapping rule) name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_person_id: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<Fragment>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub required_fields: BTreeMap<String, Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_files: Option<BTreeMap<String, SourceFile>>,
}

impl IncrementRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Decode a record from its JSON form. Fails when `name` is absent.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    #[must_use]
    pub fn with_valid_person_id(mut self, fragment: Fragment) -> Self {
        self.valid_person_id = Some(fragment);
        self
    }

    #[must_use]
    pub fn with_person_id(mut self, fragment: Fragment) -> Self {
        self.person_id = Some(fragment);
        self
    }

    #[must_use]
    pub fn with_required_field(mut self, field: impl Into<String>, fragment: Fragment) -> Self {
        self.required_fields.insert(field.into(), fragment);
        self
    }

    #[must_use]
    pub fn with_source_file(mut self, field: impl Into<String>, source: SourceFile) -> Self {
        self.source_files
            .get_or_insert_with(BTreeMap::new)
            .insert(field.into(), source);
        self
    }

    /// Source prefix for `field`, if the record carries its provenance.
    pub fn source_prefix_for(&self, field: &str) -> Option<&str> {
        self.source_files
            .as_ref()
            .and_then(|files| files.get(field))
            .map(SourceFile::prefix)
    }
}

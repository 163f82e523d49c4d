//! `{{$name}}` placeholder discovery.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::backend::{ChunkRef, TemplateChunk};
use crate::error::ClientError;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\{\{\$([A-Za-z0-9_]+)\}\}").expect("PLACEHOLDER_REGEX is valid")
    })
}

/// Parameter names in the order they were first found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterSchema {
    names: Vec<String>,
}

impl ParameterSchema {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Anything whose text may carry placeholders.
pub trait PlaceholderSource {
    fn placeholder_texts(&self) -> Vec<&str>;
}

impl PlaceholderSource for ChunkRef {
    fn placeholder_texts(&self) -> Vec<&str> {
        let mut texts = Vec::with_capacity(2);
        if let Some(d) = self.description.as_deref() {
            texts.push(d);
        }
        texts.push(self.raw.as_str());
        texts
    }
}

impl PlaceholderSource for TemplateChunk {
    fn placeholder_texts(&self) -> Vec<&str> {
        self.description
            .as_deref()
            .into_iter()
            .chain(self.raw.as_deref())
            .collect()
    }
}

/// Scans texts for `{{$name}}` and returns the distinct names, first occurrence
/// first. Unbalanced or otherwise malformed braces simply do not match.
pub fn extract<'a, I>(texts: I) -> ParameterSchema
where
    I: IntoIterator<Item = &'a str>,
{
    let re = placeholder_regex();
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for text in texts {
        for cap in re.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                if seen.insert(m.as_str()) {
                    names.push(m.as_str().to_string());
                }
            }
        }
    }
    ParameterSchema { names }
}

pub fn extract_from<T: PlaceholderSource>(items: &[T]) -> ParameterSchema {
    extract(items.iter().flat_map(|item| item.placeholder_texts()))
}

/// User-entered values, keyed by schema name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterValues {
    values: BTreeMap<String, String>,
}

impl ParameterValues {
    /// One empty entry per schema name.
    pub fn for_schema(schema: &ParameterSchema) -> Self {
        Self {
            values: schema
                .names()
                .iter()
                .map(|n| (n.clone(), String::new()))
                .collect(),
        }
    }

    /// Sets a value; names outside the schema are rejected.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), ClientError> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(ClientError::UnknownParameter(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

//! Match evaluation.
//!
//! Each store kind describes its evidence as a list of [`MatchSource`]s. The
//! [`Evaluator`] runs them in order and never looks at formats itself: a
//! source that cannot parse its input contributes zero matches and a
//! diagnostic, it never aborts the scan and never counts as a match.

pub mod document;
pub mod login_store;

pub use document::{Document, FieldPath};

use crate::error::{PurgeError, Result};
use crate::identity::Identity;
use crate::store::{Confidence, MatchDescriptor, MatchStrategy, StoreItem};
use std::fs;
use std::path::PathBuf;

/// One piece of evidence inside a store item.
pub trait MatchSource {
    /// Short description used in diagnostics.
    fn describe(&self) -> String;

    /// Look for `identity`. Errors mean "unreadable", not "no match".
    fn query(&self, item: &StoreItem, identity: &Identity) -> Result<Vec<MatchDescriptor>>;
}

/// A JSON or property-list document with well-known account fields.
///
/// Structured fields are compared for exact, case-sensitive equality. Only
/// when none of them match is every string leaf searched for a substring.
#[derive(Debug, Clone)]
pub struct PreferenceSource {
    pub path: PathBuf,
    pub fields: Vec<(FieldPath, String)>,
    pub deep_search: bool,
}

impl PreferenceSource {
    /// `fields` pairs a dotted path with the label shown to the operator.
    pub fn new(path: impl Into<PathBuf>, fields: &[(&str, &str)]) -> Self {
        Self {
            path: path.into(),
            fields: fields
                .iter()
                .map(|(f, label)| (FieldPath::parse(f), label.to_string()))
                .collect(),
            deep_search: true,
        }
    }

    /// Substring search over the whole document only.
    pub fn deep_only(path: impl Into<PathBuf>) -> Self {
        Self::new(path, &[])
    }
}

impl MatchSource for PreferenceSource {
    fn describe(&self) -> String {
        format!("document {}", self.path.display())
    }

    fn query(&self, item: &StoreItem, identity: &Identity) -> Result<Vec<MatchDescriptor>> {
        let doc = Document::load(&self.path)?;
        let descriptor = |strategy, field: String, confidence| MatchDescriptor {
            kind: item.kind,
            item_path: item.path.clone(),
            source_path: self.path.clone(),
            strategy,
            field,
            confidence,
        };

        let structured: Vec<MatchDescriptor> = self
            .fields
            .iter()
            .filter(|(field, _)| doc.field_equals(field, identity.as_str()))
            .map(|(_, label)| descriptor(MatchStrategy::StructuredField, label.clone(), Confidence::Exact))
            .collect();

        if !structured.is_empty() || !self.deep_search {
            return Ok(structured);
        }

        Ok(doc
            .leaves_containing(identity.as_str())
            .into_iter()
            .map(|pointer| descriptor(MatchStrategy::DeepDocument, pointer, Confidence::Substring))
            .collect())
    }
}

/// A browser login database, always read through a private copy.
#[derive(Debug, Clone)]
pub struct LoginStoreSource {
    pub path: PathBuf,
}

impl MatchSource for LoginStoreSource {
    fn describe(&self) -> String {
        format!("login store {}", self.path.display())
    }

    fn query(&self, item: &StoreItem, identity: &Identity) -> Result<Vec<MatchDescriptor>> {
        let origins = login_store::logins_for_username(&self.path, identity.as_str())?;
        Ok(origins
            .into_iter()
            .map(|origin| MatchDescriptor {
                kind: item.kind,
                item_path: item.path.clone(),
                source_path: self.path.clone(),
                strategy: MatchStrategy::RelationalStore,
                field: format!("saved login ({})", origin),
                confidence: Confidence::Exact,
            })
            .collect())
    }
}

/// The free-text comment at the end of an OpenSSH public key line.
#[derive(Debug, Clone)]
pub struct KeyCommentSource {
    pub path: PathBuf,
}

impl KeyCommentSource {
    /// Everything after the key type and base64 blob, if present.
    pub fn comment(line: &str) -> Option<&str> {
        let line = line.trim();
        let mut rest = line;
        for _ in 0..2 {
            let start = rest.find(|c: char| !c.is_whitespace())?;
            rest = &rest[start..];
            let end = rest.find(char::is_whitespace)?;
            rest = &rest[end..];
        }
        let comment = rest.trim();
        if comment.is_empty() {
            None
        } else {
            Some(comment)
        }
    }
}

impl MatchSource for KeyCommentSource {
    fn describe(&self) -> String {
        format!("public key {}", self.path.display())
    }

    fn query(&self, item: &StoreItem, identity: &Identity) -> Result<Vec<MatchDescriptor>> {
        let raw = fs::read(&self.path)?;
        let text = String::from_utf8(raw).map_err(|e| PurgeError::parse(&self.path, e))?;

        Ok(text
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .filter_map(KeyCommentSource::comment)
            .filter(|comment| comment.contains(identity.as_str()))
            .map(|comment| MatchDescriptor {
                kind: item.kind,
                item_path: item.path.clone(),
                source_path: self.path.clone(),
                strategy: MatchStrategy::KeyComment,
                field: format!("key comment \"{}\"", comment),
                confidence: Confidence::Substring,
            })
            .collect())
    }
}

/// Runs an item's sources and collects every match.
#[derive(Debug, Default)]
pub struct Evaluator {
    diagnostics: Vec<String>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `item`. The returned set is sorted and deduplicated so that
    /// repeated scans of unchanged files compare equal.
    pub fn evaluate(
        &mut self,
        item: &StoreItem,
        identity: &Identity,
        sources: &[Box<dyn MatchSource>],
    ) -> Vec<MatchDescriptor> {
        let mut matches = Vec::new();

        for source in sources {
            match source.query(item, identity) {
                Ok(found) => matches.extend(found),
                Err(e) => {
                    let message = format!("{}: {}", source.describe(), e);
                    log::warn!("Skipping unreadable {}", message);
                    self.diagnostics.push(message);
                }
            }
        }

        matches.sort();
        matches.dedup();
        matches
    }

    /// Diagnostics recorded since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }
}

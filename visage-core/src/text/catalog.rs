//! Viseme identifier catalog.
//!
//! The render surface only knows how to draw a finite set of mouth shapes.
//! Ids outside the catalog resolve to the neutral shape, which must itself be
//! part of the catalog.

use std::collections::BTreeSet;

use super::DIGRAPHS;
use crate::error::{Result, VisageError};

/// Default resting mouth shape.
pub const DEFAULT_NEUTRAL_VISEME: &str = "ee";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisemeCatalog {
    neutral: String,
    known: BTreeSet<String>,
}

impl VisemeCatalog {
    /// Build a catalog from an explicit id list.
    ///
    /// # Errors
    /// `VisageError::MissingNeutralViseme` if `neutral` is not in `ids`.
    pub fn new<I, S>(neutral: impl Into<String>, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let neutral = neutral.into();
        let known: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if neutral.is_empty() || !known.contains(&neutral) {
            return Err(VisageError::MissingNeutralViseme(neutral));
        }
        Ok(Self { neutral, known })
    }

    /// 26 lower-case letters + every digraph, with `neutral` added if needed.
    pub fn with_neutral(neutral: impl Into<String>) -> Result<Self> {
        let neutral = neutral.into();
        if neutral.is_empty() {
            return Err(VisageError::MissingNeutralViseme(neutral));
        }
        let mut ids = default_viseme_ids();
        ids.push(neutral.clone());
        Self::new(neutral, ids)
    }

    pub fn neutral(&self) -> &str {
        &self.neutral
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    /// `id` itself when drawable, otherwise the neutral shape.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        if self.contains(id) {
            id
        } else {
            &self.neutral
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl Default for VisemeCatalog {
    fn default() -> Self {
        let mut known: BTreeSet<String> = default_viseme_ids().into_iter().collect();
        known.insert(DEFAULT_NEUTRAL_VISEME.to_string());
        Self {
            neutral: DEFAULT_NEUTRAL_VISEME.to_string(),
            known,
        }
    }
}

/// Letters `a`–`z` followed by the digraph table.
pub fn default_viseme_ids() -> Vec<String> {
    ('a'..='z')
        .map(String::from)
        .chain(DIGRAPHS.iter().map(|d| d.to_string()))
        .collect()
}

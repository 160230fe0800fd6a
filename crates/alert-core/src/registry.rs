//! Geographic code registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Display information for one geographic code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyLabel {
    /// Human-readable label, e.g. "Jefferson County, MO".
    pub label: String,
    /// Broad region (state) the code belongs to.
    pub region: String,
}

/// Static lookup from SAME code to county label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRegistry {
    entries: HashMap<String, CountyLabel>,
}

impl CodeRegistry {
    /// Build a registry from `(code, label, region)` triples.
    pub fn from_entries<I, C, L, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, L, R)>,
        C: Into<String>,
        L: Into<String>,
        R: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(code, label, region)| {
                (
                    code.into(),
                    CountyLabel {
                        label: label.into(),
                        region: region.into(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Parse a JSON object of `code -> {label, region}`.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let entries: HashMap<String, CountyLabel> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    /// Resolve a code. `None` means the caller should skip it.
    pub fn lookup(&self, code: &str) -> Option<&CountyLabel> {
        self.entries.get(code)
    }

    /// Number of known codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry knows no codes at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const ST_LOUIS_METRO: &[(&str, &str, &str)] = &[
    ("029071", "Franklin County, MO", "MO"),
    ("029099", "Jefferson County, MO", "MO"),
    ("029189", "St. Louis County, MO", "MO"),
    ("029510", "St. Louis City, MO", "MO"),
    ("017013", "Calhoun County, IL", "IL"),
    ("017083", "Jersey County, IL", "IL"),
    ("017119", "Madison County, IL", "IL"),
    ("017133", "Monroe County, IL", "IL"),
    ("017163", "St. Clair County, IL", "IL"),
    ("029183", "St. Charles County, MO", "MO"),
    ("029221", "Washington County, MO", "MO"),
    ("029187", "St. Francois County, MO", "MO"),
    ("029186", "Ste. Genevieve County, MO", "MO"),
    ("029113", "Lincoln County, MO", "MO"),
    ("029219", "Warren County, MO", "MO"),
    ("017005", "Bond County, IL", "IL"),
    ("017027", "Clinton County, IL", "IL"),
    ("017157", "Randolph County, IL", "IL"),
    ("017189", "Washington County, IL", "IL"),
    ("029055", "Crawford County, MO", "MO"),
    ("029073", "Gasconade County, MO", "MO"),
];

impl Default for CodeRegistry {
    /// The St. Louis metro counties on both sides of the river.
    fn default() -> Self {
        Self::from_entries(ST_LOUIS_METRO.iter().copied())
    }
}

//! Category resolution for reports
//!
//! Transactions carry a [`CategorySnapshot`] taken at write time. Reports
//! resolve names through a [`CategoryDirectory`] built from the live
//! categories instead:
//!
//! 1. Live category exists: its current name, color and icon.
//! 2. Category was deleted: the transaction's snapshot.
//! 3. Neither: the configured "unknown" label.
//!
//! Transactions without a category reference resolve to "uncategorized".

use std::collections::HashMap;

use crate::config::CategoryLabels;
use crate::models::{Category, CategorySnapshot, Transaction};

/// Where a resolved label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Live,
    Snapshot,
    Unknown,
    Uncategorized,
}

/// Display attributes of a transaction's category at report time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLabel {
    pub id: Option<i64>,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub source: LabelSource,
}

/// Lookup of live categories by id
pub struct CategoryDirectory<'a> {
    live: HashMap<i64, &'a Category>,
    labels: &'a CategoryLabels,
}

impl<'a> CategoryDirectory<'a> {
    pub fn new(categories: &'a [Category], labels: &'a CategoryLabels) -> Self {
        Self {
            live: categories.iter().map(|c| (c.id, c)).collect(),
            labels,
        }
    }

    pub fn get(&self, id: i64) -> Option<&'a Category> {
        self.live.get(&id).copied()
    }

    /// Resolve the category a transaction should be reported under
    pub fn resolve(&self, tx: &Transaction) -> CategoryLabel {
        self.resolve_parts(tx.category_id, tx.category.as_ref())
    }

    pub fn resolve_parts(
        &self,
        category_id: Option<i64>,
        snapshot: Option<&CategorySnapshot>,
    ) -> CategoryLabel {
        let Some(id) = category_id else {
            return CategoryLabel {
                id: None,
                name: self.labels.uncategorized_label.clone(),
                color: None,
                icon: None,
                source: LabelSource::Uncategorized,
            };
        };

        if let Some(category) = self.get(id) {
            return CategoryLabel {
                id: Some(id),
                name: category.name.clone(),
                color: Some(category.color.clone()),
                icon: category.icon.clone(),
                source: LabelSource::Live,
            };
        }

        match snapshot {
            Some(snapshot) => CategoryLabel {
                id: Some(id),
                name: snapshot.name.clone(),
                color: snapshot.color.clone(),
                icon: snapshot.icon.clone(),
                source: LabelSource::Snapshot,
            },
            None => CategoryLabel {
                id: Some(id),
                name: self.labels.unknown_label.clone(),
                color: None,
                icon: None,
                source: LabelSource::Unknown,
            },
        }
    }
}

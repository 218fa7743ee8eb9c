use std::collections::BTreeSet;

use crate::types::{CqlValue, NOT_AVAILABLE};

/// A catalog item, keyed by its `asin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub asin: String,
    pub title: String,
    pub image_url: String,
    /// Flattened, deduplicated category names.
    pub categories: BTreeSet<String>,
    pub description: String,
}

impl Item {
    /// Returns the bound values for an insert into the items table, in
    /// `(asin, title, imageurl, categories, description)` order.
    pub fn to_insert_values(&self) -> Vec<CqlValue> {
        vec![
            CqlValue::from(self.asin.as_str()),
            CqlValue::from(self.title.as_str()),
            CqlValue::from(self.image_url.as_str()),
            CqlValue::from(self.categories.clone()),
            CqlValue::from(self.description.as_str()),
        ]
    }
}

impl Default for Item {
    fn default() -> Self {
        Self {
            asin: NOT_AVAILABLE.to_owned(),
            title: NOT_AVAILABLE.to_owned(),
            image_url: NOT_AVAILABLE.to_owned(),
            categories: BTreeSet::new(),
            description: NOT_AVAILABLE.to_owned(),
        }
    }
}

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::normalize::{optional_text, scalar_text, text_or_sentinel};
use crate::types::{Item, NOT_AVAILABLE};

/// Builds an [`Item`] from a raw record.
///
/// `imageURL` falls back to the legacy `imUrl` field. Categories are flattened from either a
/// list of lists or a flat list.
pub fn normalize_item(raw: &Map<String, Value>) -> Item {
    let image_url = optional_text(raw, "imageURL")
        .or_else(|| optional_text(raw, "imUrl"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned());

    Item {
        asin: text_or_sentinel(raw, "asin"),
        title: text_or_sentinel(raw, "title"),
        image_url,
        categories: flatten_categories(raw.get("categories")),
        description: text_or_sentinel(raw, "description"),
    }
}

/// Collects every category name into a flat set.
///
/// Nested lists contribute each leaf, with null leaves recorded as [`NOT_AVAILABLE`]. Scalar
/// entries of the outer list are taken directly, null entries are skipped. Anything that is
/// not a list yields an empty set.
fn flatten_categories(value: Option<&Value>) -> BTreeSet<String> {
    let mut categories = BTreeSet::new();

    let Some(Value::Array(entries)) = value else {
        return categories;
    };

    for entry in entries {
        match entry {
            Value::Array(leaves) => {
                for leaf in leaves {
                    if leaf.is_null() {
                        categories.insert(NOT_AVAILABLE.to_owned());
                    } else if let Some(name) = scalar_text(leaf) {
                        categories.insert(name);
                    }
                }
            }
            other => {
                if let Some(name) = scalar_text(other) {
                    categories.insert(name);
                }
            }
        }
    }

    categories
}

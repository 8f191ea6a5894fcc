//! Projection of the raw data table into the output document
//!
//! Every raw entry repeats its own key as `name` and its category as `type`
//! (item-like entries often as `subgroup` too). Those fields are dropped so
//! the document only carries what the key and category do not already say.

use indexmap::IndexMap;
use modex_core::error::ModexError;
use modex_core::ModexResult;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Entries of one category, sorted by key
pub type CategoryEntries = BTreeMap<String, Value>;

/// What to do with a field of a raw entry
pub enum FieldFilter {
    /// Drop the field when it holds exactly this value
    Equal(Value),
    /// Replace the field with the result; `None` drops it
    Transform(Box<dyn Fn(&Value) -> Option<Value> + Send + Sync>),
}

impl FieldFilter {
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Transform(Box::new(f))
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        match self {
            FieldFilter::Equal(expected) if value == expected => None,
            FieldFilter::Equal(_) => Some(value.clone()),
            FieldFilter::Transform(f) => f(value),
        }
    }
}

impl fmt::Debug for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFilter::Equal(value) => f.debug_tuple("Equal").field(value).finish(),
            FieldFilter::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Filters keyed by field name
pub type FieldFilters = HashMap<String, FieldFilter>;

/// Filter every entry of a raw category bucket.
///
/// A `name` field equal to the entry's own key is always dropped; other
/// fields go through the filter registered for their name. A bucket that is
/// missing or not a table yields no entries. Entries that are not tables are
/// kept as they are.
pub fn filter_fields(bucket: Option<&Value>, filters: &FieldFilters) -> CategoryEntries {
    let Some(Value::Object(entries)) = bucket else {
        return CategoryEntries::new();
    };

    entries
        .iter()
        .map(|(key, entry)| (key.clone(), filter_entry(key, entry, filters)))
        .collect()
}

fn filter_entry(key: &str, entry: &Value, filters: &FieldFilters) -> Value {
    let Value::Object(fields) = entry else {
        return entry.clone();
    };

    let mut kept = Map::new();
    for (field, value) in fields {
        if field == "name" && value.as_str() == Some(key) {
            continue;
        }
        let value = match filters.get(field) {
            Some(filter) => filter.apply(value),
            None => Some(value.clone()),
        };
        if let Some(value) = value {
            kept.insert(field.clone(), value);
        }
    }
    Value::Object(kept)
}

/// Output key for a data category: camel case plus a trailing `s`
/// (`assembling-machine` becomes `assemblingMachines`)
pub fn plural_camel_case(category: &str) -> String {
    let mut out = String::with_capacity(category.len() + 1);
    let mut chars = category.chars().peekable();

    while let Some(c) = chars.next() {
        if matches!(c, '-' | '_') {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
    }

    out.push('s');
    out
}

/// Top-level key holding the item categories
pub const ITEMS_KEY: &str = "items";

/// The normalized document: `items` first, then one key per data category
#[derive(Debug, Default, Serialize)]
pub struct OutputDocument {
    pub items: IndexMap<String, CategoryEntries>,
    #[serde(flatten)]
    pub data: IndexMap<String, CategoryEntries>,
}

/// Builds an `OutputDocument` from the raw table
#[derive(Debug, Clone)]
pub struct Normalizer {
    item_types: Vec<String>,
    data_types: Vec<String>,
}

impl Normalizer {
    /// Fails when two data categories, or a data category and `items`,
    /// would be written under the same top-level key
    pub fn new(item_types: &[String], data_types: &[String]) -> ModexResult<Self> {
        let mut keys: HashMap<String, &str> = HashMap::new();
        for category in data_types {
            let key = plural_camel_case(category);
            let clash = if key == ITEMS_KEY {
                Some(ITEMS_KEY)
            } else {
                keys.get(&key).copied().filter(|other| *other != category.as_str())
            };
            if let Some(other) = clash {
                return Err(ModexError::ConfigValidation {
                    field: "categories.data".to_string(),
                    reason: format!(
                        "'{}' is written as '{}', which is already used by '{}'",
                        category, key, other
                    ),
                });
            }
            keys.insert(key, category.as_str());
        }

        Ok(Self {
            item_types: item_types.to_vec(),
            data_types: data_types.to_vec(),
        })
    }

    pub fn normalize(&self, raw: &Value) -> OutputDocument {
        let mut document = OutputDocument::default();

        for category in &self.item_types {
            let filters = FieldFilters::from([
                ("type".to_string(), FieldFilter::Equal(Value::from(category.as_str()))),
                ("subgroup".to_string(), FieldFilter::Equal(Value::from(category.as_str()))),
            ]);
            document
                .items
                .insert(category.clone(), filter_fields(raw.get(category), &filters));
        }

        for category in &self.data_types {
            let filters = FieldFilters::from([(
                "type".to_string(),
                FieldFilter::Equal(Value::from(category.as_str())),
            )]);
            document.data.insert(
                plural_camel_case(category),
                filter_fields(raw.get(category), &filters),
            );
        }

        document
    }
}

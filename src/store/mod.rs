//! Data store boundary.
//!
//! The query service only needs two primitives from the backing store: a
//! lookup by primary key (`id`) and a full-table scan with a filter
//! expression. [`RecordStore`] captures exactly that so the DynamoDB client
//! can be swapped for the in-memory store in tests and local runs.

mod dynamo;
mod memory;

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use dynamo::DynamoStore;
pub use memory::{InMemoryStore, SeedData};

/// A single record as returned by the store, keyed by attribute name.
pub type Item = Map<String, Value>;

/// Logical tables this service reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    BusinessProfile,
    UserProfile,
    Album,
    Reviews,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::BusinessProfile => "BusinessProfile",
            Table::UserProfile => "UserProfile",
            Table::Album => "Album",
            Table::Reviews => "Reviews",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical table names, one per [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub business_profile: String,
    pub user_profile: String,
    pub album: String,
    pub reviews: String,
}

impl TableNames {
    pub fn resolve(&self, table: Table) -> &str {
        match table {
            Table::BusinessProfile => &self.business_profile,
            Table::UserProfile => &self.user_profile,
            Table::Album => &self.album,
            Table::Reviews => &self.reviews,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            business_profile: "BusinessProfile-m2ruyuknqfcxhp4ndrmfewfdlm-dev".to_string(),
            user_profile: "UserProfile-n3zllqf5bnb7teipirimss4ene-dev".to_string(),
            album: "Album-m2ruyuknqfcxhp4ndrmfewfdlm-dev".to_string(),
            reviews: "Reviews-n3zllqf5bnb7teipirimss4ene-dev".to_string(),
        }
    }
}

/// How the conditions of a [`ScanFilter`] are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn keyword(&self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

/// A single attribute predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `attribute = value`
    Equals { attribute: String, value: Value },
    /// `contains(attribute, value)`: set/list membership or substring match.
    Contains { attribute: String, value: Value },
}

impl Condition {
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn contains(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        match self {
            Condition::Equals { attribute, .. } | Condition::Contains { attribute, .. } => attribute,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Condition::Equals { value, .. } | Condition::Contains { value, .. } => value,
        }
    }

    /// Evaluate this predicate against an item the way DynamoDB does.
    pub fn matches(&self, item: &Item) -> bool {
        let Some(actual) = item.get(self.attribute()) else {
            return false;
        };

        match self {
            Condition::Equals { value, .. } => actual == value,
            Condition::Contains { value, .. } => match (actual, value) {
                (Value::Array(members), needle) => members.contains(needle),
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
                _ => false,
            },
        }
    }
}

/// Filter applied to a full-table scan. No conditions means "match all".
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFilter {
    pub combinator: Combinator,
    pub conditions: Vec<Condition>,
}

impl ScanFilter {
    pub fn all() -> Self {
        Self {
            combinator: Combinator::And,
            conditions: Vec::new(),
        }
    }

    pub fn all_of(conditions: Vec<Condition>) -> Self {
        Self {
            combinator: Combinator::And,
            conditions,
        }
    }

    pub fn any_of(conditions: Vec<Condition>) -> Self {
        Self {
            combinator: Combinator::Or,
            conditions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, item: &Item) -> bool {
        if self.conditions.is_empty() {
            return true;
        }

        match self.combinator {
            Combinator::And => self.conditions.iter().all(|c| c.matches(item)),
            Combinator::Or => self.conditions.iter().any(|c| c.matches(item)),
        }
    }
}

impl fmt::Display for ScanFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return f.write_str("<all>");
        }

        for (index, condition) in self.conditions.iter().enumerate() {
            if index > 0 {
                f.write_str(self.combinator.keyword())?;
            }
            match condition {
                Condition::Equals { attribute, value } => write!(f, "{attribute} = {value}")?,
                Condition::Contains { attribute, value } => {
                    write!(f, "contains({attribute}, {value})")?
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{table} store request failed: {message}")]
    Upstream { table: Table, message: String },

    #[error("Failed to load seed data: {0}")]
    Seed(String),
}

/// Key lookup + filtered scan over the four record tables.
///
/// Used as `Arc<dyn RecordStore>`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record whose `id` equals `id`. `None` when absent.
    async fn get_item(&self, table: Table, id: &str) -> Result<Option<Item>, StoreError>;

    /// Scan `table`, keeping only records that satisfy `filter`.
    ///
    /// Result order is whatever the backend yields and must not be relied on
    /// beyond a single call.
    async fn scan(&self, table: Table, filter: &ScanFilter) -> Result<Vec<Item>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn contains_checks_list_membership_and_substrings() {
        let record = item(json!({ "tags": ["vegan", "bakery"], "name": "Green Cafe" }));

        assert!(Condition::contains("tags", "vegan").matches(&record));
        assert!(!Condition::contains("tags", "veg").matches(&record));
        assert!(Condition::contains("name", "Cafe").matches(&record));
        assert!(!Condition::contains("missing", "x").matches(&record));
    }

    #[test]
    fn equals_requires_exact_value() {
        let record = item(json!({ "businessState": "open" }));

        assert!(Condition::equals("businessState", "open").matches(&record));
        assert!(!Condition::equals("businessState", "Open").matches(&record));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ScanFilter::all().matches(&item(json!({ "id": "b1" }))));
        assert!(ScanFilter::any_of(vec![]).matches(&item(json!({}))));
    }

    #[test]
    fn combinators_join_conditions() {
        let record = item(json!({ "businessId": "b1", "userId": "u2" }));
        let conditions = vec![
            Condition::equals("businessId", "b1"),
            Condition::equals("userId", "u1"),
        ];

        assert!(ScanFilter::any_of(conditions.clone()).matches(&record));
        assert!(!ScanFilter::all_of(conditions).matches(&record));
    }

    #[test]
    fn filter_display_is_readable() {
        let filter = ScanFilter::any_of(vec![
            Condition::contains("tags", "vegan"),
            Condition::equals("businessState", "open"),
        ]);

        assert_eq!(
            filter.to_string(),
            r#"contains(tags, "vegan") OR businessState = "open""#
        );
        assert_eq!(ScanFilter::all().to_string(), "<all>");
    }
}

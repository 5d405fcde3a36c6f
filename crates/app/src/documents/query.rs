//! Document Queries

use std::cmp::Ordering;

use serde_json::Value;
use smallvec::SmallVec;

use super::Document;

/// A predicate on a top-level body field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        match self {
            Self::Eq { field, value } => body.get(field) == Some(value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderKey {
    CreatedAt,
    UpdatedAt,
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub key: OrderKey,
    pub direction: Direction,
}

impl OrderBy {
    #[must_use]
    pub const fn newest_first() -> Self {
        Self {
            key: OrderKey::CreatedAt,
            direction: Direction::Descending,
        }
    }

    pub(crate) fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ordering = match &self.key {
            OrderKey::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            OrderKey::Field(field) => compare_values(a.body.get(field), b.body.get(field)),
        };

        self.direction.apply(ordering)
    }
}

/// Filters and ordering for [`super::DocumentStore::list`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub filters: SmallVec<[Filter; 2]>,
    pub order_by: Option<OrderBy>,
}

impl DocumentQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(body))
    }
}

/// Missing fields sort first, then values of the same JSON type compare naturally. Mixed types
/// compare equal so their relative order is preserved.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn eq_filter_matches_exact_top_level_value() {
        let body = json!({ "code": "SAVE10", "uses": 3 });

        assert!(Filter::equals("code", "SAVE10").matches(&body));
        assert!(!Filter::equals("code", "save10").matches(&body));
        assert!(!Filter::equals("missing", "SAVE10").matches(&body));
        assert!(Filter::equals("uses", 3).matches(&body));
    }

    #[test]
    fn query_requires_every_filter() {
        let query = DocumentQuery::new()
            .filter(Filter::equals("status", "completed"))
            .filter(Filter::equals("customer_id", "c-1"));

        assert!(query.matches(&json!({ "status": "completed", "customer_id": "c-1" })));
        assert!(!query.matches(&json!({ "status": "completed", "customer_id": "c-2" })));
    }

    #[test]
    fn missing_values_sort_first() {
        let one = json!(1);

        assert_eq!(compare_values(None, Some(&one)), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
    }
}

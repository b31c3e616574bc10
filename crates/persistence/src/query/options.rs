//! Query options, pagination and result pages.

use serde::{Deserialize, Serialize};

use super::filter::Filter;

/// Sort direction of one order key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reverse(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Accepts `asc`/`desc` in any case; anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Multi-key sort, applied in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy(Vec<(String, SortDirection)>);

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key. A key that is already present keeps its first position.
    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let field = field.into();
        if !self.0.iter().any(|(f, _)| *f == field) {
            self.0.push((field, direction));
        }
        self
    }

    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys with `id` appended as the final tiebreaker, so every order is total.
    pub fn with_id_tiebreaker(&self) -> Vec<(String, SortDirection)> {
        let mut keys = self.0.clone();
        if !keys.iter().any(|(f, _)| f == "id") {
            keys.push(("id".to_string(), SortDirection::Asc));
        }
        keys
    }
}

/// Which way a cursor pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    #[default]
    Next,
    Prev,
}

/// `{limit, offset}` for relational stores, `{limit, cursor}` for document stores.
///
/// Adapters honour the mode their backend supports and ignore the other one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub direction: CursorDirection,
}

impl Pagination {
    pub fn offset(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Default::default()
        }
    }

    pub fn cursor(limit: u64, cursor: Option<String>) -> Self {
        Self {
            limit: Some(limit),
            cursor,
            ..Default::default()
        }
    }
}

/// Everything a `find_one` / `find_many` call can ask for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<Filter>,
    pub order: OrderBy,
    /// Projection; `id` is always returned
    pub select: Option<Vec<String>>,
    pub pagination: Option<Pagination>,
    /// Relations the caller would like loaded; adapters load none
    pub include: Vec<String>,
    /// Return soft-deleted records too
    pub include_deleted: bool,
    /// Index hint for stores that accept one
    pub index: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order = self.order.then(field, direction);
        self
    }

    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.pagination.get_or_insert_with(Pagination::default).limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.pagination.get_or_insert_with(Pagination::default).offset = Some(offset);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.pagination.get_or_insert_with(Pagination::default).cursor = Some(cursor.into());
        self
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.include.push(relation.into());
        self
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }
}

/// A reusable, named query predicate.
pub trait Specification: Send + Sync {
    fn to_filter(&self) -> Filter;

    fn to_query(&self) -> QueryOptions {
        QueryOptions::new().filter(self.to_filter())
    }
}

impl From<Filter> for QueryOptions {
    fn from(filter: Filter) -> Self {
        QueryOptions::new().filter(filter)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<D> {
    pub data: Vec<D>,
    /// Exact count of matching records, when the backend computes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_prev: Option<String>,
}

impl<D> Page<D> {
    pub fn new(data: Vec<D>) -> Self {
        Self {
            data,
            total: None,
            limit: None,
            offset: None,
            cursor_next: None,
            cursor_prev: None,
        }
    }

    pub fn map<T>(self, f: impl FnMut(D) -> T) -> Page<T> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            cursor_next: self.cursor_next,
            cursor_prev: self.cursor_prev,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<D> Default for Page<D> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_keeps_insertion_order_and_first_position() {
        let order = OrderBy::new()
            .then("created_datetime", SortDirection::Desc)
            .then("rut", SortDirection::Asc)
            .then("created_datetime", SortDirection::Asc);
        assert_eq!(
            order.keys(),
            &[
                ("created_datetime".to_string(), SortDirection::Desc),
                ("rut".to_string(), SortDirection::Asc)
            ]
        );
    }

    #[test]
    fn id_tiebreaker_is_appended_once() {
        let order = OrderBy::new().then("rut", SortDirection::Desc);
        assert_eq!(order.with_id_tiebreaker().last().unwrap().0, "id");
        let by_id = OrderBy::new().then("id", SortDirection::Desc);
        assert_eq!(
            by_id.with_id_tiebreaker(),
            vec![("id".to_string(), SortDirection::Desc)]
        );
    }

    #[test]
    fn page_serializes_in_camel_case_without_empty_fields() {
        let mut page = Page::new(vec![1, 2]);
        page.cursor_next = Some("b".to_string());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json, serde_json::json!({ "data": [1, 2], "cursorNext": "b" }));
    }

    #[test]
    fn builder_fills_pagination() {
        let q = QueryOptions::new().limit(10).offset(20);
        assert_eq!(q.pagination, Some(Pagination::offset(10, 20)));
    }
}

//! Compound filter / ordering / pagination vocabulary shared by every
//! entity store (spec.md §4.1).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An operator-tagged comparison against a single field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Filter {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Ge(String, Value),
    Lt(String, Value),
    Le(String, Value),
    In(String, Vec<Value>),
    Like(String, String),
    ILike(String, String),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(f, _)
            | Filter::Ne(f, _)
            | Filter::Gt(f, _)
            | Filter::Ge(f, _)
            | Filter::Lt(f, _)
            | Filter::Le(f, _)
            | Filter::In(f, _)
            | Filter::Like(f, _)
            | Filter::ILike(f, _) => f,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }
}

/// A page request. `page` is 1-indexed, matching the original system's API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page: page.max(1), page_size: page_size.max(1) }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) * self.page_size) as usize
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, page_size: 50 }
    }
}

/// A query over a single entity collection: filters are ANDed together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub page: Option<Page>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, f: Filter) -> Self {
        self.filters.push(f);
        self
    }

    pub fn order(mut self, o: OrderBy) -> Self {
        self.order_by.push(o);
        self
    }

    pub fn paginate(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

/// A page of results plus the total matching count (for pagination UIs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPage<T> {
    pub items: Vec<T>,
    pub total: usize,
}

//! Query description shared by all store backends.

use serde_json::Value;

use super::{Document, StoreError};

/// Comparison operator of a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    /// Whether this is a range (inequality) operator.
    #[must_use]
    pub const fn is_range(self) -> bool {
        !matches!(self, Self::Eq)
    }

    pub(crate) const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

/// `field op value`. Clauses are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Sort key. Ties are broken by document id in the same direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query.
///
/// ```rust,ignore
/// let query = Query::new()
///     .filter("isPublic", FilterOp::Eq, json!(true))
///     .order_by("createdAt", Direction::Descending)
///     .limit(10)
///     .start_after(cursor);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    /// Id of the last document of the previous page.
    pub cursor: Option<String>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_owned(),
            op,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_owned(),
            direction,
        });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn start_after(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Reject queries the backends cannot serve.
    ///
    /// Mirrors the composite-index rules of the original document database:
    /// range filters may only touch one field, and when present the query
    /// must be ordered by that same field.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidQuery` describing the violated rule.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.limit == Some(0) {
            return Err(StoreError::InvalidQuery("limit must be positive".to_owned()));
        }

        let mut range_field: Option<&str> = None;
        for filter in self.filters.iter().filter(|f| f.op.is_range()) {
            match range_field {
                Some(field) if field != filter.field => {
                    return Err(StoreError::InvalidQuery(format!(
                        "range filters on '{field}' and '{}' require a composite index",
                        filter.field
                    )));
                }
                _ => range_field = Some(&filter.field),
            }
        }

        if let (Some(range), Some(order)) = (range_field, &self.order_by)
            && order.field != range
        {
            return Err(StoreError::InvalidQuery(format!(
                "range filter on '{range}' requires ordering by '{range}' first, not '{}'",
                order.field
            )));
        }

        Ok(())
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Id of the last item, to pass back as the next cursor.
    pub next_cursor: Option<String>,
    /// A full page suggests more may follow.
    pub has_more: bool,
}

impl Page<Document> {
    /// Wrap a query result fetched with `limit`.
    #[must_use]
    pub fn from_documents(items: Vec<Document>, limit: usize) -> Self {
        let next_cursor = items.last().map(|d| d.id.clone());
        let has_more = items.len() == limit;
        Self {
            items,
            next_cursor,
            has_more,
        }
    }
}

impl<T> Page<T> {
    /// Convert every item, keeping the cursor.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        })
    }
}

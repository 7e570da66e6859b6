//! Select query builder shared by every [`DataGateway`](super::DataGateway).
//!
//! The builder only records intent; adapters decide how to execute it. The
//! `PostgREST` rendering lives here so it can be unit tested without HTTP.

use serde_json::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Column equality, used both as a select filter and as the row key for
/// updates and deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct Equals {
    pub column: String,
    pub value: Value,
}

impl Equals {
    /// `column = value`.
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `PostgREST` query pair, e.g. `("id", "eq.7")`.
    #[must_use]
    pub fn to_query_pair(&self) -> (String, String) {
        let rendered = match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        };
        (self.column.clone(), format!("eq.{rendered}"))
    }
}

/// A row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact match on one column.
    Equals(Equals),
    /// Case-insensitive substring match on any of the columns.
    ILikeAny { columns: Vec<String>, text: String },
}

/// A select against one table.
///
/// ```
/// use marys_fashion_storefront::gateway::{Direction, Select};
///
/// let query = Select::table("products")
///     .ilike_any(["name", "category"], "vest")
///     .order_by("created_at", Direction::Descending)
///     .limit(50);
///
/// assert_eq!(query.table_name(), "products");
/// assert_eq!(query.limit_value(), Some(50));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    filters: Vec<Filter>,
    order: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl Select {
    /// Select every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict the returned columns.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Keep rows where any of `columns` contains `text`, ignoring case.
    #[must_use]
    pub fn ilike_any<I, S>(mut self, columns: I, text: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(Filter::ILikeAny {
            columns: columns.into_iter().map(Into::into).collect(),
            text: text.into(),
        });
        self
    }

    /// Keep rows where `column = value`.
    #[must_use]
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Equals(Equals::new(column, value)));
        self
    }

    /// Sort by `column`.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    /// Return at most `n` rows.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Requested columns; empty means all.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub fn ordering(&self) -> Option<(&str, Direction)> {
        self.order
            .as_ref()
            .map(|(column, direction)| (column.as_str(), *direction))
    }

    #[must_use]
    pub const fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    /// Render as `PostgREST` query parameters (unencoded).
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        pairs.push(("select".to_string(), select));

        for filter in &self.filters {
            match filter {
                Filter::Equals(eq) => pairs.push(eq.to_query_pair()),
                Filter::ILikeAny { columns, text } => {
                    let pattern = quote_value(&format!("*{text}*"));
                    let alternatives = columns
                        .iter()
                        .map(|column| format!("{column}.ilike.{pattern}"))
                        .collect::<Vec<_>>()
                        .join(",");
                    pairs.push(("or".to_string(), format!("({alternatives})")));
                }
            }
        }

        if let Some((column, direction)) = &self.order {
            pairs.push((
                "order".to_string(),
                format!("{column}.{}", direction.as_str()),
            ));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

/// Double-quote a value inside a `PostgREST` logical filter so that commas,
/// dots and parentheses in user input are not parsed as syntax.
fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

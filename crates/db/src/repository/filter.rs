//! Query filters, ordering and pagination
//!
//! Provides the (field, operator, value) filter triples accepted by
//! `Repository::find_where`, the builder-pattern `QueryOptions`, and the
//! SurrealQL rendering shared by every filtered query.

use crate::codec::FieldValue;
use crate::error::{DbError, DbResult};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Comparison applied by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    LessThan,
    LessOrEqual,
    Equal,
    NotEqual,
    GreaterOrEqual,
    GreaterThan,
    /// The field is an array holding the value
    ArrayContains,
    /// The field is an array holding at least one of the listed values
    ArrayContainsAny,
    /// The field equals one of the listed values
    In,
    /// The field equals none of the listed values
    NotIn,
}

impl Operator {
    /// All operators, in declaration order
    pub const ALL: [Operator; 10] = [
        Operator::LessThan,
        Operator::LessOrEqual,
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterOrEqual,
        Operator::GreaterThan,
        Operator::ArrayContains,
        Operator::ArrayContainsAny,
        Operator::In,
        Operator::NotIn,
    ];

    /// Returns the conventional filter-operator spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterOrEqual => ">=",
            Operator::GreaterThan => ">",
            Operator::ArrayContains => "array-contains",
            Operator::ArrayContainsAny => "array-contains-any",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }

    /// Returns the SurrealQL operator
    pub fn surql(&self) -> &'static str {
        match self {
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterOrEqual => ">=",
            Operator::GreaterThan => ">",
            Operator::ArrayContains => "CONTAINS",
            Operator::ArrayContainsAny => "CONTAINSANY",
            Operator::In => "INSIDE",
            Operator::NotIn => "NOTINSIDE",
        }
    }

    /// Whether the store would match records lacking the field. Absent
    /// fields sort below every value and differ from all of them.
    fn matches_absent(&self) -> bool {
        matches!(
            self,
            Operator::LessThan | Operator::LessOrEqual | Operator::NotEqual | Operator::NotIn
        )
    }

    /// Whether the operator compares against a list of values
    pub fn requires_list(&self) -> bool {
        matches!(
            self,
            Operator::ArrayContainsAny | Operator::In | Operator::NotIn
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operator {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DbError::validation(format!("Unknown filter operator '{}'", s)))
    }
}

/// A single (field, operator, value) condition
///
/// Multiple filters passed together are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field path, dot-separated for nested fields
    pub field: String,
    /// Comparison to apply
    pub operator: Operator,
    /// Right-hand value
    pub value: FieldValue,
}

impl Filter {
    /// Create a filter from its parts
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::Equal, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::NotEqual, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::LessThan, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::LessOrEqual, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::GreaterThan, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::GreaterOrEqual, value)
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::ArrayContains, value)
    }

    pub fn array_contains_any<V: Into<FieldValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(field, Operator::ArrayContainsAny, FieldValue::list(values))
    }

    pub fn is_in<V: Into<FieldValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(field, Operator::In, FieldValue::list(values))
    }

    pub fn not_in<V: Into<FieldValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(field, Operator::NotIn, FieldValue::list(values))
    }

    /// Check the filter locally, before it reaches the store
    fn validate(&self) -> DbResult<()> {
        validate_field(&self.field)?;

        if self.operator.requires_list() {
            match &self.value {
                FieldValue::List(items) if !items.is_empty() => {}
                FieldValue::List(_) => {
                    return Err(DbError::validation(format!(
                        "Operator '{}' on '{}' needs a non-empty list",
                        self.operator, self.field
                    )));
                }
                _ => {
                    return Err(DbError::validation(format!(
                        "Operator '{}' on '{}' needs a list value",
                        self.operator, self.field
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Sort direction for ordered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the SurrealQL keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A single ORDER BY term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Sorting and limiting for `find_where`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Sort terms, applied in order
    pub order_by: Vec<OrderBy>,
    /// Maximum number of records returned
    pub limit: Option<usize>,
    /// Number of matching records skipped before the first returned
    pub start: Option<usize>,
}

impl QueryOptions {
    /// Create empty options (store order, no limit)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sort term
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Add an ascending sort term
    pub fn ascending(self, field: impl Into<String>) -> Self {
        self.order_by(field, SortDirection::Asc)
    }

    /// Add a descending sort term
    pub fn descending(self, field: impl Into<String>) -> Self {
        self.order_by(field, SortDirection::Desc)
    }

    /// Cap the number of returned records
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `start` matching records
    pub fn start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }
}

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    /// Records skipped before this page, saturating at `usize::MAX`
    pub fn offset(&self) -> usize {
        self.checked_offset().unwrap_or(usize::MAX)
    }

    fn checked_offset(&self) -> Option<usize> {
        self.page.saturating_sub(1).checked_mul(self.per_page)
    }

    fn validate(&self) -> DbResult<()> {
        if self.page == 0 {
            return Err(DbError::validation("Page numbers start at 1"));
        }
        if self.per_page == 0 {
            return Err(DbError::validation("Page size must be at least 1"));
        }
        if self.checked_offset().is_none() {
            return Err(DbError::validation(format!(
                "Page {} of size {} is out of range",
                self.page, self.per_page
            )));
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// One page of records plus totals for the whole filtered set
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    /// Number of records matching the filters across all pages
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, request: PageRequest, total: usize) -> Self {
        let total_pages = total.div_ceil(request.per_page);
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages,
            has_more: request.page < total_pages,
        }
    }
}

/// Rendered WHERE clause and the parameters it references
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    /// Either empty or a leading-space ` WHERE ...` fragment
    pub clause: String,
    pub params: BTreeMap<String, FieldValue>,
}

/// Render filters as a conjunctive WHERE clause with bound parameters.
///
/// Values never appear in the query text; each is bound as `$f<n>`.
/// Records without the filtered field never match.
pub(crate) fn build_conditions(filters: &[Filter]) -> DbResult<Conditions> {
    let mut conditions = Conditions::default();
    let mut terms = Vec::with_capacity(filters.len());

    for (index, filter) in filters.iter().enumerate() {
        filter.validate()?;
        let param = format!("f{}", index);
        let field = render_field(&filter.field);
        let term = format!("{} {} ${}", field, filter.operator.surql(), param);
        if filter.operator.matches_absent() {
            terms.push(format!("({} != NONE AND {})", field, term));
        } else {
            terms.push(term);
        }
        conditions.params.insert(param, filter.value.clone());
    }

    if !terms.is_empty() {
        conditions.clause = format!(" WHERE {}", terms.join(" AND "));
    }

    Ok(conditions)
}

/// Render ORDER BY / LIMIT / START for the given options
pub(crate) fn build_tail(options: &QueryOptions) -> DbResult<String> {
    let mut tail = String::new();

    if !options.order_by.is_empty() {
        let mut terms = Vec::with_capacity(options.order_by.len());
        for order in &options.order_by {
            validate_field(&order.field)?;
            terms.push(format!(
                "{} {}",
                render_field(&order.field),
                order.direction.as_str()
            ));
        }
        tail.push_str(&format!(" ORDER BY {}", terms.join(", ")));
    }

    if let Some(limit) = options.limit {
        if limit == 0 {
            return Err(DbError::validation("Query limit must be at least 1"));
        }
        tail.push_str(&format!(" LIMIT {}", limit));
    }

    if let Some(start) = options.start {
        tail.push_str(&format!(" START {}", start));
    }

    Ok(tail)
}

/// Options for one page of a filtered query
pub(crate) fn page_options(options: &QueryOptions, page: PageRequest) -> DbResult<QueryOptions> {
    page.validate()?;
    Ok(QueryOptions {
        order_by: options.order_by.clone(),
        limit: Some(page.per_page),
        start: Some(page.offset()),
    })
}

/// Validate a dot-separated field path.
///
/// Each segment must be an identifier (`[A-Za-z_][A-Za-z0-9_]*`). `id` is
/// rejected as a top-level write target elsewhere; here it is allowed so
/// callers may filter and sort on it.
pub(crate) fn validate_field(field: &str) -> DbResult<()> {
    if field.is_empty() {
        return Err(DbError::validation("Field name cannot be empty"));
    }

    for segment in field.split('.') {
        let mut chars = segment.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_start || !valid_rest {
            return Err(DbError::validation(format!(
                "Invalid field name '{}'",
                field
            )));
        }
    }

    Ok(())
}

/// Render a validated field path with escaped segments
pub(crate) fn render_field(field: &str) -> String {
    field
        .split('.')
        .map(|segment| format!("`{}`", segment))
        .collect::<Vec<_>>()
        .join(".")
}

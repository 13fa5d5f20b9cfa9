mod predicate;
mod render;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

pub use predicate::{ColumnRef, CompareOperator, Predicate};

/// One result row keyed by column name.
pub type Row = Map<String, Value>;

/// Columns requested from one table of a select.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Every column of the table.
    #[default]
    All,
    /// The listed columns only.
    Named(Vec<String>),
}

impl ColumnSelection {
    /// Builds an explicit column list.
    #[must_use]
    pub fn named(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Named(columns.into_iter().map(Into::into).collect())
    }

    /// Selects nothing from a joined table.
    #[must_use]
    pub fn none() -> Self {
        Self::Named(Vec::new())
    }

    /// Returns whether this is a wildcard selection.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Join behavior for missing right-hand rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Only rows with a match on both sides.
    Inner,
    /// Main rows are kept when no joined row matches.
    Left,
}

impl JoinKind {
    /// Returns the SQL spelling of the join.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// Equality join of another table onto the main table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Joined table.
    pub table: String,
    /// Join behavior.
    pub kind: JoinKind,
    /// Column of the main table.
    pub left_column: String,
    /// Column of the joined table equal to `left_column`.
    pub right_column: String,
    /// Columns read from the joined table.
    pub columns: ColumnSelection,
}

impl Join {
    /// Creates an inner join on `main.left_column = table.right_column`.
    #[must_use]
    pub fn inner(
        table: impl Into<String>,
        left_column: impl Into<String>,
        right_column: impl Into<String>,
        columns: ColumnSelection,
    ) -> Self {
        Self {
            table: table.into(),
            kind: JoinKind::Inner,
            left_column: left_column.into(),
            right_column: right_column.into(),
            columns,
        }
    }

    /// Creates a left join on `main.left_column = table.right_column`.
    #[must_use]
    pub fn left(
        table: impl Into<String>,
        left_column: impl Into<String>,
        right_column: impl Into<String>,
        columns: ColumnSelection,
    ) -> Self {
        Self {
            kind: JoinKind::Left,
            ..Self::inner(table, left_column, right_column, columns)
        }
    }
}

/// Result ordering direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the SQL spelling of the direction.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Sorted column.
    pub column: ColumnRef,
    /// Sort direction.
    pub direction: SortDirection,
}

/// Structured select.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// Main table.
    pub table: String,
    /// Columns read from the main table.
    pub columns: ColumnSelection,
    /// Joined tables.
    pub joins: Vec<Join>,
    /// Row filter.
    pub predicate: Predicate,
    /// Ordering instructions.
    pub order_by: Vec<OrderBy>,
    /// Maximum rows returned.
    pub limit: Option<usize>,
}

impl SelectQuery {
    /// Creates a wildcard select over every row of a table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: ColumnSelection::All,
            joins: Vec::new(),
            predicate: Predicate::All,
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Sets the main table columns.
    #[must_use]
    pub fn columns(mut self, columns: ColumnSelection) -> Self {
        self.columns = columns;
        self
    }

    /// Adds a join.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Narrows the row filter with an additional conjunct.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = std::mem::take(&mut self.predicate).and(predicate);
        self
    }

    /// Appends an ordering instruction.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<ColumnRef>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the (table, columns) pairs read by this select, main table first.
    #[must_use]
    pub fn read_targets(&self) -> Vec<(&str, &ColumnSelection)> {
        std::iter::once((self.table.as_str(), &self.columns))
            .chain(
                self.joins
                    .iter()
                    .map(|join| (join.table.as_str(), &join.columns)),
            )
            .collect()
    }
}

/// Structured insert of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    /// Target table.
    pub table: String,
    /// Column values.
    pub values: BTreeMap<String, Value>,
}

impl InsertQuery {
    /// Creates an insert without values.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: BTreeMap::new(),
        }
    }

    /// Creates an insert from a row.
    #[must_use]
    pub fn from_row(table: impl Into<String>, row: Row) -> Self {
        Self {
            table: table.into(),
            values: row.into_iter().collect(),
        }
    }

    /// Sets one column value.
    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Returns the inserted column names.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Structured update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    /// Target table.
    pub table: String,
    /// Assigned column values.
    pub set: BTreeMap<String, Value>,
    /// Row filter.
    pub predicate: Predicate,
}

impl UpdateQuery {
    /// Creates an update over every row of a table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            set: BTreeMap::new(),
            predicate: Predicate::All,
        }
    }

    /// Assigns one column.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(column.into(), value.into());
        self
    }

    /// Narrows the row filter with an additional conjunct.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = std::mem::take(&mut self.predicate).and(predicate);
        self
    }

    /// Returns the assigned column names.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.set.keys().map(String::as_str)
    }
}

/// Structured delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    /// Target table.
    pub table: String,
    /// Row filter.
    pub predicate: Predicate,
}

impl DeleteQuery {
    /// Creates a delete over every row of a table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicate: Predicate::All,
        }
    }

    /// Narrows the row filter with an additional conjunct.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = std::mem::take(&mut self.predicate).and(predicate);
        self
    }
}

/// Any of the four structured query shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Read rows.
    Select(SelectQuery),
    /// Insert one row.
    Insert(InsertQuery),
    /// Update matching rows.
    Update(UpdateQuery),
    /// Delete matching rows.
    Delete(DeleteQuery),
}

impl Query {
    /// Returns the target table.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::Select(query) => query.table.as_str(),
            Self::Insert(query) => query.table.as_str(),
            Self::Update(query) => query.table.as_str(),
            Self::Delete(query) => query.table.as_str(),
        }
    }
}

impl From<SelectQuery> for Query {
    fn from(value: SelectQuery) -> Self {
        Self::Select(value)
    }
}

impl From<InsertQuery> for Query {
    fn from(value: InsertQuery) -> Self {
        Self::Insert(value)
    }
}

impl From<UpdateQuery> for Query {
    fn from(value: UpdateQuery) -> Self {
        Self::Update(value)
    }
}

impl From<DeleteQuery> for Query {
    fn from(value: DeleteQuery) -> Self {
        Self::Delete(value)
    }
}

/// Storage response to an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Rows written.
    pub affected_rows: u64,
    /// Generated or supplied primary key of the new row.
    pub last_insert_id: Option<i64>,
}

/// Storage response to any structured query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Rows read by a select.
    Rows(Vec<Row>),
    /// Result of an insert.
    Inserted(InsertOutcome),
    /// Rows changed by an update or delete.
    Affected(u64),
}

/// Returns the first composite (array or object) column value, if any.
#[must_use]
pub fn first_composite_value<'a>(
    values: impl IntoIterator<Item = (&'a String, &'a Value)>,
) -> Option<&'a str> {
    values
        .into_iter()
        .find(|(_, value)| value.is_array() || value.is_object())
        .map(|(column, _)| column.as_str())
}

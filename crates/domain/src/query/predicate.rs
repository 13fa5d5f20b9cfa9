use serde_json::Value;

/// Possibly table-qualified column reference such as `recipients.read`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Qualifying table, if any.
    pub table: Option<String>,
    /// Column name.
    pub column: String,
}

impl ColumnRef {
    /// Parses `column` or `table.column`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.split_once('.') {
            Some((table, column)) => Self::qualified(table, column),
            None => Self {
                table: None,
                column: value.to_owned(),
            },
        }
    }

    /// Creates a table-qualified reference.
    #[must_use]
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for ColumnRef {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOperator {
    /// Equality.
    Eq,
    /// Inequality.
    Neq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
}

impl CompareOperator {
    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// Row-selecting boolean expression.
///
/// The enforcement layer treats predicates as opaque and only forwards them;
/// storage adapters evaluate them.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Predicate {
    /// Matches every row.
    #[default]
    All,
    /// Compares a column with a scalar.
    Compare {
        /// Compared column.
        column: ColumnRef,
        /// Comparison operator.
        operator: CompareOperator,
        /// Scalar operand.
        value: Value,
    },
    /// Column value is one of the listed scalars.
    In {
        /// Compared column.
        column: ColumnRef,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Column value is null.
    IsNull {
        /// Checked column.
        column: ColumnRef,
    },
    /// Every child matches.
    And(Vec<Predicate>),
    /// At least one child matches.
    Or(Vec<Predicate>),
    /// Child does not match.
    Not(Box<Predicate>),
}

impl Predicate {
    fn compare(column: impl Into<ColumnRef>, operator: CompareOperator, value: Value) -> Self {
        Self::Compare {
            column: column.into(),
            operator,
            value,
        }
    }

    /// `column = value`
    #[must_use]
    pub fn eq(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOperator::Eq, value.into())
    }

    /// `column <> value`
    #[must_use]
    pub fn neq(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOperator::Neq, value.into())
    }

    /// `column > value`
    #[must_use]
    pub fn gt(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOperator::Gt, value.into())
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOperator::Gte, value.into())
    }

    /// `column < value`
    #[must_use]
    pub fn lt(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOperator::Lt, value.into())
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(column: impl Into<ColumnRef>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOperator::Lte, value.into())
    }

    /// `column IN (values)`
    #[must_use]
    pub fn in_list(
        column: impl Into<ColumnRef>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(column: impl Into<ColumnRef>) -> Self {
        Self::IsNull {
            column: column.into(),
        }
    }

    /// Conjunction that flattens nested `And` nodes and drops match-all operands.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::All, other) => other,
            (this, Self::All) => this,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), right) => {
                left.push(right);
                Self::And(left)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Disjunction; a match-all operand makes the whole expression match-all.
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (Self::Or(mut left), right) => {
                left.push(right);
                Self::Or(left)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Negation.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Returns whether this predicate trivially matches every row.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns every column the expression references.
    #[must_use]
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns<'a>(&'a self, columns: &mut Vec<&'a ColumnRef>) {
        match self {
            Self::All => {}
            Self::Compare { column, .. } | Self::In { column, .. } | Self::IsNull { column } => {
                columns.push(column);
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_columns(columns);
                }
            }
            Self::Not(child) => child.collect_columns(columns),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ColumnRef, Predicate};

    #[test]
    fn and_drops_match_all_and_flattens() {
        let predicate = Predicate::All
            .and(Predicate::eq("id", 1))
            .and(Predicate::eq("active", 1))
            .and(Predicate::All);

        match predicate {
            Predicate::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn or_with_match_all_matches_everything() {
        assert!(Predicate::eq("id", 1).or(Predicate::All).is_all());
    }

    #[test]
    fn qualified_columns_are_parsed() {
        let column = ColumnRef::parse("recipients.read");
        assert_eq!(column.table.as_deref(), Some("recipients"));
        assert_eq!(column.column, "read");

        let predicate = Predicate::in_list("recipients.message_id", [json!(1), json!(2)])
            .and(Predicate::is_null("response_to").negate());
        let names: Vec<&str> = predicate
            .columns()
            .into_iter()
            .map(|column| column.column.as_str())
            .collect();
        assert_eq!(names, vec!["message_id", "response_to"]);
    }
}

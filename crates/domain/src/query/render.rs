use std::fmt::{Display, Formatter, Result};

use serde_json::Value;

use super::{
    ColumnRef, ColumnSelection, DeleteQuery, InsertQuery, Predicate, Query, SelectQuery,
    UpdateQuery,
};

struct Identifier<'a>(&'a str);

impl Display for Identifier<'_> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        write!(formatter, "\"{}\"", self.0.replace('"', "\"\""))
    }
}

struct Literal<'a>(&'a Value);

impl Display for Literal<'_> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        match self.0 {
            Value::Null => formatter.write_str("NULL"),
            Value::Bool(value) => formatter.write_str(if *value { "TRUE" } else { "FALSE" }),
            Value::Number(value) => write!(formatter, "{value}"),
            Value::String(value) => write!(formatter, "'{}'", value.replace('\'', "''")),
            composite => write!(formatter, "'{}'", composite.to_string().replace('\'', "''")),
        }
    }
}

impl Display for ColumnRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        if let Some(table) = &self.table {
            write!(formatter, "{}.", Identifier(table))?;
        }
        write!(formatter, "{}", Identifier(&self.column))
    }
}

fn write_list<T>(
    formatter: &mut Formatter<'_>,
    items: impl IntoIterator<Item = T>,
    mut write_item: impl FnMut(&mut Formatter<'_>, T) -> Result,
) -> Result {
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            formatter.write_str(", ")?;
        }
        write_item(formatter, item)?;
    }
    Ok(())
}

impl Display for Predicate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        match self {
            Self::All => formatter.write_str("TRUE"),
            Self::Compare {
                column,
                operator,
                value,
            } => write!(
                formatter,
                "{column} {} {}",
                operator.as_sql(),
                Literal(value)
            ),
            Self::In { column, values } => {
                write!(formatter, "{column} IN (")?;
                write_list(formatter, values, |formatter, value| {
                    write!(formatter, "{}", Literal(value))
                })?;
                formatter.write_str(")")
            }
            Self::IsNull { column } => write!(formatter, "{column} IS NULL"),
            Self::And(children) | Self::Or(children) => {
                let joiner = if matches!(self, Self::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                formatter.write_str("(")?;
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(joiner)?;
                    }
                    write!(formatter, "{child}")?;
                }
                formatter.write_str(")")
            }
            Self::Not(child) => write!(formatter, "NOT ({child})"),
        }
    }
}

fn write_where(formatter: &mut Formatter<'_>, predicate: &Predicate) -> Result {
    if predicate.is_all() {
        return Ok(());
    }
    write!(formatter, " WHERE {predicate}")
}

impl Display for SelectQuery {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        formatter.write_str("SELECT ")?;

        let mut projections: Vec<String> = Vec::new();
        for (table, columns) in self.read_targets() {
            match columns {
                ColumnSelection::All => projections.push(format!("{}.*", Identifier(table))),
                ColumnSelection::Named(names) => projections.extend(
                    names
                        .iter()
                        .map(|name| format!("{}.{}", Identifier(table), Identifier(name))),
                ),
            }
        }
        if projections.is_empty() {
            formatter.write_str("NULL")?;
        } else {
            formatter.write_str(projections.join(", ").as_str())?;
        }

        write!(formatter, " FROM {}", Identifier(&self.table))?;
        for join in &self.joins {
            write!(
                formatter,
                " {} {} ON {}.{} = {}.{}",
                join.kind.as_sql(),
                Identifier(&join.table),
                Identifier(&self.table),
                Identifier(&join.left_column),
                Identifier(&join.table),
                Identifier(&join.right_column)
            )?;
        }

        write_where(formatter, &self.predicate)?;

        if !self.order_by.is_empty() {
            formatter.write_str(" ORDER BY ")?;
            write_list(formatter, &self.order_by, |formatter, order| {
                write!(formatter, "{} {}", order.column, order.direction.as_sql())
            })?;
        }

        if let Some(limit) = self.limit {
            write!(formatter, " LIMIT {limit}")?;
        }

        Ok(())
    }
}

impl Display for InsertQuery {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        write!(formatter, "INSERT INTO {} (", Identifier(&self.table))?;
        write_list(formatter, self.values.keys(), |formatter, column| {
            write!(formatter, "{}", Identifier(column))
        })?;
        formatter.write_str(") VALUES (")?;
        write_list(formatter, self.values.values(), |formatter, value| {
            write!(formatter, "{}", Literal(value))
        })?;
        formatter.write_str(")")
    }
}

impl Display for UpdateQuery {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        write!(formatter, "UPDATE {} SET ", Identifier(&self.table))?;
        write_list(formatter, &self.set, |formatter, (column, value)| {
            write!(formatter, "{} = {}", Identifier(column), Literal(value))
        })?;
        write_where(formatter, &self.predicate)
    }
}

impl Display for DeleteQuery {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        write!(formatter, "DELETE FROM {}", Identifier(&self.table))?;
        write_where(formatter, &self.predicate)
    }
}

impl Display for Query {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result {
        match self {
            Self::Select(query) => query.fmt(formatter),
            Self::Insert(query) => query.fmt(formatter),
            Self::Update(query) => query.fmt(formatter),
            Self::Delete(query) => query.fmt(formatter),
        }
    }
}

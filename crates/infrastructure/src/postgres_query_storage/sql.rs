use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use tablegate_core::{StorageError, StorageResult};
use tablegate_domain::{
    ColumnRef, ColumnSelection, DeleteQuery, InsertQuery, Predicate, SelectQuery, SortDirection,
    UpdateQuery,
};

/// `jsonb_build_object` accepts at most 100 arguments.
const COLUMNS_PER_OBJECT: usize = 50;

const SOURCE_ALIAS: &str = "\"tablegate_source\"";

pub(super) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds a select producing one jsonb object per row.
///
/// Joined objects are concatenated before the main table's so main-table keys win.
/// An unmatched left join selecting every column contributes no keys.
pub(super) fn select_statement(query: &SelectQuery) -> StorageResult<QueryBuilder<'static, Postgres>> {
    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new("SELECT ");

    let mut wrote_object = false;
    for join in query.joins.iter().rev() {
        wrote_object |= push_row_object(&mut builder, join.table.as_str(), &join.columns, wrote_object);
    }
    wrote_object |= push_row_object(&mut builder, query.table.as_str(), &query.columns, wrote_object);
    if !wrote_object {
        builder.push("'{}'::jsonb");
    }

    builder.push(" FROM ");
    builder.push(quote_identifier(query.table.as_str()));

    for join in &query.joins {
        builder.push(" ");
        builder.push(join.kind.as_sql());
        builder.push(" ");
        builder.push(quote_identifier(join.table.as_str()));
        builder.push(" ON ");
        push_column(
            &mut builder,
            query.table.as_str(),
            &ColumnRef::qualified(query.table.as_str(), join.left_column.as_str()),
        );
        builder.push(" = ");
        push_column(
            &mut builder,
            query.table.as_str(),
            &ColumnRef::qualified(join.table.as_str(), join.right_column.as_str()),
        );
    }

    push_where(&mut builder, query.table.as_str(), &query.predicate);

    for (index, order) in query.order_by.iter().enumerate() {
        builder.push(if index == 0 { " ORDER BY " } else { ", " });
        push_column(&mut builder, query.table.as_str(), &order.column);
        builder.push(match order.direction {
            SortDirection::Asc => " ASC NULLS FIRST",
            SortDirection::Desc => " DESC NULLS LAST",
        });
    }

    if let Some(limit) = query.limit {
        let limit = i64::try_from(limit)
            .map_err(|error| StorageError::InvalidQuery(format!("invalid limit: {error}")))?;
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    Ok(builder)
}

/// Builds an insert typed through the table's row type, returning the primary key.
pub(super) fn insert_statement(query: &InsertQuery, primary_key: &str) -> QueryBuilder<'static, Postgres> {
    let table = quote_identifier(query.table.as_str());
    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new("INSERT INTO ");
    builder.push(table.as_str());

    if query.values.is_empty() {
        builder.push(" DEFAULT VALUES");
    } else {
        let columns = query
            .columns()
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join(", ");

        builder.push(" (");
        builder.push(columns.as_str());
        builder.push(") SELECT ");
        builder.push(columns.as_str());
        builder.push(" FROM jsonb_populate_record(NULL::");
        builder.push(table.as_str());
        builder.push(", ");
        builder.push_bind(Value::Object(
            query
                .values
                .iter()
                .map(|(column, value)| (column.clone(), value.clone()))
                .collect(),
        ));
        builder.push(")");
    }

    builder.push(" RETURNING to_jsonb(");
    builder.push(quote_identifier(primary_key));
    builder.push(")");

    builder
}

pub(super) fn update_statement(query: &UpdateQuery) -> StorageResult<QueryBuilder<'static, Postgres>> {
    if query.set.is_empty() {
        return Err(StorageError::InvalidQuery(format!(
            "update of table '{}' sets no columns",
            query.table
        )));
    }

    let table = quote_identifier(query.table.as_str());
    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new("UPDATE ");
    builder.push(table.as_str());
    builder.push(" SET ");

    for (index, column) in query.columns().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        let column = quote_identifier(column);
        builder.push(column.as_str());
        builder.push(" = ");
        builder.push(SOURCE_ALIAS);
        builder.push(".");
        builder.push(column.as_str());
    }

    builder.push(" FROM jsonb_populate_record(NULL::");
    builder.push(table.as_str());
    builder.push(", ");
    builder.push_bind(Value::Object(
        query
            .set
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect(),
    ));
    builder.push(") AS ");
    builder.push(SOURCE_ALIAS);

    push_where(&mut builder, query.table.as_str(), &query.predicate);
    Ok(builder)
}

pub(super) fn delete_statement(query: &DeleteQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new("DELETE FROM ");
    builder.push(quote_identifier(query.table.as_str()));
    push_where(&mut builder, query.table.as_str(), &query.predicate);
    builder
}

/// Appends ` || ` unless first, then the object for one table. Returns whether anything was written.
fn push_row_object(
    builder: &mut QueryBuilder<'static, Postgres>,
    table: &str,
    selection: &ColumnSelection,
    after_object: bool,
) -> bool {
    match selection {
        ColumnSelection::All => {
            if after_object {
                builder.push(" || ");
            }
            builder.push("COALESCE(to_jsonb(");
            builder.push(quote_identifier(table));
            builder.push(".*), '{}'::jsonb)");
            true
        }
        ColumnSelection::Named(columns) if columns.is_empty() => false,
        ColumnSelection::Named(columns) => {
            for (index, chunk) in columns.chunks(COLUMNS_PER_OBJECT).enumerate() {
                if after_object || index > 0 {
                    builder.push(" || ");
                }
                builder.push("jsonb_build_object(");
                for (position, column) in chunk.iter().enumerate() {
                    if position > 0 {
                        builder.push(", ");
                    }
                    builder.push_bind(column.clone());
                    builder.push("::text, ");
                    push_column(builder, table, &ColumnRef::qualified(table, column.as_str()));
                }
                builder.push(")");
            }
            true
        }
    }
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, table: &str, predicate: &Predicate) {
    if predicate.is_all() {
        return;
    }

    builder.push(" WHERE ");
    push_predicate(builder, table, predicate);
}

fn push_column(builder: &mut QueryBuilder<'static, Postgres>, default_table: &str, column: &ColumnRef) {
    builder.push(quote_identifier(column.table.as_deref().unwrap_or(default_table)));
    builder.push(".");
    builder.push(quote_identifier(column.column.as_str()));
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, table: &str, predicate: &Predicate) {
    match predicate {
        Predicate::All => {
            builder.push("TRUE");
        }
        Predicate::Compare {
            column,
            operator,
            value,
        } => {
            // jsonb orders across types; only same-typed scalars compare.
            if value.is_null() {
                builder.push("FALSE");
                return;
            }

            builder.push("(jsonb_typeof(to_jsonb(");
            push_column(builder, table, column);
            builder.push(")) = jsonb_typeof(");
            builder.push_bind(value.clone());
            builder.push(") AND to_jsonb(");
            push_column(builder, table, column);
            builder.push(") ");
            builder.push(operator.as_sql());
            builder.push(" ");
            builder.push_bind(value.clone());
            builder.push(")");
        }
        Predicate::In { column, values } => {
            if values.is_empty() {
                builder.push("FALSE");
                return;
            }

            builder.push("to_jsonb(");
            push_column(builder, table, column);
            builder.push(") IN (");
            {
                let mut separated = builder.separated(", ");
                for value in values {
                    separated.push_bind(value.clone());
                }
            }
            builder.push(")");
        }
        Predicate::IsNull { column } => {
            push_column(builder, table, column);
            builder.push(" IS NULL");
        }
        Predicate::And(children) => push_group(builder, table, children, " AND ", "TRUE"),
        Predicate::Or(children) => push_group(builder, table, children, " OR ", "FALSE"),
        Predicate::Not(child) => {
            builder.push("NOT COALESCE((");
            push_predicate(builder, table, child);
            builder.push("), FALSE)");
        }
    }
}

fn push_group(
    builder: &mut QueryBuilder<'static, Postgres>,
    table: &str,
    children: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if children.is_empty() {
        builder.push(empty);
        return;
    }

    builder.push("(");
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_predicate(builder, table, child);
    }
    builder.push(")");
}

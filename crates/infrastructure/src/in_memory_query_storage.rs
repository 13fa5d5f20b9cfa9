use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use tablegate_application::QueryStorage;
use tablegate_core::{StorageError, StorageResult};
use tablegate_domain::{
    ColumnRef, ColumnSelection, DeleteQuery, InsertOutcome, InsertQuery, JoinKind, Predicate, Row,
    SelectQuery, SortDirection, TableSchema, UpdateQuery,
};

mod evaluate;


use evaluate::{ScopeEntry, predicate_matches, resolve_value, sort_ordering, values_equal};

#[derive(Debug, Clone)]
struct MemoryTable {
    columns: Vec<String>,
    primary_key: String,
    rows: Vec<Row>,
    next_id: i64,
}

impl MemoryTable {
    fn from_schema(schema: &TableSchema) -> Self {
        Self {
            columns: schema.columns().to_vec(),
            primary_key: schema.primary_key().to_owned(),
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|candidate| candidate == column)
    }

    fn pk_taken(&self, value: &Value, skip: &[usize]) -> bool {
        self.rows.iter().enumerate().any(|(index, row)| {
            !skip.contains(&index)
                && row
                    .get(self.primary_key.as_str())
                    .is_some_and(|stored| values_equal(stored, value))
        })
    }

    fn project(&self, row: Option<&Row>, selection: &ColumnSelection, output: &mut Row) {
        let columns: &[String] = match selection {
            ColumnSelection::All => self.columns.as_slice(),
            ColumnSelection::Named(columns) => columns.as_slice(),
        };

        for column in columns {
            let value = row
                .and_then(|row| row.get(column.as_str()))
                .cloned()
                .unwrap_or(Value::Null);
            output.entry(column.clone()).or_insert(value);
        }
    }
}

/// In-memory query storage over tables created from catalog entries.
///
/// Integer primary keys auto-increment when omitted and are unique per table.
#[derive(Debug, Default)]
pub struct InMemoryQueryStorage {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl InMemoryQueryStorage {
    /// Creates an empty storage without tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage with one empty table per catalog entry.
    #[must_use]
    pub fn with_tables<'a>(schemas: impl IntoIterator<Item = &'a TableSchema>) -> Self {
        let tables = schemas
            .into_iter()
            .map(|schema| (schema.name().as_str().to_owned(), MemoryTable::from_schema(schema)))
            .collect();

        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Creates or replaces an empty table.
    pub async fn create_table(&self, schema: &TableSchema) {
        self.tables.write().await.insert(
            schema.name().as_str().to_owned(),
            MemoryTable::from_schema(schema),
        );
    }

    /// Returns every stored row of a table, bypassing any access control.
    pub async fn dump(&self, table: &str) -> StorageResult<Vec<Row>> {
        let tables = self.tables.read().await;
        Ok(lookup_table(&tables, table)?.rows.clone())
    }
}

#[async_trait]
impl QueryStorage for InMemoryQueryStorage {
    async fn select(&self, query: &SelectQuery) -> StorageResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let main = lookup_table(&tables, query.table.as_str())?;

        let mut participants: Vec<(&str, &MemoryTable)> = vec![(query.table.as_str(), main)];
        for join in &query.joins {
            let joined = lookup_table(&tables, join.table.as_str())?;
            require_column(query.table.as_str(), main, join.left_column.as_str())?;
            require_column(join.table.as_str(), joined, join.right_column.as_str())?;
            require_selection(join.table.as_str(), joined, &join.columns)?;
            participants.push((join.table.as_str(), joined));
        }
        require_selection(query.table.as_str(), main, &query.columns)?;
        for column in query.predicate.columns() {
            require_scoped_column(&participants, column)?;
        }
        for order in &query.order_by {
            require_scoped_column(&participants, &order.column)?;
        }

        let mut scopes: Vec<Vec<ScopeEntry<'_>>> = main
            .rows
            .iter()
            .map(|row| vec![(query.table.as_str(), Some(row))])
            .collect();

        for join in &query.joins {
            let joined = &lookup_table(&tables, join.table.as_str())?.rows;

            let mut expanded = Vec::with_capacity(scopes.len());
            for scope in scopes {
                let left_value = scope
                    .first()
                    .and_then(|(_, row)| *row)
                    .and_then(|row| row.get(join.left_column.as_str()));

                let matches: Vec<&Row> = joined
                    .iter()
                    .filter(|candidate| {
                        match (left_value, candidate.get(join.right_column.as_str())) {
                            (Some(left), Some(right)) => values_equal(left, right),
                            _ => false,
                        }
                    })
                    .collect();

                if matches.is_empty() {
                    if join.kind == JoinKind::Left {
                        let mut scope = scope;
                        scope.push((join.table.as_str(), None));
                        expanded.push(scope);
                    }
                    continue;
                }

                for matched in matches {
                    let mut extended = scope.clone();
                    extended.push((join.table.as_str(), Some(matched)));
                    expanded.push(extended);
                }
            }
            scopes = expanded;
        }

        scopes.retain(|scope| predicate_matches(scope, &query.predicate));

        if !query.order_by.is_empty() {
            scopes.sort_by(|left, right| {
                query
                    .order_by
                    .iter()
                    .map(|order| {
                        let ordering = sort_ordering(
                            resolve_value(left, &order.column),
                            resolve_value(right, &order.column),
                        );
                        match order.direction {
                            SortDirection::Asc => ordering,
                            SortDirection::Desc => ordering.reverse(),
                        }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        if let Some(limit) = query.limit {
            scopes.truncate(limit);
        }

        let rows = scopes
            .iter()
            .map(|scope| {
                let mut output = Row::new();
                main.project(
                    scope.first().and_then(|(_, row)| *row),
                    &query.columns,
                    &mut output,
                );
                for (join, (_, row)) in query.joins.iter().zip(scope.iter().skip(1)) {
                    if let Some((_, joined)) = participants
                        .iter()
                        .find(|(name, _)| *name == join.table.as_str())
                    {
                        joined.project(*row, &join.columns, &mut output);
                    }
                }
                output
            })
            .collect();

        Ok(rows)
    }

    async fn insert(&self, query: &InsertQuery) -> StorageResult<InsertOutcome> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(query.table.as_str())
            .ok_or_else(|| unknown_table(query.table.as_str()))?;

        for column in query.columns() {
            require_column(query.table.as_str(), table, column)?;
        }

        let primary_key = table.primary_key.clone();
        let pk_value = match query.values.get(primary_key.as_str()) {
            Some(value) if !value.is_null() => {
                if table.pk_taken(value, &[]) {
                    return Err(StorageError::Constraint(format!(
                        "duplicate primary key {value} in table '{}'",
                        query.table
                    )));
                }
                value.clone()
            }
            _ => Value::from(table.next_id),
        };

        if let Some(id) = pk_value.as_i64() {
            table.next_id = table.next_id.max(id.saturating_add(1));
        }

        let mut row = Row::new();
        for column in &table.columns {
            let value = if *column == primary_key {
                pk_value.clone()
            } else {
                query.values.get(column).cloned().unwrap_or(Value::Null)
            };
            row.insert(column.clone(), value);
        }
        table.rows.push(row);

        Ok(InsertOutcome {
            affected_rows: 1,
            last_insert_id: pk_value.as_i64(),
        })
    }

    async fn update(&self, query: &UpdateQuery) -> StorageResult<u64> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(query.table.as_str())
            .ok_or_else(|| unknown_table(query.table.as_str()))?;

        if query.set.is_empty() {
            return Err(StorageError::InvalidQuery(format!(
                "update of table '{}' sets no columns",
                query.table
            )));
        }
        for column in query.columns() {
            require_column(query.table.as_str(), table, column)?;
        }
        let matched = matching_indices(query.table.as_str(), table, &query.predicate)?;

        if let Some(pk_value) = query.set.get(table.primary_key.as_str())
            && (matched.len() > 1 || table.pk_taken(pk_value, &matched))
        {
            return Err(StorageError::Constraint(format!(
                "primary key {pk_value} would not be unique in table '{}'",
                query.table
            )));
        }

        for index in &matched {
            if let Some(row) = table.rows.get_mut(*index) {
                for (column, value) in &query.set {
                    row.insert(column.clone(), value.clone());
                }
            }
        }

        Ok(matched.len() as u64)
    }

    async fn delete(&self, query: &DeleteQuery) -> StorageResult<u64> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(query.table.as_str())
            .ok_or_else(|| unknown_table(query.table.as_str()))?;

        let matched = matching_indices(query.table.as_str(), table, &query.predicate)?;
        let mut index = 0;
        table.rows.retain(|_| {
            let keep = !matched.contains(&index);
            index += 1;
            keep
        });

        Ok(matched.len() as u64)
    }
}

fn matching_indices(
    name: &str,
    table: &MemoryTable,
    predicate: &Predicate,
) -> StorageResult<Vec<usize>> {
    let participants = [(name, table)];
    for column in predicate.columns() {
        require_scoped_column(&participants, column)?;
    }

    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| predicate_matches(&[(name, Some(*row))], predicate))
        .map(|(index, _)| index)
        .collect())
}

fn lookup_table<'a>(
    tables: &'a HashMap<String, MemoryTable>,
    name: &str,
) -> StorageResult<&'a MemoryTable> {
    tables.get(name).ok_or_else(|| unknown_table(name))
}

fn unknown_table(name: &str) -> StorageError {
    StorageError::InvalidQuery(format!("unknown table '{name}'"))
}

fn require_column(name: &str, table: &MemoryTable, column: &str) -> StorageResult<()> {
    if table.has_column(column) {
        return Ok(());
    }

    Err(StorageError::InvalidQuery(format!(
        "unknown column '{column}' in table '{name}'"
    )))
}

fn require_selection(
    name: &str,
    table: &MemoryTable,
    selection: &ColumnSelection,
) -> StorageResult<()> {
    match selection {
        ColumnSelection::All => Ok(()),
        ColumnSelection::Named(columns) => columns
            .iter()
            .try_for_each(|column| require_column(name, table, column)),
    }
}

fn require_scoped_column(
    participants: &[(&str, &MemoryTable)],
    column: &ColumnRef,
) -> StorageResult<()> {
    match column.table.as_deref() {
        Some(qualifier) => {
            let (name, table) = participants
                .iter()
                .find(|(name, _)| *name == qualifier)
                .ok_or_else(|| {
                    StorageError::InvalidQuery(format!(
                        "table '{qualifier}' is not part of the query"
                    ))
                })?;
            require_column(name, table, column.column.as_str())
        }
        None if participants
            .iter()
            .any(|(_, table)| table.has_column(column.column.as_str())) =>
        {
            Ok(())
        }
        None => Err(StorageError::InvalidQuery(format!(
            "unknown column '{}'",
            column.column
        ))),
    }
}

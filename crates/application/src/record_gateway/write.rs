use serde_json::Value;
use tablegate_core::AppError;
use tablegate_domain::{
    DeleteQuery, InsertOutcome, InsertQuery, UpdateQuery, first_composite_value,
};
use tracing::debug;

use super::*;

impl RecordGateway {
    /// Inserts one row.
    pub async fn insert_record(&self, identity: &Identity, values: Row) -> AppResult<InsertOutcome> {
        self.engine
            .execute_insert(identity, InsertQuery::from_row(self.table.as_str(), values))
            .await
    }

    /// Updates the rows matched by the predicate.
    pub async fn update_where(
        &self,
        identity: &Identity,
        values: Row,
        predicate: Predicate,
    ) -> AppResult<u64> {
        let update = UpdateQuery {
            set: values.into_iter().collect(),
            ..UpdateQuery::new(self.table.as_str()).filter(predicate)
        };
        self.engine.execute_update(identity, update).await
    }

    /// Deletes the rows matched by the predicate.
    pub async fn delete_where(&self, identity: &Identity, predicate: Predicate) -> AppResult<u64> {
        self.engine
            .execute_delete(identity, DeleteQuery::new(self.table.as_str()).filter(predicate))
            .await
    }

    /// Updates the row named by the primary key in `values`, or inserts a new
    /// row when the key is absent, then runs the hooks and re-reads the row.
    ///
    /// The re-read is a wildcard select, so read-blacklisted columns are
    /// left out of the returned row.
    pub async fn add_or_update_record(
        &self,
        identity: &Identity,
        mut values: Row,
    ) -> AppResult<Option<Row>> {
        if let Some(column) = first_composite_value(&values) {
            return Err(AppError::ArrayAsScalarColumnValue {
                table: self.table.clone(),
                column: column.to_owned(),
            });
        }

        let primary_key = self.primary_key().await;
        let id = match values.get(primary_key.as_str()) {
            Some(id) if !id.is_null() => {
                let id = id.clone();
                let mut set = values.clone();
                set.remove(primary_key.as_str());
                if !set.is_empty() {
                    self.update_where(identity, set, Predicate::eq(primary_key.as_str(), id.clone()))
                        .await?;
                }
                for hook in &self.hooks {
                    hook.post_update(identity, self.table.as_str(), &values).await?;
                }
                id
            }
            _ => {
                values.remove(primary_key.as_str());
                let outcome = self.insert_record(identity, values.clone()).await?;
                let id = outcome
                    .last_insert_id
                    .map(Value::from)
                    .unwrap_or(Value::Null);
                values.insert(primary_key.clone(), id.clone());
                for hook in &self.hooks {
                    hook.post_insert(identity, self.table.as_str(), &values).await?;
                }
                id
            }
        };

        if id.is_null() {
            debug!(table = %self.table, "stored row has no key to re-read");
            return Ok(None);
        }

        self.find_one_by(identity, primary_key.as_str(), id).await
    }
}

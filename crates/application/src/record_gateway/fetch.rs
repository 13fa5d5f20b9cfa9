use serde_json::Value;
use tablegate_core::AppError;
use tablegate_domain::{ACTIVE_COLUMN, ActiveState, SortDirection};

use super::*;

impl RecordGateway {
    /// Finds one row by primary key.
    pub async fn find(&self, identity: &Identity, id: impl Into<Value>) -> AppResult<Option<Row>> {
        let primary_key = self.primary_key().await;
        self.find_one_by(identity, primary_key.as_str(), id).await
    }

    /// Finds one active row by primary key.
    pub async fn find_active(
        &self,
        identity: &Identity,
        id: impl Into<Value>,
    ) -> AppResult<Option<Row>> {
        let primary_key = self.primary_key().await;
        let select = SelectQuery::new(self.table.as_str())
            .filter(Predicate::eq(primary_key.as_str(), id))
            .filter(Predicate::eq(ACTIVE_COLUMN, ActiveState::Active.value()))
            .limit(1);

        Ok(self.select(identity, select).await?.into_iter().next())
    }

    /// Finds the first row whose column equals the value.
    pub async fn find_one_by(
        &self,
        identity: &Identity,
        column: &str,
        value: impl Into<Value>,
    ) -> AppResult<Option<Row>> {
        let select = SelectQuery::new(self.table.as_str())
            .filter(Predicate::eq(column, value))
            .limit(1);

        Ok(self.select(identity, select).await?.into_iter().next())
    }

    /// Lists rows with optional select modifiers.
    pub async fn fetch_all(&self, identity: &Identity, options: FetchOptions) -> AppResult<Vec<Row>> {
        self.select(identity, options.into_select(self.table.as_str()))
            .await
    }

    /// Lists rows paired with their primary key value, in select order.
    ///
    /// Every returned row must carry the primary key column.
    pub async fn fetch_all_with_id_keys(
        &self,
        identity: &Identity,
        options: FetchOptions,
    ) -> AppResult<Vec<(String, Row)>> {
        let primary_key = self.primary_key().await;
        let rows = self.fetch_all(identity, options).await?;

        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows {
            let key = match row.get(primary_key.as_str()) {
                Some(Value::String(value)) => value.clone(),
                Some(value) if !value.is_null() => value.to_string(),
                _ => {
                    return Err(AppError::Validation(format!(
                        "row of table '{}' has no '{}' value to key by",
                        self.table, primary_key
                    )));
                }
            };
            keyed.push((key, row));
        }

        Ok(keyed)
    }

    /// Lists active rows, optionally sorted by one column.
    pub async fn fetch_all_active_sorted(
        &self,
        identity: &Identity,
        sort: Option<&str>,
        direction: SortDirection,
    ) -> AppResult<Vec<Row>> {
        let mut select = SelectQuery::new(self.table.as_str())
            .filter(Predicate::eq(ACTIVE_COLUMN, ActiveState::Active.value()));
        if let Some(sort) = sort {
            select = select.order_by(sort, direction);
        }

        self.select(identity, select).await
    }
}

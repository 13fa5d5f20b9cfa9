use std::fmt::Display;

use tablegate_core::StorageError;
use tracing::error;

use super::*;

impl QueryEnforcementEngine {
    /// Wraps a storage failure of an authorized query.
    pub(super) fn execution_failed(&self, failure: StorageError, query: &dyn Display) -> AppError {
        let rendered = query.to_string();
        error!(error = %failure, query = %rendered, "authorized query failed in storage");

        AppError::ExecutionFailed {
            reason: failure.to_string(),
            query: self
                .deployment_mode
                .exposes_query_text()
                .then_some(rendered),
        }
    }
}

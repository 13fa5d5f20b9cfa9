use std::any::Any;

use serde_json::Value;
use tablegate_core::{AppResult, Identity};
use tablegate_domain::{Predicate, Row, SelectQuery};

use super::TableGateway;
use crate::RecordGateway;

/// Table of posts imported from social feeds.
pub const SOCIAL_POSTS_TABLE: &str = "social_posts";

/// Gateway for imported social feed posts.
#[derive(Clone)]
pub struct SocialPostsTableGateway {
    records: RecordGateway,
}

impl SocialPostsTableGateway {
    /// Wraps the record gateway of the social posts table.
    #[must_use]
    pub fn new(records: RecordGateway) -> Self {
        Self { records }
    }

    /// Returns the post already imported for the feed under this foreign id.
    pub async fn feed_foreign_id_exists(
        &self,
        identity: &Identity,
        foreign_id: impl Into<Value>,
        feed: impl Into<Value>,
    ) -> AppResult<Option<Row>> {
        let select = SelectQuery::new(SOCIAL_POSTS_TABLE)
            .filter(Predicate::eq("foreign_id", foreign_id))
            .filter(Predicate::eq("feed", feed))
            .limit(1);

        let rows = self.records.engine().execute_select(identity, select).await?;
        Ok(rows.into_iter().next())
    }
}

impl TableGateway for SocialPostsTableGateway {
    fn table_name(&self) -> &str {
        SOCIAL_POSTS_TABLE
    }

    fn records(&self) -> &RecordGateway {
        &self.records
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

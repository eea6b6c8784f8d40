use leadflow_core::domain::lead::LeadId;

use super::{OrderLinkRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderLinkRepository {
    pool: DbPool,
}

impl SqlOrderLinkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderLinkRepository for SqlOrderLinkRepository {
    async fn count_references(&self, lead_id: &LeadId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_order WHERE lead_id = ?")
            .bind(&lead_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn detach(&self, lead_id: &LeadId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE work_order SET lead_id = NULL WHERE lead_id = ?")
            .bind(&lead_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::DietRecordRow;
use crate::models::{DietRecord, NewDietRecord};

const COLUMNS: &str = "id, user_id, meal_type, photo_refs, tags, satisfaction, description, \
                       location, calorie_level, occurred_at, created_at";

/// Append-only record storage partitioned by user. Time filters are
/// half-open on `created_at`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, new: NewDietRecord) -> anyhow::Result<DietRecord>;

    /// Newest first.
    async fn list_by_user(
        &self,
        user_id: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DietRecord>>;

    async fn list_in_window(
        &self,
        user_id: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<DietRecord>>;

    async fn find(&self, user_id: &str, id: Uuid) -> anyhow::Result<Option<DietRecord>>;
}

#[derive(Clone)]
pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_records(rows: Vec<DietRecordRow>) -> anyhow::Result<Vec<DietRecord>> {
    rows.into_iter().map(DietRecord::try_from).collect()
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, new: NewDietRecord) -> anyhow::Result<DietRecord> {
        let row = sqlx::query_as::<_, DietRecordRow>(&format!(
            r#"
            INSERT INTO diet_records
                (id, user_id, meal_type, photo_refs, tags, satisfaction,
                 description, location, calorie_level, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.user_id)
        .bind(new.meal_type.as_str())
        .bind(&new.photo_refs)
        .bind(&new.tags)
        .bind(i16::from(new.satisfaction))
        .bind(&new.description)
        .bind(&new.location)
        .bind(new.calorie_level.map(|c| c.as_str()))
        .bind(new.occurred_at)
        .fetch_one(&self.db)
        .await
        .context("insert diet record")?;
        row.try_into()
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DietRecord>> {
        let rows = sqlx::query_as::<_, DietRecordRow>(&format!(
            r#"
            SELECT {COLUMNS}
              FROM diet_records
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list diet records")?;
        into_records(rows)
    }

    async fn list_in_window(
        &self,
        user_id: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<DietRecord>> {
        let rows = sqlx::query_as::<_, DietRecordRow>(&format!(
            r#"
            SELECT {COLUMNS}
              FROM diet_records
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await
        .context("list diet records in window")?;
        into_records(rows)
    }

    async fn find(&self, user_id: &str, id: Uuid) -> anyhow::Result<Option<DietRecord>> {
        let row = sqlx::query_as::<_, DietRecordRow>(&format!(
            "SELECT {COLUMNS} FROM diet_records WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find diet record")?;
        row.map(DietRecord::try_from).transpose()
    }
}

/// Process-local store used by tests and `AppState::fake`.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<DietRecord>>,
}

impl MemoryRecordStore {
    fn matching(
        all: &[DietRecord],
        user_id: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Vec<DietRecord> {
        all.iter()
            .filter(|r| r.user_id == user_id && start <= r.created_at && r.created_at < end)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, new: NewDietRecord) -> anyhow::Result<DietRecord> {
        let record = DietRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            meal_type: new.meal_type,
            photo_refs: new.photo_refs,
            tags: new.tags,
            satisfaction: new.satisfaction,
            description: new.description,
            location: new.location,
            calorie_level: new.calorie_level,
            occurred_at: new.occurred_at,
            created_at: OffsetDateTime::now_utc(),
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DietRecord>> {
        let mut out = Self::matching(&self.records.read().await, user_id, start, end);
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn list_in_window(
        &self,
        user_id: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<DietRecord>> {
        Ok(Self::matching(&self.records.read().await, user_id, start, end))
    }

    async fn find(&self, user_id: &str, id: Uuid) -> anyhow::Result<Option<DietRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned())
    }
}

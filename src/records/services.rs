use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use time::{Date, Duration as TimeDuration, OffsetDateTime, Time, UtcOffset};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CreateRecordRequest, RecordDraft, RecordView, RecordsQuery};
use crate::errors::AppError;
use crate::models::{DietRecord, NewDietRecord};
use crate::state::AppState;
use crate::storage::ext_from_mime;

pub const PHOTO_URL_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

impl CreateRecordRequest {
    /// Pairs each photo with its content type; missing types default to
    /// `application/octet-stream`.
    pub fn into_parts(self) -> (RecordDraft, Vec<UploadItem>) {
        let mut types = self.content_types.into_iter();
        let photos = self
            .photos
            .into_iter()
            .map(|buf| UploadItem {
                body: Bytes::from(buf.into_vec()),
                content_type: types.next().unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            })
            .collect();
        (self.draft, photos)
    }
}

/// Uploads every photo; on any failure the ones already stored are removed.
pub async fn upload_photos(
    st: &AppState,
    user_id: &str,
    batch: Uuid,
    photos: Vec<UploadItem>,
) -> anyhow::Result<Vec<String>> {
    let mut refs = Vec::with_capacity(photos.len());
    for (n, photo) in photos.into_iter().enumerate() {
        let key = format!(
            "records/{}/{}-{}.{}",
            user_id,
            batch,
            n,
            ext_from_mime(&photo.content_type)
        );
        match st.storage.upload(&key, photo.body, &photo.content_type).await {
            Ok(r) => refs.push(r),
            Err(e) => {
                discard_photos(st, &refs).await;
                return Err(e.context(format!("upload {key}")));
            }
        }
    }
    Ok(refs)
}

async fn discard_photos(st: &AppState, refs: &[String]) {
    for r in refs {
        if let Err(e) = st.storage.delete(r).await {
            warn!(error = %e, photo = %r, "failed to remove orphaned photo");
        }
    }
}

pub async fn create_record(
    st: &AppState,
    user_id: &str,
    draft: RecordDraft,
    photos: Vec<UploadItem>,
) -> Result<DietRecord, AppError> {
    if !(1..=5).contains(&draft.satisfaction) {
        return Err(AppError::BadRequest("satisfaction must be between 1 and 5".into()));
    }

    let offset = st.config.stats.utc_offset;
    let occurred_at = draft
        .occurred_at
        .unwrap_or_else(|| OffsetDateTime::now_utc().to_offset(offset).date());

    let photo_refs = upload_photos(st, user_id, Uuid::new_v4(), photos).await?;

    let new = NewDietRecord {
        user_id: user_id.to_string(),
        meal_type: draft.meal_type,
        photo_refs: photo_refs.clone(),
        tags: draft.tags,
        satisfaction: draft.satisfaction,
        description: draft.description,
        location: draft.location,
        calorie_level: draft.calorie_level,
        occurred_at,
    };
    let record = match st.records.insert(new).await {
        Ok(r) => r,
        Err(e) => {
            discard_photos(st, &photo_refs).await;
            return Err(e.into());
        }
    };
    info!(record_id = %record.id, photos = record.photo_refs.len(), "diet record saved");
    Ok(record)
}

/// Inclusive local-date bounds as a half-open timestamp range. Open bounds
/// reach back to the epoch and forward to tomorrow.
pub fn date_bounds(
    start: Option<Date>,
    end: Option<Date>,
    offset: UtcOffset,
) -> (OffsetDateTime, OffsetDateTime) {
    let midnight = |d: Date| d.with_time(Time::MIDNIGHT).assume_offset(offset);
    let from = start.map(midnight).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let to = end
        .map(midnight)
        .unwrap_or_else(|| midnight(OffsetDateTime::now_utc().to_offset(offset).date()))
        + TimeDuration::days(1);
    (from, to)
}

pub async fn presign_many(st: &AppState, refs: &[String]) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::with_capacity(refs.len());
    for r in refs {
        out.push(st.storage.presign_get(r, PHOTO_URL_TTL).await?);
    }
    Ok(out)
}

pub async fn list_records(
    st: &AppState,
    user_id: &str,
    q: &RecordsQuery,
) -> anyhow::Result<Vec<RecordView>> {
    let (start, end) = date_bounds(q.start, q.end, st.config.stats.utc_offset);
    let records = st
        .records
        .list_by_user(user_id, start, end, q.limit.clamp(1, 100), q.offset.max(0))
        .await?;
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let photo_urls = presign_many(st, &record.photo_refs).await?;
        out.push(RecordView { record, photo_urls });
    }
    Ok(out)
}

/// Distinct local dates with at least one record, ascending.
pub async fn calendar(st: &AppState, user_id: &str, q: &RecordsQuery) -> anyhow::Result<Vec<Date>> {
    let offset = st.config.stats.utc_offset;
    let (start, end) = date_bounds(q.start, q.end, offset);
    let records = st.records.list_in_window(user_id, start, end).await?;
    let days: BTreeSet<Date> = records
        .iter()
        .map(|r| r.created_at.to_offset(offset).date())
        .collect();
    Ok(days.into_iter().collect())
}

pub async fn first_photo_url(st: &AppState, user_id: &str, id: Uuid) -> Result<String, AppError> {
    let record = st
        .records
        .find(user_id, id)
        .await?
        .ok_or(AppError::NotFound("record"))?;
    let first = record.photo_refs.first().ok_or(AppError::NotFound("photo"))?;
    let url = st
        .storage
        .presign_get(first, PHOTO_URL_TTL)
        .await
        .with_context(|| format!("presign url for {first}"))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalorieLevel, MealType};
    use crate::records::RecordStore;
    use crate::storage::{MemoryStorage, ObjectStorage};
    use async_trait::async_trait;
    use serde_bytes::ByteBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn request(photos: usize, satisfaction: u8) -> CreateRecordRequest {
        CreateRecordRequest {
            draft: RecordDraft {
                meal_type: MealType::Breakfast,
                tags: vec!["早餐".into()],
                satisfaction,
                description: Some("面包和牛奶".into()),
                location: None,
                calorie_level: Some(CalorieLevel::Medium),
                occurred_at: None,
            },
            photos: (0..photos).map(|i| ByteBuf::from(vec![i as u8; 4])).collect(),
            content_types: vec!["image/png".into()],
        }
    }

    async fn create(st: &AppState, user_id: &str, photos: usize, satisfaction: u8) -> Result<DietRecord, AppError> {
        let (draft, items) = request(photos, satisfaction).into_parts();
        create_record(st, user_id, draft, items).await
    }

    fn all_records() -> RecordsQuery {
        RecordsQuery {
            limit: 20,
            ..Default::default()
        }
    }

    /// Accepts nothing; every insert fails.
    struct DownStore;

    #[async_trait]
    impl RecordStore for DownStore {
        async fn insert(&self, _new: NewDietRecord) -> anyhow::Result<DietRecord> {
            anyhow::bail!("pg down")
        }
        async fn list_by_user(
            &self,
            _user_id: &str,
            _start: OffsetDateTime,
            _end: OffsetDateTime,
            _limit: i64,
            _offset: i64,
        ) -> anyhow::Result<Vec<DietRecord>> {
            Ok(Vec::new())
        }
        async fn list_in_window(
            &self,
            _user_id: &str,
            _start: OffsetDateTime,
            _end: OffsetDateTime,
        ) -> anyhow::Result<Vec<DietRecord>> {
            Ok(Vec::new())
        }
        async fn find(&self, _user_id: &str, _id: Uuid) -> anyhow::Result<Option<DietRecord>> {
            Ok(None)
        }
    }

    /// Stores the first upload, refuses the second.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStorage for FlakyStorage {
        async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
            if self.uploads.fetch_add(1, Ordering::SeqCst) == 1 {
                anyhow::bail!("minio: connection reset");
            }
            self.inner.upload(key, body, content_type).await
        }
        async fn delete(&self, key: &str) -> anyhow::Result<()> {
            self.inner.delete(key).await
        }
        async fn presign_get(&self, key: &str, ttl: Duration) -> anyhow::Result<String> {
            self.inner.presign_get(key, ttl).await
        }
    }

    #[tokio::test]
    async fn create_uploads_photos_and_stores_refs() {
        let st = AppState::fake();
        let rec = create(&st, "u1", 2, 4).await.unwrap();
        assert_eq!(rec.photo_refs.len(), 2);
        assert!(rec.photo_refs[0].starts_with("records/u1/"));
        assert!(rec.photo_refs[0].ends_with("-0.png"));
        assert!(rec.photo_refs[1].ends_with("-1.bin"));

        let listed = list_records(&st, "u1", &all_records()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].photo_urls.len(), 2);
        assert!(listed[0].photo_urls[0].contains(&rec.photo_refs[0]));

        let url = first_photo_url(&st, "u1", rec.id).await.unwrap();
        assert!(url.ends_with("-0.png"));
    }

    #[tokio::test]
    async fn failed_insert_removes_uploaded_photos() {
        let storage = Arc::new(MemoryStorage::default());
        let st = AppState {
            storage: storage.clone(),
            records: Arc::new(DownStore),
            ..AppState::fake()
        };

        let err = create(&st, "u1", 2, 4).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)), "{err:?}");
        assert!(storage.keys().await.is_empty());
    }

    #[tokio::test]
    async fn failed_upload_removes_earlier_photos() {
        let storage = Arc::new(FlakyStorage::default());
        let st = AppState {
            storage: storage.clone(),
            ..AppState::fake()
        };

        let err = create(&st, "u1", 3, 4).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)), "{err:?}");
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 2);
        assert!(storage.inner.keys().await.is_empty());
        assert!(list_records(&st, "u1", &all_records()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn satisfaction_out_of_range_is_rejected() {
        let st = AppState::fake();
        for bad in [0, 6] {
            let err = create(&st, "u1", 0, bad).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
        assert!(list_records(&st, "u1", &all_records()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn calendar_lists_each_day_once() {
        let st = AppState::fake();
        create(&st, "u1", 0, 3).await.unwrap();
        create(&st, "u1", 0, 5).await.unwrap();
        let days = calendar(&st, "u1", &all_records()).await.unwrap();
        assert_eq!(days.len(), 1);
        assert!(calendar(&st, "u2", &all_records()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_records_are_not_found() {
        let st = AppState::fake();
        let rec = create(&st, "u1", 1, 3).await.unwrap();
        let err = first_photo_url(&st, "u2", rec.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("record")));

        let bare = create(&st, "u1", 0, 3).await.unwrap();
        let err = first_photo_url(&st, "u1", bare.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("photo")));
    }

    #[test]
    fn missing_content_types_default_to_octet_stream() {
        let (_, items) = request(2, 3).into_parts();
        let types: Vec<&str> = items.iter().map(|i| i.content_type.as_str()).collect();
        assert_eq!(types, vec!["image/png", DEFAULT_CONTENT_TYPE]);
    }

    #[test]
    fn date_bounds_cover_whole_local_days() {
        use time::macros::{date, datetime, offset};
        let (from, to) = date_bounds(Some(date!(2025 - 03 - 01)), Some(date!(2025 - 03 - 02)), offset!(+8));
        assert_eq!(from, datetime!(2025-03-01 0:00 +8));
        assert_eq!(to, datetime!(2025-03-03 0:00 +8));
    }
}

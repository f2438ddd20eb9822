use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    CalendarResponse, CreateRecordRequest, CreatedRecordResponse, RecordDraft, RecordView, RecordsQuery,
};
use super::services::{
    calendar, create_record, first_photo_url, list_records, UploadItem, DEFAULT_CONTENT_TYPE,
};
use crate::models::DietRecord;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/records", get(list))
        .route("/records/calendar", get(get_calendar))
        .route("/records/:id/photo", get(get_photo))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/records", post(create))
        .route("/records/multipart", post(create_multipart)) // meta + files[]
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

type Created = (StatusCode, HeaderMap, Json<CreatedRecordResponse>);

fn created(record: DietRecord) -> Created {
    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/records/{}", record.id)) {
        headers.insert(header::LOCATION, location);
    }

    (
        StatusCode::CREATED,
        headers,
        Json(CreatedRecordResponse {
            id: record.id,
            created_at: record.created_at,
            photo_refs: record.photo_refs,
        }),
    )
}

/// POST /records (JSON, photos as byte arrays)
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateRecordRequest>,
) -> Result<Created, AppError> {
    let (draft, photos) = body.into_parts();
    let record = create_record(&state, &user_id, draft, photos).await?;
    Ok(created(record))
}

/// POST /records/multipart
/// Fields: `meta` (record JSON, same keys as the JSON route) and any number of `files` / `files[]`.
#[instrument(skip(state, mp))]
pub async fn create_multipart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<Created, AppError> {
    let (draft, photos) = read_multipart(mp).await?;
    let record = create_record(&state, &user_id, draft, photos).await?;
    Ok(created(record))
}

pub async fn read_multipart(mut mp: Multipart) -> Result<(RecordDraft, Vec<UploadItem>), AppError> {
    let bad = |e: axum::extract::multipart::MultipartError| AppError::BadRequest(e.body_text());

    let mut draft = None;
    let mut photos = Vec::new();
    while let Some(field) = mp.next_field().await.map_err(bad)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("meta") => {
                let text = field.text().await.map_err(bad)?;
                let parsed: RecordDraft = serde_json::from_str(&text)
                    .map_err(|e| AppError::BadRequest(format!("invalid meta: {e}")))?;
                draft = Some(parsed);
            }
            Some("files") | Some("files[]") => {
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let body = field.bytes().await.map_err(bad)?;
                photos.push(UploadItem { body, content_type });
            }
            _ => {}
        }
    }

    let draft = draft.ok_or_else(|| AppError::BadRequest("meta is required".into()))?;
    Ok((draft, photos))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<RecordsQuery>,
) -> Result<Json<Vec<RecordView>>, AppError> {
    Ok(Json(list_records(&state, &user_id, &q).await?))
}

#[instrument(skip(state))]
pub async fn get_calendar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<RecordsQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let dates = calendar(&state, &user_id, &q).await?;
    Ok(Json(CalendarResponse {
        dates: dates.iter().map(ToString::to_string).collect(),
    }))
}

/// 307 to the presigned url of the record's first photo.
#[instrument(skip(state))]
pub async fn get_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    let url = first_photo_url(&state, &user_id, id).await?;
    Ok(Redirect::temporary(&url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;
    use axum::{body::Body, extract::FromRequest, http::Request};

    const BOUNDARY: &str = "dietlog-boundary";

    fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, content_type, data) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match content_type {
                Some(ct) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"p.jpg\"\r\nContent-Type: {ct}\r\n\r\n"
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
            }
            body.push_str(data);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn read(req: Request<Body>) -> Result<(RecordDraft, Vec<UploadItem>), AppError> {
        let mp = Multipart::from_request(req, &()).await.unwrap();
        read_multipart(mp).await
    }

    #[tokio::test]
    async fn multipart_reads_meta_and_files() {
        let req = multipart(&[
            ("meta", None, r#"{"mealType":"dinner","satisfaction":4,"tags":["家常菜"],"occurredAt":"2025-03-09"}"#),
            ("files[]", Some("image/jpeg"), "jpegbytes"),
            ("files", None, "raw"),
            ("note", None, "ignored"),
        ]);
        let (draft, photos) = read(req).await.unwrap();
        assert_eq!(draft.meal_type, MealType::Dinner);
        assert_eq!(draft.satisfaction, 4);
        assert_eq!(draft.tags, vec!["家常菜"]);
        assert_eq!(draft.occurred_at, Some(time::macros::date!(2025 - 03 - 09)));

        let got: Vec<(&str, &[u8])> = photos
            .iter()
            .map(|p| (p.content_type.as_str(), p.body.as_ref()))
            .collect();
        assert_eq!(got, vec![("image/jpeg", &b"jpegbytes"[..]), (DEFAULT_CONTENT_TYPE, &b"raw"[..])]);
    }

    #[tokio::test]
    async fn multipart_without_meta_is_rejected() {
        let req = multipart(&[("files", Some("image/png"), "x")]);
        let err = read(req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "meta is required"), "{err:?}");

        let req = multipart(&[("meta", None, r#"{"satisfaction":4}"#)]);
        assert!(matches!(read(req).await, Err(AppError::BadRequest(_))));
    }
}

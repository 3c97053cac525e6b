//! Resume upload: multipart PDF in, object-storage URL out.

use axum::extract::{Multipart, State};
use axum::Json;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::AuthSubject;
use crate::documents::location::object_url;
use crate::errors::AppError;
use crate::models::profile::ProfileUpdate;
use crate::state::AppState;

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
pub const RESUME_FIELD: &str = "resume";
const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub url: String,
}

struct ResumeFile {
    file_name: String,
    data: Bytes,
}

/// Keeps only the final path component and replaces anything outside
/// `[A-Za-z0-9._-]` so the object key stays predictable.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '-']).is_empty() {
        "resume.pdf".to_string()
    } else {
        cleaned
    }
}

fn resume_object_key(millis: i64, file_name: &str) -> String {
    format!("resumes/{millis}-{}", sanitize_file_name(file_name))
}

async fn read_resume_field(multipart: &mut Multipart) -> Result<ResumeFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            return Err(AppError::Validation(
                "Invalid file type, only PDF is allowed!".to_string(),
            ));
        }
        let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        if data.len() > MAX_RESUME_BYTES {
            return Err(AppError::Validation("File exceeds the 5MB limit".to_string()));
        }
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        return Ok(ResumeFile { file_name, data });
    }
    Err(AppError::Validation("No file uploaded".to_string()))
}

/// POST /api/upload/resume
///
/// Stores the PDF and, when the caller already has a profile, points its
/// `resume` field at the new object.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    auth: AuthSubject,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let file = read_resume_field(&mut multipart).await?;
    let key = resume_object_key(Utc::now().timestamp_millis(), &file.file_name);
    let size = file.data.len();

    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(file.data))
        .content_type(PDF_CONTENT_TYPE)
        .send()
        .await
        .map_err(|e| AppError::S3(DisplayErrorContext(&e).to_string()))?;

    info!("Uploaded resume s3://{}/{} ({size} bytes)", state.config.s3_bucket, key);

    let url = object_url(
        &state.config.s3_bucket,
        &state.config.aws_region,
        state.config.s3_endpoint.as_deref(),
        &key,
    );

    let update = ProfileUpdate {
        resume: Some(url.clone()),
        ..Default::default()
    };
    if state.store.update_profile(&auth.subject, &update).await?.is_none() {
        warn!("Resume uploaded for {} before profile sync; profile not updated", auth.subject);
    }

    Ok(Json(UploadResponse {
        message: "Resume uploaded successfully",
        url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::auth::SUBJECT_HEADER;
    use crate::routes::build_router;
    use crate::testing::{test_state, FakeExtractor, FakeGenerator};

    const BOUNDARY: &str = "hireready-test-boundary";

    fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {data}\r\n\
             --{BOUNDARY}--\r\n"
        )
    }

    async fn upload(body: String) -> (StatusCode, Value) {
        let state = test_state(FakeGenerator::failing(), FakeExtractor::failing());
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload/resume")
            .header(SUBJECT_HEADER, "user_1")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[test]
    fn test_object_key_strips_directories_and_odd_characters() {
        assert_eq!(
            resume_object_key(1700000000000, "../../etc/Jane Doe (CV).pdf"),
            "resumes/1700000000000-Jane-Doe--CV-.pdf"
        );
        assert_eq!(resume_object_key(1, "..."), "resumes/1-resume.pdf");
    }

    #[tokio::test]
    async fn test_rejects_non_pdf() {
        let (status, body) = upload(multipart_body("resume", "cv.txt", "text/plain", "hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid file type, only PDF is allowed!");
    }

    #[tokio::test]
    async fn test_rejects_missing_file_field() {
        let (status, body) =
            upload(multipart_body("avatar", "me.pdf", "application/pdf", "%PDF-1.4")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let (status, body) =
            upload(multipart_body("resume", "cv.pdf", "application/pdf", "%PDF-1.4")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "S3_ERROR");
    }
}

use axum::{
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::{AppError, Result},
    storage::{FailedUpload, UploadReport},
};

pub async fn upload(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>> {
    let mut files = Vec::new();
    let mut unreadable = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                // The stream can't be resumed after a framing error; keep what we have.
                tracing::warn!("Multipart stream ended early: {}", e);
                unreadable.push(FailedUpload {
                    name: String::new(),
                    error: e.body_text(),
                });
                break;
            }
        };

        let Some(filename) = field.file_name().map(str::to_string) else {
            let _ = field.bytes().await;
            continue;
        };

        match field.bytes().await {
            Ok(data) => files.push((filename, data.to_vec())),
            Err(e) => unreadable.push(FailedUpload {
                name: filename,
                error: e.body_text(),
            }),
        }
    }

    if files.is_empty() && unreadable.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }

    let mut report = state
        .service_context
        .upload_store
        .save_all(current.user.id, files)
        .await;
    report.failed.extend(unreadable);

    tracing::debug!(
        "User {} uploaded {} file(s), {} failed",
        current.user.id,
        report.count,
        report.failed.len()
    );

    Ok(Json(report))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(file): Path<String>,
) -> Result<StatusCode> {
    state
        .service_context
        .upload_store
        .delete(current.user.id, &file)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

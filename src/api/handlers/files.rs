use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Extension, Form};
use bytes::Bytes;
use serde::Deserialize;

use crate::api::render::{self, DownloadView};
use crate::api::response::{found, AppQuery, PageError};
use crate::auth::CurrentUser;
use crate::object_store::{self, ObjectStoreError};
use crate::rating::{RatingError, Vote, VoteOutcome};
use crate::storage::models::{Category, FileRecord, NewFile};
use crate::AppState;

const LABEL_MAX_LEN: usize = 50;
const DESCRIPTION_MAX_LEN: usize = 500;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FileIdParams {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RatingForm {
    #[serde(default)]
    pub rating: String,
}

/// Validated contents of the upload form
struct UploadForm {
    label: String,
    description: String,
    category: Category,
    data: Bytes,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn home(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<Response, PageError> {
    let Some(user) = state
        .db
        .get_user(&username)
        .map_err(|e| PageError::internal("Failed to load user", e))?
    else {
        // Session outlived its account
        return Ok(found("/logout"));
    };

    let files = state
        .db
        .list_owner_files(&username)
        .map_err(|e| PageError::internal("Failed to list user files", e))?;

    Ok(Html(render::home_page(&user, &files)).into_response())
}

pub async fn upload_form(Extension(CurrentUser(username)): Extension<CurrentUser>) -> Html<String> {
    Html(render::upload_page(&username, None))
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let form = match read_upload_form(multipart, state.config.max_upload_size).await {
        Ok(form) => form,
        Err(message) => {
            return Ok(Html(render::upload_page(&username, Some(message.as_str()))).into_response())
        }
    };

    // Phase 1: contents to the object store under a fresh key
    let blob_key = object_store::new_key();
    let byte_size = form.data.len() as u64;
    state
        .object_store
        .put(&blob_key, form.data)
        .await
        .map_err(|e| PageError::internal("Failed to store file contents", e))?;

    // Phase 2: the file row, which assigns the id
    let new_file = NewFile {
        label: form.label,
        description: form.description,
        owner: username,
        category: form.category,
        byte_size,
        blob_key: blob_key.clone(),
    };

    let file = match state.db.insert_file(new_file) {
        Ok(file) => file,
        Err(e) => {
            // Best-effort cleanup of the orphaned contents
            if let Err(cleanup) = state.object_store.delete(&blob_key).await {
                tracing::warn!(blob_key = %blob_key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(PageError::internal("Failed to insert file", e));
        }
    };

    tracing::info!(file_id = file.id, owner = %file.owner, category = %file.category, "Uploaded file");
    Ok(found(&format!("/download?id={}", file.id)))
}

pub async fn download_page(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    AppQuery(params): AppQuery<FileIdParams>,
) -> Result<Response, PageError> {
    let file = load_file(&state, params.id.as_deref())?;
    render_download(&state, &username, &file, None)
}

pub async fn submit_rating(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    AppQuery(params): AppQuery<FileIdParams>,
    Form(form): Form<RatingForm>,
) -> Result<Response, PageError> {
    let file = load_file(&state, params.id.as_deref())?;

    let vote = match form.rating.parse::<Vote>() {
        Ok(vote) => vote,
        Err(invalid) => {
            let message = invalid.to_string();
            return render_download(&state, &username, &file, Some(message.as_str()));
        }
    };

    let outcome = state
        .ratings
        .submit_vote(file.id, &username, vote)
        .await
        .map_err(|e| match e {
            RatingError::FileNotFound(_) => PageError::not_found("File not found"),
            e => PageError::internal("Failed to record vote", e),
        })?;

    let message = match outcome {
        VoteOutcome::Recorded => "Thanks for rating this file",
        VoteOutcome::Changed { .. } => "Your rating was updated",
        VoteOutcome::Unchanged => "Your rating is unchanged",
    };

    // Reload so the page shows the new aggregate
    let file = fetch_file(&state, file.id)?;
    render_download(&state, &username, &file, Some(message))
}

/// Serve the stored contents of a file as an attachment.
/// Route: GET /files/:id
pub async fn raw_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let file = load_file(&state, Some(id.as_str()))?;

    let data = state
        .object_store
        .get(&file.blob_key)
        .await
        .map_err(|e| match e {
            ObjectStoreError::NotFound(_) => PageError::not_found("File contents not found"),
            _ => PageError::internal("Failed to read file contents", e),
        })?;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    let mime_type = mime_guess::from_path(&file.label)
        .first_or_octet_stream()
        .to_string();
    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.byte_size));

    let filename = file.label.replace(['"', '\\', '\r', '\n'], "_");
    if let Ok(value) = format!("attachment; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolve the `id` parameter to a stored file. Malformed and unknown ids are
/// both a 404.
fn load_file(state: &AppState, id: Option<&str>) -> Result<FileRecord, PageError> {
    let id = id
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .ok_or_else(|| PageError::not_found("File not found"))?;
    fetch_file(state, id)
}

fn fetch_file(state: &AppState, id: u64) -> Result<FileRecord, PageError> {
    state
        .db
        .get_file(id)
        .map_err(|e| PageError::internal("Failed to load file", e))?
        .ok_or_else(|| PageError::not_found("File not found"))
}

fn render_download(
    state: &AppState,
    username: &str,
    file: &FileRecord,
    message: Option<&str>,
) -> Result<Response, PageError> {
    let viewer_timezone = state
        .db
        .get_user(username)
        .map_err(|e| PageError::internal("Failed to load viewer", e))?
        .map(|u| u.timezone)
        .unwrap_or_else(|| "UTC".to_string());

    let own_vote = state
        .db
        .get_file_rating(file.id, username)
        .map_err(|e| PageError::internal("Failed to load own vote", e))?;

    let view = DownloadView {
        file,
        viewer: username,
        viewer_timezone: &viewer_timezone,
        own_vote,
        message,
    };
    Ok(Html(render::download_page(&view)).into_response())
}

async fn read_upload_form(mut multipart: Multipart, max_size: u64) -> Result<UploadForm, String> {
    let mut label: Option<String> = None;
    let mut data: Option<Bytes> = None;
    let mut description = String::new();
    let mut category: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid upload: {e}"))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                label = field.file_name().map(base_name);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file: {e}"))?;

                if bytes.len() as u64 > max_size {
                    return Err(format!("File exceeds maximum upload size of {max_size} bytes"));
                }
                data = Some(bytes);
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|e| format!("Invalid description: {e}"))?;
            }
            "category" => {
                category = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("Invalid category: {e}"))?,
                );
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let label = label
        .filter(|l| !l.is_empty())
        .ok_or_else(|| "Please choose a file to upload".to_string())?;
    let data = data.ok_or_else(|| "Please choose a file to upload".to_string())?;

    if label.chars().count() > LABEL_MAX_LEN {
        return Err(format!("File name must be at most {LABEL_MAX_LEN} characters"));
    }
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(format!("Description must be at most {DESCRIPTION_MAX_LEN} characters"));
    }

    let category = category
        .as_deref()
        .unwrap_or("other")
        .parse::<Category>()
        .map_err(|_| "Unknown category".to_string())?;

    Ok(UploadForm {
        label,
        description,
        category,
        data,
    })
}

/// Strip any directory part a browser may send with the file name.
fn base_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("report.pdf"), "report.pdf");
        assert_eq!(base_name("C:\\Users\\me\\report.pdf"), "report.pdf");
        assert_eq!(base_name("dir/sub/song.mp3"), "song.mp3");
        assert_eq!(base_name("dir/"), "");
    }
}

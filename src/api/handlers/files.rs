use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{ApiMultipart, ApiQuery, ValidatedJson};
use crate::api::middleware::auth::CurrentUser;
use crate::services::file_service::FileInfo;
use crate::utils::validation::require_not_blank;
use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileQuery {
    /// Name of the file within the caller's storage
    pub filename: Option<String>,
}

impl FileQuery {
    fn required(&self) -> Result<&str, AppError> {
        let filename = self.filename.as_deref().unwrap_or_default();
        require_not_blank(filename, "Filename")?;
        Ok(filename)
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Maximum number of entries; non-positive or absent returns all
    pub limit: Option<i64>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct RenameRequest {
    #[serde(alias = "filename")]
    #[validate(length(min = 1, message = "New file name is required"))]
    pub name: String,
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(filename, NON_ALPHANUMERIC)
    )
}

#[utoipa::path(
    post,
    path = "/file",
    params(FileQuery, ("auth-token" = String, Header, description = "Session token")),
    request_body(content = String, description = "Multipart form with a `file` part", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded successfully"),
        (status = 400, description = "Missing filename, file already exists, or read error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Upload failed")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<FileQuery>,
    ApiMultipart(mut multipart): ApiMultipart,
) -> Result<(), AppError> {
    let filename = query.required()?;

    let mut content = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            content = Some(field.bytes().await?);
        }
    }

    let content = content.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    if content.len() > state.config.max_file_size {
        return Err(AppError::BadRequest(format!(
            "File exceeds the maximum size of {} bytes",
            state.config.max_file_size
        )));
    }

    state.file_service.store(&user, filename, &content).await
}

#[utoipa::path(
    get,
    path = "/file",
    params(FileQuery, ("auth-token" = String, Header, description = "Session token")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "File not found or unreadable"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Download failed")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<FileQuery>,
) -> Result<Response, AppError> {
    let filename = query.required()?;
    let content = state.file_service.load(&user, filename).await?;

    let headers = [
        (
            header::CONTENT_TYPE,
            mime::APPLICATION_OCTET_STREAM.to_string(),
        ),
        (header::CONTENT_DISPOSITION, content_disposition(filename)),
    ];

    Ok((headers, content).into_response())
}

#[utoipa::path(
    delete,
    path = "/file",
    params(FileQuery, ("auth-token" = String, Header, description = "Session token")),
    responses(
        (status = 200, description = "File deleted"),
        (status = 400, description = "File not found or storage error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Delete failed")
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<FileQuery>,
) -> Result<(), AppError> {
    let filename = query.required()?;
    state.file_service.delete(&user, filename).await
}

#[utoipa::path(
    put,
    path = "/file",
    params(FileQuery, ("auth-token" = String, Header, description = "Session token")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "File renamed"),
        (status = 400, description = "File not found, name taken, or storage error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Rename failed")
    ),
    tag = "files"
)]
pub async fn rename_file(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<FileQuery>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<(), AppError> {
    let filename = query.required()?;
    state.file_service.rename(&user, filename, &req.name).await
}

#[utoipa::path(
    get,
    path = "/list",
    params(ListQuery, ("auth-token" = String, Header, description = "Session token")),
    responses(
        (status = 200, description = "Files, most recent first", body = [FileInfo]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Listing failed")
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<FileInfo>>, AppError> {
    let files = state.file_service.list(&user, query.limit).await?;
    Ok(Json(files))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("a.txt"),
            "attachment; filename=\"a.txt\"; filename*=UTF-8''a%2Etxt"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("отчёт \"v2\".pdf");
        assert!(value.starts_with("attachment; filename=\"_____ _v2_.pdf\""));
        assert!(value.contains("filename*=UTF-8''%D0%BE"));
        assert!(value.is_ascii());
    }

    #[test]
    fn test_file_query_required() {
        let query = FileQuery { filename: None };
        assert!(matches!(query.required(), Err(AppError::BadRequest(_))));

        let query = FileQuery {
            filename: Some("  ".to_string()),
        };
        assert!(query.required().is_err());

        let query = FileQuery {
            filename: Some("a.txt".to_string()),
        };
        assert_eq!(query.required().unwrap(), "a.txt");
    }
}

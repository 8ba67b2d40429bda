//! Consignment form endpoint.

use std::path::Path;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{multipart::Field, FromRequest, Multipart, Request, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use consign_core::models::FILE_FIELD;
use consign_core::{AppError, FileUpload, IntakeError, Submission, UploadStatus};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::error::HttpAppError;
use crate::services::intake::IntakeOutcome;
use crate::state::AppState;

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Submission Error</title>
</head>
<body>
<h1>Submission Error!</h1>
<p>Your submission failed due to the following reasons:</p>
<ul>
{% for error in errors %}<li>{{ error }}</li>
{% endfor %}</ul>
<p>Please use your browser's back button to correct the form.</p>
</body>
</html>
"#,
    ext = "html"
)]
struct ErrorPage<'a> {
    errors: &'a [String],
}

/// Text fields plus the spooled primary image, if one was sent.
struct ReceivedForm {
    submission: Submission,
    upload: Option<ReceivedUpload>,
}

/// The temp file is removed when this is dropped, unless it was moved away.
struct ReceivedUpload {
    descriptor: FileUpload,
    _temp: Option<TempPath>,
}

impl ReceivedUpload {
    fn failed(name: String, status: UploadStatus) -> Self {
        Self {
            descriptor: FileUpload::failed(name, status),
            _temp: None,
        }
    }
}

/// Consignment intake handler
///
/// Only `POST` is processed; any other method is sent back to the form.
/// Accepted submissions redirect to the confirmation page, refused ones get the
/// error page listing every reason. A urlencoded body contributes its text fields;
/// a body that is neither form encoding is validated as an empty submission.
///
/// # Errors
/// - `AppError::BadRequest` - multipart stream broke off mid-field
/// - `AppError::PayloadTooLarge` - body exceeds the request limit
/// - `AppError::InternalWithSource` - error page could not be rendered
#[tracing::instrument(skip(state, request), fields(method = %method, operation = "submit_consign_form"))]
pub async fn submit_consign_form(
    State(state): State<Arc<AppState>>,
    method: Method,
    request: Request,
) -> Result<Response, HttpAppError> {
    let settings = &state.config.intake;

    if method != Method::POST {
        tracing::debug!("Non-POST request sent back to the form");
        return Ok(Redirect::to(&settings.form_redirect).into_response());
    }

    let form = if is_urlencoded(&request) {
        read_urlencoded(request, &state).await
    } else {
        match Multipart::from_request(request, &state).await {
            Ok(multipart) => {
                read_form(
                    multipart,
                    &state.config.base.temp_dir,
                    state.config.max_upload_bytes(),
                )
                .await?
            }
            Err(rejection) => {
                tracing::debug!(
                    reason = %rejection.body_text(),
                    "Body is not multipart, validating without fields"
                );
                ReceivedForm::empty()
            }
        }
    };

    let upload = form.upload.as_ref().map(|u| &u.descriptor);
    match state.intake.handle(&form.submission, upload).await {
        IntakeOutcome::Accepted { .. } => Ok(Redirect::to(&settings.success_redirect).into_response()),
        IntakeOutcome::Rejected { errors, .. } => render_error_page(&errors),
    }
}

fn render_error_page(errors: &[IntakeError]) -> Result<Response, HttpAppError> {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    let body = ErrorPage { errors: &messages }
        .render()
        .map_err(|e| AppError::InternalWithSource {
            message: "Failed to render error page".to_string(),
            source: anyhow::Error::new(e),
        })?;
    Ok((StatusCode::OK, Html(body)).into_response())
}

impl ReceivedForm {
    fn empty() -> Self {
        Self {
            submission: Submission::new(),
            upload: None,
        }
    }
}

fn is_urlencoded(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Text fields only; a urlencoded body cannot carry the image.
async fn read_urlencoded(request: Request, state: &Arc<AppState>) -> ReceivedForm {
    match Form::<Vec<(String, String)>>::from_request(request, state).await {
        Ok(Form(fields)) => ReceivedForm {
            submission: fields.into_iter().collect(),
            upload: None,
        },
        Err(rejection) => {
            tracing::debug!(
                reason = %rejection.body_text(),
                "Unreadable urlencoded body, validating without fields"
            );
            ReceivedForm::empty()
        }
    }
}

/// Read every part of the form. Text fields go into the submission (last value
/// wins); the first `primaryImage` part carrying a filename is streamed to a temp
/// file. A `primaryImage` part without a filename is an ordinary text field.
async fn read_form(
    mut multipart: Multipart,
    temp_dir: &Path,
    max_file_bytes: usize,
) -> Result<ReceivedForm, HttpAppError> {
    let mut submission = Submission::new();
    let mut upload: Option<ReceivedUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_FIELD && field.file_name().is_some() {
            if upload.is_some() {
                tracing::debug!("Additional primary image part ignored");
                continue;
            }
            upload = Some(spool_file(field, temp_dir, max_file_bytes).await?);
        } else {
            let value = field.text().await?;
            submission.insert(name, value);
        }
    }

    Ok(ReceivedForm { submission, upload })
}

/// Stream one file part to disk. Transport problems become an upload status
/// rather than an error so they can be reported alongside the form.
async fn spool_file(
    mut field: Field<'_>,
    temp_dir: &Path,
    max_file_bytes: usize,
) -> Result<ReceivedUpload, HttpAppError> {
    let original_name = field.file_name().unwrap_or_default().to_string();

    let named = match tempfile::Builder::new()
        .prefix("consign-")
        .tempfile_in(temp_dir)
    {
        Ok(named) => named,
        Err(e) => {
            tracing::warn!(error = %e, temp_dir = %temp_dir.display(), "Failed to create temp file");
            while field.chunk().await?.is_some() {}
            return Ok(ReceivedUpload::failed(original_name, UploadStatus::CantWrite));
        }
    };
    let (file, temp_path) = named.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut size: u64 = 0;
    let mut status = UploadStatus::Ok;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Primary image stream ended early");
                status = UploadStatus::Partial;
                break;
            }
        };

        if status != UploadStatus::Ok {
            continue;
        }

        size += chunk.len() as u64;
        if size > max_file_bytes as u64 {
            status = UploadStatus::TooLarge;
            continue;
        }

        if let Err(e) = file.write_all(&chunk).await {
            tracing::warn!(error = %e, "Failed to write primary image to temp file");
            status = UploadStatus::CantWrite;
        }
    }

    if status == UploadStatus::Ok {
        if let Err(e) = file.flush().await {
            tracing::warn!(error = %e, "Failed to flush primary image temp file");
            status = UploadStatus::CantWrite;
        }
    }
    drop(file);

    if status == UploadStatus::Ok && original_name.is_empty() && size == 0 {
        status = UploadStatus::NoFile;
    }

    if status != UploadStatus::Ok {
        return Ok(ReceivedUpload::failed(original_name, status));
    }

    tracing::debug!(
        original_name = %original_name,
        size_bytes = size,
        "Primary image received"
    );

    Ok(ReceivedUpload {
        descriptor: FileUpload::new(temp_path.to_path_buf(), original_name, size),
        _temp: Some(temp_path),
    })
}

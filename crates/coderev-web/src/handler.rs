use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use axum::Form;
use serde::Deserialize;

use coderev_suggest::ReviewError;

use crate::page::{self, Page};
use crate::AppState;

const CODE_FIELD: &str = "code_input";
const CRITERIA_FIELD: &str = "criteria_selected";
const FILE_FIELD: &str = "uploaded_file";

/// Text fields of a url-encoded submission. Missing fields are empty.
#[derive(Debug, Default, Deserialize)]
struct ReviewForm {
    #[serde(default)]
    code_input: String,
    #[serde(default)]
    criteria_selected: String,
}

/// A decoded POST to `/`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Submission {
    pub code_input: String,
    pub criteria_selected: String,
    pub uploaded_file: Option<Vec<u8>>,
}

impl Submission {
    /// Uploaded file content when present and non-empty, otherwise the text field.
    pub fn resolve_code(&self) -> String {
        match &self.uploaded_file {
            Some(bytes) if self.uses_file() => String::from_utf8_lossy(bytes).into_owned(),
            _ => self.code_input.clone(),
        }
    }

    pub fn uses_file(&self) -> bool {
        self.uploaded_file.as_ref().is_some_and(|b| !b.is_empty())
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    page::respond(&state.registry, Page::default())
}

pub async fn submit(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let submission = match read_submission(request).await {
        Ok(submission) => submission,
        Err(err) => {
            tracing::warn!(error = %err, "rejected form submission");
            return page::respond(
                &state.registry,
                Page {
                    error: Some(&err),
                    ..Page::default()
                },
            );
        }
    };

    let code = submission.resolve_code();
    tracing::info!(
        criterion = %submission.criteria_selected,
        from_file = submission.uses_file(),
        chars = code.len(),
        "review requested"
    );

    let result = coderev_suggest::review(
        state.client.as_ref(),
        &state.settings,
        &state.registry,
        &code,
        &submission.criteria_selected,
    )
    .await;

    let reached_upstream = result.as_ref().map_or_else(ReviewError::reached_upstream, |_| true);
    if reached_upstream && !state.post_call_delay.is_zero() {
        tokio::time::sleep(state.post_call_delay).await;
    }

    let selected = Some(submission.criteria_selected.as_str());
    let pasted = Some(submission.code_input.as_str());
    match &result {
        Ok(output) => page::respond(
            &state.registry,
            Page {
                selected,
                code: pasted,
                output: Some(output),
                error: None,
            },
        ),
        Err(err) => {
            if !err.reached_upstream() {
                tracing::warn!(error = %err, "review not sent");
            }
            page::respond(
                &state.registry,
                Page {
                    selected,
                    code: pasted,
                    output: None,
                    error: Some(err),
                },
            )
        }
    }
}

/// Decode either a multipart or a url-encoded form body.
pub async fn read_submission(request: Request) -> Result<Submission, ReviewError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Form(form) = Form::<ReviewForm>::from_request(request, &())
            .await
            .map_err(|e| ReviewError::MalformedForm(e.to_string()))?;
        return Ok(Submission {
            code_input: form.code_input,
            criteria_selected: form.criteria_selected,
            uploaded_file: None,
        });
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ReviewError::MalformedForm(e.to_string()))?;

    let mut submission = Submission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ReviewError::MalformedForm(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            CODE_FIELD => {
                submission.code_input = field
                    .text()
                    .await
                    .map_err(|e| ReviewError::MalformedForm(e.to_string()))?;
            }
            CRITERIA_FIELD => {
                submission.criteria_selected = field
                    .text()
                    .await
                    .map_err(|e| ReviewError::MalformedForm(e.to_string()))?;
            }
            FILE_FIELD => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ReviewError::MalformedForm(e.to_string()))?;
                submission.uploaded_file = Some(bytes.to_vec());
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(submission)
}

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use coderev_core::CriteriaRegistry;
use coderev_suggest::ReviewError;

/// What a single render of the form page shows.
#[derive(Debug, Default, Clone, Copy)]
pub struct Page<'a> {
    pub selected: Option<&'a str>,
    /// Echoed back into the textarea.
    pub code: Option<&'a str>,
    pub output: Option<&'a str>,
    pub error: Option<&'a ReviewError>,
}

pub fn status_for(err: &ReviewError) -> StatusCode {
    match err {
        ReviewError::ConfigMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
        ReviewError::UnknownCriterion(_) | ReviewError::MalformedForm(_) => {
            StatusCode::BAD_REQUEST
        }
        ReviewError::CompletionFailure(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Text shown to the user. Details stay in the logs.
pub fn user_message(err: &ReviewError) -> &'static str {
    match err {
        ReviewError::ConfigMissing(_) => {
            "The review service is not configured yet. Please contact the administrator."
        }
        ReviewError::UnknownCriterion(_) => "Please choose one of the listed criteria.",
        ReviewError::CompletionFailure(_) => {
            "Error occurred while generating response. Please try again later."
        }
        ReviewError::MalformedForm(_) => "The submitted form could not be read. Please try again.",
    }
}

/// Render the page and pair it with the right status code. Every response
/// from `/`, success or failure, goes through here.
pub fn respond(registry: &CriteriaRegistry, page: Page<'_>) -> Response {
    let status = page.error.map_or(StatusCode::OK, status_for);
    (status, Html(render(registry, page))).into_response()
}

pub fn render(registry: &CriteriaRegistry, page: Page<'_>) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>Code Review Assistant</title>\n</head>\n<body>\n<h1>Code Review Assistant</h1>\n",
    );

    if let Some(err) = page.error {
        out.push_str("<div class=\"error\" role=\"alert\">");
        push_escaped(&mut out, user_message(err));
        out.push_str("</div>\n");
    }

    out.push_str("<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n");
    out.push_str("<label for=\"code_input\">Code</label>\n");
    out.push_str("<textarea id=\"code_input\" name=\"code_input\" rows=\"20\" cols=\"80\">");
    push_escaped(&mut out, page.code.unwrap_or_default());
    out.push_str("</textarea>\n");
    out.push_str("<label for=\"uploaded_file\">Or upload a file</label>\n");
    out.push_str("<input type=\"file\" id=\"uploaded_file\" name=\"uploaded_file\">\n");

    out.push_str("<label for=\"criteria_selected\">Criteria</label>\n");
    out.push_str("<select id=\"criteria_selected\" name=\"criteria_selected\">\n");
    for criterion in registry.criteria() {
        out.push_str("<option value=\"");
        push_escaped(&mut out, &criterion.id);
        out.push('"');
        if page.selected == Some(criterion.id.as_str()) {
            out.push_str(" selected");
        }
        out.push('>');
        push_escaped(&mut out, &criterion.id);
        out.push_str("</option>\n");
    }
    out.push_str("</select>\n");

    out.push_str("<dl class=\"criteria\">\n");
    for criterion in registry.criteria() {
        out.push_str("<dt>");
        push_escaped(&mut out, &criterion.id);
        out.push_str("</dt><dd>");
        push_escaped(&mut out, &criterion.description);
        out.push_str("</dd>\n");
    }
    out.push_str("</dl>\n");

    out.push_str("<button type=\"submit\">Submit</button>\n</form>\n");

    if let Some(output) = page.output {
        out.push_str("<h2>Output</h2>\n<pre id=\"output\">");
        push_escaped(&mut out, output);
        out.push_str("</pre>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

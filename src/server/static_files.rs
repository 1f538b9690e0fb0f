//! Static file serving from the document root.
//!
//! Files are served by `ServeDir`; this module only rewrites HTML responses
//! to load the live-reload client.

use std::sync::{Arc, LazyLock};

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use regex::Regex;
use tower::ServiceExt;
use tracing::warn;

use super::AppState;
use super::app::CLIENT_PATH;

/// Largest HTML page buffered for injection; bigger pages answer 500.
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

static BODY_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("static regex is valid"));

/// Serve a file below the document root, injecting the live-reload client
/// into full HTML responses.
pub(crate) async fn serve_file(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let method = request.method().clone();
    let response = match state.files.clone().oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    if response.status() != StatusCode::OK || !is_html(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    // The injected page no longer matches the file's length or byte ranges.
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::ACCEPT_RANGES);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    if method == Method::HEAD {
        return Response::from_parts(parts, Body::empty());
    }

    match to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => {
            let html = inject_client(&String::from_utf8_lossy(&bytes));
            Response::from_parts(parts, Body::from(html))
        }
        Err(err) => {
            warn!(error = %err, "failed to buffer html page");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

/// Insert the client script tag before the last `</body>`, or append it
/// when the document has none.
pub(crate) fn inject_client(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_PATH}"></script>"#);
    match BODY_CLOSE.find_iter(html).last() {
        Some(m) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..m.start()]);
            out.push_str(&tag);
            out.push_str(&html[m.start()..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::CACHE_CONTROL;
use axum::routing::get;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::AppState;
use super::{client, static_files, websocket};

pub(crate) const WS_PATH: &str = "/__livereload";
pub(crate) const CLIENT_PATH: &str = "/__livereload.js";

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(WS_PATH, get(websocket::ws_handler))
        .route(CLIENT_PATH, get(client::client_script))
        .fallback(static_files::serve_file)
        .layer(no_cache_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Every response is revalidated; outputs change under the browser's feet.
fn no_cache_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tokio::sync::watch;
    use tower::ServiceExt;
    use tower_http::services::ServeDir;

    use super::*;
    use crate::server::ReloadHandle;

    fn router(base_dir: &Path, notify: bool) -> Router {
        let (_tx, shutdown) = watch::channel(false);
        create_router(Arc::new(AppState {
            files: ServeDir::new(base_dir),
            reload: ReloadHandle::new("dist", true),
            notify,
            shutdown,
        }))
    }

    async fn get_path(router: Router, path: &str) -> (StatusCode, header::HeaderMap, String) {
        let response = router
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8_lossy(&body).into_owned())
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.html"),
            "<html><body><h1>Home</h1></body></html>",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("assets/css")).unwrap();
        fs::write(dir.path().join("assets/css/main.min.css"), "a{color:red}").unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "<p>docs</p>").unwrap();
        dir
    }

    #[tokio::test]
    async fn root_serves_index_with_client_injected() {
        let dir = site();
        let (status, headers, body) = get_path(router(dir.path(), false), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(
            body,
            r#"<html><body><h1>Home</h1><script src="/__livereload.js"></script></body></html>"#
        );
    }

    #[tokio::test]
    async fn directory_paths_map_to_index() {
        let dir = site();
        let (status, _, body) = get_path(router(dir.path(), false), "/docs/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<p>docs</p>"));
        assert!(body.ends_with(r#"<script src="/__livereload.js"></script>"#));
    }

    #[tokio::test]
    async fn stylesheets_are_served_untouched() {
        let dir = site();
        let (status, headers, body) =
            get_path(router(dir.path(), false), "/assets/css/main.min.css").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/css"));
        assert_eq!(body, "a{color:red}");
    }

    #[tokio::test]
    async fn missing_and_escaping_paths_are_not_found() {
        let dir = site();
        let (status, headers, _) = get_path(router(dir.path(), false), "/nope.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");

        let (status, _, _) = get_path(router(dir.path(), false), "/../secret.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = get_path(router(dir.path(), false), "/%2e%2e/secret.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_get_methods_are_rejected() {
        let dir = site();
        let response = router(dir.path(), false)
            .oneshot(Request::post("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn head_on_html_has_no_stale_length() {
        let dir = site();
        let response = router(dir.path(), false)
            .oneshot(Request::head("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn conditional_requests_are_honoured_for_assets() {
        let dir = site();
        let (_, headers, _) =
            get_path(router(dir.path(), false), "/assets/css/main.min.css").await;
        let last_modified = headers[header::LAST_MODIFIED].clone();

        let response = router(dir.path(), false)
            .oneshot(
                Request::get("/assets/css/main.min.css")
                    .header(header::IF_MODIFIED_SINCE, last_modified)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn client_script_reflects_notify_flag() {
        let dir = site();
        let (status, headers, body) = get_path(router(dir.path(), true), CLIENT_PATH).await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            headers[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("application/javascript")
        );
        assert!(body.contains("var NOTIFY = true;"));
        assert!(body.contains(WS_PATH));

        let (_, _, body) = get_path(router(dir.path(), false), CLIENT_PATH).await;
        assert!(body.contains("var NOTIFY = false;"));
    }
}

//! Single-page application serving
//!
//! Existing files under the web root are served with a cache policy picked
//! from their path. Anything else falls back to the root `index.html`, which
//! is never cached, so client-side routes resolve on reload.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

const INDEX_FILE: &str = "index.html";

/// Router serving the SPA rooted at `web_dir` for every request it receives
pub fn router(web_dir: impl Into<PathBuf>) -> Router {
    let root = Arc::new(web_dir.into());
    Router::new().fallback(serve_spa).with_state(root)
}

async fn serve_spa(State(root): State<Arc<PathBuf>>, request: Request) -> Response {
    let Some(relative) = clean_path(request.uri().path()) else {
        return serve_index(&root).await;
    };

    let full_path = root.join(&relative);
    let file_path = match tokio::fs::metadata(&full_path).await {
        Ok(meta) if meta.is_dir() => {
            let index = full_path.join(INDEX_FILE);
            if !is_file(&index).await {
                return serve_index(&root).await;
            }
            index
        }
        Ok(_) => full_path,
        Err(_) => {
            debug!(path = %relative, "No static file, serving index.html");
            return serve_index(&root).await;
        }
    };

    let mut response = match ServeFile::new(&file_path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control(&relative)),
    );
    response
}

async fn serve_index(root: &Path) -> Response {
    match tokio::fs::read(root.join(INDEX_FILE)).await {
        Ok(content) => (
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
                (header::PRAGMA, "no-cache"),
                (header::EXPIRES, "0"),
            ],
            content,
        )
            .into_response(),
        Err(e) => {
            warn!(root = %root.display(), error = %e, "index.html is missing");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Normalize a request path into a path relative to the web root.
///
/// `.` and `..` segments are resolved without ever leaving the root; `/`
/// maps to `index.html`. Returns `None` when the path cannot be decoded.
fn clean_path(uri_path: &str) -> Option<String> {
    let decoded = urlencoding::decode(uri_path).ok()?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.contains('\\') || s.contains('\0') => return None,
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        Some(INDEX_FILE.to_string())
    } else {
        Some(segments.join("/"))
    }
}

/// Cache-Control value for a static file
fn cache_control(relative: &str) -> &'static str {
    // Hashed build output
    if relative.contains("assets/") {
        return "public, max-age=31536000, immutable";
    }

    let extension = Path::new(relative)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "js" | "css" | "woff" | "woff2" | "ttf" | "eot" => "public, max-age=86400",
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" | "webp" => "public, max-age=604800",
        _ => "public, max-age=3600",
    }
}

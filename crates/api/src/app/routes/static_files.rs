//! Static assets served from the configured root directory.

use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use crate::app::{errors, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/*path", get(serve_static))
}

pub async fn serve_static(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<String>,
) -> axum::response::Response {
    let requested = path.strip_prefix('/').unwrap_or(&path);
    let Some(file) = resolve(&services.static_root, requested) else {
        return errors::not_found("no such asset");
    };

    match tokio::fs::read(&file).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(&file))],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => errors::not_found("no such asset"),
        Err(e) => {
            tracing::warn!(error = %e, path = %file.display(), "failed to read static asset");
            errors::not_found("no such asset")
        }
    }
}

/// Join `requested` onto `root`, refusing anything that could escape it.
pub fn resolve(root: &FsPath, requested: &str) -> Option<PathBuf> {
    if requested.is_empty() || requested.contains('\\') {
        return None;
    }
    let relative = FsPath::new(requested);
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (resolved != root).then_some(resolved)
}

pub fn content_type(file: &FsPath) -> &'static str {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

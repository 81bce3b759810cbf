//! Status page files served from the static root

use crate::error::{AppError, Result};
use std::path::{Component, Path, PathBuf};

const INDEX_FILE: &str = "index.html";

/// A file read from the static root
#[derive(Debug, Clone)]
pub struct StaticFile {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// Map a request path to a file under `root`
///
/// Segments are percent-decoded before they are checked. Returns `None` for
/// undecodable segments and for parent, root or prefix components.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    if relative.is_empty() {
        return Some(root.join(INDEX_FILE));
    }

    let mut resolved = root.to_path_buf();
    for segment in relative.split('/') {
        let decoded = urlencoding::decode(segment).ok()?;
        if decoded.contains('\0') {
            return None;
        }

        for component in Path::new(decoded.as_ref()).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
    }

    Some(resolved)
}

/// Read the file for `request_path`, directories serve their index
pub async fn load(root: &Path, request_path: &str) -> Result<StaticFile> {
    let mut path = resolve(root, request_path)
        .ok_or_else(|| AppError::not_found(format!("Invalid path: {}", request_path)))?;

    if tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false) {
        path.push(INDEX_FILE);
    }

    let body = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::not_found(format!("No such file: {}", request_path)),
        _ => AppError::io(format!("Failed to read {}: {}", path.display(), e)),
    })?;

    Ok(StaticFile {
        body,
        content_type: content_type_for(&path),
    })
}

pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

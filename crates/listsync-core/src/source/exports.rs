//! Downloaded registration exports.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::SourceError;

/// Most recent export in `dir`: the last regular file by name. Dotfiles,
/// including in-progress downloads, are ignored.
pub fn latest_export(dir: &Path) -> Result<PathBuf, SourceError> {
    let io_error = |source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type().map_err(io_error)?.is_file() {
            files.push(entry.path());
        }
    }

    files.sort();
    files
        .pop()
        .ok_or_else(|| SourceError::NoExports(dir.to_path_buf()))
}

/// Fetch `link` into `dir`, named after the link's last path segment.
///
/// The body is written to a hidden temporary file first and renamed once
/// complete. Returns the path of the saved export.
pub async fn download(
    http: &reqwest::Client,
    link: &str,
    dir: &Path,
    cancel: &CancellationToken,
) -> Result<PathBuf, SourceError> {
    let url = Url::parse(link).map_err(|_| SourceError::InvalidLink(link.to_string()))?;
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty() && !s.starts_with('.'))
        .ok_or_else(|| SourceError::InvalidLink(link.to_string()))?
        .to_string();

    let fetch = async {
        let resp = http.get(url.clone()).send().await?.error_for_status()?;
        resp.bytes().await
    };
    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SourceError::Cancelled),
        body = fetch => body.map_err(|source| SourceError::Download {
            url: link.to_string(),
            source,
        })?,
    };

    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| SourceError::Io { path, source }
    };
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    let partial = dir.join(format!(".{name}.part"));
    let target = dir.join(&name);
    std::fs::write(&partial, &body).map_err(io_error(&partial))?;
    std::fs::rename(&partial, &target).map_err(io_error(&target))?;

    tracing::info!(path = %target.display(), bytes = body.len(), "export downloaded");
    Ok(target)
}

//! Pure helpers: request bodies and URL handling (no HTTP, no status logic).

use serde::Serialize;

use crate::error::{TerrierError, TerrierResult};

/// Body of every "by ids" request.
#[derive(Debug, Serialize)]
pub(crate) struct IdsBody<'a> {
    pub ids: &'a [i64],
}

#[derive(Debug, Serialize)]
pub(crate) struct NumbersBody<'a> {
    pub numbers: &'a [i64],
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub user: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogoutBody<'a> {
    pub user: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PendingUserBody<'a> {
    pub user: &'a str,
    pub password: &'a str,
    pub email: &'a str,
}

/// Resource path of a request URL relative to the framework base URL.
///
/// Used to name the missing resource in `NotFound` errors.
pub(crate) fn resource_from_url(url: &str, base_url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let path = path.strip_prefix(base_url).unwrap_or(path);
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Append percent-encoded path segments to the base URL.
pub(crate) fn join_segments(base_url: &str, segments: &[&str]) -> TerrierResult<String> {
    let mut url = url::Url::parse(base_url).map_err(|e| TerrierError::Config {
        message: format!("invalid framework URL {}: {}", base_url, e),
    })?;
    url.path_segments_mut()
        .map_err(|_| TerrierError::Config {
            message: format!("framework URL cannot be a base: {}", base_url),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

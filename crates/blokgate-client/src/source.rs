//! Remote source download for upload-from-URL.

use blokgate_core::{AssetUpload, Error, Result};
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;

use crate::response::{status_line, transport_reason};

/// File name used when the URL path has no usable last segment.
pub const DEFAULT_FILENAME: &str = "asset";

/// Last non-empty path segment of `url`, or [`DEFAULT_FILENAME`].
pub fn filename_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Download `file_url` into an [`AssetUpload`].
///
/// Every failure is reported as [`Error::SourceFetch`].
pub async fn fetch_source(client: &reqwest::Client, file_url: &str) -> Result<AssetUpload> {
    let url = Url::parse(file_url)
        .map_err(|e| Error::source_fetch(format!("invalid URL '{file_url}': {e}")))?;
    let filename = filename_from_url(&url);

    tracing::debug!(url = %url, "fetching upload source");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::source_fetch(transport_reason(&e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::source_fetch(status_line(status)));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::source_fetch(format!("failed to read body: {e}")))?;

    let mut upload = AssetUpload::new(filename, bytes.to_vec());
    upload.content_type = content_type;
    Ok(upload)
}

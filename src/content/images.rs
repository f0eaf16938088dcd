use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::error::ComposeError;

/// An image as picked in the editor: either already hosted, or a local file
/// that still has to go through the upload service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    File(PathBuf),
}

impl From<&str> for ImageSource {
    /// Only strings without a URL scheme are paths. Anything else stays a
    /// URL, so a bad scheme is rejected by validation instead of uploaded.
    fn from(s: &str) -> Self {
        match Url::parse(s.trim()) {
            Err(url::ParseError::RelativeUrlWithoutBase) => ImageSource::File(PathBuf::from(s)),
            _ => ImageSource::Url(s.trim().to_string()),
        }
    }
}

/// External upload/proxy service. Returns a public URL for the file.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, file: &Path) -> Result<String, ComposeError>;
}

/// Turns picked images into URLs, uploading local files in order.
pub async fn resolve_images(
    uploader: Option<&dyn ImageUploader>,
    sources: Vec<ImageSource>,
) -> Result<Vec<String>, ComposeError> {
    let mut urls = Vec::with_capacity(sources.len());

    for source in sources {
        match source {
            ImageSource::Url(url) => urls.push(url),
            ImageSource::File(path) => {
                let uploader = uploader.ok_or_else(|| {
                    ComposeError::Upload(format!("no upload service for {}", path.display()))
                })?;
                urls.push(uploader.upload(&path).await?);
            }
        }
    }

    Ok(urls)
}

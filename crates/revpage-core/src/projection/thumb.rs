//! Scaled-thumbnail computation

use thiserror::Error;

use crate::errors::{HistoryError, Result};
use crate::model::{Entity, Revision};

/// Requested bounding box for a scaled variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub width: u32,
    pub height: Option<u32>,
}

impl Scale {
    /// Build a scale from optional request parameters.
    ///
    /// A height without a width is rejected; neither means no scaling.
    pub fn from_params(width: Option<u32>, height: Option<u32>) -> Result<Option<Self>> {
        match (width, height) {
            (None, Some(_)) => Err(HistoryError::UrlHeightWithoutWidth),
            (None, None) => Ok(None),
            (Some(width), height) => Ok(Some(Self { width, height })),
        }
    }
}

/// A scaled rendition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub mime: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThumbError {
    #[error("No handler for files of type {mime}")]
    UnsupportedMime { mime: String },

    #[error("Cannot scale a file with zero dimensions")]
    ZeroDimensions,

    #[error("Requested width must be positive")]
    ZeroWidth,
}

/// Produces scaled variants of a revision's content
pub trait ThumbnailScaler: Send + Sync {
    fn transform(
        &self,
        entity: &Entity,
        revision: &Revision,
        scale: Scale,
    ) -> std::result::Result<Thumbnail, ThumbError>;
}

/// Scaler that derives thumbnail paths under a base URL
///
/// Never upscales: a request at least as large as the original returns the
/// original URL and dimensions. SVG renders to PNG.
#[derive(Debug, Clone)]
pub struct PathScaler {
    base_url: String,
}

impl PathScaler {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn thumb_mime(mime: &str) -> &str {
        match mime {
            "image/svg+xml" => "image/png",
            other => other,
        }
    }

    /// Width after fitting the original into the requested box
    fn fitted_width(revision: &Revision, scale: Scale) -> u32 {
        let width = scale.width.min(revision.width);
        match scale.height {
            Some(box_h) if box_h > 0 => {
                let h = scaled_height(revision, width);
                if h > box_h {
                    let by_height = u64::from(revision.width) * u64::from(box_h)
                        / u64::from(revision.height);
                    (by_height as u32).max(1)
                } else {
                    width
                }
            }
            _ => width,
        }
    }
}

fn scaled_height(revision: &Revision, width: u32) -> u32 {
    let h = (u64::from(revision.height) * u64::from(width) + u64::from(revision.width) / 2)
        / u64::from(revision.width);
    (h as u32).max(1)
}

impl ThumbnailScaler for PathScaler {
    fn transform(
        &self,
        entity: &Entity,
        revision: &Revision,
        scale: Scale,
    ) -> std::result::Result<Thumbnail, ThumbError> {
        if !revision.mime.starts_with("image/") {
            return Err(ThumbError::UnsupportedMime {
                mime: revision.mime.clone(),
            });
        }
        if scale.width == 0 {
            return Err(ThumbError::ZeroWidth);
        }
        if revision.width == 0 || revision.height == 0 {
            return Err(ThumbError::ZeroDimensions);
        }

        let width = Self::fitted_width(revision, scale);
        if width >= revision.width {
            return Ok(Thumbnail {
                url: revision.url.clone(),
                width: revision.width,
                height: revision.height,
                mime: revision.mime.clone(),
            });
        }

        let name = entity.id.as_str().replace(' ', "_");
        let mime = Self::thumb_mime(&revision.mime);
        let suffix = if mime != revision.mime { ".png" } else { "" };
        Ok(Thumbnail {
            url: format!("{}/thumb/{}/{}px-{}{}", self.base_url, name, width, name, suffix),
            width,
            height: scaled_height(revision, width),
            mime: mime.to_string(),
        })
    }
}

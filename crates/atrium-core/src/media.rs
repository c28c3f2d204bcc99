// SPDX-License-Identifier: Apache-2.0
//! Stored media assets.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::id::{AssetId, OrgId};

/// Upload category; also the middle segment of the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// 360° panorama referenced by graph nodes.
    Panorama,
    /// Icon artwork (areas, markers).
    Icon,
    /// Raster floor-plan image referenced by floors.
    Floorplan,
}

impl MediaKind {
    /// Stable storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Panorama => "panorama",
            Self::Icon => "icon",
            Self::Floorplan => "floorplan",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown media kind string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media kind: {0}")]
pub struct UnknownMediaKind(pub String);

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "panorama" => Ok(Self::Panorama),
            "icon" => Ok(Self::Icon),
            "floorplan" => Ok(Self::Floorplan),
            other => Err(UnknownMediaKind(other.to_owned())),
        }
    }
}

/// A storage-backed blob.
///
/// Assets are referenced by id from nodes and floors and are never
/// deep-copied on publish; every revision of a venue shares them.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    /// Asset identifier.
    pub id: AssetId,
    /// Owning organization.
    pub org: OrgId,
    /// Storage bucket.
    pub bucket: String,
    /// Object key: `{org}/{kind}/{asset}{ext}`.
    pub key: String,
    /// Original client file name.
    pub file_name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Upload category.
    pub kind: MediaKind,
    /// Declared size in bytes.
    pub size_bytes: i64,
    /// Pixel width; 0 until the upload is confirmed.
    pub width: i32,
    /// Pixel height; 0 until the upload is confirmed.
    pub height: i32,
    /// Public read URL served via the CDN.
    pub public_url: String,
    /// Reduced-resolution variant for the authoring UI, when generated.
    pub thumbnail_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl MediaAsset {
    /// URL the authoring UI should load: the thumbnail when one exists,
    /// otherwise the full-resolution asset.
    #[must_use]
    pub fn preview_url(&self) -> &str {
        self.thumbnail_url.as_deref().unwrap_or(&self.public_url)
    }
}

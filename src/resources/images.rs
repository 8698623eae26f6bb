//! Portal branding images.
//!
//! Each platform slot is filled from one derived variant. Slot names keep
//! the platform's file names even though the uploaded bytes are JPEG.

use std::path::{Path, PathBuf};

use serde_json::json;

use super::{object, path_segment};
use crate::api::{ApiError, ConflictSignal, FilePart, ResourceDescriptor};
use crate::assets::{DerivedAssetSet, ImageSize};

/// A named image slot on the platform and the variant that fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSlot {
    pub filename: &'static str,
    pub size: ImageSize,
}

const PWA_LARGE: ImageSize = ImageSize::new(512, 512);
const PWA_SMALL: ImageSize = ImageSize::new(192, 192);
const BANNER: ImageSize = ImageSize::new(250, 150);

pub const SLOTS: [ImageSlot; 8] = [
    ImageSlot { filename: "512PWA.png", size: PWA_LARGE },
    ImageSlot { filename: "192PWA.png", size: PWA_SMALL },
    ImageSlot { filename: "favicon.gif", size: PWA_SMALL },
    ImageSlot { filename: "video_main_top_left.png", size: BANNER },
    ImageSlot { filename: "video_login.png", size: BANNER },
    ImageSlot { filename: "portal_main_top_left.png", size: BANNER },
    ImageSlot { filename: "portal_landing.png", size: BANNER },
    ImageSlot { filename: "webphone_main_top_left.png", size: BANNER },
];

/// One slot paired with the local file that will be uploaded into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    pub source: PathBuf,
}

/// Map every slot to its variant. Fails if any variant is missing so that
/// nothing is uploaded from an incomplete set.
pub fn plan_uploads(assets: &DerivedAssetSet) -> anyhow::Result<Vec<ImageUpload>> {
    let missing: Vec<String> = SLOTS
        .iter()
        .filter(|slot| assets.get(slot.size).is_none())
        .map(|slot| format!("{} ({})", slot.filename, slot.size))
        .collect();
    if !missing.is_empty() {
        anyhow::bail!(
            "Derived image set is incomplete, missing variants for: {}",
            missing.join(", ")
        );
    }

    Ok(SLOTS
        .iter()
        .filter_map(|slot| {
            assets.get(slot.size).map(|asset| ImageUpload {
                filename: slot.filename.to_string(),
                source: asset.path.clone(),
            })
        })
        .collect())
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

impl ImageUpload {
    /// Read the source file and build the multipart upload for `server`.
    pub async fn descriptor(&self, server: &str) -> Result<ResourceDescriptor, ApiError> {
        let bytes = tokio::fs::read(&self.source)
            .await
            .map_err(|source| ApiError::UploadFile {
                path: self.source.display().to_string(),
                source,
            })?;
        let file = FilePart {
            field: "File".into(),
            filename: self.filename.clone(),
            mime: mime_for(&self.source).into(),
            bytes,
        };
        let path = format!("/images/{}", path_segment(&self.filename));
        Ok(ResourceDescriptor::new(format!("image {}", self.filename), path)
            .with_defaults(object(json!({
                "reseller": "*",
                "domain": "*",
                "description": "viaAPI",
            })))
            .with_field("filename", self.filename.as_str())
            .with_field("server", server)
            .with_file(file)
            .conflict_signal(ConflictSignal::StatusOrExistsMessage))
    }
}

//! Decode a source image and write its fixed-size JPEG variants.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::error::FetchError;
use super::{DerivedAsset, DerivedAssetSet, ImageSize};

/// Decode `bytes` and flatten to 8-bit RGB.
///
/// Palette images are expanded by the decoder; any alpha channel is
/// composited over white so transparent regions do not turn black in JPEG.
pub(crate) fn decode_rgb(bytes: &[u8], origin: &str) -> Result<RgbImage, FetchError> {
    let img = image::load_from_memory(bytes).map_err(|source| FetchError::Decode {
        origin: origin.to_string(),
        source,
    })?;
    tracing::debug!(
        origin,
        color = ?img.color(),
        width = img.width(),
        height = img.height(),
        "decoded source image"
    );
    Ok(flatten_to_rgb(img))
}

fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let blend = |c: u8| -> u8 {
            let (c, a) = (u32::from(c), u32::from(a));
            ((c * a + 255 * (255 - a) + 127) / 255) as u8
        };
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Resize `img` to every size (stretching, not preserving aspect ratio) and
/// write each as `{w}x{h}.jpg` in `out_dir`.
///
/// Each file is written to a `.part` sibling and renamed into place.
pub(crate) fn write_variants(
    img: &RgbImage,
    sizes: &[ImageSize],
    out_dir: &Path,
) -> Result<DerivedAssetSet, FetchError> {
    std::fs::create_dir_all(out_dir)?;
    let mut set = DerivedAssetSet::default();

    for &size in sizes {
        if set.get(size).is_some() {
            continue;
        }
        let resized = imageops::resize(img, size.width, size.height, FilterType::Lanczos3);
        let path = out_dir.join(size.file_name());
        let part_path = out_dir.join(format!("{}.part", size.file_name()));

        if let Err(source) = resized.save_with_format(&part_path, ImageFormat::Jpeg) {
            let _ = std::fs::remove_file(&part_path);
            return Err(FetchError::Encode { path, source });
        }
        std::fs::rename(&part_path, &path)?;
        tracing::info!("Resized image saved to {}", path.display());

        set.insert(DerivedAsset { size, path });
    }

    Ok(set)
}

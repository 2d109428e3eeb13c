//! Thumbnail production: cover-fit resize to the exact target size,
//! keeping animated GIFs animated.

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, Frame, ImageFormat};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::classify::ThumbnailSpec;
use super::IngestError;

/// Write the thumbnail for `input` at `output`, cropping to fill the
/// spec's exact dimensions. Parent directories are created. The encode
/// goes to a temp sibling which is renamed into place, so a failure never
/// leaves a partial file at the destination.
pub fn write_thumbnail(
    input: &Path,
    output: &Path,
    spec: &ThumbnailSpec,
) -> Result<(), IngestError> {
    let failed = |reason: String| IngestError::Thumbnail {
        path: input.to_path_buf(),
        reason,
    };

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
    }

    let tmp = temp_sibling(output);
    let result = if is_gif(input) {
        encode_animated_gif(input, &tmp, spec)
    } else {
        encode_static(input, output, &tmp, spec)
    };

    if let Err(reason) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(failed(reason));
    }

    std::fs::rename(&tmp, output).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        failed(e.to_string())
    })
}

fn is_gif(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gif"))
        .unwrap_or(false)
}

fn temp_sibling(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "thumbnail".to_string());
    output.with_file_name(format!("{name}.tmp"))
}

fn encode_static(
    input: &Path,
    output: &Path,
    tmp: &Path,
    spec: &ThumbnailSpec,
) -> Result<(), String> {
    let format = ImageFormat::from_path(output).map_err(|e| e.to_string())?;
    let img = image::open(input).map_err(|e| e.to_string())?;
    let thumb = img.resize_to_fill(spec.width, spec.height, FilterType::Lanczos3);
    thumb.save_with_format(tmp, format).map_err(|e| e.to_string())
}

/// Frame-by-frame re-encode so the animation survives; a first-frame
/// capture is not acceptable output.
fn encode_animated_gif(input: &Path, tmp: &Path, spec: &ThumbnailSpec) -> Result<(), String> {
    let file = File::open(input).map_err(|e| e.to_string())?;
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(|e| e.to_string())?;
    let frames = decoder.into_frames().collect_frames().map_err(|e| e.to_string())?;

    let out = File::create(tmp).map_err(|e| e.to_string())?;
    let mut encoder = GifEncoder::new(out);
    encoder.set_repeat(Repeat::Infinite).map_err(|e| e.to_string())?;

    let resized = frames.into_iter().map(|frame| {
        let delay = frame.delay();
        let buffer = DynamicImage::ImageRgba8(frame.into_buffer())
            .resize_to_fill(spec.width, spec.height, FilterType::Lanczos3)
            .into_rgba8();
        Frame::from_parts(buffer, 0, 0, delay)
    });
    encoder.encode_frames(resized).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::classify::classify;

    #[test]
    fn static_thumbnail_has_exact_target_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.png");
        let output = dir.path().join("thumbs").join("wide.png");
        let img = image::RgbaImage::from_pixel(1000, 500, image::Rgba([200, 100, 50, 255]));
        img.save(&input).unwrap();

        let spec = classify(1000, 500);
        write_thumbnail(&input, &output, &spec).unwrap();

        let thumb = image::open(&output).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (spec.width, spec.height));
    }

    #[test]
    fn failure_leaves_no_file_at_destination() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        let output = dir.path().join("broken-thumb.png");
        std::fs::write(&input, b"garbage").unwrap();

        let err = write_thumbnail(&input, &output, &classify(100, 100)).unwrap_err();
        assert!(matches!(err, IngestError::Thumbnail { .. }));
        assert!(!output.exists());
        assert!(!temp_sibling(&output).exists());
    }

    #[test]
    fn gif_thumbnail_keeps_all_frames() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("anim.gif");
        let output = dir.path().join("anim-thumb.gif");

        // two-frame source gif
        {
            let file = File::create(&input).unwrap();
            let mut encoder = GifEncoder::new(file);
            for shade in [60u8, 200u8] {
                let buf = image::RgbaImage::from_pixel(400, 300, image::Rgba([shade, 0, 0, 255]));
                encoder
                    .encode_frames([Frame::new(buf)])
                    .unwrap();
            }
        }

        let spec = classify(400, 300);
        write_thumbnail(&input, &output, &spec).unwrap();

        let decoder = GifDecoder::new(BufReader::new(File::open(&output).unwrap())).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 2, "animation must survive the resize");
        assert_eq!(frames[0].buffer().width(), spec.width);
        assert_eq!(frames[0].buffer().height(), spec.height);
    }
}

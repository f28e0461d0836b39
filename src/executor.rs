use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;

use crate::error::{CropError, CropResult};
use crate::geometry::{NativeSize, PixelRect, Rect, scale_factors, to_native_rect};
use crate::selection::SelectionState;

/// Output quality on the JPEG 1-100 scale.
pub const JPEG_QUALITY: u8 = 90;

/// Where the session's image comes from. Remote images are fetched by the
/// host and handed over as bytes.
#[derive(Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

impl ImageSource {
    /// Decode into a fresh image, independent of whatever the host displays.
    pub fn decode(&self) -> CropResult<DynamicImage> {
        match self {
            ImageSource::Path(path) => image::open(path)
                .map_err(|e| CropError::SourceLoad(format!("{}: {e}", path.display()))),
            ImageSource::Bytes(bytes) => image::load_from_memory(bytes)
                .map_err(|e| CropError::SourceLoad(e.to_string())),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes.into())
    }
}

/// A finished crop, ready to be written or embedded.
#[derive(Clone, Debug)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// The region of the source image that was extracted.
    pub region: PixelRect,
}

impl EncodedImage {
    pub const MIME: &'static str = "image/jpeg";

    pub fn to_data_uri(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{b64}", Self::MIME)
    }
}

/// Extract the selected region of `source` and encode it.
///
/// `frame` must be measured now, against the same image the selection was
/// drawn on; `recorded` is the native size the viewport saw at load time.
pub fn execute(
    selection: &SelectionState,
    source: &ImageSource,
    frame: Rect,
    recorded: NativeSize,
) -> CropResult<EncodedImage> {
    let rect = selection.settled_rect().ok_or(CropError::NoSelection)?;

    let img = source.decode()?;
    let native = NativeSize::new(img.width(), img.height());
    if native != recorded {
        tracing::warn!(
            ?recorded,
            ?native,
            "decoded size differs from the displayed image; selection may be stale"
        );
    }

    let scale = scale_factors(native, frame.size());
    let region = PixelRect::snap(to_native_rect(rect, frame, scale, native), native);
    tracing::debug!(?rect, ?frame, ?region, "cropping");

    let cropped = img.crop_imm(region.x, region.y, region.width, region.height);
    let bytes = encode_jpeg(&cropped)?;

    tracing::info!(
        width = region.width,
        height = region.height,
        bytes = bytes.len(),
        "crop encoded"
    );
    Ok(EncodedImage {
        bytes,
        width: region.width,
        height: region.height,
        region,
    })
}

fn encode_jpeg(img: &DynamicImage) -> CropResult<Vec<u8>> {
    // JPEG carries no alpha channel.
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut Cursor::new(&mut bytes), JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| CropError::Encode(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    use super::*;

    /// PNG whose pixels encode their own coordinates in the red/green channels.
    pub(crate) fn gradient_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn committed(rect: Rect) -> SelectionState {
        SelectionState::Committed { rect }
    }

    #[test]
    fn crops_scaled_selection_in_native_pixels() {
        let source = ImageSource::from(gradient_png(800, 600));
        let frame = Rect::new(0.0, 0.0, 400.0, 300.0);
        let out = execute(
            &committed(Rect::new(100.0, 100.0, 100.0, 75.0)),
            &source,
            frame,
            NativeSize::new(800, 600),
        )
        .unwrap();

        assert_eq!(
            out.region,
            PixelRect {
                x: 200,
                y: 200,
                width: 200,
                height: 150
            }
        );
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (200, 150));
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn copies_pixels_without_resampling() {
        let source = ImageSource::from(gradient_png(256, 256));
        let frame = Rect::new(10.0, 10.0, 256.0, 256.0);
        let out = execute(
            &committed(Rect::new(50.0, 60.0, 64.0, 32.0)),
            &source,
            frame,
            NativeSize::new(256, 256),
        )
        .unwrap();
        assert_eq!(out.region.x, 40);
        assert_eq!(out.region.y, 50);

        // JPEG is lossy; the gradient should survive within a small tolerance.
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        let px = decoded.get_pixel(16, 8);
        assert!((px[0] as i32 - 56).abs() <= 6, "red {}", px[0]);
        assert!((px[1] as i32 - 58).abs() <= 6, "green {}", px[1]);
    }

    #[test]
    fn selection_past_edge_is_clamped_to_image() {
        let source = ImageSource::from(gradient_png(100, 80));
        let frame = Rect::new(0.0, 0.0, 100.0, 80.0);
        let out = execute(
            &committed(Rect::new(90.0, 70.0, 40.0, 40.0)),
            &source,
            frame,
            NativeSize::new(100, 80),
        )
        .unwrap();
        assert!(out.region.x + out.region.width <= 100);
        assert!(out.region.y + out.region.height <= 80);
        assert_eq!(out.region.width, 40);
    }

    #[test]
    fn drafting_selection_is_rejected() {
        let source = ImageSource::from(gradient_png(10, 10));
        let drafting = SelectionState::Drafting {
            anchor: Default::default(),
            rect: Rect::new(0.0, 0.0, 5.0, 5.0),
        };
        let err = execute(
            &drafting,
            &source,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            NativeSize::new(10, 10),
        )
        .unwrap_err();
        assert!(matches!(err, CropError::NoSelection));
    }

    #[test]
    fn undecodable_source_is_a_load_error() {
        let source = ImageSource::from(b"definitely not an image".to_vec());
        let err = execute(
            &committed(Rect::new(0.0, 0.0, 5.0, 5.0)),
            &source,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            NativeSize::new(10, 10),
        )
        .unwrap_err();
        assert!(matches!(err, CropError::SourceLoad(_)));
        assert!(err.is_user_facing());
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let source = ImageSource::Path(PathBuf::from("/nonexistent/regioncrop/input.png"));
        assert!(matches!(source.decode(), Err(CropError::SourceLoad(_))));
    }

    #[test]
    fn data_uri_has_jpeg_prefix() {
        let encoded = EncodedImage {
            bytes: vec![0xff, 0xd8, 0xff],
            width: 1,
            height: 1,
            region: PixelRect {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
        };
        assert_eq!(encoded.to_data_uri(), "data:image/jpeg;base64,/9j/");
    }
}

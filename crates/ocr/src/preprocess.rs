use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Decoded image is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Byte order of the three 8-bit channels in a `Raster`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// A height×width×3 8-bit image that remembers its channel order.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub pixels: RgbImage,
    pub order: ChannelOrder,
}

impl Raster {
    pub fn new(pixels: RgbImage, order: ChannelOrder) -> Self {
        Self { pixels, order }
    }

    /// Decoded images are always RGB-ordered.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        Self::new(img.to_rgb8(), ChannelOrder::Rgb)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Reorder channels in place if needed.
    pub fn into_order(mut self, order: ChannelOrder) -> Self {
        if self.order != order {
            for p in self.pixels.pixels_mut() {
                p.0.swap(0, 2);
            }
            self.order = order;
        }
        self
    }
}

/// Tunables for `enhance`. Defaults: sharpness 2.0, 2× upscale, 1024×1024 output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceOptions {
    /// 1.0 leaves the image unchanged; larger values sharpen.
    pub sharpness: f32,
    pub scale_factor: f32,
    pub output_width: u32,
    pub output_height: u32,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            sharpness: 2.0,
            scale_factor: 2.0,
            output_width: 1024,
            output_height: 1024,
        }
    }
}

/// Decode raw bytes (JPEG / PNG / WEBP / …) into an image, rejecting zero-size results.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, DecodeError> {
    let img = image::load_from_memory(data)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::Empty { width: img.width(), height: img.height() });
    }
    Ok(img)
}

/// Sharpen → Lanczos upscale → bicubic resample to the fixed output size, returned
/// in `target` channel order. The input must be non-empty.
pub fn enhance(input: Raster, opts: &EnhanceOptions, target: ChannelOrder) -> Raster {
    debug_assert!(input.width() > 0 && input.height() > 0, "enhance on empty raster");

    let rgb = input.into_order(ChannelOrder::Rgb).pixels;
    let sharpened = sharpen(&rgb, opts.sharpness);

    let up_w = ((rgb.width() as f32 * opts.scale_factor) as u32).max(1);
    let up_h = ((rgb.height() as f32 * opts.scale_factor) as u32).max(1);
    let upscaled = imageops::resize(&sharpened, up_w, up_h, FilterType::Lanczos3);

    let fixed = imageops::resize(
        &upscaled,
        opts.output_width,
        opts.output_height,
        FilterType::CatmullRom,
    );

    Raster::new(fixed, ChannelOrder::Rgb).into_order(target)
}

/// Blend between a smoothed copy and the original: `smooth + factor * (orig - smooth)`.
/// The smoothing kernel is 1 everywhere and 5 at the centre, normalized by 13.
/// Border pixels are left untouched.
fn sharpen(img: &RgbImage, factor: f32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return img.clone();
    }

    ImageBuffer::from_fn(w, h, |x, y| {
        let orig = img.get_pixel(x, y);
        if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
            return *orig;
        }
        let mut sums = [0u32; 3];
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                let weight = if nx == x && ny == y { 5 } else { 1 };
                let p = img.get_pixel(nx, ny);
                for c in 0..3 {
                    sums[c] += weight * p[c] as u32;
                }
            }
        }
        let mut out = [0u8; 3];
        for c in 0..3 {
            let soft = sums[c] as f32 / 13.0;
            let v = soft + factor * (orig[c] as f32 - soft);
            out[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}

/// PNG-encode a raster for engines that only accept encoded images.
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>, image::ImageError> {
    let rgb = raster.clone().into_order(ChannelOrder::Rgb).pixels;
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, px: [u8; 3]) -> RgbImage {
        ImageBuffer::from_pixel(width, height, Rgb(px))
    }

    fn vertical_edge() -> RgbImage {
        ImageBuffer::from_fn(6, 3, |x, _| if x < 3 { Rgb([100; 3]) } else { Rgb([200; 3]) })
    }

    fn small_opts() -> EnhanceOptions {
        EnhanceOptions { output_width: 64, output_height: 48, ..EnhanceOptions::default() }
    }

    #[test]
    fn default_output_is_1024_square() {
        let out = enhance(
            Raster::new(solid(10, 7, [10, 20, 30]), ChannelOrder::Rgb),
            &EnhanceOptions::default(),
            ChannelOrder::Rgb,
        );
        assert_eq!(out.pixels.dimensions(), (1024, 1024));
    }

    #[test]
    fn output_size_is_fixed_regardless_of_input() {
        for (w, h) in [(1, 1), (5, 300), (200, 20)] {
            let out = enhance(
                Raster::new(solid(w, h, [0, 0, 0]), ChannelOrder::Rgb),
                &small_opts(),
                ChannelOrder::Rgb,
            );
            assert_eq!(out.pixels.dimensions(), (64, 48));
        }
    }

    #[test]
    fn sharpness_one_is_identity() {
        let img = vertical_edge();
        assert_eq!(sharpen(&img, 1.0), img);
    }

    #[test]
    fn sharpening_increases_edge_contrast() {
        let out = sharpen(&vertical_edge(), 2.0);
        assert!(out.get_pixel(2, 1)[0] < 100);
        assert!(out.get_pixel(3, 1)[0] > 200);
        // Border rows stay as they were.
        assert_eq!(out.get_pixel(2, 0)[0], 100);
    }

    #[test]
    fn channel_order_is_tracked() {
        let bgr = Raster::new(solid(4, 4, [1, 2, 3]), ChannelOrder::Bgr);
        let out = enhance(bgr, &small_opts(), ChannelOrder::Bgr);
        assert_eq!(out.order, ChannelOrder::Bgr);
        let px = out.pixels.get_pixel(10, 10);
        for (got, want) in px.0.iter().zip([1u8, 2, 3]) {
            assert!(got.abs_diff(want) <= 1, "{px:?}");
        }

        let rgb = Raster::new(solid(4, 4, [1, 2, 3]), ChannelOrder::Bgr).into_order(ChannelOrder::Rgb);
        assert_eq!(*rgb.pixels.get_pixel(0, 0), Rgb([3, 2, 1]));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_image(b"definitely not an image"), Err(DecodeError::Image(_))));
    }

    #[test]
    fn encode_then_decode_keeps_dimensions() {
        let png = encode_png(&Raster::new(solid(5, 4, [9, 9, 9]), ChannelOrder::Rgb)).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let img = decode_image(&png).unwrap();
        assert_eq!((img.width(), img.height()), (5, 4));
    }
}

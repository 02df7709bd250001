//! Geometric augmentation shared by both frames and the label mask.
//!
//! One [`Geometry`] is drawn per sampled pair and then applied to every image
//! of the pair through [`warp`], so frames and mask always agree spatially.
//! Frames are resampled bilinearly, masks with nearest neighbour so their
//! values never blend.

use super::config::AugParams;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel, RgbImage};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interp {
    Bilinear,
    Nearest,
}

impl Interp {
    fn filter(self) -> FilterType {
        match self {
            Interp::Bilinear => FilterType::Triangle,
            Interp::Nearest => FilterType::Nearest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineParams {
    /// relative size change, the canvas is resized by `1 + scale`
    pub scale: f64,
    /// degrees, counter-clockwise
    pub rotation: f64,
    /// pixels
    pub trans_w: i64,
    /// pixels
    pub trans_h: i64,
    pub flip: bool,
}

impl AffineParams {
    pub fn scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        let w = (width as f64 * (1.0 + self.scale)) as u32;
        let h = (height as f64 * (1.0 + self.scale)) as u32;
        (w.max(1), h.max(1))
    }
}

impl std::fmt::Display for AffineParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scale: {:.4}; rotation: {:.3}; translation: ({},{}); flip: {}",
            self.scale, self.rotation, self.trans_w, self.trans_h, self.flip
        )
    }
}

/// Geometry of one sampled pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// plain resize to the output size
    Resize,
    Affine(AffineParams),
}

impl Geometry {
    /// Draws the pair geometry. With `params == None` (augmentation off)
    /// nothing is drawn from `rng`.
    ///
    /// Draw order: gate in `[0, aug_num]` (0 skips), scale, rotation,
    /// width and height translation, and the flip coin when flipping is on.
    pub fn draw<R: Rng>(
        params: Option<&AugParams>,
        width: u32,
        height: u32,
        rng: &mut R,
    ) -> Self {
        let Some(p) = params else {
            return Geometry::Resize;
        };
        if rng.gen_range(0..=p.aug_num) == 0 {
            return Geometry::Resize;
        }
        let mut symmetric = || rng.gen::<f64>() * 2.0 - 1.0;
        let scale = symmetric() * p.max_scale;
        let rotation = symmetric() * p.max_rotate;
        let trans_w = (symmetric() * p.max_trans_w * width as f64) as i64;
        let trans_h = (symmetric() * p.max_trans_h * height as f64) as i64;
        let flip = p.flip && rng.gen_range(0..=1u32) > 0;
        Geometry::Affine(AffineParams {
            scale,
            rotation,
            trans_w,
            trans_h,
            flip,
        })
    }

    pub fn is_augmented(&self) -> bool {
        matches!(self, Geometry::Affine(_))
    }
}

type Buffer<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Brings `img` to `width`×`height` through `geometry`.
///
/// Affine order: resize by `1 + scale`, translate, rotate about the centre,
/// optional mirror, then centre-crop (scale > 0) or resize back.
pub fn warp<P>(
    img: &Buffer<P>,
    geometry: &Geometry,
    interp: Interp,
    width: u32,
    height: u32,
) -> Buffer<P>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let filter = interp.filter();
    let p = match geometry {
        Geometry::Resize => return imageops::resize(img, width, height, filter),
        Geometry::Affine(p) => p,
    };

    let (sw, sh) = p.scaled_size(width, height);
    let mut out = imageops::resize(img, sw, sh, filter);
    if p.trans_w != 0 || p.trans_h != 0 {
        out = translate(&out, p.trans_w, p.trans_h);
    }
    if p.rotation != 0.0 {
        out = rotate_about_center(&out, p.rotation);
    }
    if p.flip {
        out = imageops::flip_horizontal(&out);
    }
    if p.scale > 0.0 && sw >= width && sh >= height {
        let x = (sw - width) / 2;
        let y = (sh - height) / 2;
        imageops::crop_imm(&out, x, y, width, height).to_image()
    } else {
        imageops::resize(&out, width, height, filter)
    }
}

/// Output pixel (x, y) takes input pixel (x + dx, y + dy); pixels sourced
/// from outside the image are zero.
pub fn translate<P: Pixel>(img: &Buffer<P>, dx: i64, dy: i64) -> Buffer<P> {
    let (w, h) = img.dimensions();
    let mut out: Buffer<P> = ImageBuffer::new(w, h);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let sx = x as i64 + dx;
        let sy = y as i64 + dy;
        if sx >= 0 && sy >= 0 && sx < w as i64 && sy < h as i64 {
            *px = *img.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}

/// Counter-clockwise rotation about the image centre on the same canvas,
/// nearest-neighbour sampled at pixel centres, zero fill.
pub fn rotate_about_center<P: Pixel>(img: &Buffer<P>, degrees: f64) -> Buffer<P> {
    let (w, h) = img.dimensions();
    let theta = -degrees.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;

    let mut out: Buffer<P> = ImageBuffer::new(w, h);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        let sx = (cos_t * dx + sin_t * dy + cx).floor();
        let sy = (-sin_t * dx + cos_t * dy + cy).floor();
        if sx >= 0.0 && sy >= 0.0 && sx < w as f64 && sy < h as f64 {
            *px = *img.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}

/// Raw label value per pixel: the largest colour channel, so grayscale and
/// palette annotations both keep background at 0.
///
/// Values are read at 16 bits and narrowed afterwards; any non-zero sample
/// stays at least 1.
pub fn label_values(img: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = img {
        return gray.clone();
    }
    let rgb = img.to_rgb16();
    let (w, h) = rgb.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| {
        let p = rgb.get_pixel(x, y);
        let max = p[0].max(p[1]).max(p[2]);
        Luma([(max >> 8).max(u16::from(max > 0)) as u8])
    })
}

/// Maps every non-zero label value to 1.
pub fn binarize(mask: &mut GrayImage) {
    for px in mask.pixels_mut() {
        px[0] = u8::from(px[0] > 0);
    }
}

/// RGB image to a CHW buffer in BGR order with `mean` (BGR) subtracted.
pub fn frame_to_chw(img: &RgbImage, mean: [f32; 3]) -> Vec<f32> {
    let (w, h) = img.dimensions();
    let plane = (w * h) as usize;
    let mut out = vec![0f32; 3 * plane];
    for (x, y, px) in img.enumerate_pixels() {
        let i = (y * w + x) as usize;
        for c in 0..3 {
            out[c * plane + i] = px[2 - c] as f32 - mean[c];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn params() -> AugParams {
        AugParams {
            aug_num: 3,
            max_scale: 0.2,
            max_rotate: 15.0,
            max_trans_w: 0.1,
            max_trans_h: 0.1,
            flip: true,
        }
    }

    #[test]
    fn resize_path_keeps_constant_mask() {
        let mask = GrayImage::new(100, 100);
        let out = warp(&mask, &Geometry::Resize, Interp::Nearest, 854, 480);
        assert_eq!(out.dimensions(), (854, 480));
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn no_params_draws_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut before = rng.clone();
        assert_eq!(Geometry::draw(None, 854, 480, &mut rng), Geometry::Resize);
        assert_eq!(rng.next_u64(), before.next_u64());
    }

    #[test]
    fn zero_denominator_always_skips() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let p = AugParams {
            aug_num: 0,
            ..params()
        };
        for _ in 0..100 {
            assert_eq!(Geometry::draw(Some(&p), 854, 480, &mut rng), Geometry::Resize);
        }
    }

    #[test]
    fn drawn_params_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let p = params();
        let (mut skipped, mut flipped, mut total) = (0, 0, 0);
        for _ in 0..2000 {
            total += 1;
            match Geometry::draw(Some(&p), 854, 480, &mut rng) {
                Geometry::Resize => skipped += 1,
                Geometry::Affine(a) => {
                    assert!(a.scale.abs() <= 0.2);
                    assert!(a.rotation.abs() <= 15.0);
                    assert!(a.trans_w.abs() <= 85);
                    assert!(a.trans_h.abs() <= 48);
                    if a.flip {
                        flipped += 1;
                    }
                }
            }
        }
        // skip probability is 1/4
        assert!(skipped > total / 8 && skipped < total * 3 / 8);
        assert!(flipped > 0);
    }

    #[test]
    fn flip_disabled_never_flips() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let p = AugParams {
            flip: false,
            ..params()
        };
        for _ in 0..200 {
            if let Geometry::Affine(a) = Geometry::draw(Some(&p), 854, 480, &mut rng) {
                assert!(!a.flip);
            }
        }
    }

    #[test]
    fn translate_shifts_content() {
        let mut img = GrayImage::new(4, 3);
        img.put_pixel(2, 1, Luma([9]));
        let out = translate(&img, 1, 1);
        assert_eq!(out.get_pixel(1, 0)[0], 9);
        assert_eq!(out.pixels().filter(|p| p[0] != 0).count(), 1);

        let gone = translate(&img, 5, 0);
        assert!(gone.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn rotate_quarter_turn_is_counter_clockwise() {
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(3, 0, Luma([7]));
        let out = rotate_about_center(&img, 90.0);
        assert_eq!(out.get_pixel(0, 0)[0], 7);
        assert_eq!(out.pixels().filter(|p| p[0] != 0).count(), 1);
    }

    #[test]
    fn affine_outputs_have_target_size() {
        let frame = RgbImage::from_pixel(120, 90, Rgb([10, 20, 30]));
        for scale in [0.15, -0.15, 0.0] {
            let g = Geometry::Affine(AffineParams {
                scale,
                rotation: 7.5,
                trans_w: -5,
                trans_h: 3,
                flip: true,
            });
            let out = warp(&frame, &g, Interp::Bilinear, 80, 60);
            assert_eq!(out.dimensions(), (80, 60));
        }
    }

    #[test]
    fn warped_mask_stays_binary() {
        let mut mask =
            GrayImage::from_fn(50, 40, |x, y| Luma([u8::from(x > 20 && y > 10)]));
        binarize(&mut mask);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let p = AugParams {
            aug_num: 1000,
            ..params()
        };
        for _ in 0..20 {
            let g = Geometry::draw(Some(&p), 40, 30, &mut rng);
            let mut out = warp(&mask, &g, Interp::Nearest, 40, 30);
            assert!(out.pixels().all(|p| p[0] <= 1));
            binarize(&mut out);
            assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 1));
        }
    }

    #[test]
    fn flip_only_mirrors() {
        let mut mask = GrayImage::new(10, 4);
        mask.put_pixel(0, 2, Luma([1]));
        let g = Geometry::Affine(AffineParams {
            scale: 0.0,
            rotation: 0.0,
            trans_w: 0,
            trans_h: 0,
            flip: true,
        });
        let out = warp(&mask, &g, Interp::Nearest, 10, 4);
        assert_eq!(out.get_pixel(9, 2)[0], 1);
        assert_eq!(out.get_pixel(0, 2)[0], 0);
    }

    #[test]
    fn label_values_use_max_channel() {
        let rgb = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([0, 0, 0]),
            1 => Rgb([0, 0, 128]),
            _ => Rgb([200, 0, 0]),
        });
        let mut m = label_values(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(m.as_raw(), &vec![0, 128, 200]);
        binarize(&mut m);
        assert_eq!(m.as_raw(), &vec![0, 1, 1]);
    }

    #[test]
    fn sixteen_bit_labels_keep_small_ids() {
        let raw: Vec<u16> = vec![0, 1, 128, 60000];
        let luma16: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(4, 1, raw).unwrap();
        let mut m = label_values(&DynamicImage::ImageLuma16(luma16));
        assert_eq!(m.as_raw(), &vec![0, 1, 1, 234]);
        binarize(&mut m);
        assert_eq!(m.as_raw(), &vec![0, 1, 1, 1]);
    }

    #[test]
    fn mask_follows_distinct_frame() {
        // right half white in the frame, foreground in the mask
        let frame = RgbImage::from_fn(120, 90, |x, _| {
            if x >= 60 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let mask = GrayImage::from_fn(120, 90, |x, _| Luma([u8::from(x >= 60)]));
        let cases = [(0.1, 6.0, 4, -3, false), (-0.15, -9.0, -5, 2, true)];
        for (scale, rotation, trans_w, trans_h, flip) in cases {
            let g = Geometry::Affine(AffineParams {
                scale,
                rotation,
                trans_w,
                trans_h,
                flip,
            });
            let f = warp(&frame, &g, Interp::Bilinear, 100, 75);
            let m = warp(&mask, &g, Interp::Nearest, 100, 75);
            let mut fg = 0;
            let mut mismatched = 0;
            for (x, y, px) in m.enumerate_pixels() {
                let bright = f.get_pixel(x, y)[0] > 127;
                if px[0] == 1 {
                    fg += 1;
                }
                if bright != (px[0] == 1) {
                    mismatched += 1;
                }
            }
            // bilinear blur only reaches the edges of the foreground, a few
            // pixels per row; a shifted mask would miss whole columns
            assert!(fg > 100 * 75 / 4, "fg {fg} for {g:?}");
            assert!(mismatched <= 4 * 75, "{mismatched} mismatches for {g:?}");
        }
    }

    #[test]
    fn upscale_is_centre_cropped() {
        let g = Geometry::Affine(AffineParams {
            scale: 0.5,
            rotation: 0.0,
            trans_w: 0,
            trans_h: 0,
            flip: false,
        });
        // already at the scaled size (30, 15), so the first resize keeps it
        let mut src = GrayImage::new(30, 15);
        for y in 8..=10 {
            for x in 16..=18 {
                src.put_pixel(x, y, Luma([1]));
            }
        }
        let out = warp(&src, &g, Interp::Nearest, 20, 10);
        assert_eq!(out.dimensions(), (20, 10));
        // offsets floor((30 - 20) / 2) = 5 and floor((15 - 10) / 2) = 2
        let scaled = imageops::resize(&src, 30, 15, FilterType::Nearest);
        let expected = imageops::crop_imm(&scaled, 5, 2, 20, 10).to_image();
        assert_eq!(out, expected);
        assert_eq!(out.get_pixel(12, 7)[0], 1);
        assert_eq!(out.pixels().filter(|p| p[0] == 1).count(), 9);
    }

    #[test]
    fn frame_is_bgr_chw_minus_mean() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([10, 20, 30])
            } else {
                Rgb([40, 50, 60])
            }
        });
        let chw = frame_to_chw(&img, [1.0, 2.0, 3.0]);
        assert_eq!(chw, vec![29.0, 59.0, 18.0, 48.0, 7.0, 37.0]);
    }
}

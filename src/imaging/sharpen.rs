//! 3×3 unsharp mask for resampled canvases.
//!
//! Resampling softens edges; this filter puts some of that crispness back.
//! The kernel is fixed:
//!
//! ```text
//!  0 -1  0
//! -1  5 -1
//!  0 -1  0
//! ```
//!
//! It runs on the RGB channels of an RGBA buffer and leaves alpha alone.
//! Border pixels only use the taps that fall inside the image (no wraparound,
//! no edge padding). The result is blended with the original:
//! `out = convolved * mix + original * (1 - mix)`.

use thiserror::Error;

const KERNEL: [[f32; 3]; 3] = [[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]];

#[derive(Error, Debug, PartialEq)]
pub enum SharpenError {
    #[error("pixel data unavailable: expected {expected} bytes, got {actual}")]
    PixelsUnavailable { expected: usize, actual: usize },
    #[error("empty surface ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error("sharpen mix must be within 0..=1, got {0}")]
    InvalidMix(f32),
}

/// Sharpen an RGBA8 buffer in place.
///
/// Returns an error without touching the buffer when the pixel data can't be
/// read as a `width × height` RGBA surface or `mix` is outside `[0, 1]`.
pub fn sharpen_rgba(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    mix: f32,
) -> Result<(), SharpenError> {
    if !(0.0..=1.0).contains(&mix) {
        return Err(SharpenError::InvalidMix(mix));
    }
    if width == 0 || height == 0 {
        return Err(SharpenError::EmptySurface { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if buffer.len() != expected {
        return Err(SharpenError::PixelsUnavailable {
            expected,
            actual: buffer.len(),
        });
    }
    if mix == 0.0 {
        return Ok(());
    }

    let original = buffer.to_vec();
    let (w, h) = (width as i64, height as i64);
    let keep = 1.0 - mix;

    for y in 0..h {
        for x in 0..w {
            let idx = ((y * w + x) * 4) as usize;
            for channel in 0..3 {
                let mut acc = 0.0f32;
                for (ky, row) in KERNEL.iter().enumerate() {
                    let sy = y + ky as i64 - 1;
                    if sy < 0 || sy >= h {
                        continue;
                    }
                    for (kx, &weight) in row.iter().enumerate() {
                        if weight == 0.0 {
                            continue;
                        }
                        let sx = x + kx as i64 - 1;
                        if sx < 0 || sx >= w {
                            continue;
                        }
                        let tap = ((sy * w + sx) * 4) as usize + channel;
                        acc += original[tap] as f32 * weight;
                    }
                }
                let orig = original[idx + channel] as f32;
                let blended = acc * mix + orig * keep;
                buffer[idx + channel] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn flat(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        rgba.repeat((width * height) as usize)
    }

    fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn flat_interior_is_unchanged() {
        // Kernel weights sum to 1, so a flat area stays flat away from the border
        let mut buf = flat(5, 5, [100, 100, 100, 255]);
        sharpen_rgba(&mut buf, 5, 5, 1.0).unwrap();
        assert_eq!(pixel(&buf, 5, 2, 2), [100, 100, 100, 255]);
    }

    #[test]
    fn border_uses_only_in_bounds_taps() {
        // Corner has two missing neighbours: 5*40 - 2*40 = 120
        let mut buf = flat(3, 3, [40, 40, 40, 255]);
        sharpen_rgba(&mut buf, 3, 3, 1.0).unwrap();
        assert_eq!(pixel(&buf, 3, 0, 0), [120, 120, 120, 255]);
        // Edge middle has one missing neighbour: 5*40 - 3*40 = 80
        assert_eq!(pixel(&buf, 3, 1, 0), [80, 80, 80, 255]);
        assert_eq!(pixel(&buf, 3, 1, 1), [40, 40, 40, 255]);
    }

    #[test]
    fn mix_blends_with_original() {
        // Corner convolves to 120; half mix → (120 + 40) / 2 = 80
        let mut buf = flat(3, 3, [40, 40, 40, 255]);
        sharpen_rgba(&mut buf, 3, 3, 0.5).unwrap();
        assert_eq!(pixel(&buf, 3, 0, 0), [80, 80, 80, 255]);
    }

    #[test]
    fn output_is_clamped() {
        // Bright pixel surrounded by black: 5*250 = 1250 → 255
        let mut buf = flat(3, 3, [0, 0, 0, 255]);
        buf[16..19].copy_from_slice(&[250, 250, 250]);
        sharpen_rgba(&mut buf, 3, 3, 1.0).unwrap();
        assert_eq!(pixel(&buf, 3, 1, 1), [255, 255, 255, 255]);
        // Its neighbours go negative and clamp to 0
        assert_eq!(pixel(&buf, 3, 1, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn alpha_passes_through() {
        let mut buf = flat(4, 4, [10, 200, 30, 77]);
        sharpen_rgba(&mut buf, 4, 4, 1.0).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(pixel(&buf, 4, x, y)[3], 77);
            }
        }
    }

    #[test]
    fn wrong_buffer_length_is_reported_and_untouched() {
        let mut buf = vec![9u8; 10];
        let err = sharpen_rgba(&mut buf, 2, 2, 0.5).unwrap_err();
        assert_eq!(
            err,
            SharpenError::PixelsUnavailable {
                expected: 16,
                actual: 10
            }
        );
        assert_eq!(buf, vec![9u8; 10]);
    }

    #[test]
    fn empty_surface_is_reported() {
        let mut buf = Vec::new();
        assert!(matches!(
            sharpen_rgba(&mut buf, 0, 4, 0.2),
            Err(SharpenError::EmptySurface { .. })
        ));
    }

    #[test]
    fn invalid_mix_is_reported() {
        let mut buf = flat(2, 2, [1, 2, 3, 4]);
        assert!(matches!(
            sharpen_rgba(&mut buf, 2, 2, f32::NAN),
            Err(SharpenError::InvalidMix(_))
        ));
        assert!(matches!(
            sharpen_rgba(&mut buf, 2, 2, 1.5),
            Err(SharpenError::InvalidMix(_))
        ));
    }

    proptest! {
        #[test]
        fn zero_mix_twice_is_identity(
            (w, h, data) in (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), proptest::collection::vec(any::<u8>(), (w * h * 4) as usize))
            })
        ) {
            let mut buf = data.clone();
            sharpen_rgba(&mut buf, w, h, 0.0).unwrap();
            sharpen_rgba(&mut buf, w, h, 0.0).unwrap();
            prop_assert_eq!(buf, data);
        }

        #[test]
        fn alpha_never_changes(
            (w, h, data) in (1u32..10, 1u32..10).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), proptest::collection::vec(any::<u8>(), (w * h * 4) as usize))
            }),
            mix in 0.0f32..=1.0,
        ) {
            let mut buf = data.clone();
            sharpen_rgba(&mut buf, w, h, mix).unwrap();
            for (after, before) in buf.chunks_exact(4).zip(data.chunks_exact(4)) {
                prop_assert_eq!(after[3], before[3]);
            }
        }
    }
}

use image::{RgbaImage, imageops::FilterType};

use crate::foundation::core::frame_byte_len;
use crate::foundation::error::{WavyteError, WavyteResult};

/// The background fill is blurred at this fraction of its final size, then scaled up.
const FILL_DOWNSCALE: u32 = 8;
const FILL_RADIUS: u32 = 3;
const FILL_SIGMA: f32 = 2.0;

/// Separable Gaussian blur over premultiplied RGBA8 with a Q16 fixed-point kernel.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> WavyteResult<Vec<u8>> {
    let expected_len = frame_byte_len(width, height)?;
    if src.len() != expected_len {
        return Err(WavyteError::evaluation(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// Blurred copy of a `width x height` premultiplied image stretched to `box_width x box_height`.
pub fn stretched_blur(
    src: &[u8],
    width: u32,
    height: u32,
    box_width: u32,
    box_height: u32,
) -> WavyteResult<Vec<u8>> {
    let img = RgbaImage::from_raw(width, height, src.to_vec()).ok_or_else(|| {
        WavyteError::evaluation("stretched_blur expects src matching width*height*4")
    })?;
    let small_w = (box_width / FILL_DOWNSCALE).max(1);
    let small_h = (box_height / FILL_DOWNSCALE).max(1);

    let small = image::imageops::resize(&img, small_w, small_h, FilterType::Triangle);
    let blurred = blur_rgba8_premul(small.as_raw(), small_w, small_h, FILL_RADIUS, FILL_SIGMA)?;
    let blurred = RgbaImage::from_raw(small_w, small_h, blurred)
        .ok_or_else(|| WavyteError::evaluation("blurred fill has unexpected size"))?;

    Ok(image::imageops::resize(&blurred, box_width, box_height, FilterType::Triangle).into_raw())
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> WavyteResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(WavyteError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(WavyteError::evaluation("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Push rounding drift into the center tap so the kernel sums to exactly 1.0.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/blur.rs"]
mod tests;

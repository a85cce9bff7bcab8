//! Grayscale conversion and thresholding of raw camera frames.

/// A thresholded frame: `true` = dark.
pub(crate) struct Bitmap {
    pub width: usize,
    pub height: usize,
    data: Vec<bool>,
}

impl Bitmap {
    /// Dark test with light out-of-bounds reads, so samplers can run off
    /// the edge without caring.
    pub fn dark(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        x < self.width && y < self.height && self.data[y * self.width + x]
    }
}

// Offset subtracted from the local mean; pixels at or below mean - C are
// dark.
const THRESHOLD_OFFSET: i32 = 7;

fn grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut gray = Vec::with_capacity(width * height);
    for px in rgba.chunks_exact(4) {
        let luma = 0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
        gray.push(luma as u8);
    }
    debug_assert_eq!(gray.len(), width * height);
    gray
}

// Summed-area table with a zero row and column, so any window sum is four
// lookups.
fn integral_image(gray: &[u8], width: usize, height: usize) -> Vec<u64> {
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += u64::from(gray[y * width + x]);
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
    integral
}

/// Adaptive threshold over an integral-image mean: a pixel is dark iff its
/// gray value is at or below the local window mean minus a fixed offset.
pub(crate) fn binarize(rgba: &[u8], width: usize, height: usize) -> Option<Bitmap> {
    if width == 0 || height == 0 || rgba.len() != width * height * 4 {
        return None;
    }
    let gray = grayscale(rgba, width, height);
    let integral = integral_image(&gray, width, height);
    let stride = width + 1;

    let mut block = (width.min(height) / 8).max(3);
    if block % 2 == 0 {
        block += 1;
    }
    let half = block / 2;

    let mut data = vec![false; width * height];
    for y in 0..height {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half + 1).min(height);
        for x in 0..width {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half + 1).min(width);
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let area = ((y1 - y0) * (x1 - x0)) as u64;
            let mean = (sum / area) as i32;
            data[y * width + x] = i32::from(gray[y * width + x]) <= mean - THRESHOLD_OFFSET;
        }
    }
    Some(Bitmap {
        width,
        height,
        data,
    })
}

/// Fixed threshold at mid-gray, the fallback for clean synthetic frames
/// where the adaptive pass washes out large solid areas.
pub(crate) fn binarize_global(rgba: &[u8], width: usize, height: usize) -> Option<Bitmap> {
    if width == 0 || height == 0 || rgba.len() != width * height * 4 {
        return None;
    }
    let data = grayscale(rgba, width, height)
        .into_iter()
        .map(|g| g < 128)
        .collect();
    Some(Bitmap {
        width,
        height,
        data,
    })
}

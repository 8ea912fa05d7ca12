//! Canny edge extraction.
//!
//! - 3x3 Sobel gradients with border clamping
//! - L1 magnitude `|gx| + |gy|`
//! - Non-maximum suppression over 4 quantized directions (sectors split at
//!   22.5 and 67.5 degrees); the 1-pixel outer frame never holds an edge
//! - Double threshold with 8-connected hysteresis
//!
//! Complexity: O(W·H); memory: two i32 gradient buffers, one magnitude
//! buffer and one byte per pixel for the edge state.

use image::GrayImage;

const TAN_22_5_DEG: f64 = 0.414_213_562_37;
const TAN_67_5_DEG: f64 = 2.414_213_562_37;

const NOT_EDGE: u8 = 0;
const CANDIDATE: u8 = 1;
const EDGE: u8 = 255;

/// Binary edge map; `255` marks an edge pixel, `0` background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl EdgeMap {
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.pixels[(y * self.width + x) as usize] == EDGE
    }

    /// Coordinates of every edge pixel in row-major order.
    pub fn edge_points(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width.max(1);
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, &p)| p == EDGE)
            .map(move |(i, _)| (i as u32 % width, i as u32 / width))
    }

    pub fn edge_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p == EDGE).count()
    }
}

struct Gradients {
    gx: Vec<i32>,
    gy: Vec<i32>,
    mag: Vec<i32>,
}

fn sobel(gray: &GrayImage) -> Gradients {
    let w = gray.width() as usize;
    let h = gray.height() as usize;
    let src = gray.as_raw();
    let mut gx = vec![0i32; w * h];
    let mut gy = vec![0i32; w * h];
    let mut mag = vec![0i32; w * h];

    for y in 0..h {
        let ys = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        for x in 0..w {
            let xs = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
            let p = |row: usize, col: usize| src[ys[row] * w + xs[col]] as i32;

            let sum_x = (p(0, 2) + 2 * p(1, 2) + p(2, 2)) - (p(0, 0) + 2 * p(1, 0) + p(2, 0));
            let sum_y = (p(2, 0) + 2 * p(2, 1) + p(2, 2)) - (p(0, 0) + 2 * p(0, 1) + p(0, 2));

            let idx = y * w + x;
            gx[idx] = sum_x;
            gy[idx] = sum_y;
            mag[idx] = sum_x.abs() + sum_y.abs();
        }
    }

    Gradients { gx, gy, mag }
}

/// Keep pixels that are local maxima along the gradient and above `low`.
///
/// Ties along the axis directions go to the later neighbour so plateaus
/// still produce a single-pixel ridge.
fn suppress(grad: &Gradients, w: usize, h: usize, low: i32, high: i32) -> Vec<u8> {
    let mut state = vec![NOT_EDGE; w * h];
    if w < 3 || h < 3 {
        return state;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let m = grad.mag[idx];
            if m <= low {
                continue;
            }

            let ax = grad.gx[idx].abs() as f64;
            let ay = grad.gy[idx].abs() as f64;

            let is_max = if ay < ax * TAN_22_5_DEG {
                m > grad.mag[idx - 1] && m >= grad.mag[idx + 1]
            } else if ay > ax * TAN_67_5_DEG {
                m > grad.mag[idx - w] && m >= grad.mag[idx + w]
            } else {
                let same_sign = (grad.gx[idx] ^ grad.gy[idx]) >= 0;
                let (before, after) = if same_sign {
                    (grad.mag[idx - w - 1], grad.mag[idx + w + 1])
                } else {
                    (grad.mag[idx - w + 1], grad.mag[idx + w - 1])
                };
                m > before && m > after
            };

            if is_max {
                state[idx] = if m > high { EDGE } else { CANDIDATE };
            }
        }
    }

    state
}

/// Promote candidates 8-connected to a strong edge; drop the rest.
fn hysteresis(state: &mut [u8], w: usize, h: usize) {
    let mut stack: Vec<usize> = state
        .iter()
        .enumerate()
        .filter(|(_, &s)| s == EDGE)
        .map(|(i, _)| i)
        .collect();

    while let Some(idx) = stack.pop() {
        let x = idx % w;
        let y = idx / w;
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let n = ny * w + nx;
                if state[n] == CANDIDATE {
                    state[n] = EDGE;
                    stack.push(n);
                }
            }
        }
    }

    for s in state.iter_mut() {
        if *s != EDGE {
            *s = NOT_EDGE;
        }
    }
}

/// Run Canny on a grayscale frame with the given hysteresis thresholds
/// (applied to the L1 Sobel magnitude).
pub fn canny(gray: &GrayImage, low: f32, high: f32) -> EdgeMap {
    let w = gray.width() as usize;
    let h = gray.height() as usize;
    if w == 0 || h == 0 {
        return EdgeMap {
            width: gray.width(),
            height: gray.height(),
            pixels: Vec::new(),
        };
    }

    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let grad = sobel(gray);
    let mut state = suppress(&grad, w, h, low.floor() as i32, high.floor() as i32);
    hysteresis(&mut state, w, h);

    EdgeMap {
        width: gray.width(),
        height: gray.height(),
        pixels: state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn horizontal_step(w: u32, h: u32, row: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |_, y| if y < row { Luma([20]) } else { Luma([220]) })
    }

    #[test]
    fn test_uniform_image_has_no_edges() {
        let gray = GrayImage::from_pixel(40, 30, Luma([128]));
        let edges = canny(&gray, 50.0, 150.0);
        assert_eq!(edges.edge_count(), 0);
    }

    #[test]
    fn test_horizontal_step_gives_single_row() {
        let gray = horizontal_step(40, 30, 15);
        let edges = canny(&gray, 50.0, 150.0);

        let rows: std::collections::BTreeSet<u32> = edges.edge_points().map(|(_, y)| y).collect();
        assert_eq!(rows.len(), 1, "expected a one-pixel ridge, got rows {:?}", rows);
        // Interior columns only; the outer frame is never marked.
        assert_eq!(edges.edge_count(), 38);
        assert!(!edges.is_edge(0, *rows.iter().next().unwrap()));
    }

    #[test]
    fn test_weak_step_is_rejected() {
        // Contrast of 10 gives an L1 magnitude of 40, under the low threshold.
        let gray = GrayImage::from_fn(30, 30, |_, y| if y < 15 { Luma([100]) } else { Luma([110]) });
        assert_eq!(canny(&gray, 50.0, 150.0).edge_count(), 0);
    }

    #[test]
    fn test_hysteresis_keeps_connected_weak_pixels() {
        // Strong step on the left half, weak step (magnitude 100) on the right.
        let gray = GrayImage::from_fn(40, 20, |x, y| {
            let low = if x < 20 { 0 } else { 100 };
            let high = if x < 20 { 200 } else { 125 };
            if y < 10 {
                Luma([low])
            } else {
                Luma([high])
            }
        });
        let edges = canny(&gray, 50.0, 150.0);
        let right_side = edges.edge_points().filter(|&(x, _)| x > 25).count();
        assert!(right_side > 0);
    }

    #[test]
    fn test_isolated_weak_step_is_dropped() {
        let gray = GrayImage::from_fn(40, 20, |_, y| if y < 10 { Luma([100]) } else { Luma([125]) });
        assert_eq!(canny(&gray, 50.0, 150.0).edge_count(), 0);
    }

    #[test]
    fn test_tiny_images() {
        assert_eq!(canny(&GrayImage::new(0, 0), 50.0, 150.0).edge_count(), 0);
        assert_eq!(canny(&GrayImage::from_pixel(2, 2, Luma([9])), 50.0, 150.0).edge_count(), 0);
    }
}

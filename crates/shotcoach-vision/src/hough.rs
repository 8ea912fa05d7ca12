//! Standard (rho, theta) Hough line transform over an edge map.
//!
//! Lines are reported in normal form `x·cosθ + y·sinθ = ρ` with θ in
//! [0, π). The accumulator is padded by one cell on every side so the
//! 4-neighbour peak test needs no bounds checks.

use crate::edges::EdgeMap;

/// Accumulator resolution and vote threshold.
#[derive(Debug, Clone, Copy)]
pub struct HoughParams {
    /// Distance resolution in pixels.
    pub rho: f64,
    /// Angle resolution in radians.
    pub theta: f64,
    /// A cell must collect strictly more votes than this to become a line.
    pub threshold: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta: std::f64::consts::PI / 180.0,
            threshold: 0,
        }
    }
}

/// One detected line in normal form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughLine {
    pub rho: f64,
    /// Normal angle in radians, [0, π).
    pub theta: f64,
    pub votes: u32,
}

/// Detect lines, strongest first. Ties keep accumulator order.
pub fn hough_lines(edges: &EdgeMap, params: &HoughParams) -> Vec<HoughLine> {
    if params.rho <= 0.0 || params.theta <= 0.0 || edges.width == 0 || edges.height == 0 {
        return Vec::new();
    }

    let num_angle = (std::f64::consts::PI / params.theta).round() as usize;
    let num_rho = (((edges.width + edges.height) as f64 * 2.0 + 1.0) / params.rho).round() as usize;
    if num_angle == 0 || num_rho == 0 {
        return Vec::new();
    }

    let stride = num_rho + 2;
    let mut accum = vec![0u32; (num_angle + 2) * stride];

    let irho = 1.0 / params.rho;
    let tables: Vec<(f64, f64)> = (0..num_angle)
        .map(|n| {
            let angle = n as f64 * params.theta;
            (angle.cos() * irho, angle.sin() * irho)
        })
        .collect();
    let offset = (num_rho as i64 - 1) / 2;

    for (x, y) in edges.edge_points() {
        for (n, &(cos_t, sin_t)) in tables.iter().enumerate() {
            let r = (x as f64 * cos_t + y as f64 * sin_t).round() as i64 + offset;
            if r < 0 || r >= num_rho as i64 {
                continue;
            }
            accum[(n + 1) * stride + r as usize + 1] += 1;
        }
    }

    let mut peaks: Vec<(usize, usize, u32)> = Vec::new();
    for n in 0..num_angle {
        for r in 0..num_rho {
            let base = (n + 1) * stride + r + 1;
            let votes = accum[base];
            if votes > params.threshold
                && votes > accum[base - 1]
                && votes >= accum[base + 1]
                && votes > accum[base - stride]
                && votes >= accum[base + stride]
            {
                peaks.push((n, r, votes));
            }
        }
    }

    // Stable sort keeps (theta, rho) scan order among equal votes.
    peaks.sort_by(|a, b| b.2.cmp(&a.2));

    peaks
        .into_iter()
        .map(|(n, r, votes)| HoughLine {
            rho: (r as f64 - (num_rho as f64 - 1.0) * 0.5) * params.rho,
            theta: n as f64 * params.theta,
            votes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(width: u32, height: u32, points: &[(u32, u32)]) -> EdgeMap {
        let mut pixels = vec![0u8; (width * height) as usize];
        for &(x, y) in points {
            pixels[(y * width + x) as usize] = 255;
        }
        EdgeMap { width, height, pixels }
    }

    #[test]
    fn test_horizontal_row_votes_at_ninety_degrees() {
        let points: Vec<(u32, u32)> = (0..50).map(|x| (x, 20)).collect();
        let edges = map_with(60, 40, &points);
        let params = HoughParams {
            threshold: 30,
            ..Default::default()
        };
        let lines = hough_lines(&edges, &params);
        assert!(!lines.is_empty());
        let best = lines[0];
        assert_eq!(best.votes, 50);
        assert!((best.theta.to_degrees() - 90.0).abs() < 1e-9);
        assert!((best.rho - 20.0).abs() <= 0.5 + 1e-9);
    }

    #[test]
    fn test_vertical_column_votes_at_zero() {
        let points: Vec<(u32, u32)> = (0..40).map(|y| (10, y)).collect();
        let edges = map_with(60, 40, &points);
        let params = HoughParams {
            threshold: 30,
            ..Default::default()
        };
        let best = hough_lines(&edges, &params)[0];
        assert_eq!(best.votes, 40);
        assert!(best.theta.abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let points: Vec<(u32, u32)> = (0..20).map(|x| (x, 5)).collect();
        let edges = map_with(30, 30, &points);
        let at = HoughParams {
            threshold: 20,
            ..Default::default()
        };
        assert!(hough_lines(&edges, &at).is_empty());
        let below = HoughParams {
            threshold: 19,
            ..Default::default()
        };
        assert!(!hough_lines(&edges, &below).is_empty());
    }

    #[test]
    fn test_empty_map() {
        let edges = map_with(10, 10, &[]);
        assert!(hough_lines(&edges, &HoughParams::default()).is_empty());
    }

    #[test]
    fn test_sorted_by_votes() {
        let mut points: Vec<(u32, u32)> = (0..50).map(|x| (x, 10)).collect();
        points.extend((0..35).map(|x| (x, 30)));
        let edges = map_with(60, 40, &points);
        let params = HoughParams {
            threshold: 25,
            ..Default::default()
        };
        let lines = hough_lines(&edges, &params);
        assert!(lines.windows(2).all(|w| w[0].votes >= w[1].votes));
    }
}

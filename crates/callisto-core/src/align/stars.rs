//! Point-source detection for the feature-based backend.

use std::collections::HashMap;

use ndarray::Array2;

use crate::config::TriangleMatchConfig;

/// A detected source with its flux-weighted centroid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    /// Column coordinate.
    pub x: f64,
    /// Row coordinate.
    pub y: f64,
    /// Background-subtracted flux.
    pub flux: f64,
    /// Number of pixels above threshold.
    pub area: usize,
}

impl Star {
    pub fn position(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Detect stars above `mean + sigma * std`, brightest first.
///
/// Components smaller than `min_star_area` are dropped and at most
/// `max_control_points` stars are returned.
pub fn detect_stars(data: &Array2<f32>, config: &TriangleMatchConfig) -> Vec<Star> {
    let (mean, std) = mean_stddev(data);
    let threshold = (mean + config.detection_sigma as f64 * std) as f32;
    let mask = data.mapv(|v| v > threshold);

    let mut stars: Vec<Star> = label_components(data, &mask, mean)
        .into_values()
        .filter(|acc| acc.area >= config.min_star_area)
        .filter_map(Accumulator::finish)
        .collect();
    stars.sort_by(|a, b| b.flux.total_cmp(&a.flux));
    stars.truncate(config.max_control_points);

    tracing::debug!(count = stars.len(), threshold, "detected stars");
    stars
}

pub fn mean_stddev(data: &Array2<f32>) -> (f64, f64) {
    let n = data.len() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = data.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = data.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Running sums of one component.
#[derive(Default)]
struct Accumulator {
    area: usize,
    flux: f64,
    sum_x: f64,
    sum_y: f64,
}

impl Accumulator {
    fn add(&mut self, row: usize, col: usize, value: f64) {
        self.area += 1;
        self.flux += value;
        self.sum_x += value * col as f64;
        self.sum_y += value * row as f64;
    }

    fn finish(self) -> Option<Star> {
        if self.flux <= 0.0 {
            return None;
        }
        Some(Star {
            x: self.sum_x / self.flux,
            y: self.sum_y / self.flux,
            flux: self.flux,
            area: self.area,
        })
    }
}

/// Two-pass union-find labelling with 8-connectivity. Each component
/// accumulates `data - background` moments under its root label.
fn label_components(
    data: &Array2<f32>,
    mask: &Array2<bool>,
    background: f64,
) -> HashMap<u32, Accumulator> {
    let (h, w) = mask.dim();
    let mut labels = Array2::<u32>::zeros((h, w));
    let mut parent: Vec<u32> = vec![0];

    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }
            // Already-visited neighbours: W, NW, N, NE.
            let mut neighbours = [0u32; 4];
            if col > 0 {
                neighbours[0] = labels[[row, col - 1]];
            }
            if row > 0 {
                if col > 0 {
                    neighbours[1] = labels[[row - 1, col - 1]];
                }
                neighbours[2] = labels[[row - 1, col]];
                if col + 1 < w {
                    neighbours[3] = labels[[row - 1, col + 1]];
                }
            }

            let label = match neighbours.iter().copied().filter(|&l| l > 0).min() {
                Some(min) => {
                    for &other in neighbours.iter().filter(|&&l| l > 0) {
                        union(&mut parent, min, other);
                    }
                    min
                }
                None => {
                    let next = parent.len() as u32;
                    parent.push(next);
                    next
                }
            };
            labels[[row, col]] = label;
        }
    }

    let mut components = HashMap::<u32, Accumulator>::new();
    for ((row, col), &label) in labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let root = find(&parent, label);
        let value = data[[row, col]] as f64 - background;
        components.entry(root).or_default().add(row, col, value);
    }
    components
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}

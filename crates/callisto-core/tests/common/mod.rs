use ndarray::Array2;

use callisto_core::transform::Transform2D;

/// A synthetic point source: position `(x, y)` and peak amplitude.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticStar {
    pub x: f64,
    pub y: f64,
    pub amplitude: f64,
}

/// Small deterministic generator so fixtures are reproducible without a
/// random-number crate.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// `n` stars at least `margin` pixels from the border.
pub fn random_stars(n: usize, h: usize, w: usize, margin: f64, seed: u64) -> Vec<SyntheticStar> {
    let mut rng = Lcg::new(seed);
    (0..n)
        .map(|_| SyntheticStar {
            x: margin + rng.next_f64() * (w as f64 - 2.0 * margin),
            y: margin + rng.next_f64() * (h as f64 - 2.0 * margin),
            amplitude: 0.6 + 0.4 * rng.next_f64(),
        })
        .collect()
}

/// Render stars as circular Gaussians with standard deviation `sigma`.
pub fn render_stars(stars: &[SyntheticStar], h: usize, w: usize, sigma: f64) -> Array2<f32> {
    let two_sigma_sq = 2.0 * sigma * sigma;
    let reach = (4.0 * sigma).ceil() as i64;
    let mut img = Array2::<f32>::zeros((h, w));
    for star in stars {
        let (cx, cy) = (star.x.round() as i64, star.y.round() as i64);
        for r in (cy - reach).max(0)..(cy + reach + 1).min(h as i64) {
            for c in (cx - reach).max(0)..(cx + reach + 1).min(w as i64) {
                let d2 = (c as f64 - star.x).powi(2) + (r as f64 - star.y).powi(2);
                img[[r as usize, c as usize]] += (star.amplitude * (-d2 / two_sigma_sq).exp()) as f32;
            }
        }
    }
    img
}

/// Move every star through `transform`.
pub fn transform_stars(stars: &[SyntheticStar], transform: &Transform2D) -> Vec<SyntheticStar> {
    stars
        .iter()
        .map(|s| {
            let (x, y) = transform.apply(s.x, s.y);
            SyntheticStar { x, y, ..*s }
        })
        .collect()
}

/// Rotation by `angle_deg` about the image centre followed by `(dx, dy)`.
pub fn rotation_about_center(h: usize, w: usize, angle_deg: f64, dx: f64, dy: f64) -> Transform2D {
    similarity_about_center(h, w, 1.0, angle_deg, dx, dy)
}

/// Scale and rotation about the image centre followed by `(dx, dy)`.
pub fn similarity_about_center(
    h: usize,
    w: usize,
    scale: f64,
    angle_deg: f64,
    dx: f64,
    dy: f64,
) -> Transform2D {
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    Transform2D::translation(cx + dx, cy + dy)
        .compose(&Transform2D::similarity(scale, angle_deg.to_radians(), 0.0, 0.0))
        .compose(&Transform2D::translation(-cx, -cy))
}

pub fn positions(stars: &[SyntheticStar]) -> Vec<[f64; 2]> {
    stars.iter().map(|s| [s.x, s.y]).collect()
}

/// Largest absolute difference over the region `margin` pixels inside the
/// border.
pub fn max_interior_diff(a: &Array2<f32>, b: &Array2<f32>, margin: usize) -> f32 {
    let (h, w) = a.dim();
    let mut worst = 0.0f32;
    for r in margin..h - margin {
        for c in margin..w - margin {
            worst = worst.max((a[[r, c]] - b[[r, c]]).abs());
        }
    }
    worst
}

use ndarray::Array2;

/// Refine a peak location with a 1-D parabola fit along each axis.
///
/// Neighbours wrap around the array edges, matching the periodic surfaces
/// produced by FFT correlation. Returns `(delta_row, delta_col)` as
/// fractional offsets from the integer peak, clamped to ±0.5.
pub fn refine_peak_paraboloid(
    surface: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
) -> (f64, f64) {
    let (h, w) = surface.dim();
    if h < 3 || w < 3 {
        return (0.0, 0.0);
    }

    let up = (peak_row + h - 1) % h;
    let down = (peak_row + 1) % h;
    let left = (peak_col + w - 1) % w;
    let right = (peak_col + 1) % w;

    let center = surface[[peak_row, peak_col]];
    let delta_row = parabola_vertex(surface[[up, peak_col]], center, surface[[down, peak_col]]);
    let delta_col = parabola_vertex(surface[[peak_row, left]], center, surface[[peak_row, right]]);

    (delta_row.clamp(-0.5, 0.5), delta_col.clamp(-0.5, 0.5))
}

fn parabola_vertex(prev: f64, curr: f64, next: f64) -> f64 {
    let denom = prev - 2.0 * curr + next;
    if denom.abs() > 1e-12 {
        (prev - next) / (2.0 * denom)
    } else {
        0.0
    }
}

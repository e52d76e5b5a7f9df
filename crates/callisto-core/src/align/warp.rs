use ndarray::{Array2, Zip};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::transform::Transform2D;

/// Bilinear sample at fractional `(y, x)`. Pixels outside the array read as 0.
pub fn bilinear_sample(data: &Array2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |r: i64, c: i64| -> f32 {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    let v00 = sample(y0, x0);
    let v10 = sample(y0, x1);
    let v01 = sample(y1, x0);
    let v11 = sample(y1, x1);

    v00 * (1.0 - fx) * (1.0 - fy)
        + v10 * fx * (1.0 - fy)
        + v01 * (1.0 - fx) * fy
        + v11 * fx * fy
}

/// Resample `source` onto a `shape` grid.
///
/// `output_to_source` maps output pixel coordinates `(x = col, y = row)` to
/// source coordinates, i.e. it is the inverse of the alignment transform.
pub fn warp_image(
    source: &Array2<f32>,
    output_to_source: &Transform2D,
    shape: (usize, usize),
) -> Array2<f32> {
    let mut result = Array2::<f32>::zeros(shape);
    let zip = Zip::indexed(&mut result);
    let sample = |(row, col): (usize, usize), out: &mut f32| {
        let (x, y) = output_to_source.apply(col as f64, row as f64);
        *out = bilinear_sample(source, y, x);
    };

    if shape.0 * shape.1 >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(sample);
    } else {
        zip.for_each(sample);
    }
    result
}

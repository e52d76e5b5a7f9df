use ndarray::Array2;

/// Mean Sobel gradient magnitude over the image interior.
pub fn gradient_score(data: &Array2<f32>) -> f64 {
    let (h, w) = data.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let count = ((h - 2) * (w - 2)) as f64;

    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let gx = -data[[row - 1, col - 1]] as f64 + data[[row - 1, col + 1]] as f64
                - 2.0 * data[[row, col - 1]] as f64
                + 2.0 * data[[row, col + 1]] as f64
                - data[[row + 1, col - 1]] as f64
                + data[[row + 1, col + 1]] as f64;

            let gy = -data[[row - 1, col - 1]] as f64
                - 2.0 * data[[row - 1, col]] as f64
                - data[[row - 1, col + 1]] as f64
                + data[[row + 1, col - 1]] as f64
                + 2.0 * data[[row + 1, col]] as f64
                + data[[row + 1, col + 1]] as f64;

            sum += (gx * gx + gy * gy).sqrt();
        }
    }

    sum / count
}

mod common;

use approx::assert_abs_diff_eq;

use callisto_core::align::{align, AlignMethod};
use callisto_core::config::AlignConfig;
use callisto_core::image::{Header, Image};
use callisto_core::transform::Transform2D;

use common::{
    max_interior_diff, positions, random_stars, render_stars, rotation_about_center,
    similarity_about_center, transform_stars, SyntheticStar,
};

const SIZE: usize = 128;
const SIGMA: f64 = 2.0;

fn field(seed: u64) -> Vec<SyntheticStar> {
    random_stars(40, SIZE, SIZE, 12.0, seed)
}

fn render(stars: &[SyntheticStar]) -> ndarray::Array2<f32> {
    render_stars(stars, SIZE, SIZE, SIGMA)
}

/// Reference field and the same field moved by `transform`.
fn pair(seed: u64, transform: &Transform2D) -> (Vec<SyntheticStar>, Vec<SyntheticStar>) {
    let reference = field(seed);
    let moved = transform_stars(&reference, transform);
    (reference, moved)
}

#[cfg(feature = "skimage")]
#[test]
fn cross_correlation_recovers_subpixel_shift() {
    use callisto_core::align::cross_correlation::register_translation;

    let (reference, moved) = pair(1, &Transform2D::translation(3.3, -2.6));
    let (reference, source) = (render(&reference), render(&moved));

    let offset = register_translation(&reference, &source, 100).unwrap();
    assert_abs_diff_eq!(offset.dx, -3.3, epsilon = 0.05);
    assert_abs_diff_eq!(offset.dy, 2.6, epsilon = 0.05);

    let out = align(source, Some(&Image::bare(reference.clone())), AlignMethod::Skimage).unwrap();
    let out = out.into_single().unwrap();
    let out = callisto_core::image::to_array(&out, "test").unwrap();
    assert!(max_interior_diff(&out, &reference, 8) < 0.02);
}

#[cfg(feature = "chi2")]
#[test]
fn chi2_reports_source_offset_and_undoes_it() {
    use callisto_core::align::chi2::chi2_shift;

    let (reference, moved) = pair(2, &Transform2D::translation(-4.25, 1.5));
    let (reference, source) = (render(&reference), render(&moved));

    let offset = chi2_shift(&reference, &source, None).unwrap();
    assert_abs_diff_eq!(offset.dx, -4.25, epsilon = 0.05);
    assert_abs_diff_eq!(offset.dy, 1.5, epsilon = 0.05);

    let out = align(source, Some(&Image::bare(reference.clone())), AlignMethod::Chi2).unwrap();
    let out = callisto_core::image::to_array(&out.into_single().unwrap(), "test").unwrap();
    assert!(max_interior_diff(&out, &reference, 8) < 0.02);
}

#[cfg(feature = "imreg")]
#[test]
fn log_polar_recovers_rotation_and_translation() {
    use callisto_core::align::log_polar::similarity;

    let truth = rotation_about_center(SIZE, SIZE, 8.0, 4.0, -3.0);
    let (reference_stars, moved) = pair(3, &truth);
    let (reference, source) = (render(&reference_stars), render(&moved));

    let result = similarity(&reference, &source, &AlignConfig::default().log_polar).unwrap();
    assert_abs_diff_eq!(result.angle.to_degrees(), 8.0, epsilon = 1.0);
    assert_abs_diff_eq!(result.scale, 1.0, epsilon = 0.03);

    // Stars well inside the frame land back on their reference positions.
    for (r, m) in reference_stars.iter().zip(&moved) {
        if (r.x - 64.0).hypot(r.y - 64.0) > 40.0 {
            continue;
        }
        let (x, y) = result.transform.apply(m.x, m.y);
        assert!((x - r.x).hypot(y - r.y) < 1.5, "star at ({}, {}) mapped to ({x}, {y})", r.x, r.y);
    }
}

#[cfg(feature = "imreg")]
#[test]
fn log_polar_recovers_scale_without_rotation() {
    use callisto_core::align::log_polar::similarity;

    for (seed, scale) in [(6, 0.9), (7, 1.1), (8, 1.2)] {
        let truth = similarity_about_center(SIZE, SIZE, scale, 0.0, 0.0, 0.0);
        let (reference_stars, moved) = pair(seed, &truth);
        let (reference, source) = (render(&reference_stars), render(&moved));

        let result = similarity(&reference, &source, &AlignConfig::default().log_polar).unwrap();
        assert_abs_diff_eq!(result.scale, scale, epsilon = 0.02);
        assert!(
            result.angle.to_degrees().abs() < 1.0,
            "scale {scale}: angle {} deg",
            result.angle.to_degrees()
        );

        for (r, m) in reference_stars.iter().zip(&moved) {
            if (r.x - 64.0).hypot(r.y - 64.0) > 40.0 {
                continue;
            }
            let (x, y) = result.transform.apply(m.x, m.y);
            assert!((x - r.x).hypot(y - r.y) < 1.5, "scale {scale}: star mapped to ({x}, {y})");
        }
    }
}

#[cfg(feature = "astroalign")]
#[test]
fn triangle_matching_recovers_rotation() {
    use callisto_core::align::feature_match::find_transform;
    use callisto_core::align::stars::detect_stars;
    use callisto_core::config::TriangleMatchConfig;

    let truth = rotation_about_center(SIZE, SIZE, -15.0, 2.5, 6.0);
    let (reference, moved) = pair(4, &truth);
    let (reference_img, source_img) = (render(&reference), render(&moved));

    let config = TriangleMatchConfig::default();
    let detect = |img: &ndarray::Array2<f32>| -> Vec<[f64; 2]> {
        detect_stars(img, &config).iter().map(|s| s.position()).collect()
    };
    let target = detect(&reference_img);
    let points = detect(&source_img);
    assert!(points.len() >= 20, "only {} stars detected", points.len());

    let (found, diagnostics) = find_transform(&points, &target, &config).unwrap();
    assert!(diagnostics.inlier_matches >= 10);
    assert!(diagnostics.residual_rms < 1.0);

    // `found` maps the moved field back onto the reference: the inverse of `truth`.
    assert_abs_diff_eq!(found.rotation().to_degrees(), 15.0, epsilon = 0.2);
    assert_abs_diff_eq!(found.scale(), 1.0, epsilon = 0.01);
    for (r, m) in positions(&reference).iter().zip(positions(&moved)) {
        let (x, y) = found.apply(m[0], m[1]);
        assert!((x - r[0]).hypot(y - r[1]) < 1.0);
    }
}

#[cfg(feature = "astroalign")]
#[test]
fn astroalign_backend_resamples_onto_reference_and_keeps_header() {
    let truth = rotation_about_center(SIZE, SIZE, 10.0, -3.0, 2.0);
    let (reference, moved) = pair(5, &truth);
    let (reference_img, source_img) = (render(&reference), render(&moved));

    let mut header = Header::new();
    header.set("FILTER", "Ha");
    let source = Image::with_header(source_img, header.clone());

    let reference = Image::bare(reference_img.clone());
    let out = align(vec![source], Some(&reference), AlignMethod::Astroalign)
        .unwrap()
        .into_vec();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].header(), Some(&header));

    let aligned = callisto_core::image::to_array(&out[0], "test").unwrap();
    assert!(max_interior_diff(&aligned, &reference_img, 20) < 0.15);
}

//! Point-set registration by matching similarity-invariant triangles.
//!
//! Every point forms triangles with its nearest neighbours. A triangle is
//! described by two side-length ratios, which do not change under
//! translation, rotation or uniform scale, so triangles seen in both sets
//! can be paired without knowing the transform. Each pair proposes a
//! similarity; the proposal most other pairs agree with wins and is refitted
//! on all the point correspondences that support it.

use std::collections::HashSet;

use ndarray::Array2;

use crate::config::{AlignConfig, TriangleMatchConfig};
use crate::consts::{EPSILON, MAX_REQUIRED_MATCHES, MIN_STARS};
use crate::error::{CallistoError, Result};
use crate::transform::Transform2D;

use super::stars::detect_stars;
use super::warp::warp_image;

/// How a transform returned by [`find_transform`] was reached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchDiagnostics {
    /// Control points used from the source and target sets.
    pub source_points: usize,
    pub target_points: usize,
    /// Triangle pairs with matching invariants.
    pub triangle_matches: usize,
    /// Triangle pairs consistent with the accepted transform.
    pub inlier_matches: usize,
    /// `(source index, target index)` point correspondences used for the
    /// final fit.
    pub inlier_pairs: Vec<(usize, usize)>,
    /// Root-mean-square residual of `inlier_pairs`, in pixels.
    pub residual_rms: f64,
}

#[derive(Clone, Copy, Debug)]
struct Triangle {
    /// Vertices ordered by the length of the opposite side, shortest first.
    vertices: [usize; 3],
    invariant: [f64; 2],
}

/// Estimate the similarity transform mapping `source` points onto `target`
/// points. Points are `[x, y]`, brightest first; only the first
/// `max_control_points` of each set are used.
pub fn find_transform(
    source: &[[f64; 2]],
    target: &[[f64; 2]],
    config: &TriangleMatchConfig,
) -> Result<(Transform2D, MatchDiagnostics)> {
    let source = &source[..source.len().min(config.max_control_points)];
    let target = &target[..target.len().min(config.max_control_points)];
    if source.len() < MIN_STARS || target.len() < MIN_STARS {
        return Err(CallistoError::NotEnoughStars {
            found: source.len().min(target.len()),
            required: MIN_STARS,
        });
    }

    let source_triangles = build_triangles(source, config.nearest_neighbors);
    let target_triangles = build_triangles(target, config.nearest_neighbors);
    let matches = match_triangles(&source_triangles, &target_triangles, config.invariant_tolerance);
    if matches.is_empty() {
        return Err(CallistoError::NoMatch(
            "no triangles with matching invariants".to_string(),
        ));
    }

    let required = ((matches.len() as f64 * config.min_matches_fraction) as usize)
        .min(MAX_REQUIRED_MATCHES)
        .max(1);

    let correspondences = |&(s, t): &(usize, usize)| {
        let sv = source_triangles[s].vertices;
        let tv = target_triangles[t].vertices;
        [(sv[0], tv[0]), (sv[1], tv[1]), (sv[2], tv[2])]
    };
    let is_inlier = |model: &Transform2D, pair: &(usize, usize)| {
        correspondences(pair).iter().all(|&(si, ti)| {
            residual(model, source[si], target[ti]) < config.pixel_tolerance
        })
    };

    // Closest invariants first; stop at the first hypothesis with enough
    // support or after `max_hypotheses` tries.
    let mut best: Option<(Transform2D, Vec<usize>)> = None;
    let mut tried = 0;
    for pair in matches.iter().take(config.max_hypotheses.max(1)) {
        tried += 1;
        let pairs = correspondences(pair);
        let src: Vec<[f64; 2]> = pairs.iter().map(|&(si, _)| source[si]).collect();
        let tgt: Vec<[f64; 2]> = pairs.iter().map(|&(_, ti)| target[ti]).collect();
        let Some(model) = Transform2D::estimate_similarity(&src, &tgt) else {
            continue;
        };

        let inliers: Vec<usize> = (0..matches.len())
            .filter(|&m| is_inlier(&model, &matches[m]))
            .collect();
        let enough = inliers.len() >= required;
        if best.as_ref().is_none_or(|(_, b)| inliers.len() > b.len()) {
            best = Some((model, inliers));
        }
        if enough {
            break;
        }
    }

    let (model, inliers) = best
        .filter(|(_, inliers)| inliers.len() >= required)
        .ok_or_else(|| {
            CallistoError::NoMatch(format!(
                "no transform supported by {} of {} triangle matches ({} hypotheses tried)",
                required,
                matches.len(),
                tried
            ))
        })?;

    let mut seen = HashSet::new();
    let inlier_pairs: Vec<(usize, usize)> = inliers
        .iter()
        .flat_map(|&m| correspondences(&matches[m]))
        .filter(|pair| seen.insert(*pair))
        .collect();

    let src: Vec<[f64; 2]> = inlier_pairs.iter().map(|&(si, _)| source[si]).collect();
    let tgt: Vec<[f64; 2]> = inlier_pairs.iter().map(|&(_, ti)| target[ti]).collect();
    let transform = Transform2D::estimate_similarity(&src, &tgt).unwrap_or(model);

    let residual_rms = (inlier_pairs
        .iter()
        .map(|&(si, ti)| residual(&transform, source[si], target[ti]).powi(2))
        .sum::<f64>()
        / inlier_pairs.len().max(1) as f64)
        .sqrt();

    let diagnostics = MatchDiagnostics {
        source_points: source.len(),
        target_points: target.len(),
        triangle_matches: matches.len(),
        inlier_matches: inliers.len(),
        inlier_pairs,
        residual_rms,
    };
    tracing::debug!(
        matches = diagnostics.triangle_matches,
        inliers = diagnostics.inlier_matches,
        rms = diagnostics.residual_rms,
        %transform,
        "triangle match"
    );
    Ok((transform, diagnostics))
}

/// `astroalign` backend: detect stars in both images, match them and
/// resample the source onto the reference grid.
pub fn align_features(
    reference: &Array2<f32>,
    source: &Array2<f32>,
    config: &AlignConfig,
) -> Result<Array2<f32>> {
    let target: Vec<[f64; 2]> = detect_stars(reference, &config.triangle)
        .iter()
        .map(|s| s.position())
        .collect();
    let points: Vec<[f64; 2]> = detect_stars(source, &config.triangle)
        .iter()
        .map(|s| s.position())
        .collect();

    let (transform, _) = find_transform(&points, &target, &config.triangle)?;
    let to_source = transform
        .inverse()
        .ok_or_else(|| CallistoError::NoMatch(format!("singular transform {}", transform)))?;
    Ok(warp_image(source, &to_source, reference.dim()))
}

fn residual(model: &Transform2D, source: [f64; 2], target: [f64; 2]) -> f64 {
    let (x, y) = model.apply(source[0], source[1]);
    (x - target[0]).hypot(y - target[1])
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Triangles from every point and each pair of its `k - 1` nearest
/// neighbours, without duplicates.
fn build_triangles(points: &[[f64; 2]], k: usize) -> Vec<Triangle> {
    let k = k.clamp(MIN_STARS, points.len());
    let mut seen = HashSet::new();
    let mut triangles = Vec::new();

    for &p in points {
        let mut order: Vec<usize> = (0..points.len()).collect();
        order.sort_by(|&a, &b| distance(p, points[a]).total_cmp(&distance(p, points[b])));
        let near = &order[..k];

        for i in 0..k {
            for j in i + 1..k {
                for l in j + 1..k {
                    let mut key = [near[i], near[j], near[l]];
                    key.sort_unstable();
                    if seen.insert(key) {
                        if let Some(t) = triangle(points, key) {
                            triangles.push(t);
                        }
                    }
                }
            }
        }
    }
    triangles
}

fn triangle(points: &[[f64; 2]], key: [usize; 3]) -> Option<Triangle> {
    // Side opposite each vertex.
    let mut sides = [
        (distance(points[key[1]], points[key[2]]), key[0]),
        (distance(points[key[0]], points[key[2]]), key[1]),
        (distance(points[key[0]], points[key[1]]), key[2]),
    ];
    sides.sort_by(|a, b| a.0.total_cmp(&b.0));
    let [(l0, v0), (l1, v1), (l2, v2)] = sides;
    if l0 < EPSILON {
        return None;
    }
    Some(Triangle {
        vertices: [v0, v1, v2],
        invariant: [l2 / l1, l1 / l0],
    })
}

/// `(source, target)` triangle index pairs whose invariants lie within
/// `tolerance`, closest first.
fn match_triangles(
    source: &[Triangle],
    target: &[Triangle],
    tolerance: f64,
) -> Vec<(usize, usize)> {
    let mut matches: Vec<(f64, usize, usize)> = Vec::new();
    for (s, st) in source.iter().enumerate() {
        for (t, tt) in target.iter().enumerate() {
            let d = distance(st.invariant, tt.invariant);
            if d < tolerance {
                matches.push((d, s, t));
            }
        }
    }
    matches.sort_by(|a, b| a.0.total_cmp(&b.0));
    matches.into_iter().map(|(_, s, t)| (s, t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn invariant_is_similarity_invariant() {
        let points = [[0.0, 0.0], [4.0, 0.0], [0.0, 3.0]];
        let t = Transform2D::similarity(2.5, 0.7, 10.0, -4.0);
        let moved: Vec<[f64; 2]> = points
            .iter()
            .map(|p| {
                let (x, y) = t.apply(p[0], p[1]);
                [x, y]
            })
            .collect();

        let a = triangle(&points, [0, 1, 2]).unwrap();
        let b = triangle(&moved, [0, 1, 2]).unwrap();
        assert_abs_diff_eq!(a.invariant[0], b.invariant[0], epsilon = 1e-9);
        assert_abs_diff_eq!(a.invariant[1], b.invariant[1], epsilon = 1e-9);
        assert_eq!(a.vertices, b.vertices);
        // 3-4-5 triangle: hypotenuse is opposite vertex 0
        assert_eq!(a.vertices, [1, 2, 0]);
        assert_abs_diff_eq!(a.invariant[0], 5.0 / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_triangle_is_skipped() {
        let points = [[1.0, 1.0], [1.0, 1.0], [5.0, 2.0]];
        assert!(triangle(&points, [0, 1, 2]).is_none());
    }

    #[test]
    fn triangles_are_deduplicated() {
        let points = [[0.0, 0.0], [5.0, 1.0], [2.0, 7.0], [9.0, 9.0]];
        // Every neighbourhood covers all four points: C(4, 3) triangles.
        assert_eq!(build_triangles(&points, 5).len(), 4);
    }

    #[test]
    fn three_points_match_themselves() {
        let points = [[0.0, 0.0], [10.0, 1.0], [3.0, 8.0]];
        let (t, diag) = find_transform(&points, &points, &TriangleMatchConfig::default()).unwrap();
        assert_eq!(diag.triangle_matches, 1);
        assert_abs_diff_eq!(t.scale(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.rotation(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let points = [[0.0, 0.0], [1.0, 1.0]];
        let err = find_transform(&points, &points, &TriangleMatchConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CallistoError::NotEnoughStars {
                found: 2,
                required: 3
            }
        ));
    }

    #[test]
    fn unrelated_sets_stop_after_max_hypotheses() {
        let source: Vec<[f64; 2]> = (0..8)
            .map(|i| [(i * 37 % 97) as f64, (i * 61 % 89) as f64])
            .collect();
        let target: Vec<[f64; 2]> = (0..8)
            .map(|i| [(i * 53 % 101) as f64 + 0.5, (i * 29 % 83) as f64])
            .collect();
        // Loose enough that nearly every triangle pair matches.
        let config = TriangleMatchConfig {
            invariant_tolerance: 10.0,
            max_hypotheses: 3,
            ..TriangleMatchConfig::default()
        };

        let err = find_transform(&source, &target, &config).unwrap_err();
        assert!(
            matches!(err, CallistoError::NoMatch(ref m) if m.contains("(3 hypotheses tried)")),
            "{}",
            err
        );
    }
}

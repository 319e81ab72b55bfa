//! Ramer–Douglas–Peucker retained-vertex mask.
//!
//! The simplification is run in plain coordinate space (degrees treated as planar
//! coordinates), which is what the tolerance `epsilon` is expressed in. Only the mask is
//! needed downstream: retained vertices become segment breakpoints, no point is discarded.
use nalgebra::Vector2;

use crate::constants::Degree;

/// Distance from `point` to the infinite line through `start` and `end`.
///
/// Falls back to the point-to-point distance when `start == end`.
fn line_distance(point: &Vector2<f64>, start: &Vector2<f64>, end: &Vector2<f64>) -> f64 {
    let chord = end - start;
    let norm = chord.norm();
    if norm == 0.0 {
        return (point - start).norm();
    }
    chord.perp(&(start - point)).abs() / norm
}

/// Compute the RDP mask of a `(lon, lat)` polyline.
///
/// Iterative (explicit stack) formulation, so long tracks do not recurse.
///
/// Arguments
/// -----------------
/// * `coords` – polyline vertices as `(lon, lat)` in degrees.
/// * `epsilon` – tolerance in degrees; a vertex is kept when it lies strictly further than
///   `epsilon` from the chord of its current interval. Negative or NaN values act as `0`.
///
/// Return
/// ----------
/// * One flag per vertex, `true` for retained vertices. The first and last vertices are
///   always retained; an empty input gives an empty mask.
pub fn rdp_mask(coords: &[(Degree, Degree)], epsilon: Degree) -> Vec<bool> {
    let n = coords.len();
    let epsilon = if epsilon > 0.0 { epsilon } else { 0.0 };
    let mut mask = vec![true; n];
    if n < 3 {
        return mask;
    }

    let points: Vec<Vector2<f64>> = coords
        .iter()
        .map(|&(lon, lat)| Vector2::new(lon, lat))
        .collect();

    let mut stack = vec![(0usize, n - 1)];
    while let Some((start, end)) = stack.pop() {
        let mut dmax = 0.0;
        let mut index = start;
        for i in (start + 1)..end {
            if !mask[i] {
                continue;
            }
            let d = line_distance(&points[i], &points[start], &points[end]);
            if d > dmax {
                index = i;
                dmax = d;
            }
        }

        // index > start: every split strictly shrinks the interval
        if dmax > epsilon && index > start {
            stack.push((start, index));
            stack.push((index, end));
        } else {
            mask[(start + 1)..end].iter_mut().for_each(|m| *m = false);
        }
    }

    mask
}

//! # Great-circle distances on a spherical Earth
//!
//! Every distance in the crate goes through [`haversine`], parameterised by a
//! [`DistanceUnit`] so that the segmentation stage (meters) and the line-survey
//! conversion stage (kilometers) share one radius and one formula.
//!
//! Units & Conventions
//! -----------------
//! * Coordinates are geographic **degrees**, argument order is `(lon, lat)`.
//! * Longitudes may be given in `[0, 360)` or `(-180, 180]`; the half-angle
//!   formulation is insensitive to the convention and to antimeridian crossings.
//! * The sphere radius is [`EARTH_RADIUS_M`].
use itertools::Itertools;

use crate::constants::{Degree, EARTH_RADIUS_M, METERS_PER_KM};

/// Output unit of a great-circle distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
}

impl DistanceUnit {
    /// Sphere radius expressed in this unit.
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Meters => EARTH_RADIUS_M,
            DistanceUnit::Kilometers => EARTH_RADIUS_M / METERS_PER_KM,
        }
    }
}

/// Great-circle distance between two points using the Haversine formula.
///
/// Arguments
/// -----------------
/// * `lon1`, `lat1` – First point (degrees).
/// * `lon2`, `lat2` – Second point (degrees).
/// * `unit` – Output unit.
///
/// Return
/// ----------
/// * The distance in `unit`. Zero for coincident points, symmetric in its arguments.
pub fn haversine(lon1: Degree, lat1: Degree, lon2: Degree, lat2: Degree, unit: DistanceUnit) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // rounding can push `a` marginally above 1 for antipodal points
    2.0 * unit.earth_radius() * a.sqrt().min(1.0).asin()
}

/// Length of a polyline: sum of the great-circle distances between consecutive vertices.
///
/// Fewer than two vertices yield `0.0`.
pub fn path_length<I>(points: I, unit: DistanceUnit) -> f64
where
    I: IntoIterator<Item = (Degree, Degree)>,
{
    points
        .into_iter()
        .tuple_windows()
        .map(|((lon1, lat1), (lon2, lat2))| haversine(lon1, lat1, lon2, lat2, unit))
        .sum()
}

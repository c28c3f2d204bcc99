// SPDX-License-Identifier: Apache-2.0
//! Edge geometry on floor maps.
//!
//! Floor maps use the screen convention: x grows rightward, y grows
//! downward. Headings are absolute compass bearings where map-up is 0° and
//! angles grow clockwise, so the vertical term is negated when deriving a
//! bearing from pixel deltas.

/// A pixel position on a floor map.
pub type Point = (f64, f64);

/// Normalizes an angle in degrees to `[0, 360)`.
#[must_use]
pub fn normalize_heading(degrees: f64) -> f64 {
    let mut r = degrees % 360.0;
    if r < 0.0 {
        r += 360.0;
    }
    // A tiny negative remainder can round up to exactly 360.0.
    if r >= 360.0 {
        r = 0.0;
    }
    r
}

/// Euclidean pixel distance between two map points.
///
/// Consumers divide by the floor's pixels-per-meter scale for meters.
#[must_use]
pub fn edge_distance(from: Point, to: Point) -> f64 {
    (to.0 - from.0).hypot(to.1 - from.1)
}

/// Compass bearing from one map point toward another, in `[0, 360)`.
///
/// `atan2(dx, -dy)`: straight up on screen is 0°, right is 90°.
#[must_use]
pub fn edge_heading(from: Point, to: Point) -> f64 {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    normalize_heading(dx.atan2(-dy).to_degrees())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn cardinal_headings() {
        let origin = (100.0, 100.0);
        assert!((edge_heading(origin, (100.0, 0.0)) - 0.0).abs() < EPS); // up
        assert!((edge_heading(origin, (200.0, 100.0)) - 90.0).abs() < EPS); // right
        assert!((edge_heading(origin, (100.0, 200.0)) - 180.0).abs() < EPS); // down
        assert!((edge_heading(origin, (0.0, 100.0)) - 270.0).abs() < EPS); // left
    }

    #[test]
    fn diagonal_down_right_is_135() {
        // (100,100) -> (200,200): down-right on screen, south-east bearing.
        let h = edge_heading((100.0, 100.0), (200.0, 200.0));
        assert!((h - 135.0).abs() < 1e-4);
    }

    #[test]
    fn distance_matches_hypot() {
        let d = edge_distance((100.0, 100.0), (200.0, 200.0));
        assert!((d - 141.4213562373095).abs() < 1e-6);
    }

    #[test]
    fn normalize_wraps_negative_and_large() {
        assert!((normalize_heading(-90.0) - 270.0).abs() < EPS);
        assert!((normalize_heading(450.0) - 90.0).abs() < EPS);
        assert!((normalize_heading(360.0)).abs() < EPS);
    }

    proptest! {
        #[test]
        fn normalized_heading_is_in_range(deg in -1.0e6_f64..1.0e6) {
            let h = normalize_heading(deg);
            prop_assert!((0.0..360.0).contains(&h));
        }

        #[test]
        fn heading_is_in_range_for_any_points(
            ax in 0.0_f64..10_000.0, ay in 0.0_f64..10_000.0,
            bx in 0.0_f64..10_000.0, by in 0.0_f64..10_000.0,
        ) {
            let h = edge_heading((ax, ay), (bx, by));
            prop_assert!((0.0..360.0).contains(&h));
        }

        #[test]
        fn opposite_direction_flips_heading_by_180(
            ax in 0.0_f64..10_000.0, ay in 0.0_f64..10_000.0,
            bx in 0.0_f64..10_000.0, by in 0.0_f64..10_000.0,
        ) {
            prop_assume!((ax - bx).abs() > 1e-6 || (ay - by).abs() > 1e-6);
            let there = edge_heading((ax, ay), (bx, by));
            let back = edge_heading((bx, by), (ax, ay));
            let diff = normalize_heading(back - there);
            prop_assert!((diff - 180.0).abs() < 1e-6);
        }

        #[test]
        fn distance_is_symmetric(
            ax in 0.0_f64..10_000.0, ay in 0.0_f64..10_000.0,
            bx in 0.0_f64..10_000.0, by in 0.0_f64..10_000.0,
        ) {
            let d1 = edge_distance((ax, ay), (bx, by));
            let d2 = edge_distance((bx, by), (ax, ay));
            prop_assert!((d1 - d2).abs() < 1e-9);
        }
    }
}

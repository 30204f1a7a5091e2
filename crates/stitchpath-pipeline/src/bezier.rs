//! Cubic Bézier curves with arc-length traversal.
//!
//! ```text
//! B(t)     = (1-t)^3 P0 + 3(1-t)^2 t P1 + 3(1-t) t^2 P2 + t^3 P3
//! dB(t)/dt = 3(1-t)^2 v1 + 6(1-t) t v2 + 3 t^2 v3
//!            (v1 = P1-P0, v2 = P2-P1, v3 = P3-P2)
//! ```
//!
//! At construction the parameter range is split into `n` equal
//! sub-intervals and the length of each is estimated with Simpson's rule
//! on the speed `|dB/dt|`. [`CubicBezier::advance`] walks that table, so
//! moving a given distance along the curve never re-integrates.

use crate::types::Point;

/// A cubic Bézier curve with a precomputed arc-length table.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicBezier {
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
    v1: Point,
    v2: Point,
    v3: Point,
    /// Width of one sub-interval in parameter space.
    dt: f64,
    /// Arc length of each sub-interval.
    lengths: Vec<f64>,
}

impl CubicBezier {
    /// Default number of sub-intervals in the arc-length table.
    pub const DEFAULT_SEGMENTS: usize = 32;

    /// Create a curve from four control points using
    /// [`DEFAULT_SEGMENTS`](Self::DEFAULT_SEGMENTS) sub-intervals.
    #[must_use]
    pub fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self::with_segments(p0, p1, p2, p3, Self::DEFAULT_SEGMENTS)
    }

    /// Create a curve whose arc-length table has `segments` entries.
    ///
    /// A `segments` value of zero is treated as one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn with_segments(p0: Point, p1: Point, p2: Point, p3: Point, segments: usize) -> Self {
        let n = segments.max(1);
        let dt = 1.0 / n as f64;
        let mut curve = Self {
            p0,
            p1,
            p2,
            p3,
            v1: p1 - p0,
            v2: p2 - p1,
            v3: p3 - p2,
            dt,
            lengths: Vec::with_capacity(n),
        };

        // Simpson's rule per sub-interval; the right sample of one interval
        // is the left sample of the next.
        let mut left = curve.derivative(0.0).norm();
        for i in 0..n {
            let t = i as f64 * dt;
            let center = curve.derivative(0.5f64.mul_add(dt, t)).norm();
            let right = curve.derivative(t + dt).norm();
            curve
                .lengths
                .push((dt / 6.0) * 4.0f64.mul_add(center, left + right));
            left = right;
        }

        curve
    }

    /// The four control points.
    #[must_use]
    pub const fn control_points(&self) -> [Point; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }

    /// Point on the curve at parameter `t`.
    ///
    /// `t` is not clamped; values outside `[0, 1]` extrapolate the
    /// polynomial.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        let s = 1.0 - t;
        (s * s * s) * self.p0
            + (3.0 * s * s * t) * self.p1
            + (3.0 * s * t * t) * self.p2
            + (t * t * t) * self.p3
    }

    /// First derivative `dB/dt` at parameter `t`.
    #[must_use]
    pub fn derivative(&self, t: f64) -> Point {
        let s = 1.0 - t;
        (3.0 * s * s) * self.v1 + (6.0 * s * t) * self.v2 + (3.0 * t * t) * self.v3
    }

    /// Estimated arc length of the whole curve.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.lengths.iter().sum()
    }

    /// Arc length of each sub-interval, in parameter order.
    #[must_use]
    pub fn segment_lengths(&self) -> &[f64] {
        &self.lengths
    }

    /// Move `distance` along the curve starting at parameter `t`.
    ///
    /// When the destination lies on this curve, `t` is updated to it and
    /// `0.0` is returned. When the destination lies past the end, `t` is
    /// set to `1.0` and the distance still left to travel is returned, so
    /// the caller can carry it into the next curve of a path.
    ///
    /// Within a sub-interval the parameter is interpolated linearly in
    /// arc length.
    ///
    /// If `t` is outside `[0, 1)` on entry it is left untouched and the
    /// whole `distance` is returned.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn advance(&self, t: &mut f64, distance: f64) -> f64 {
        if !(0.0..1.0).contains(t) {
            return distance;
        }

        let n = self.lengths.len();
        let scaled = *t * n as f64;
        // `t < 1` can still round up to `n` after scaling.
        let start = (scaled.floor() as usize).min(n - 1);

        // Measure from the start of the current sub-interval.
        let mut remaining = self.lengths[start].mul_add(scaled - start as f64, distance);

        for (i, &dl) in self.lengths.iter().enumerate().skip(start) {
            if remaining < dl {
                *t = self.dt * (i as f64 + remaining / dl);
                return 0.0;
            }
            remaining -= dl;
        }

        *t = 1.0;
        remaining
    }
}

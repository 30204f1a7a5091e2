//! Constant-pitch sampling of poly-Bézier paths.
//!
//! A path is a chain of cubic curves that share endpoints. Points are
//! placed every `pitch` units of arc length; distance left over at the end
//! of one curve is carried into the next so spacing stays uniform across
//! curve boundaries.

use crate::bezier::CubicBezier;
use crate::types::Point;

/// Upper bound on stitches along a single curve.
pub const MAX_STITCHES_PER_CURVE: f64 = 1.0e6;

/// Why a control point list could not be sampled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    /// Fewer than the four control points of a single cubic curve.
    #[error("expected at least 4 control points, got {0}")]
    TooFewControlPoints(usize),

    /// The count is not `3k + 1`, so the last curve is incomplete.
    #[error("control point count {0} is not of the form 3k+1")]
    MisalignedControlPoints(usize),

    /// A flattened coordinate array had an odd number of values.
    #[error("flattened coordinate array has odd length {0}")]
    OddCoordinateCount(usize),

    /// A curve would need more than [`MAX_STITCHES_PER_CURVE`] stitches,
    /// or one pitch is lost in rounding against its parameter.
    #[error("pitch is too small for the curve length")]
    PitchTooSmall,
}

/// Place a point every `pitch` units of arc length along a poly-Bézier.
///
/// `controls` holds `3k + 1` control points: curve `i` uses
/// `controls[3i..=3i+3]`. The first point of the path is always emitted.
///
/// The end of the path is handled specially. When the stitch after the
/// last sampled point would have landed less than a quarter pitch past
/// the true end point, that sampled point is moved onto the end point;
/// otherwise the end point is appended as one more stitch.
///
/// `segments` is the arc-length table resolution of each curve.
///
/// # Errors
///
/// Returns [`SampleError`] when `controls` does not describe at least one
/// complete cubic curve, or [`SampleError::PitchTooSmall`] when `pitch`
/// is vanishingly small against a curve's length.
pub fn points_on_path(
    controls: &[Point],
    pitch: f64,
    segments: usize,
) -> Result<Vec<Point>, SampleError> {
    if controls.len() < 4 {
        return Err(SampleError::TooFewControlPoints(controls.len()));
    }
    if (controls.len() - 1) % 3 != 0 {
        return Err(SampleError::MisalignedControlPoints(controls.len()));
    }

    let mut points = Vec::new();
    let mut carry = 0.0;
    let mut end = controls[0];

    for c in controls.windows(4).step_by(3) {
        let curve = CubicBezier::with_segments(c[0], c[1], c[2], c[3], segments);
        end = c[3];
        if curve.length() / pitch > MAX_STITCHES_PER_CURVE {
            return Err(SampleError::PitchTooSmall);
        }

        let mut t = 0.0;
        carry = curve.advance(&mut t, carry);
        while t < 1.0 {
            points.push(curve.point_at(t));
            let before = t;
            carry = curve.advance(&mut t, pitch);
            if t <= before {
                return Err(SampleError::PitchTooSmall);
            }
        }
    }

    // `carry` is how far past the end the next stitch would have landed.
    match points.last_mut() {
        Some(last) if carry < 0.25 * pitch => *last = end,
        _ => points.push(end),
    }

    Ok(points)
}

/// Like [`points_on_path`] but takes a flattened `x0, y0, x1, y1, ...`
/// coordinate array.
///
/// # Errors
///
/// Returns [`SampleError::OddCoordinateCount`] for an odd-length array,
/// and the errors of [`points_on_path`] otherwise.
pub fn points_on_flat(
    coords: &[f64],
    pitch: f64,
    segments: usize,
) -> Result<Vec<Point>, SampleError> {
    if coords.len() % 2 != 0 {
        return Err(SampleError::OddCoordinateCount(coords.len()));
    }
    let controls: Vec<Point> = coords
        .chunks_exact(2)
        .map(|xy| Point::new(xy[0], xy[1]))
        .collect();
    points_on_path(&controls, pitch, segments)
}

/// Sample a straight segment from `a` to `b` at `pitch`.
///
/// The segment is treated as a Bézier with evenly spaced collinear
/// control points, so the parameter is proportional to arc length.
///
/// # Errors
///
/// Returns [`SampleError::PitchTooSmall`] as [`points_on_path`] does.
pub fn points_on_line(
    a: Point,
    b: Point,
    pitch: f64,
    segments: usize,
) -> Result<Vec<Point>, SampleError> {
    let step = (b - a) * (1.0 / 3.0);
    points_on_path(&[a, a + step, a + 2.0 * step, b], pitch, segments)
}

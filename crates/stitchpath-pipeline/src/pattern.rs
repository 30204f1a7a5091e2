//! Stitch patterns: turn a point sequence into a sewable segment.
//!
//! - **Single**: the points as-is.
//! - **Triple**: forward, backward, forward again. Three passes give a
//!   stronger line and, with conductive thread, three times the
//!   conductance.
//! - **Junction marker** ("star"): a closed seven-point star tacked at a
//!   connection point.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::types::{Point, StitchSegment};

/// Number of vertices in a junction marker.
const STAR_VERTICES: u32 = 7;

/// Which pattern to sew a traced path with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StitchPattern {
    /// One pass along the path.
    Single,
    /// Forward, backward, forward.
    Triple,
}

impl StitchPattern {
    /// Sew `points` with this pattern. See [`single_stitch`] and
    /// [`triple_stitch`].
    #[must_use]
    pub fn apply(
        self,
        points: &[Point],
        star_size: f64,
        start_star: bool,
        end_star: bool,
    ) -> Option<StitchSegment> {
        match self {
            Self::Single => single_stitch(points, star_size, start_star, end_star),
            Self::Triple => triple_stitch(points, star_size, start_star, end_star),
        }
    }
}

/// Closed star polygon of radius `r` around `center`.
///
/// Vertex `i` sits at angle `2π·2i/7`, so consecutive stitches skip a
/// vertex and cross the center region, giving a tack that holds in every
/// direction. The first vertex is repeated at the end (8 points).
#[must_use]
pub fn junction_marker(center: Point, r: f64) -> Vec<Point> {
    let mut points: Vec<Point> = (0..STAR_VERTICES)
        .map(|i| {
            let angle = TAU / f64::from(STAR_VERTICES) * f64::from(2 * i);
            center + Point::new(angle.cos(), angle.sin()) * r
        })
        .collect();
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

/// Sew `points` as a single pass.
///
/// Without markers the points pass through unchanged, whatever their
/// count. With a marker requested at either end, fewer than two points is
/// too short to anchor and yields `None`.
///
/// Markers have diameter `star_size`.
#[must_use]
pub fn single_stitch(
    points: &[Point],
    star_size: f64,
    start_star: bool,
    end_star: bool,
) -> Option<StitchSegment> {
    if !start_star && !end_star {
        return Some(StitchSegment::new(points.to_vec()));
    }
    let (&first, &last) = (points.first()?, points.last()?);
    if points.len() < 2 {
        return None;
    }

    let radius = 0.5 * star_size;
    let mut out = Vec::with_capacity(points.len() + 16);
    if start_star {
        out.extend(junction_marker(first, radius));
    }
    out.extend_from_slice(points);
    if end_star {
        out.extend(junction_marker(last, radius));
    }
    Some(StitchSegment::new(out))
}

/// Sew `points` as a reinforced triple pass.
///
/// The markers go at the geometric ends: the end marker after the first
/// (forward) pass, the start marker after the second (backward) pass.
/// Fewer than two points yields `None`.
#[must_use]
pub fn triple_stitch(
    points: &[Point],
    star_size: f64,
    start_star: bool,
    end_star: bool,
) -> Option<StitchSegment> {
    let (&first, &last) = (points.first()?, points.last()?);
    if points.len() < 2 {
        return None;
    }

    let radius = 0.5 * star_size;
    let mut out = Vec::with_capacity(points.len() * 3 + 16);
    out.extend_from_slice(points);
    if end_star {
        out.extend(junction_marker(last, radius));
    }
    out.extend(points.iter().rev());
    if start_star {
        out.extend(junction_marker(first, radius));
    }
    out.extend_from_slice(points);
    Some(StitchSegment::new(out))
}

/// Append-only set of stitch segments awaiting ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StitchCollection {
    segments: Vec<StitchSegment>,
}

impl StitchCollection {
    /// An empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// `true` when no segment has been added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.segments.len()
    }

    /// The segments in insertion order.
    #[must_use]
    pub fn segments(&self) -> &[StitchSegment] {
        &self.segments
    }

    /// Consume the collection.
    #[must_use]
    pub fn into_segments(self) -> Vec<StitchSegment> {
        self.segments
    }

    /// Add an already-built segment.
    pub fn push(&mut self, segment: StitchSegment) {
        self.segments.push(segment);
    }

    /// Add `points` sewn with `pattern`. Returns `false` when the pattern
    /// produced nothing (too few points for the requested markers).
    pub fn add(
        &mut self,
        pattern: StitchPattern,
        points: &[Point],
        star_size: f64,
        start_star: bool,
        end_star: bool,
    ) -> bool {
        match pattern.apply(points, star_size, start_star, end_star) {
            Some(segment) => {
                self.push(segment);
                true
            }
            None => false,
        }
    }

    /// Add a single pass. See [`single_stitch`].
    pub fn add_single(
        &mut self,
        points: &[Point],
        star_size: f64,
        start_star: bool,
        end_star: bool,
    ) -> bool {
        self.add(StitchPattern::Single, points, star_size, start_star, end_star)
    }

    /// Add a triple pass. See [`triple_stitch`].
    pub fn add_triple(
        &mut self,
        points: &[Point],
        star_size: f64,
        start_star: bool,
        end_star: bool,
    ) -> bool {
        self.add(StitchPattern::Triple, points, star_size, start_star, end_star)
    }
}

impl From<StitchCollection> for Vec<StitchSegment> {
    fn from(collection: StitchCollection) -> Self {
        collection.segments
    }
}

//! Shape stitching: turn extracted vector shapes into stitch segments.
//!
//! Vector sources differ in what their shapes mean. A hand-drawn SVG is a
//! set of plain strokes, while a PCB editor export names its shapes so
//! that pads, wires and the board outline can be told apart. This module
//! defines the [`ShapeStitcher`] trait for pluggable strategies and the
//! [`ShapeStitcherKind`] enum for runtime selection.

use serde::{Deserialize, Serialize};

use crate::pattern::{StitchCollection, StitchPattern};
use crate::sample::{SampleError, points_on_line, points_on_path};
use crate::types::{PipelineConfig, PipelineError, Point, Shape, Wire};

/// Shape id of the PCB board outline, which is never sewn.
const BOARD_OUTLINE_ID: &str = "boardoutline";

/// Id prefix of PCB pads and holes.
const CONNECTOR_ID_PREFIX: &str = "connector";

/// Selects which shape stitching strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeStitcherKind {
    /// Every stroked shape is sewn along its path.
    ///
    /// Strokes at least [`PipelineConfig::triple_stroke_width`] wide get a
    /// reinforced triple stitch, thinner ones a single stitch. Fill paint
    /// is not sewn.
    #[default]
    Normal,

    /// Shapes are interpreted by id, as exported by Fritzing 0.9 PCB view.
    ///
    /// - `boardoutline` is skipped.
    /// - `connector*` (pads and holes) is triple stitched at half pitch.
    /// - Everything else is a wire: triple stitched with a junction
    ///   marker at both ends.
    Fritzing09,
}

impl ShapeStitcherKind {
    /// Lowercase name, as used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fritzing09 => "fritzing09",
        }
    }
}

/// Trait for shape stitching strategies.
pub trait ShapeStitcher {
    /// Sew `shape` into `stitches`, one segment per path.
    ///
    /// Returns the number of segments added. Segments with fewer than two
    /// stitches are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedPath`] when a path of the shape is
    /// not a valid poly-Bézier control point list.
    fn stitch_shape(
        &self,
        shape: &Shape,
        config: &PipelineConfig,
        stitches: &mut StitchCollection,
    ) -> Result<usize, PipelineError>;
}

impl ShapeStitcher for ShapeStitcherKind {
    fn stitch_shape(
        &self,
        shape: &Shape,
        config: &PipelineConfig,
        stitches: &mut StitchCollection,
    ) -> Result<usize, PipelineError> {
        let Some(stroke_width) = shape.stroke_width else {
            if shape.filled {
                tracing::warn!(shape = %shape.id, "fill stitching is not supported, skipping");
            }
            return Ok(0);
        };

        match *self {
            Self::Normal => {
                if shape.filled {
                    tracing::warn!(shape = %shape.id, "fill stitching is not supported, stroke only");
                }
                let pattern = if stroke_width >= config.triple_stroke_width {
                    StitchPattern::Triple
                } else {
                    StitchPattern::Single
                };
                let style = PathStyle {
                    pattern,
                    pitch: config.pitch,
                    stars: false,
                };
                stitch_paths(shape, style, config, stitches)
            }
            Self::Fritzing09 => {
                if shape.id == BOARD_OUTLINE_ID {
                    tracing::debug!("skipping board outline");
                    return Ok(0);
                }
                let style = if shape.id.starts_with(CONNECTOR_ID_PREFIX) {
                    PathStyle {
                        pattern: StitchPattern::Triple,
                        pitch: 0.5 * config.pitch,
                        stars: false,
                    }
                } else {
                    PathStyle {
                        pattern: StitchPattern::Triple,
                        pitch: config.pitch,
                        stars: true,
                    }
                };
                stitch_paths(shape, style, config, stitches)
            }
        }
    }
}

/// How the paths of one shape are sewn.
#[derive(Debug, Clone, Copy)]
struct PathStyle {
    pattern: StitchPattern,
    pitch: f64,
    /// Junction marker at both ends of every path.
    stars: bool,
}

fn stitch_paths(
    shape: &Shape,
    style: PathStyle,
    config: &PipelineConfig,
    stitches: &mut StitchCollection,
) -> Result<usize, PipelineError> {
    let mut added = 0;
    for controls in &shape.paths {
        let points = points_on_path(controls, style.pitch, config.curve_segments).map_err(
            |source| PipelineError::MalformedPath {
                shape: shape.id.clone(),
                source,
            },
        )?;
        if add_if_sewable(
            stitches,
            style.pattern,
            &points,
            config.star_size,
            style.stars,
            style.stars,
        ) {
            added += 1;
        }
    }
    tracing::trace!(shape = %shape.id, paths = shape.paths.len(), added, "stitched shape");
    Ok(added)
}

/// Add the pattern to `stitches` unless it yields fewer than two stitches.
fn add_if_sewable(
    stitches: &mut StitchCollection,
    pattern: StitchPattern,
    points: &[Point],
    star_size: f64,
    start_star: bool,
    end_star: bool,
) -> bool {
    match pattern
        .apply(points, star_size, start_star, end_star)
        .filter(|segment| segment.len() >= 2)
    {
        Some(segment) => {
            stitches.push(segment);
            true
        }
        None => false,
    }
}

/// Sew a straight wire as a triple stitch.
///
/// A junction marker is tacked at every end that lands on a pad, so the
/// conductive thread makes solid contact there. Returns `false` when the
/// wire is too short to sew.
///
/// # Errors
///
/// Returns [`SampleError::PitchTooSmall`] when the wire is too long for
/// the configured pitch.
pub fn stitch_wire(
    wire: &Wire,
    config: &PipelineConfig,
    stitches: &mut StitchCollection,
) -> Result<bool, SampleError> {
    let points = points_on_line(wire.from, wire.to, config.pitch, config.curve_segments)?;
    Ok(add_if_sewable(
        stitches,
        StitchPattern::Triple,
        &points,
        config.star_size,
        wire.from_pad,
        wire.to_pad,
    ))
}

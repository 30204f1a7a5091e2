//! stitchpath-pipeline: Pure stitch synthesis and tour ordering (sans-IO).
//!
//! Converts vector geometry into an ordered embroidery stitch path:
//! constant-pitch sampling of cubic Bézier paths -> stitch patterns
//! (single, triple, junction markers) -> tour ordering that keeps jump
//! travel between segments short.
//!
//! This crate has **no I/O dependencies**. It takes already-extracted
//! geometry ([`GeometryDocument`]) and returns ordered stitch segments.
//! Machine file formats live in `stitchpath-export`.

pub mod bezier;
pub mod diagnostics;
pub mod optimize;
pub mod pattern;
pub mod sample;
pub mod stitcher;
pub mod types;

pub use bezier::CubicBezier;
pub use optimize::{optimize_stitch_order, optimize_with_trace, total_jump_distance};
pub use pattern::{StitchCollection, StitchPattern};
pub use sample::{SampleError, points_on_flat, points_on_line, points_on_path};
pub use stitcher::{ShapeStitcher, ShapeStitcherKind, stitch_wire};
pub use types::{
    Affine, Bounds, GeometryDocument, PipelineConfig, PipelineError, Point, Shape, StitchResult,
    StitchSegment, Wire,
};

/// Run the full stitch pipeline.
///
/// # Pipeline steps
///
/// 1. Validate the configuration
/// 2. Stitch every visible shape with the configured strategy
/// 3. Stitch every wire
/// 4. Tour ordering (when `config.optimize_order` is set)
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::MalformedPath`] if a shape path is not a valid
/// poly-Bézier.
/// Returns [`PipelineError::NoStitches`] if nothing in `doc` is sewable.
pub fn process(
    doc: &GeometryDocument,
    config: &PipelineConfig,
) -> Result<StitchResult, PipelineError> {
    config.validate()?;

    // 1-3. Build the unordered stitch set.
    let stitches = build_stitches(doc, config)?;
    if stitches.is_empty() {
        return Err(PipelineError::NoStitches);
    }

    // 4. Ordering.
    let segments = if config.optimize_order {
        optimize_stitch_order(stitches.into_segments())
    } else {
        stitches.into_segments()
    };

    finish(segments)
}

/// Stitch every visible shape and every wire of `doc`, in input order.
///
/// Does not validate `config`; see [`PipelineConfig::validate`].
///
/// # Errors
///
/// Returns [`PipelineError::MalformedPath`] if a shape path is not a valid
/// poly-Bézier.
pub fn build_stitches(
    doc: &GeometryDocument,
    config: &PipelineConfig,
) -> Result<StitchCollection, PipelineError> {
    let mut stitches = StitchCollection::new();
    stitch_shapes(&doc.shapes, config, &mut stitches)?;
    stitch_wires(&doc.wires, config, &mut stitches);
    Ok(stitches)
}

/// Counts from the shape stitching stage.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ShapeStats {
    pub hidden: usize,
    pub paths: usize,
    pub segments: usize,
}

pub(crate) fn stitch_shapes(
    shapes: &[Shape],
    config: &PipelineConfig,
    stitches: &mut StitchCollection,
) -> Result<ShapeStats, PipelineError> {
    let mut stats = ShapeStats::default();
    for shape in shapes {
        if !shape.visible {
            stats.hidden += 1;
            continue;
        }
        stats.paths += shape.paths.len();
        stats.segments += config.stitcher.stitch_shape(shape, config, stitches)?;
    }
    tracing::debug!(
        stitcher = config.stitcher.name(),
        shapes = shapes.len(),
        hidden = stats.hidden,
        segments = stats.segments,
        "stitched shapes"
    );
    Ok(stats)
}

/// Returns the number of segments added.
pub(crate) fn stitch_wires(
    wires: &[Wire],
    config: &PipelineConfig,
    stitches: &mut StitchCollection,
) -> usize {
    let mut added = 0;
    for (i, wire) in wires.iter().enumerate() {
        match stitch_wire(wire, config, stitches) {
            Ok(true) => added += 1,
            Ok(false) => tracing::warn!(wire = i, "wire too short to sew, skipping"),
            Err(e) => tracing::warn!(wire = i, error = %e, "wire cannot be sampled, skipping"),
        }
    }
    tracing::debug!(wires = wires.len(), segments = added, "stitched wires");
    added
}

/// Wrap ordered segments into a [`StitchResult`].
pub(crate) fn finish(segments: Vec<StitchSegment>) -> Result<StitchResult, PipelineError> {
    let bounds = Bounds::of(&segments).ok_or(PipelineError::NoStitches)?;
    Ok(StitchResult { segments, bounds })
}

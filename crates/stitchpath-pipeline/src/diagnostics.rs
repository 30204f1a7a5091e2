//! Pipeline diagnostics: timing, counts, and jump metrics for each stage.
//!
//! [`process_with_diagnostics`] runs the same stages as
//! [`process`](crate::process) and reports what each one did, along with
//! the full merge trace of the tour optimizer.
//!
//! Timestamps come from a caller-supplied [`Clock`] so the crate stays
//! free of platform time sources.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::optimize::{MergeTrace, optimize_with_trace, total_jump_distance};
use crate::pattern::StitchCollection;
use crate::types::{
    Bounds, GeometryDocument, PipelineConfig, PipelineError, StitchResult, StitchSegment,
};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: shape stitching.
    pub shapes: StageDiagnostics,
    /// Stage 2: wire stitching.
    pub wires: StageDiagnostics,
    /// Stage 3: tour ordering (only when `config.optimize_order == true`).
    pub ordering: Option<StageDiagnostics>,
    /// Every merge the optimizer made, in order. Empty when ordering was
    /// skipped.
    pub merge_trace: MergeTrace,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of the final stitch set.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Shape stitching metrics.
    Shapes {
        /// Which stitcher strategy was used.
        stitcher: String,
        /// Shapes in the input document.
        shape_count: usize,
        /// Shapes skipped because they are hidden.
        hidden_count: usize,
        /// Paths across all visible shapes.
        path_count: usize,
        /// Segments produced.
        segment_count: usize,
        /// Stitches across those segments.
        stitch_count: usize,
    },
    /// Wire stitching metrics.
    Wires {
        /// Wires in the input document.
        wire_count: usize,
        /// Wire ends flagged as pad connections.
        pad_count: usize,
        /// Segments produced.
        segment_count: usize,
        /// Stitches across those segments.
        stitch_count: usize,
    },
    /// Tour ordering metrics.
    Ordering {
        /// Segments ordered.
        segment_count: usize,
        /// Merges performed (one less than the segment count).
        merge_count: usize,
        /// Jump travel in input order.
        jump_distance_before: f64,
        /// Jump travel in the optimized order.
        jump_distance_after: f64,
    },
}

/// High-level summary of the final stitch set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Segments in output order.
    pub segment_count: usize,
    /// Total stitches.
    pub stitch_count: usize,
    /// Jump travel between consecutive segments.
    pub jump_distance: f64,
    /// Bounding box of every stitch.
    pub bounds: Bounds,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Design: {:.1}x{:.1}mm ({} stitches)",
            self.summary.bounds.width(),
            self.summary.bounds.height(),
            self.summary.stitch_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages = vec![("Shapes", &self.shapes), ("Wires", &self.wires)];
        if let Some(ref ordering) = self.ordering {
            stages.push(("Ordering", ordering));
        }

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Segments: {}  |  Jump travel: {:.1}mm",
            self.summary.segment_count, self.summary.jump_distance,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Shapes {
            stitcher,
            shape_count,
            hidden_count,
            path_count,
            segment_count,
            stitch_count,
        } => format!(
            "{stitcher} {shape_count} shapes ({hidden_count} hidden), {path_count} paths -> {segment_count} segs, {stitch_count} sts",
        ),
        StageMetrics::Wires {
            wire_count,
            pad_count,
            segment_count,
            stitch_count,
        } => format!(
            "{wire_count} wires ({pad_count} pad ends) -> {segment_count} segs, {stitch_count} sts",
        ),
        StageMetrics::Ordering {
            segment_count,
            merge_count,
            jump_distance_before,
            jump_distance_after,
        } => format!(
            "{segment_count} segs, {merge_count} merges, jumps {jump_distance_before:.1}->{jump_distance_after:.1}mm",
        ),
    }
}

/// Stitches across `segments`.
fn stitch_count(segments: &[StitchSegment]) -> usize {
    segments.iter().map(StitchSegment::len).sum()
}

/// Run the pipeline, timing each stage with `clock`.
///
/// Produces the same [`StitchResult`] as [`process`](crate::process).
///
/// # Errors
///
/// Same as [`process`](crate::process).
pub fn process_with_diagnostics<C: Clock>(
    doc: &GeometryDocument,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StitchResult, PipelineDiagnostics), PipelineError> {
    let total_start = clock.now();
    config.validate()?;

    // 1. Shapes.
    let start = clock.now();
    let mut stitches = StitchCollection::new();
    let shape_stats = crate::stitch_shapes(&doc.shapes, config, &mut stitches)?;
    let shape_stitches = stitch_count(stitches.segments());
    let shapes = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Shapes {
            stitcher: config.stitcher.name().to_string(),
            shape_count: doc.shapes.len(),
            hidden_count: shape_stats.hidden,
            path_count: shape_stats.paths,
            segment_count: shape_stats.segments,
            stitch_count: shape_stitches,
        },
    };

    // 2. Wires.
    let start = clock.now();
    let wire_segments = crate::stitch_wires(&doc.wires, config, &mut stitches);
    let wires = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Wires {
            wire_count: doc.wires.len(),
            pad_count: doc
                .wires
                .iter()
                .map(|w| usize::from(w.from_pad) + usize::from(w.to_pad))
                .sum(),
            segment_count: wire_segments,
            stitch_count: stitch_count(stitches.segments()) - shape_stitches,
        },
    };

    if stitches.is_empty() {
        return Err(PipelineError::NoStitches);
    }

    // 3. Ordering.
    let segments = stitches.into_segments();
    let (segments, ordering, merge_trace) = if config.optimize_order {
        let start = clock.now();
        let jump_distance_before = total_jump_distance(&segments);
        let segment_count = segments.len();
        let (ordered, trace) = optimize_with_trace(segments);
        let ordering = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::Ordering {
                segment_count,
                merge_count: trace.steps.len(),
                jump_distance_before,
                jump_distance_after: total_jump_distance(&ordered),
            },
        };
        (ordered, Some(ordering), trace)
    } else {
        (segments, None, MergeTrace::default())
    };

    let result = crate::finish(segments)?;
    let summary = PipelineSummary {
        segment_count: result.segments.len(),
        stitch_count: result.stitch_count(),
        jump_distance: total_jump_distance(&result.segments),
        bounds: result.bounds,
    };

    let diagnostics = PipelineDiagnostics {
        shapes,
        wires,
        ordering,
        merge_trace,
        total_duration: clock.elapsed(&total_start),
        summary,
    };
    Ok((result, diagnostics))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Point, Shape, Wire};

    /// Clock that never advances.
    struct FrozenClock;

    impl Clock for FrozenClock {
        type Instant = ();

        fn now(&self) -> Self::Instant {}

        fn elapsed(&self, _since: &Self::Instant) -> Duration {
            Duration::ZERO
        }
    }

    fn line(x0: f64, y: f64, x1: f64) -> Vec<Point> {
        let step = (x1 - x0) / 3.0;
        (0..4)
            .map(|i| Point::new(f64::from(i).mul_add(step, x0), y))
            .collect()
    }

    fn document() -> GeometryDocument {
        let stroke = |id: &str, paths| Shape {
            id: id.to_string(),
            visible: true,
            stroke_width: Some(0.05),
            filled: false,
            paths,
        };
        let mut hidden = stroke("hidden", vec![line(0.0, 50.0, 10.0)]);
        hidden.visible = false;
        GeometryDocument {
            shapes: vec![
                stroke("a", vec![line(0.0, 0.0, 10.0)]),
                stroke("b", vec![line(30.0, 0.0, 40.0), line(12.0, 0.0, 28.0)]),
                hidden,
            ],
            wires: vec![Wire {
                from: Point::new(40.0, 2.0),
                to: Point::new(40.0, 12.0),
                from_pad: true,
                to_pad: false,
            }],
        }
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_match_plain_process() {
        let config = PipelineConfig::default();
        let (result, _) = process_with_diagnostics(&document(), &config, &FrozenClock).unwrap();
        let plain = crate::process(&document(), &config).unwrap();
        assert_eq!(result, plain);
    }

    #[test]
    fn stage_counts() {
        let (result, diag) =
            process_with_diagnostics(&document(), &PipelineConfig::default(), &FrozenClock)
                .unwrap();

        match diag.shapes.metrics {
            StageMetrics::Shapes {
                ref stitcher,
                shape_count,
                hidden_count,
                path_count,
                segment_count,
                ..
            } => {
                assert_eq!(stitcher, "normal");
                assert_eq!(shape_count, 3);
                assert_eq!(hidden_count, 1);
                assert_eq!(path_count, 3);
                assert_eq!(segment_count, 3);
            }
            ref other => unreachable!("wrong metrics {other:?}"),
        }
        assert!(matches!(
            diag.wires.metrics,
            StageMetrics::Wires {
                wire_count: 1,
                pad_count: 1,
                segment_count: 1,
                ..
            }
        ));

        let ordering = diag.ordering.unwrap();
        match ordering.metrics {
            StageMetrics::Ordering {
                segment_count,
                merge_count,
                jump_distance_before,
                jump_distance_after,
            } => {
                assert_eq!(segment_count, 4);
                assert_eq!(merge_count, 3);
                assert!(jump_distance_after < jump_distance_before);
            }
            ref other => unreachable!("wrong metrics {other:?}"),
        }
        assert_eq!(diag.merge_trace.steps.len(), 3);
        assert_eq!(diag.summary.segment_count, result.segments.len());
        assert_eq!(diag.summary.stitch_count, result.stitch_count());
    }

    #[test]
    fn ordering_skipped_when_disabled() {
        let config = PipelineConfig {
            optimize_order: false,
            ..PipelineConfig::default()
        };
        let (_, diag) = process_with_diagnostics(&document(), &config, &FrozenClock).unwrap();
        assert!(diag.ordering.is_none());
        assert!(diag.merge_trace.steps.is_empty());
    }

    #[test]
    fn report_lists_stages() {
        let (_, diag) =
            process_with_diagnostics(&document(), &PipelineConfig::default(), &FrozenClock)
                .unwrap();
        let report = diag.report();
        assert!(report.contains("Shapes"));
        assert!(report.contains("Wires"));
        assert!(report.contains("Ordering"));
        assert!(report.contains("Segments: 4"));
    }

    #[test]
    fn diagnostics_serialize_to_json() {
        let (_, diag) =
            process_with_diagnostics(&document(), &PipelineConfig::default(), &FrozenClock)
                .unwrap();
        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.segment_count, diag.summary.segment_count);
        assert_eq!(back.merge_trace, diag.merge_trace);
    }

    #[test]
    fn empty_document_is_no_stitches() {
        let err = process_with_diagnostics(
            &GeometryDocument::default(),
            &PipelineConfig::default(),
            &FrozenClock,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::NoStitches));
    }
}

//! Machine command stream.
//!
//! Ordered stitch segments map onto the four commands every embroidery
//! format understands:
//!
//! ```text
//! segment 0:  JUMP p0, NORMAL p0, NORMAL p1, ...
//! segment k:  TRIM, JUMP p0, NORMAL p0, NORMAL p1, ...
//! end:        END
//! ```
//!
//! A TRIM is issued where the previous segment finished, before the
//! frame travels to the next one. Positions are absolute.

use stitchpath_pipeline::{Affine, Point, StitchSegment};

/// What the machine does at a [`StitchCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchKind {
    /// Sew a stitch ending at the position.
    Normal,
    /// Move the frame without sewing.
    Jump,
    /// Cut the thread.
    Trim,
    /// End of the pattern.
    End,
}

/// One machine command at an absolute position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StitchCommand {
    /// What to do.
    pub kind: StitchKind,
    /// Where, in millimetres after the caller's transform.
    pub position: Point,
}

impl StitchCommand {
    const fn new(kind: StitchKind, position: Point) -> Self {
        Self { kind, position }
    }
}

/// Lower ordered segments into a command stream.
///
/// Every position is passed through `transform`; use
/// [`Affine::flip_y`] for formats whose y axis points up. Empty segments
/// are skipped. Returns an empty stream when there is nothing to sew.
#[must_use]
pub fn to_commands(segments: &[StitchSegment], transform: &Affine) -> Vec<StitchCommand> {
    let total: usize = segments.iter().map(|s| s.len() + 2).sum();
    let mut commands = Vec::with_capacity(total + 1);
    let mut last: Option<Point> = None;

    for segment in segments.iter().filter(|s| !s.is_empty()) {
        let mut points = segment.points().iter().map(|&p| transform.apply(p));
        let Some(first) = points.next() else {
            continue;
        };

        if let Some(at) = last {
            commands.push(StitchCommand::new(StitchKind::Trim, at));
        }
        commands.push(StitchCommand::new(StitchKind::Jump, first));
        commands.push(StitchCommand::new(StitchKind::Normal, first));

        let mut end = first;
        for p in points {
            commands.push(StitchCommand::new(StitchKind::Normal, p));
            end = p;
        }
        last = Some(end);
    }

    if let Some(at) = last {
        commands.push(StitchCommand::new(StitchKind::End, at));
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(points: &[(f64, f64)]) -> StitchSegment {
        StitchSegment::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn kinds(commands: &[StitchCommand]) -> Vec<StitchKind> {
        commands.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn empty_input_gives_no_commands() {
        assert!(to_commands(&[], &Affine::IDENTITY).is_empty());
        assert!(to_commands(&[seg(&[])], &Affine::IDENTITY).is_empty());
    }

    #[test]
    fn single_segment() {
        let commands = to_commands(&[seg(&[(1.0, 2.0), (3.0, 4.0)])], &Affine::IDENTITY);
        assert_eq!(
            kinds(&commands),
            vec![
                StitchKind::Jump,
                StitchKind::Normal,
                StitchKind::Normal,
                StitchKind::End,
            ]
        );
        assert_eq!(commands[0].position, Point::new(1.0, 2.0));
        assert_eq!(commands[3].position, Point::new(3.0, 4.0));
    }

    #[test]
    fn trim_precedes_every_later_segment() {
        use StitchKind::{End, Jump, Normal, Trim};

        let commands = to_commands(
            &[
                seg(&[(0.0, 0.0), (1.0, 0.0)]),
                seg(&[]),
                seg(&[(5.0, 0.0), (6.0, 0.0)]),
            ],
            &Affine::IDENTITY,
        );
        assert_eq!(
            kinds(&commands),
            vec![Jump, Normal, Normal, Trim, Jump, Normal, Normal, End]
        );
        // The cut happens where the previous segment ended.
        assert_eq!(commands[3].position, Point::new(1.0, 0.0));
        assert_eq!(commands[4].position, Point::new(5.0, 0.0));
    }

    #[test]
    fn normal_count_matches_points() {
        let segments = [
            seg(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            seg(&[(9.0, 9.0)]),
        ];
        let commands = to_commands(&segments, &Affine::IDENTITY);
        let normals = commands
            .iter()
            .filter(|c| c.kind == StitchKind::Normal)
            .count();
        assert_eq!(normals, 4);
    }

    #[test]
    fn transform_is_applied() {
        let commands = to_commands(&[seg(&[(1.0, 2.0)])], &Affine::flip_y());
        assert!(commands.iter().all(|c| c.position == Point::new(1.0, -2.0)));
    }
}

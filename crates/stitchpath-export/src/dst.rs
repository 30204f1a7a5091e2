//! Tajima DST serializer.
//!
//! A DST file is a 512-byte ASCII header followed by 3-byte stitch
//! records. Each record is a relative move in 0.1 mm units, encoded in
//! balanced ternary across the three bytes, so a single record moves at
//! most 121 units (12.1 mm) along each axis. Longer moves are split into
//! equal steps.
//!
//! The y axis points up. Callers lowering pipeline segments should pass
//! [`Affine::flip_y`](stitchpath_pipeline::Affine::flip_y) to
//! [`to_commands`](crate::to_commands).
//!
//! Record bit layout (`b0 b1 b2`):
//!
//! ```text
//!       bit7  bit6  bit5  bit4  bit3  bit2  bit1  bit0
//! b0:   y+1   y-1   y+9   y-9   x-9   x+9   x-1   x+1
//! b1:   y+3   y-3   y+27  y-27  x-27  x+27  x-3   x+3
//! b2:   jump  stop  y+81  y-81  x-81  x+81  1     1
//! ```
//!
//! No I/O happens here; [`DstEmitter`](crate::DstEmitter) does the writing.

use std::fmt::Write;

use crate::commands::{StitchCommand, StitchKind};
use crate::error::WriteError;

/// DST units per millimetre.
pub const UNITS_PER_MM: f64 = 10.0;

/// Largest displacement a single record can encode, per axis.
pub const MAX_STEP: i32 = 121;

/// Largest absolute coordinate, in DST units, that the header's
/// five-digit extent fields can report.
pub const MAX_EXTENT: i32 = 99_999;

/// Size of the header block.
pub const HEADER_LEN: usize = 512;

/// Longest label the header can hold.
const LABEL_LEN: usize = 16;

/// End-of-pattern record.
pub const END_RECORD: [u8; 3] = [0x00, 0x00, 0xF3];

/// A thread trim, spelled as three jumps that return to where they started.
const TRIM_STEPS: [(i32, i32); 3] = [(2, 2), (-4, -4), (2, 2)];

/// Ternary digits of the x displacement: (weight, byte, positive bit,
/// negative bit), largest weight first.
const X_DIGITS: [(i32, usize, u8, u8); 5] = [
    (81, 2, 2, 3),
    (27, 1, 2, 3),
    (9, 0, 2, 3),
    (3, 1, 0, 1),
    (1, 0, 0, 1),
];

/// Ternary digits of the y displacement, as [`X_DIGITS`].
const Y_DIGITS: [(i32, usize, u8, u8); 5] = [
    (81, 2, 5, 4),
    (27, 1, 5, 4),
    (9, 0, 5, 4),
    (3, 1, 7, 6),
    (1, 0, 7, 6),
];

/// Header fields supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct DstMetadata<'a> {
    /// Design name for the `LA:` field. Non-ASCII characters are dropped
    /// and the rest truncated to 16 characters.
    pub label: Option<&'a str>,
}

/// Encode one relative move.
///
/// `dx` and `dy` must lie within `-121..=121`; larger values are not
/// representable and are clamped.
#[must_use]
pub fn encode_record(dx: i32, dy: i32, jump: bool) -> [u8; 3] {
    let mut b = [0u8, 0u8, 0b0000_0011];
    if jump {
        b[2] |= 0x80;
    }

    for (value, digits) in [(dx, X_DIGITS), (dy, Y_DIGITS)] {
        let mut rest = value.clamp(-MAX_STEP, MAX_STEP);
        for (weight, byte, pos, neg) in digits {
            // Each digit absorbs values beyond half of its weight.
            let half = weight / 2;
            if rest > half {
                b[byte] |= 1 << pos;
                rest -= weight;
            } else if rest < -half {
                b[byte] |= 1 << neg;
                rest += weight;
            }
        }
    }
    b
}

/// Millimetres to DST units.
///
/// # Errors
///
/// Returns [`WriteError::NonFiniteCoordinate`] for NaN or infinite input
/// and [`WriteError::CoordinateOutOfRange`] beyond [`MAX_EXTENT`].
#[allow(clippy::cast_possible_truncation)]
fn to_units(command: &StitchCommand) -> Result<(i32, i32), WriteError> {
    let p = command.position;
    if !p.is_finite() {
        return Err(WriteError::NonFiniteCoordinate { x: p.x, y: p.y });
    }
    let (x, y) = ((p.x * UNITS_PER_MM).round(), (p.y * UNITS_PER_MM).round());
    let limit = f64::from(MAX_EXTENT);
    if x.abs() > limit || y.abs() > limit {
        return Err(WriteError::CoordinateOutOfRange {
            x: p.x,
            y: p.y,
            limit: limit / UNITS_PER_MM,
        });
    }
    // In range, so the casts are exact.
    Ok((x as i32, y as i32))
}

/// Accumulates records and the extents the header reports.
#[derive(Debug, Default)]
struct RecordWriter {
    records: Vec<[u8; 3]>,
    position: (i32, i32),
    min: (i32, i32),
    max: (i32, i32),
}

impl RecordWriter {
    /// Move to `target`, splitting into equal steps no longer than
    /// [`MAX_STEP`].
    fn move_to(&mut self, target: (i32, i32), jump: bool) {
        let (x0, y0) = self.position;
        let (dx, dy) = (target.0 - x0, target.1 - y0);
        let longest = dx.unsigned_abs().max(dy.unsigned_abs());
        let steps = longest.div_ceil(MAX_STEP.unsigned_abs()).max(1);
        let steps = i32::try_from(steps).unwrap_or(i32::MAX);

        let mut prev = (0, 0);
        for k in 1..=steps {
            let here = (
                i32::try_from(i64::from(dx) * i64::from(k) / i64::from(steps)).unwrap_or(dx),
                i32::try_from(i64::from(dy) * i64::from(k) / i64::from(steps)).unwrap_or(dy),
            );
            self.records
                .push(encode_record(here.0 - prev.0, here.1 - prev.1, jump));
            prev = here;
        }

        self.position = target;
        self.min = (self.min.0.min(target.0), self.min.1.min(target.1));
        self.max = (self.max.0.max(target.0), self.max.1.max(target.1));
    }

    fn trim(&mut self) {
        for (dx, dy) in TRIM_STEPS {
            self.records.push(encode_record(dx, dy, true));
        }
    }
}

/// Serialize a command stream to DST bytes.
///
/// Missing END is appended. Commands after an END are ignored.
///
/// # Errors
///
/// Returns [`WriteError::EmptyPattern`] when the stream sews no stitch,
/// and [`WriteError::NonFiniteCoordinate`] or
/// [`WriteError::CoordinateOutOfRange`] when a position cannot be
/// encoded.
pub fn to_dst(commands: &[StitchCommand], metadata: &DstMetadata<'_>) -> Result<Vec<u8>, WriteError> {
    if !commands.iter().any(|c| c.kind == StitchKind::Normal) {
        return Err(WriteError::EmptyPattern);
    }

    let mut writer = RecordWriter::default();
    for command in commands {
        match command.kind {
            StitchKind::Normal => writer.move_to(to_units(command)?, false),
            StitchKind::Jump => writer.move_to(to_units(command)?, true),
            StitchKind::Trim => writer.trim(),
            StitchKind::End => break,
        }
    }
    writer.records.push(END_RECORD);

    tracing::debug!(
        commands = commands.len(),
        records = writer.records.len(),
        "encoded DST"
    );

    let mut out = header(&writer, metadata);
    out.reserve(writer.records.len() * 3);
    for record in &writer.records {
        out.extend_from_slice(record);
    }
    Ok(out)
}

/// Build the fixed-size header block.
fn header(writer: &RecordWriter, metadata: &DstMetadata<'_>) -> Vec<u8> {
    let label: String = metadata
        .label
        .unwrap_or("Untitled")
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .take(LABEL_LEN)
        .collect();
    let sign = |v: i32| if v < 0 { '-' } else { '+' };
    let (ax, ay) = writer.position;

    let mut text = String::with_capacity(HEADER_LEN);
    let _ = write!(text, "LA:{label:<16}\r");
    let _ = write!(text, "ST:{:7}\r", writer.records.len());
    text.push_str("CO:  0\r");
    let _ = write!(text, "+X:{:5}\r", writer.max.0.unsigned_abs());
    let _ = write!(text, "-X:{:5}\r", writer.min.0.unsigned_abs());
    let _ = write!(text, "+Y:{:5}\r", writer.max.1.unsigned_abs());
    let _ = write!(text, "-Y:{:5}\r", writer.min.1.unsigned_abs());
    let _ = write!(text, "AX:{}{:5}\r", sign(ax), ax.unsigned_abs());
    let _ = write!(text, "AY:{}{:5}\r", sign(ay), ay.unsigned_abs());
    text.push_str("MX:+    0\rMY:+    0\rPD:******\r");

    let mut bytes = text.into_bytes();
    bytes.push(0x1A);
    bytes.resize(HEADER_LEN.max(bytes.len()), b' ');
    bytes
}

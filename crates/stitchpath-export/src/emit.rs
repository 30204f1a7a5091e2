//! Emitter boundary: hand ordered segments to a machine file writer.

use std::io::Write;

use stitchpath_pipeline::{Affine, StitchSegment};

use crate::commands::to_commands;
use crate::dst::{DstMetadata, to_dst};
use crate::error::WriteError;

/// Writes ordered stitch segments in some machine format.
///
/// Every segment boundary is sewn as a thread cut followed by a jump.
pub trait StitchEmitter {
    /// Write `segments` in order.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::EmptyPattern`] when `segments` holds no
    /// stitch, and other [`WriteError`]s when encoding or writing fails.
    /// Nothing is retried.
    fn emit(&mut self, segments: &[StitchSegment]) -> Result<(), WriteError>;
}

/// [`StitchEmitter`] producing Tajima DST on any [`Write`] sink.
#[derive(Debug)]
pub struct DstEmitter<W> {
    writer: W,
    label: Option<String>,
}

impl<W: Write> DstEmitter<W> {
    /// Emit into `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            label: None,
        }
    }

    /// Set the design name stored in the header.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StitchEmitter for DstEmitter<W> {
    fn emit(&mut self, segments: &[StitchSegment]) -> Result<(), WriteError> {
        // DST is y-up.
        let commands = to_commands(segments, &Affine::flip_y());
        let metadata = DstMetadata {
            label: self.label.as_deref(),
        };
        let bytes = to_dst(&commands, &metadata)?;
        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        tracing::debug!(bytes = bytes.len(), "wrote DST");
        Ok(())
    }
}

//! stitchpath-export: Machine command stream and file serializers.
//!
//! Ordered segments from `stitchpath-pipeline` are lowered into a
//! [`StitchCommand`] stream (stitch, jump, cut, end) and then encoded:
//!
//! - [`dst`]: Tajima DST, the machine format.
//! - [`svg`]: SVG preview of stitches and jumps.
//!
//! Serializers are pure functions returning bytes or strings. Writing to
//! a sink goes through the [`StitchEmitter`] trait.

pub mod commands;
pub mod dst;
pub mod emit;
pub mod error;
pub mod svg;

pub use commands::{StitchCommand, StitchKind, to_commands};
pub use dst::{DstMetadata, encode_record, to_dst};
pub use emit::{DstEmitter, StitchEmitter};
pub use error::WriteError;
pub use svg::{SvgMetadata, to_svg};

//! Emitter errors.

/// Why a stitch pattern could not be written.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The underlying writer failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// There are no stitches to write.
    #[error("stitch pattern is empty")]
    EmptyPattern,

    /// A stitch position is NaN or infinite and cannot be encoded.
    #[error("non-finite stitch coordinate ({x}, {y})")]
    NonFiniteCoordinate {
        /// Horizontal coordinate as given.
        x: f64,
        /// Vertical coordinate as given.
        y: f64,
    },

    /// A stitch position lies beyond the extent the format can address.
    #[error("stitch coordinate ({x}, {y}) is outside the {limit} mm extent")]
    CoordinateOutOfRange {
        /// Horizontal coordinate as given.
        x: f64,
        /// Vertical coordinate as given.
        y: f64,
        /// Largest absolute coordinate the format accepts, in millimetres.
        limit: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::other("disk full");
        let err: WriteError = io.into();
        assert!(matches!(err, WriteError::Io(_)));
        assert_eq!(err.to_string(), "write failed: disk full");
    }

    #[test]
    fn non_finite_display() {
        let err = WriteError::NonFiniteCoordinate {
            x: f64::NAN,
            y: 1.5,
        };
        assert_eq!(err.to_string(), "non-finite stitch coordinate (NaN, 1.5)");
    }

    #[test]
    fn out_of_range_display() {
        let err = WriteError::CoordinateOutOfRange {
            x: 12_000.0,
            y: 0.0,
            limit: 9_999.9,
        };
        assert_eq!(
            err.to_string(),
            "stitch coordinate (12000, 0) is outside the 9999.9 mm extent"
        );
    }
}

use thiserror::Error;

/// Result type alias for DiscFerret operations
pub type Result<T> = std::result::Result<T, DiscFerretError>;

/// Errors that can occur when talking to a DiscFerret
#[derive(Debug, Error)]
pub enum DiscFerretError {
    /// USB transport error from the underlying backend
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// A bulk transfer moved a different number of bytes than requested
    #[error("Transfer length mismatch: expected {expected} bytes, got {actual}")]
    TransferLength {
        /// Byte count requested
        expected: usize,
        /// Byte count actually transferred
        actual: usize,
    },

    /// Device response was shorter than the minimum for its command
    #[error("Short response to command {opcode:#04x}: expected at least {expected} bytes, got {actual}")]
    ShortResponse {
        /// Command opcode the response belongs to
        opcode: u8,
        /// Minimum response length for this command
        expected: usize,
        /// Length actually received
        actual: usize,
    },

    /// Device returned a status byte outside the documented domain
    #[error("Unexpected status byte {0:#04x} in device response")]
    UnexpectedStatus(u8),

    /// Invalid argument passed to a library call
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// No device matched the search criteria
    #[error("No matching DiscFerret device found")]
    NoDevice,

    /// Device reported a hardware malfunction
    #[error("Hardware error reported by device")]
    Hardware,

    /// FPGA has no valid microcode loaded, or rejected a configuration load
    #[error("FPGA not configured")]
    FpgaNotConfigured,

    /// Feature not supported by this firmware/microcode version
    #[error("Not supported by this firmware/microcode version")]
    NotSupported,

    /// Track zero was not reached within the given step budget
    #[error("Recalibration failed: track zero not reached within step budget")]
    RecalFailed,

    /// Operation requires a known head position; recalibrate first
    #[error("Current track unknown: recalibrate the head first")]
    TrackUnknown,
}

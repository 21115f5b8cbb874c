//! milcodec error types with granular per-subsystem categories

use thiserror::Error;

/// Top-level error type, folding every subsystem's errors together.
///
/// Most of these never cross the public decode boundary: a failed sync
/// or a malformed frame is swallowed into "no message" rather than
/// propagated as an `Err` (see `session::ReceiverSession::decode`). The
/// enum exists so each stage can fail in a structured, typed way
/// internally and so unit tests can assert on the precise failure mode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("demodulation error: {0}")]
    Demod(#[from] DemodError),

    #[error("synchronization error: {0}")]
    Sync(#[from] SyncError),

    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    #[error("cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("audio loading error: {0}")]
    Audio(#[from] AudioError),
}

/// Demodulator-stage errors.
///
/// Per spec, the demodulator itself never raises: a weak or silent
/// window simply yields a low-quality `RawBitStream` and synchronization
/// is left to reject it. This type is retained for symmetry with the
/// other stages.
#[derive(Debug, Error)]
pub enum DemodError {
    #[error("audio window was empty")]
    EmptyWindow,
}

/// Frame-synchronizer errors. "No sync" is normally represented as
/// `Option::None`, not an `Err`; this variant exists for completeness
/// and for direct unit testing of the search routine.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync word not found within {searched} symbols")]
    NotFound { searched: usize },
}

/// Payload-extractor errors.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("length field {length} out of range (0 < L <= {max})")]
    LengthOutOfRange { length: u16, max: u16 },

    #[error("truncated stream: need {required} bits, have {available}")]
    Truncated { required: usize, available: usize },
}

/// Cryptographic unsealer errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("corrupt data: blob shorter than nonce + tag")]
    CorruptData,

    #[error("authentication failed")]
    AuthFailure,

    #[error("no supported cipher could unseal the blob")]
    UnsupportedCipher,
}

/// Packet-unwrapper errors.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("plaintext shorter than the minimum packet length ({min} bytes)")]
    TooShort { min: usize },

    #[error("JSON body failed to parse: {reason}")]
    JsonParseFailed { reason: String },

    #[error("'d' field is not valid base64: {reason}")]
    InvalidBase64Payload { reason: String },
}

/// External audio file loading errors (CLI `decode`/`demo` file input).
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open/probe '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("resampling '{path}' from {source_rate}Hz to {target_rate}Hz failed: {reason}")]
    ResampleFailed {
        path: String,
        source_rate: usize,
        target_rate: usize,
        reason: String,
    },
}

/// Result alias used throughout the crate's internal stages.
pub type Result<T> = std::result::Result<T, DecodeError>;

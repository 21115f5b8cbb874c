//! milcodec core library
//!
//! Physical-layer / link-layer decoder and cryptographic unsealer for an
//! acoustic covert-channel receiver: demodulation (DSSS/BPSK, 2-FSK,
//! linear chirp), frame synchronization, triple-redundant payload
//! extraction, authenticated decryption, and packet unwrapping into a
//! typed message record.

pub mod channel;
pub mod config;
pub mod crypto;
pub mod decode;
pub mod errors;
pub mod external_audio;
pub mod fixtures;
pub mod logging;
pub mod packet;
pub mod payload;
pub mod session;
pub mod sync;
pub mod utils;
pub mod waveform;

pub use config::{Mode, ReceiverConfig, WaveformKind};
pub use decode::decode_window;
pub use errors::{DecodeError, Result};
pub use packet::{DecodeStatus, MessageRecord, MsgType, Priority};
pub use session::{ReceiverSession, SessionState};

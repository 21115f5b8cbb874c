//! Decode orchestration state machine (spec.md §4.6): `Idle -> Capturing
//! -> Decoding -> Emitting -> Idle`, single-threaded cooperative, an
//! append-only sample buffer plus a `listening` flag as the only shared
//! state (spec.md §5).

use crate::config::{Mode, ReceiverConfig};
use crate::decode::decode_window;
use crate::logging::ReceiverLogger;
use crate::packet::MessageRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Decoding,
    Emitting,
}

/// Owns the sample buffer, configuration, and logger for one receive
/// session. `push_samples` drives the state machine forward: callers feed
/// it fixed-size chunks as they arrive from the audio callback and read
/// back at most one `MessageRecord` per call.
pub struct ReceiverSession {
    config: ReceiverConfig,
    logger: ReceiverLogger,
    buffer: Vec<f32>,
    listening: bool,
    state: SessionState,
}

impl ReceiverSession {
    pub fn new(config: ReceiverConfig, logger: ReceiverLogger) -> Self {
        Self {
            config,
            logger,
            buffer: Vec::new(),
            listening: false,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Idempotent: starting an already-listening session is a no-op.
    pub fn start_listening(&mut self) {
        if !self.listening {
            self.logger.info("SESSION", "listening started");
        }
        self.listening = true;
    }

    /// Idempotent; clears any buffered samples immediately, discarding
    /// whatever partial window was in flight (spec.md §5 cancellation).
    pub fn stop_listening(&mut self) {
        if self.listening {
            self.logger.info("SESSION", "listening stopped");
        }
        self.listening = false;
        self.buffer.clear();
        self.state = SessionState::Idle;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.config.set_mode(mode);
    }

    pub fn set_auto_scan(&mut self, enabled: bool) {
        self.config.set_auto_scan(enabled);
    }

    pub fn set_key(&mut self, key: [u8; 32]) {
        self.config.set_key(key);
    }

    pub fn logger(&self) -> &ReceiverLogger {
        &self.logger
    }

    /// Append one fixed-size chunk of monaural float samples. Once the
    /// buffer holds a full window (`config.window_len()` samples), runs
    /// one decode cycle and returns at most one `MessageRecord`; the
    /// buffer is reset synchronously on entry to `Decoding` regardless of
    /// whether a message was produced.
    pub fn push_samples(&mut self, chunk: &[f32]) -> Option<MessageRecord> {
        if !self.listening {
            return None;
        }

        self.state = SessionState::Capturing;
        self.buffer.extend_from_slice(chunk);

        let window_len = self.config.window_len();
        if self.buffer.len() < window_len {
            return None;
        }

        self.state = SessionState::Decoding;
        let window: Vec<f32> = self.buffer.drain(..window_len).collect();

        let record = decode_window(&window, &self.config, &mut self.logger);

        self.state = SessionState::Emitting;
        let outcome = record;
        self.state = SessionState::Idle;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::logging::LogConfig;

    fn session() -> ReceiverSession {
        ReceiverSession::new(ReceiverConfig::default(), ReceiverLogger::new(LogConfig::default()))
    }

    #[test]
    fn starts_idle_and_not_listening() {
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_listening());
    }

    #[test]
    fn ignores_samples_until_listening_starts() {
        let mut session = session();
        let chunk = vec![0.0f32; 4_096];
        assert!(session.push_samples(&chunk).is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn decodes_once_enough_samples_have_accumulated() {
        let mut session = session();
        session.start_listening();
        let audio = fixtures::synthesize_frame(&ReceiverConfig::default(), r#"{"m":"chunked"}"#, 0x01, [0u8; 64]);

        let mut record = None;
        for chunk in audio.chunks(4_096) {
            record = session.push_samples(chunk).or(record);
        }

        let record = record.expect("should decode across chunk boundaries");
        assert_eq!(record.content, "chunked");
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn stop_listening_clears_buffer_and_resets_state() {
        let mut session = session();
        session.start_listening();
        session.push_samples(&vec![0.0f32; 1_000]);
        session.stop_listening();
        assert!(!session.is_listening());
        assert_eq!(session.state(), SessionState::Idle);

        session.start_listening();
        assert!(session.push_samples(&vec![0.0f32; 1_000]).is_none());
    }

    #[test]
    fn start_listening_is_idempotent() {
        let mut session = session();
        session.start_listening();
        session.start_listening();
        assert!(session.is_listening());
    }
}

//! Decode session: raw bytes in, status and pages out through a sink.
//!
//! A [`Session`] owns everything needed to turn a byte stream into pages.
//! Each call to [`Session::process`] reports `"Received N bytes"` to the
//! sink first, then any pages completed by those bytes.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::DecoderConfig;
use crate::dsp::SampleConverter;
use crate::error::{Error, Result};
use crate::pocsag::{DecoderState, DecoderStats, PocsagDecoder, PocsagMessage};

/// Receiver of session output.
pub trait SessionSink: Send {
    /// One status line per processed block.
    fn on_status(&self, status: &str);

    /// A decoded page.
    fn on_message(&self, message: &PocsagMessage);
}

impl<T: SessionSink + Sync + ?Sized> SessionSink for Arc<T> {
    fn on_status(&self, status: &str) {
        (**self).on_status(status)
    }

    fn on_message(&self, message: &PocsagMessage) {
        (**self).on_message(message)
    }
}

/// Sink discarding all output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SessionSink for NullSink {
    fn on_status(&self, _status: &str) {}
    fn on_message(&self, _message: &PocsagMessage) {}
}

/// The status line reported for a block of `length` bytes.
pub fn status_line(length: usize) -> String {
    format!("Received {} bytes", length)
}

/// Session counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub bytes_received: u64,
    pub blocks: u64,
    #[serde(flatten)]
    pub decoder: DecoderStats,
}

/// Most recent pages, newest first.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    messages: VecDeque<PocsagMessage>,
    capacity: usize,
}

impl MessageHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, message: PocsagMessage) {
        if self.capacity == 0 {
            return;
        }
        self.messages.push_front(message);
        self.messages.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&PocsagMessage> {
        self.messages.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PocsagMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// An owned decode pipeline bound to one sink.
pub struct Session {
    config: DecoderConfig,
    converter: SampleConverter,
    decoder: PocsagDecoder,
    history: MessageHistory,
    sink: Box<dyn SessionSink>,
    bytes_received: u64,
    blocks: u64,
    samples: Vec<f32>,
}

impl Session {
    /// Create a session. The configuration is validated first.
    pub fn new(config: DecoderConfig, sink: Box<dyn SessionSink>) -> Result<Self> {
        config.validate()?;
        info!(
            "Session created: {:?} at {} Hz, {} baud",
            config.input_format,
            config.effective_input_rate(),
            config.baud_rate
        );
        Ok(Self {
            converter: SampleConverter::new(&config),
            decoder: PocsagDecoder::new(&config),
            history: MessageHistory::new(config.history_capacity),
            sink,
            bytes_received: 0,
            blocks: 0,
            samples: Vec::new(),
            config,
        })
    }

    pub fn with_sink<S: SessionSink + 'static>(config: DecoderConfig, sink: S) -> Result<Self> {
        Self::new(config, Box::new(sink))
    }

    /// Process the first `length` bytes of `data`.
    ///
    /// Returns `length`. A negative length or one past the end of `data` is
    /// rejected before anything is reported.
    pub fn process(&mut self, data: &[u8], length: i32) -> Result<i32> {
        let valid = usize::try_from(length)
            .ok()
            .and_then(|len| data.get(..len))
            .ok_or(Error::InvalidLength {
                length: length as i64,
                available: data.len(),
            })?;

        self.bytes_received += valid.len() as u64;
        self.blocks += 1;
        self.sink.on_status(&status_line(valid.len()));

        self.samples.clear();
        self.converter.convert(valid, &mut self.samples);
        let messages = self.decoder.process_samples(&self.samples);
        debug!(
            "Block of {} bytes: {} samples, {} pages, state {:?}",
            valid.len(),
            self.samples.len(),
            messages.len(),
            self.decoder.state()
        );
        self.deliver(messages);

        Ok(length)
    }

    /// End of stream: deliver the page still being collected, if any.
    ///
    /// Returns the number of pages delivered.
    pub fn finish(&mut self) -> usize {
        let messages = self.decoder.finish();
        let count = messages.len();
        self.deliver(messages);
        count
    }

    /// Drop partial pages, carried bytes and timing state.
    ///
    /// Counters and history are kept.
    pub fn reset(&mut self) {
        self.converter.reset();
        self.decoder.reset();
        self.samples.clear();
        debug!("Session reset");
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            bytes_received: self.bytes_received,
            blocks: self.blocks,
            decoder: self.decoder.stats().clone(),
        }
    }

    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn state(&self) -> DecoderState {
        self.decoder.state()
    }

    fn deliver(&mut self, messages: Vec<PocsagMessage>) {
        for message in messages {
            info!("{}", message);
            self.sink.on_message(&message);
            self.history.push(message);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.decoder.state())
            .field("bytes_received", &self.bytes_received)
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleFormat;
    use crate::dsp::synth::{nrz, to_pcm_s16le};
    use crate::pocsag::{MessageKind, Transmission};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SessionSink for Recorder {
        fn on_status(&self, status: &str) {
            self.events.lock().unwrap().push(format!("status:{status}"));
        }

        fn on_message(&self, message: &PocsagMessage) {
            self.events
                .lock()
                .unwrap()
                .push(format!("page:{}:{}", message.address, message.content));
        }
    }

    fn session(recorder: &Arc<Recorder>) -> Session {
        Session::with_sink(
            DecoderConfig::pcm(SampleFormat::PcmS16le, 24_000),
            recorder.clone(),
        )
        .unwrap()
    }

    #[test]
    fn test_status_per_call() {
        let recorder = Arc::new(Recorder::default());
        let mut session = session(&recorder);
        let buf = [7u8; 64];
        assert_eq!(session.process(&buf, 64).unwrap(), 64);
        assert_eq!(session.process(&buf, 0).unwrap(), 0);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["status:Received 64 bytes", "status:Received 0 bytes"]
        );
        assert_eq!(session.stats().bytes_received, 64);
        assert_eq!(session.stats().blocks, 2);
    }

    #[test]
    fn test_invalid_length_reports_nothing() {
        let recorder = Arc::new(Recorder::default());
        let mut session = session(&recorder);
        let buf = [0u8; 8];
        assert!(matches!(
            session.process(&buf, -1),
            Err(Error::InvalidLength { length: -1, available: 8 })
        ));
        assert!(matches!(
            session.process(&buf, 9),
            Err(Error::InvalidLength { length: 9, .. })
        ));
        assert!(recorder.events.lock().unwrap().is_empty());
        assert_eq!(session.stats().blocks, 0);
    }

    #[test]
    fn test_status_precedes_page() {
        let recorder = Arc::new(Recorder::default());
        let mut session = session(&recorder);
        let bits = Transmission::new().alpha(1_000_008, 3, "HELLO").to_bits();
        let pcm = to_pcm_s16le(&nrz(&bits, 20.0, 0.6));
        session.process(&pcm, pcm.len() as i32).unwrap();

        let events = recorder.events.lock().unwrap();
        assert_eq!(events[0], format!("status:Received {} bytes", pcm.len()));
        assert_eq!(events[1..], ["page:1000008:HELLO".to_string()]);
        assert_eq!(session.history().latest().map(|m| m.kind), Some(MessageKind::Alpha3));
    }

    #[test]
    fn test_history_is_newest_first_and_capped() {
        let mut history = MessageHistory::new(2);
        for n in 0..3 {
            history.push(PocsagMessage::new(n, 0, MessageKind::Numeric, n.to_string()));
        }
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["2", "1"]);

        let mut disabled = MessageHistory::new(0);
        disabled.push(PocsagMessage::new(1, 0, MessageKind::Numeric, "1".into()));
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = DecoderConfig {
            baud_rate: 300,
            ..Default::default()
        };
        assert!(matches!(
            Session::with_sink(config, NullSink),
            Err(Error::UnsupportedBaudRate(300))
        ));
    }
}

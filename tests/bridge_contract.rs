//! The status-callback contract of the native entry point: one
//! `Received N bytes` per call, the length echoed back, nothing reported
//! for rejected lengths, and first-controller reuse on the legacy path.

use std::sync::{Arc, Mutex};

use pocsagsdr::{
    DecoderConfig, Error, LegacyBridge, PocsagMessage, SampleFormat, Session, SessionSink,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl SessionSink for Recorder {
    fn on_status(&self, status: &str) {
        self.events.lock().unwrap().push(status.to_string());
    }

    fn on_message(&self, message: &PocsagMessage) {
        self.events.lock().unwrap().push(format!("page {}", message));
    }
}

fn session(recorder: &Arc<Recorder>) -> Session {
    Session::with_sink(DecoderConfig::default(), recorder.clone()).unwrap()
}

#[test]
fn one_status_per_call_with_length_echoed() {
    let recorder = Arc::new(Recorder::default());
    let mut session = session(&recorder);
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let len: usize = rng.gen_range(0..4096);
        let buf: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let returned = session.process(&buf, len as i32).unwrap();
        assert_eq!(returned, len as i32);
        assert_eq!(recorder.take(), vec![format!("Received {} bytes", len)]);
    }
}

#[test]
fn zero_length_still_reports() {
    let recorder = Arc::new(Recorder::default());
    let mut session = session(&recorder);
    assert_eq!(session.process(&[], 0).unwrap(), 0);
    assert_eq!(recorder.take(), vec!["Received 0 bytes"]);
}

#[test]
fn only_the_declared_prefix_counts() {
    let recorder = Arc::new(Recorder::default());
    let mut session = session(&recorder);
    let buf = [0x55u8; 100];
    assert_eq!(session.process(&buf, 10).unwrap(), 10);
    assert_eq!(recorder.take(), vec!["Received 10 bytes"]);
    assert_eq!(session.stats().bytes_received, 10);
}

#[test]
fn content_does_not_change_callback_output() {
    let mut rng = StdRng::seed_from_u64(99);
    let a: Vec<u8> = (0..8192).map(|_| rng.gen()).collect();
    let b = vec![0x7fu8; 8192];
    let (a_before, b_before) = (a.clone(), b.clone());

    let ra = Arc::new(Recorder::default());
    let rb = Arc::new(Recorder::default());
    session(&ra).process(&a, 8192).unwrap();
    session(&rb).process(&b, 8192).unwrap();

    assert_eq!(ra.take(), rb.take());
    assert_eq!(a, a_before);
    assert_eq!(b, b_before);
}

#[test]
fn invalid_lengths_are_rejected_silently() {
    let recorder = Arc::new(Recorder::default());
    let mut session = session(&recorder);
    let buf = [0u8; 16];

    for length in [-1, i32::MIN, 17, i32::MAX] {
        let err = session.process(&buf, length).unwrap_err();
        assert!(matches!(err, Error::InvalidLength { .. }), "{length}: {err}");
    }
    assert!(recorder.take().is_empty());
    assert_eq!(session.stats().blocks, 0);
}

#[test]
fn legacy_bridge_keeps_first_controller() {
    let bridge = LegacyBridge::new(DecoderConfig::pcm(SampleFormat::PcmU8, 24_000));
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());

    let f = first.clone();
    assert_eq!(
        bridge
            .process(&[1, 2, 3], 3, move || Ok(Box::new(f) as Box<dyn SessionSink>))
            .unwrap(),
        3
    );
    let s = second.clone();
    assert_eq!(
        bridge
            .process(&[4; 8], 8, move || Ok(Box::new(s) as Box<dyn SessionSink>))
            .unwrap(),
        8
    );

    assert_eq!(first.take(), vec!["Received 3 bytes", "Received 8 bytes"]);
    assert!(second.take().is_empty());
}

#[test]
fn legacy_bridge_rejects_bad_length_after_binding() {
    let bridge = LegacyBridge::new(DecoderConfig::default());
    let recorder = Arc::new(Recorder::default());
    let r = recorder.clone();
    let err = bridge
        .process(&[0; 4], -5, move || Ok(Box::new(r) as Box<dyn SessionSink>))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidLength { length: -5, available: 4 }));
    assert!(bridge.is_bound());
    assert!(recorder.take().is_empty());
}

//! Process-wide session behind the legacy `nativeProcess` entry point.
//!
//! The legacy entry point receives its controller on every call but only
//! ever reports to the first one it saw. The first call binds a session to
//! the sink built for that controller; later calls reuse it and never build
//! their own sink.

use std::sync::{Mutex, OnceLock};

use tracing::info;

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::session::{Session, SessionSink, SessionStats};

pub struct LegacyBridge {
    config: DecoderConfig,
    session: Mutex<Option<Session>>,
}

impl LegacyBridge {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    /// The bridge used by the JNI `nativeProcess` export.
    pub fn global() -> &'static LegacyBridge {
        static BRIDGE: OnceLock<LegacyBridge> = OnceLock::new();
        BRIDGE.get_or_init(|| LegacyBridge::new(DecoderConfig::default()))
    }

    /// Process a block, binding the session on first use.
    ///
    /// `make_sink` runs only when no session is bound yet.
    pub fn process<F>(&self, data: &[u8], length: i32, make_sink: F) -> Result<i32>
    where
        F: FnOnce() -> Result<Box<dyn SessionSink>>,
    {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| Error::internal("legacy session lock poisoned"))?;

        if guard.is_none() {
            let session = Session::new(self.config.clone(), make_sink()?)?;
            info!("Legacy bridge bound to its first controller");
            *guard = Some(session);
        }

        let session = guard
            .as_mut()
            .ok_or_else(|| Error::internal("legacy session missing after bind"))?;
        session.process(data, length)
    }

    pub fn is_bound(&self) -> bool {
        self.session.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    pub fn stats(&self) -> Option<SessionStats> {
        self.session
            .lock()
            .ok()
            .and_then(|s| s.as_ref().map(Session::stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleFormat;
    use crate::pocsag::PocsagMessage;
    use std::sync::Arc;

    struct Tagged {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl SessionSink for Tagged {
        fn on_status(&self, status: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", self.tag, status));
        }
        fn on_message(&self, _message: &PocsagMessage) {}
    }

    fn sink(tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Result<Box<dyn SessionSink>> {
        Ok(Box::new(Tagged {
            tag,
            log: log.clone(),
        }))
    }

    #[test]
    fn test_first_controller_is_reused() {
        let bridge = LegacyBridge::new(DecoderConfig::pcm(SampleFormat::PcmU8, 24_000));
        let log = Arc::new(Mutex::new(Vec::new()));

        bridge.process(&[0; 4], 4, || sink("first", &log)).unwrap();
        let mut second_built = false;
        bridge
            .process(&[0; 2], 2, || {
                second_built = true;
                sink("second", &log)
            })
            .unwrap();

        assert!(!second_built);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:Received 4 bytes", "first:Received 2 bytes"]
        );
        assert_eq!(bridge.stats().map(|s| s.blocks), Some(2));
    }

    #[test]
    fn test_sink_error_leaves_bridge_unbound() {
        let bridge = LegacyBridge::new(DecoderConfig::default());
        let err = bridge
            .process(&[], 0, || Err(Error::param("no controller")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParam(_)));
        assert!(!bridge.is_bound());
    }
}

//! POCSAG pager receiver library
//!
//! Raw SDR sample bytes go in, decoded pages come out through a
//! [`SessionSink`]. The same pipeline backs the CLI, the C ABI and the
//! Android JNI bridge.

pub mod bridge;
pub mod config;
pub mod device;
pub mod dsp;
pub mod error;
pub mod ffi;
pub mod pocsag;
pub mod receiver;
pub mod session;

// Re-export main types
pub use bridge::LegacyBridge;
pub use config::{DecoderConfig, SampleFormat};
pub use error::{Error, Result};
pub use pocsag::{MessageKind, PocsagDecoder, PocsagMessage, Transmission};
pub use session::{MessageHistory, NullSink, Session, SessionSink, SessionStats};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Default configuration constants
pub const DEFAULT_CONFIG_FILE: &str = "pocsag.json";
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
pub const DEFAULT_BAUD_RATE: u32 = 1200;
/// RTL-SDR rate used by the app, ten times the decoder rate.
pub const DEFAULT_INPUT_RATE: u32 = 240_000;
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

//! FFI (Foreign Function Interface) module for the Android app and other hosts.
//!
//! This module provides a C-compatible ABI that can be called from:
//! - Kotlin/Java (Android) via the JNI exports in `android` (feature `jni`)
//! - C, C++ or Swift via direct C bindings
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 SDRController (Kotlin)                    │
//! │        USB bulk reads ──► nativeProcess(bytes, len)       │
//! │                   ▲ onNativeMessage / onNativePage        │
//! │  ┌────────────────┴─────────────────────────┐            │
//! │  │        JNI exports / C FFI Layer          │            │
//! │  │  - pocsag_create()                        │            │
//! │  │  - pocsag_process()                       │            │
//! │  │  - pocsag_get_stats()                     │            │
//! │  │  - pocsag_destroy()                       │            │
//! │  └────────────────────┬─────────────────────┘            │
//! │  ┌────────────────────▼─────────────────────┐            │
//! │  │            Rust POCSAG Core               │            │
//! │  │  - sample conversion, FM demodulation     │            │
//! │  │  - bit slicing, sync, BCH correction      │            │
//! │  │  - page assembly and delivery             │            │
//! │  └──────────────────────────────────────────┘            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage from C
//!
//! ```c
//! PocsagCallbacks cbs = { ctx, on_status, on_message, on_log };
//! PocsagHandle h = pocsag_create("{\"input_format\": \"iq_u8\"}", &cbs);
//! while ((n = read_usb(buf, sizeof buf)) > 0)
//!     pocsag_process(h, buf, sizeof buf, n);
//! pocsag_finish(h);
//! pocsag_destroy(h);
//! ```

mod callbacks;
mod client;
mod types;

pub use callbacks::*;
pub use client::*;
pub use types::*;

#[cfg(feature = "jni")]
mod android;

#[cfg(feature = "jni")]
pub use android::*;

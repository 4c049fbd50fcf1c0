//! Signal processing ahead of the bit slicer.
//!
//! Raw bytes from the radio (or a capture file) become `f32` baseband
//! samples at the decoder rate:
//!
//! ```text
//! iq_u8:  bytes -> I/Q pairs -> FM discriminator -> boxcar decimator -> samples
//! pcm_*:  bytes -> samples
//! ```

pub mod convert;
pub mod fm;
pub mod synth;

pub use convert::SampleConverter;
pub use fm::{Decimator, FmDiscriminator};

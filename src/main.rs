//! POCSAG receiver CLI Application

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pocsagsdr::dsp::synth;
use pocsagsdr::pocsag::{Page, Transmission};
use pocsagsdr::{device, receiver, DecoderConfig, PocsagMessage, SampleFormat, Session, SessionSink};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Frequency deviation used when synthesising I/Q captures.
const SYNTH_DEVIATION_HZ: f32 = 4_500.0;

#[derive(Parser)]
#[command(name = "pocsagsdr")]
#[command(about = "POCSAG pager receiver (Rust)")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a capture file or stdin
    Decode {
        /// Input file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// JSON decoder configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sample format (iq_u8, pcm_u8, pcm_s16le, pcm_f32le)
        #[arg(short, long)]
        format: Option<SampleFormat>,

        /// Raw I/Q input rate in Hz
        #[arg(long)]
        input_rate: Option<u32>,

        /// Decoder sample rate in Hz
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Baud rate (512, 1200 or 2400)
        #[arg(short, long)]
        baud: Option<u32>,

        /// Print pages as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Write a capture containing one page
    Synth {
        #[arg(short, long)]
        output: PathBuf,

        /// Receiver address (RIC)
        #[arg(short, long)]
        address: u32,

        #[arg(short, long)]
        message: String,

        /// Function bits: 0 numeric, 1-3 alphanumeric
        #[arg(long, default_value_t = 3)]
        function: u8,

        #[arg(short, long, default_value = "iq_u8")]
        format: SampleFormat,

        #[arg(short, long, default_value_t = pocsagsdr::DEFAULT_BAUD_RATE)]
        baud: u32,
    },

    /// List known SDR receivers
    Devices,
}

/// Prints decoded pages to stdout.
struct StdoutSink {
    json: bool,
}

impl SessionSink for StdoutSink {
    fn on_status(&self, status: &str) {
        debug!("{}", status);
    }

    fn on_message(&self, message: &PocsagMessage) {
        if self.json {
            match serde_json::to_string(message) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Cannot serialise page: {}", e),
            }
        } else {
            println!("{}", message);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with env overrides
    // Priority: RUST_LOG (standard), then RUST_LOG_LEVEL (custom, e.g., "debug"), then --verbose flag
    let fallback = if cli.verbose { "debug" } else { "info" };
    let default_level = std::env::var("RUST_LOG_LEVEL").unwrap_or_else(|_| fallback.to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level.clone()))
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).without_time().with_writer(std::io::stderr))
        .try_init()
        .ok();

    match cli.command {
        Command::Decode {
            input,
            config,
            format,
            input_rate,
            sample_rate,
            baud,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(format) = format {
                config.input_format = format;
            }
            if let Some(rate) = input_rate {
                config.input_rate = rate;
            }
            if let Some(rate) = sample_rate {
                config.sample_rate = rate;
            }
            if let Some(baud) = baud {
                config.baud_rate = baud;
            }
            decode(config, input.as_deref(), json).await
        }
        Command::Synth {
            output,
            address,
            message,
            function,
            format,
            baud,
        } => synthesize(&output, address, &message, function, format, baud),
        Command::Devices => {
            for d in device::KNOWN_DEVICES {
                println!("{:04x}:{:04x}  {}", d.vendor_id, d.product_id, d.name);
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<DecoderConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            DecoderConfig::load(path)
                .with_context(|| format!("Failed to load configuration from: {}", path.display()))
        }
        None => Ok(DecoderConfig::default()),
    }
}

/// Decode until end of input or Ctrl+C.
async fn decode(config: DecoderConfig, input: Option<&Path>, json: bool) -> Result<()> {
    let mut session = Session::with_sink(config, StdoutSink { json })
        .context("Invalid decoder configuration")?;

    let stop = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, stopping...");
    };

    let stats = match input {
        Some(path) => {
            info!("Decoding {}", path.display());
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            receiver::run(file, &mut session, stop).await?
        }
        None => {
            info!("Decoding stdin");
            receiver::run(tokio::io::stdin(), &mut session, stop).await?
        }
    };

    info!(
        "{} bytes, {} preambles, {} batches, {} codewords corrected, {} uncorrectable, {} pages",
        stats.bytes_received,
        stats.decoder.preambles,
        stats.decoder.batches,
        stats.decoder.codewords_corrected,
        stats.decoder.codewords_uncorrectable,
        stats.decoder.messages
    );
    Ok(())
}

fn synthesize(
    output: &Path,
    address: u32,
    message: &str,
    function: u8,
    format: SampleFormat,
    baud: u32,
) -> Result<()> {
    if address > 0x1F_FFFF {
        bail!("address {} does not fit in 21 bits", address);
    }
    if function > 3 {
        bail!("function must be 0-3");
    }

    let config = DecoderConfig {
        input_format: format,
        baud_rate: baud,
        ..Default::default()
    };
    config.validate().context("Invalid synthesis parameters")?;

    let bits = Transmission::new()
        .page(Page {
            address,
            function,
            content: message.to_string(),
        })
        .to_bits();

    let rate = config.effective_input_rate();
    let samples_per_bit = rate as f32 / baud as f32;
    let bytes = match format {
        SampleFormat::IqU8 => synth::fm_iq_u8(
            &synth::nrz(&bits, samples_per_bit, 1.0),
            SYNTH_DEVIATION_HZ,
            rate,
        ),
        SampleFormat::PcmU8 => synth::to_pcm_u8(&synth::nrz(&bits, samples_per_bit, 0.5)),
        SampleFormat::PcmS16le => synth::to_pcm_s16le(&synth::nrz(&bits, samples_per_bit, 0.5)),
        SampleFormat::PcmF32le => synth::to_pcm_f32le(&synth::nrz(&bits, samples_per_bit, 0.5)),
    };

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "Wrote {} bytes ({} bits at {} Hz, {:?}) to {}",
        bytes.len(),
        bits.len(),
        rate,
        format,
        output.display()
    );
    Ok(())
}

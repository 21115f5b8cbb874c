mod config;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};

use config::CliConfig;
use logging::{LogEvent, MessageEvent, StructuredLogger};
use milcodec_core::config::SAMPLE_RATE;
use milcodec_core::logging::{LogConfig, ReceiverLogger};
use milcodec_core::{decode_window, external_audio, fixtures, ReceiverConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Acoustic covert-channel receiver harness", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (receiver + terminal settings).
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose diagnostic output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a WAV file through the receiver pipeline.
    Decode {
        /// Path to the input WAV (or any symphonia-supported) audio file.
        input: PathBuf,
    },

    /// Synthesize a reference frame carrying `message` and write it to a WAV file.
    Demo {
        /// JSON body to embed as the packet's `m` field (e.g. "hello").
        #[arg(short, long, default_value = "hello from the reference sender")]
        message: String,

        /// Message priority tag (ROUTINE, PRIORITY, IMMEDIATE, FLASH).
        #[arg(short, long, default_value = "ROUTINE")]
        priority: String,

        /// Output WAV path (overrides `terminal.wav_output` from the config file).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let cli_config = match &args.config {
        Some(path) => {
            CliConfig::from_file(path).wrap_err_with(|| format!("Failed to load config from {path}"))?
        }
        None => CliConfig::default(),
    };

    let mut logger = StructuredLogger::new(cli_config.terminal.logging.clone())?;
    let receiver_config = cli_config.receiver.to_receiver_config()?;

    match args.command {
        Command::Decode { input } => run_decode(&input, &receiver_config, &mut logger, args.verbose),
        Command::Demo { message, priority, output } => {
            let output = output
                .or_else(|| cli_config.terminal.wav_output.clone())
                .unwrap_or_else(|| PathBuf::from("demo.wav"));
            run_demo(&message, &priority, &output, &receiver_config, &mut logger)
        }
    }
}

fn run_decode(
    input: &PathBuf,
    receiver_config: &ReceiverConfig,
    logger: &mut StructuredLogger,
    verbose: bool,
) -> Result<()> {
    logger.log(LogEvent::Info {
        message: format!("loading {}", input.display()),
    })?;

    let audio = external_audio::load_audio_file(input, receiver_config.sample_rate)
        .wrap_err_with(|| format!("failed to load {}", input.display()))?;
    let window = external_audio::fit_to_window(&audio, receiver_config.window_len());

    let log_config = if verbose { LogConfig::verbose() } else { LogConfig::default() };
    let mut receiver_logger = ReceiverLogger::new(log_config);

    match decode_window(&window, receiver_config, &mut receiver_logger) {
        Some(record) => logger.log(LogEvent::Message(MessageEvent::from_record(&record)))?,
        None => logger.log(LogEvent::Warn {
            message: "no message recovered from this window".to_string(),
        })?,
    }

    if verbose {
        for entry in receiver_logger.entries() {
            logger.log(LogEvent::Info {
                message: format!("[{}] {}", entry.subsystem, entry.message),
            })?;
        }
    }

    Ok(())
}

fn run_demo(
    message: &str,
    priority: &str,
    output: &PathBuf,
    receiver_config: &ReceiverConfig,
    logger: &mut StructuredLogger,
) -> Result<()> {
    let json_body = format!(r#"{{"p":"{priority}","m":"{}"}}"#, message.replace('"', "\\\""));
    let audio = fixtures::synthesize_frame(receiver_config, &json_body, 0x01, [0u8; 64]);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(output, spec)?;
    for &sample in &audio {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    logger.log(LogEvent::Info {
        message: format!(
            "wrote {} samples ({:.2}s) to {}",
            audio.len(),
            audio.len() as f64 / SAMPLE_RATE as f64,
            output.display()
        ),
    })?;

    Ok(())
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use seqconv::config::Settings;
use seqconv::device::td3::read_header;
use seqconv::{detect_format, detect_format_from_content, supported_conversions};
use seqconv::{Converter, Device, DeviceKind, Format};

#[derive(Parser, Debug)]
#[command(name = "seqconv")]
#[command(about = "Convert TD-3 patterns between MIDI, .seq and .syx files", long_about = None)]
struct Cli {
    /// Device family (default: from config, else td3)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Config file (default: ./seqconv.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a file, formats taken from the file extensions
    Convert {
        /// Input file
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// MIDI to .seq
    Midi2seq(FileArgs),
    /// .seq to MIDI
    Seq2midi(FileArgs),
    /// MIDI to .syx
    Midi2syx(FileArgs),
    /// .syx to MIDI
    Syx2midi(FileArgs),
    /// .seq to .syx
    Seq2syx(FileArgs),
    /// .syx to .seq
    Syx2seq(FileArgs),
    /// Print a decoded pattern as YAML
    Inspect {
        /// Input file
        input: PathBuf,
    },
    /// List supported conversions
    Formats,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Input file
    input: PathBuf,
    /// Output file (default: input with the target extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn build_converter(cli: &Cli) -> Result<Converter> {
    let dir = env::current_dir().context("Failed to read working directory")?;
    let settings = Settings::resolve(cli.config.as_deref(), &dir)?;

    let device = match &cli.device {
        Some(name) => name
            .parse::<DeviceKind>()
            .with_context(|| format!("Invalid --device {:?}", name))?,
        None => settings.device_kind()?,
    };

    Ok(Converter::new(device).with_midi_options(settings.midi_options()))
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))
}

/// Format of an input file, by extension and then by content
fn input_format(path: &Path, data: &[u8]) -> Format {
    match detect_format(path) {
        Format::Unknown => detect_format_from_content(data),
        format => format,
    }
}

fn run_conversion(
    converter: &Converter,
    input: &Path,
    data: &[u8],
    output: &Path,
    from: Format,
    to: Format,
) -> Result<()> {
    let bytes = converter
        .convert(data, from, to)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        bytes = bytes.len(),
        "wrote {} -> {}",
        from,
        to
    );
    Ok(())
}

fn run_fixed(converter: &Converter, args: &FileArgs, from: Format, to: Format) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension(to.extension()));
    let data = read_input(&args.input)?;
    run_conversion(converter, &args.input, &data, &output, from, to)
}

fn inspect(converter: &Converter, input: &Path) -> Result<()> {
    let data = read_input(input)?;
    let format = input_format(input, &data);
    if format == Format::Unknown {
        bail!("Cannot determine the format of {}", input.display());
    }

    let pattern = converter
        .decode(&data, format)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    println!("# {} ({}, {})", input.display(), format, converter.device().name());
    if format == Format::Seq {
        let header = read_header(&data)?;
        println!("# device: {}", header.device);
        println!("# version: {}", header.version);
    }
    let yaml = serde_yaml::to_string(&pattern).context("Failed to serialize pattern to YAML")?;
    print!("{}", yaml);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let converter = build_converter(&cli)?;

    match &cli.command {
        Command::Convert { input, output } => {
            let data = read_input(input)?;
            let from = input_format(input, &data);
            let to = detect_format(output);
            if to == Format::Unknown {
                bail!(
                    "Cannot determine the output format of {} (use .mid, .seq or .syx)",
                    output.display()
                );
            }
            run_conversion(&converter, input, &data, output, from, to)?;
        }
        Command::Midi2seq(args) => run_fixed(&converter, args, Format::Midi, Format::Seq)?,
        Command::Seq2midi(args) => run_fixed(&converter, args, Format::Seq, Format::Midi)?,
        Command::Midi2syx(args) => run_fixed(&converter, args, Format::Midi, Format::Syx)?,
        Command::Syx2midi(args) => run_fixed(&converter, args, Format::Syx, Format::Midi)?,
        Command::Seq2syx(args) => run_fixed(&converter, args, Format::Seq, Format::Syx)?,
        Command::Syx2seq(args) => run_fixed(&converter, args, Format::Syx, Format::Seq)?,
        Command::Inspect { input } => inspect(&converter, input)?,
        Command::Formats => {
            for conversion in supported_conversions() {
                println!("{}", conversion);
            }
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use retouch::config;
use retouch::imaging::format::OutputFormat;
use retouch::imaging::params::ResampleKernel;
use retouch::naming::{generate_output_path, with_format_extension};
use retouch::normalize::RawOptions;
use retouch::output;
use retouch::pipeline::Pipeline;
use retouch::presets::{UseCase, get_optimal_settings};
use retouch::types::{InfoRecord, ResultRecord};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Deterministic photo restoration pipeline")]
#[command(long_about = "\
Deterministic photo restoration pipeline

Every command reads one input image and writes a new file; the input is never
modified. Without --output the result lands next to the input with the command
name appended:

  scans/photo.jpg  →  retouch restore  →  scans/photo_restore.jpg
                   →  retouch convert --format webp  →  scans/photo_convert.webp

Inputs are checked before anything is written: the file must exist, be under
the size limit and have a JPEG, PNG, WebP, TIFF, GIF, AVIF or HEIF header.

Run 'retouch gen-config' to generate a documented retouch.toml.")]
#[command(version)]
struct Cli {
    /// Config file (TOML) merged over the stock defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON records instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Input and optional output path shared by every transforming command.
#[derive(clap::Args)]
struct Paths {
    /// Source image
    input: PathBuf,

    /// Output path (default: input name with the command appended)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Tone flags for enhance and restore.
#[derive(clap::Args)]
struct ToneArgs {
    /// Brightness multiplier
    #[arg(long)]
    brightness: Option<f32>,
    /// Contrast multiplier around mid-gray
    #[arg(long)]
    contrast: Option<f32>,
    /// Saturation multiplier
    #[arg(long)]
    saturation: Option<f32>,
    /// Gamma, clamped to 1.0-3.0
    #[arg(long)]
    gamma: Option<f32>,
    /// Unsharp mask after tone changes
    #[arg(long)]
    sharpen: Option<bool>,
    /// 3x3 median pass at the end
    #[arg(long)]
    denoise: Option<bool>,
}

impl ToneArgs {
    fn raw(&self) -> RawOptions {
        RawOptions {
            brightness: self.brightness,
            contrast: self.contrast,
            saturation: self.saturation,
            gamma: self.gamma,
            sharpen: self.sharpen,
            denoise: self.denoise,
            ..RawOptions::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Check that a file is an acceptable input
    Validate { input: PathBuf },
    /// Show format, dimensions and color layout
    Info { input: PathBuf },
    /// Upscale then enhance (enhance only when --scale is 1 or less)
    Restore {
        #[command(flatten)]
        paths: Paths,
        #[command(flatten)]
        tone: ToneArgs,
        /// Upscale factor, clamped to 1.1-8.0
        #[arg(long)]
        scale: Option<f64>,
        /// Resampling kernel: nearest, linear, cubic, gaussian, lanczos3
        #[arg(long)]
        kernel: Option<ResampleKernel>,
    },
    /// Adjust tone, gamma and contrast, optionally sharpen and denoise
    Enhance {
        #[command(flatten)]
        paths: Paths,
        #[command(flatten)]
        tone: ToneArgs,
    },
    /// Enlarge by a scale factor
    Upscale {
        #[command(flatten)]
        paths: Paths,
        /// Upscale factor, clamped to 1.1-8.0
        #[arg(long)]
        scale: Option<f64>,
        /// Resampling kernel: nearest, linear, cubic, gaussian, lanczos3
        #[arg(long)]
        kernel: Option<ResampleKernel>,
        /// Light sharpen and saturation lift after resampling
        #[arg(long)]
        enhance: Option<bool>,
    },
    /// Remove noise with a strength from 1 (light) to 10 (strong)
    Denoise {
        #[command(flatten)]
        paths: Paths,
        #[arg(long)]
        strength: Option<f64>,
    },
    /// Shift temperature, vibrance, exposure, highlights and shadows (writes JPEG)
    Color {
        #[command(flatten)]
        paths: Paths,
        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<f32>,
        #[arg(long, allow_negative_numbers = true)]
        vibrance: Option<f32>,
        #[arg(long, allow_negative_numbers = true)]
        exposure: Option<f32>,
        #[arg(long, allow_negative_numbers = true)]
        highlights: Option<f32>,
        #[arg(long, allow_negative_numbers = true)]
        shadows: Option<f32>,
    },
    /// Re-encode as jpeg, png, webp or avif
    Convert {
        #[command(flatten)]
        paths: Paths,
        /// Target format
        #[arg(long, default_value = "jpeg")]
        format: String,
        /// Encoder quality, 1-100
        #[arg(long)]
        quality: Option<u32>,
    },
    /// Fit within a bounding box as a JPEG (never enlarges)
    Thumbnail {
        #[command(flatten)]
        paths: Paths,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        quality: Option<u32>,
    },
    /// Suggest restore settings for an image of the given size
    Optimal {
        width: u32,
        height: u32,
        /// general, print or web
        #[arg(long, default_value = "general")]
        use_case: UseCase,
    },
    /// Print a stock retouch.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let engine_config = config::load_config(cli.config.as_deref())?;
    let pipeline = Pipeline::new(engine_config);

    let record = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Validate { input } => {
            let report = pipeline.validate_input_file(&input);
            if cli.json {
                print_json(&report)?;
            } else {
                output::print_validation(&input, &report);
            }
            return Ok(exit_code(report.valid));
        }
        Command::Info { input } => {
            let record = pipeline.get_image_info(&input);
            if cli.json {
                print_json(&record)?;
            } else {
                output::print_info(&input, &record);
            }
            return Ok(exit_code(matches!(record, InfoRecord::Success(_))));
        }
        Command::Optimal {
            width,
            height,
            use_case,
        } => {
            let preset = get_optimal_settings(width, height, use_case);
            if cli.json {
                print_json(&preset)?;
            } else {
                output::print_preset(width, height, &preset);
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Restore {
            paths,
            tone,
            scale,
            kernel,
        } => {
            let raw = RawOptions {
                scale,
                kernel,
                ..tone.raw()
            };
            let output = default_output(&paths, "restore");
            pipeline.restore_image(&paths.input, &output, &raw)
        }
        Command::Enhance { paths, tone } => {
            let output = default_output(&paths, "enhance");
            pipeline.enhance_image(&paths.input, &output, &tone.raw())
        }
        Command::Upscale {
            paths,
            scale,
            kernel,
            enhance,
        } => {
            let raw = RawOptions {
                scale,
                kernel,
                enhance,
                ..RawOptions::default()
            };
            let output = default_output(&paths, "upscale");
            pipeline.upscale_image(&paths.input, &output, &raw)
        }
        Command::Denoise { paths, strength } => {
            let raw = RawOptions {
                strength,
                ..RawOptions::default()
            };
            let output = default_output(&paths, "denoise");
            pipeline.remove_noise(&paths.input, &output, &raw)
        }
        Command::Color {
            paths,
            temperature,
            vibrance,
            exposure,
            highlights,
            shadows,
        } => {
            let raw = RawOptions {
                temperature,
                vibrance,
                exposure,
                highlights,
                shadows,
                ..RawOptions::default()
            };
            // Color balance always writes JPEG.
            let output = paths.output.clone().unwrap_or_else(|| {
                with_format_extension(
                    &generate_output_path(&paths.input, "_color"),
                    OutputFormat::Jpeg,
                )
            });
            pipeline.adjust_color_balance(&paths.input, &output, &raw)
        }
        Command::Convert {
            paths,
            format,
            quality,
        } => {
            let output = paths.output.clone().unwrap_or_else(|| {
                let base = generate_output_path(&paths.input, "_convert");
                match OutputFormat::parse_target(&format) {
                    Some(target) => with_format_extension(&base, target),
                    None => base,
                }
            });
            let raw = RawOptions {
                format: Some(format),
                quality,
                ..RawOptions::default()
            };
            pipeline.convert_format(&paths.input, &output, &raw)
        }
        Command::Thumbnail {
            paths,
            width,
            height,
            quality,
        } => {
            let raw = RawOptions {
                width,
                height,
                quality,
                ..RawOptions::default()
            };
            let output = paths.output.clone().unwrap_or_else(|| {
                with_format_extension(
                    &generate_output_path(&paths.input, "_thumbnail"),
                    OutputFormat::Jpeg,
                )
            });
            pipeline.create_thumbnail(&paths.input, &output, &raw)
        }
    };

    report(&record, cli.json)
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "retouch=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn default_output(paths: &Paths, command: &str) -> PathBuf {
    paths
        .output
        .clone()
        .unwrap_or_else(|| generate_output_path(&paths.input, &format!("_{command}")))
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(record: &ResultRecord, json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if json {
        print_json(record)?;
    } else {
        output::print_result(record);
    }
    Ok(exit_code(record.is_success()))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

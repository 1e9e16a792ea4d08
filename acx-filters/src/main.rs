//! ACX command line front end
//!
//! Reads WAV input(s), runs one compositor and writes the result as WAV.
//! Overflow handling, fade shape and frame size default to the values of the
//! configuration file (see `acx_common::config`) and can be overridden per
//! invocation.

use std::fmt;
use std::path::{Path, PathBuf};

use acx_common::config::{load_settings, Settings};
use acx_common::{OverflowLog, OverflowMode, SampleType, TransitionType};
use acx_filters::filters::{
    self, ConvertParams, CrossFadeParams, DelayParams, FadeInParams, FadeOutParams, FindPeakParams,
    MixParams, NormalizeParams, OverflowParams, SetSamplesParams, SineToneParams,
};
use acx_filters::wav::{read_wav, write_wav};
use acx_filters::NodeRef;
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for acx
#[derive(Parser, Debug)]
#[command(name = "acx")]
#[command(about = "Sample-accurate audio stream composition")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(long, global = true, env = "ACX_CONFIG")]
    config: Option<PathBuf>,

    /// Samples per frame (overrides the configuration file)
    #[arg(long, global = true)]
    frame_samples: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

/// Overflow options shared by every compositor
#[derive(ClapArgs, Debug, Default)]
struct OverflowArgs {
    /// error | clip | clip_int | keep_float
    #[arg(long, value_parser = parse_overflow_mode)]
    overflow: Option<OverflowMode>,

    /// all | once | none
    #[arg(long, value_parser = parse_overflow_log)]
    overflow_log: Option<OverflowLog>,
}

impl OverflowArgs {
    fn resolve(&self, settings: &Settings) -> OverflowParams {
        OverflowParams {
            mode: self.overflow.unwrap_or(settings.overflow),
            log: self.overflow_log.unwrap_or(settings.overflow_log),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shift a stream by a signed offset
    Delay {
        input: PathBuf,
        output: PathBuf,
        /// Offset in samples; negative values trim the start
        #[arg(long, allow_hyphen_values = true)]
        samples: Option<i64>,
        #[arg(long, allow_hyphen_values = true)]
        seconds: Option<f64>,
        #[arg(long, value_delimiter = ',')]
        channels: Vec<usize>,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Fade a stream in
    FadeIn {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        samples: Option<i64>,
        #[arg(long)]
        seconds: Option<f64>,
        #[arg(long)]
        start_sample: Option<i64>,
        #[arg(long)]
        start_seconds: Option<f64>,
        /// linear | cubic | sine
        #[arg(long, value_parser = parse_fade_type)]
        fade_type: Option<TransitionType>,
        #[arg(long, value_delimiter = ',')]
        channels: Vec<usize>,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Fade a stream out
    FadeOut {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        samples: Option<i64>,
        #[arg(long)]
        seconds: Option<f64>,
        #[arg(long)]
        end_sample: Option<i64>,
        #[arg(long)]
        end_seconds: Option<f64>,
        #[arg(long, value_parser = parse_fade_type)]
        fade_type: Option<TransitionType>,
        #[arg(long, value_delimiter = ',')]
        channels: Vec<usize>,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Splice two streams with an overlapping crossfade
    CrossFade {
        clip1: PathBuf,
        clip2: PathBuf,
        output: PathBuf,
        #[arg(long)]
        samples: Option<i64>,
        #[arg(long)]
        seconds: Option<f64>,
        #[arg(long, value_parser = parse_fade_type)]
        fade_type: Option<TransitionType>,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Add clip2 onto clip1 at a signed offset
    Mix {
        clip1: PathBuf,
        clip2: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        clip1_gain: f64,
        #[arg(long, default_value_t = 1.0)]
        clip2_gain: f64,
        /// Scale both gains so they sum to 1
        #[arg(long)]
        relative_gain: bool,
        /// Position of clip2 relative to clip1
        #[arg(long, allow_hyphen_values = true)]
        clip2_offset_samples: Option<i64>,
        #[arg(long, allow_hyphen_values = true)]
        clip2_offset_seconds: Option<f64>,
        #[arg(long)]
        fadein_samples: Option<i64>,
        #[arg(long)]
        fadein_seconds: Option<f64>,
        #[arg(long)]
        fadeout_samples: Option<i64>,
        #[arg(long)]
        fadeout_seconds: Option<f64>,
        #[arg(long, value_parser = parse_fade_type)]
        fade_type: Option<TransitionType>,
        /// Keep the part of clip2 before clip1
        #[arg(long)]
        extend_start: bool,
        /// Keep the part of clip2 after clip1
        #[arg(long)]
        extend_end: bool,
        #[arg(long, value_delimiter = ',')]
        channels: Vec<usize>,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Scale a stream to a target peak
    Normalize {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        peak: f64,
        /// Never amplify
        #[arg(long)]
        lower_only: bool,
        #[arg(long, value_delimiter = ',')]
        channels: Vec<usize>,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Change the sample type
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// i16 | i24 | i32 | f32
        #[arg(long, value_parser = parse_container_type, default_value = "i16")]
        sample_type: SampleType,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Overwrite a sample range with a constant
    SetSamples {
        input: PathBuf,
        output: PathBuf,
        /// Value in units of the stream's sample type
        #[arg(long, allow_hyphen_values = true)]
        sample: f64,
        #[arg(long)]
        start_sample: Option<i64>,
        #[arg(long)]
        end_sample: Option<i64>,
        #[arg(long, value_delimiter = ',')]
        channels: Vec<usize>,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Generate a sine wave
    SineTone {
        output: PathBuf,
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
        #[arg(long)]
        samples: Option<i64>,
        #[arg(long)]
        seconds: Option<f64>,
        /// i16 | i24 | i32 | f32
        #[arg(long, value_parser = parse_container_type, default_value = "i16")]
        sample_type: SampleType,
        #[arg(long, default_value_t = 500.0)]
        freq: f64,
        #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
        amplitude: f64,
        #[arg(long, default_value_t = 2)]
        num_channels: usize,
        #[command(flatten)]
        overflow: OverflowArgs,
    },

    /// Print the peak of a stream
    FindPeak {
        input: PathBuf,
        #[arg(long, value_delimiter = ',')]
        channels: Vec<usize>,
        /// Report the signed native sample instead of the normalized magnitude
        #[arg(long)]
        raw: bool,
        /// Print a JSON object
        #[arg(long)]
        json: bool,
    },
}

fn variant_list<T: fmt::Display>(variants: &[T]) -> String {
    variants.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn parse_overflow_mode(s: &str) -> std::result::Result<OverflowMode, String> {
    OverflowMode::from_str(s)
        .ok_or_else(|| format!("expected one of: {}", variant_list(OverflowMode::all_variants())))
}

fn parse_overflow_log(s: &str) -> std::result::Result<OverflowLog, String> {
    OverflowLog::from_str(s)
        .ok_or_else(|| format!("expected one of: {}", variant_list(OverflowLog::all_variants())))
}

fn parse_fade_type(s: &str) -> std::result::Result<TransitionType, String> {
    TransitionType::from_str(s)
        .ok_or_else(|| format!("expected one of: {}", variant_list(TransitionType::all_variants())))
}

/// Sample types a stream can be stored in
fn parse_container_type(s: &str) -> std::result::Result<SampleType, String> {
    SampleType::from_container_str(s).ok_or_else(|| {
        let containers: Vec<SampleType> = SampleType::all_variants()
            .iter()
            .copied()
            .filter(SampleType::is_container_type)
            .collect();
        format!("expected one of: {}", variant_list(&containers))
    })
}

fn init_tracing(log_level: &str) {
    let default_filter = format!("acx={0},acx_filters={0},acx_common={0}", log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_input(path: &Path, frame_samples: usize) -> Result<NodeRef> {
    let clip = read_wav(path, frame_samples)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(clip.into_node())
}

fn write_output(node: &NodeRef, path: &Path) -> Result<()> {
    write_wav(node.as_ref(), path).with_context(|| format!("Failed to write {}", path.display()))
}

fn run(command: Command, settings: &Settings, frame_samples: usize) -> Result<()> {
    match command {
        Command::Delay {
            input,
            output,
            samples,
            seconds,
            channels,
            overflow,
        } => {
            let clip = read_input(&input, frame_samples)?;
            let params = DelayParams {
                samples,
                seconds,
                channels,
                overflow: overflow.resolve(settings),
            };
            let node = filters::delay(clip, &params).context("Failed to set up Delay")?;
            write_output(&node, &output)
        }

        Command::FadeIn {
            input,
            output,
            samples,
            seconds,
            start_sample,
            start_seconds,
            fade_type,
            channels,
            overflow,
        } => {
            let clip = read_input(&input, frame_samples)?;
            let params = FadeInParams {
                samples,
                seconds,
                start_sample,
                start_seconds,
                fade_type: fade_type.unwrap_or(settings.fade_type),
                channels,
                overflow: overflow.resolve(settings),
            };
            let node = filters::fade_in(clip, &params).context("Failed to set up FadeIn")?;
            write_output(&node, &output)
        }

        Command::FadeOut {
            input,
            output,
            samples,
            seconds,
            end_sample,
            end_seconds,
            fade_type,
            channels,
            overflow,
        } => {
            let clip = read_input(&input, frame_samples)?;
            let params = FadeOutParams {
                samples,
                seconds,
                end_sample,
                end_seconds,
                fade_type: fade_type.unwrap_or(settings.fade_type),
                channels,
                overflow: overflow.resolve(settings),
            };
            let node = filters::fade_out(clip, &params).context("Failed to set up FadeOut")?;
            write_output(&node, &output)
        }

        Command::CrossFade {
            clip1,
            clip2,
            output,
            samples,
            seconds,
            fade_type,
            overflow,
        } => {
            let clip1 = read_input(&clip1, frame_samples)?;
            let clip2 = read_input(&clip2, frame_samples)?;
            let params = CrossFadeParams {
                samples,
                seconds,
                fade_type: fade_type.unwrap_or(settings.fade_type),
                overflow: overflow.resolve(settings),
            };
            let node = filters::cross_fade(clip1, clip2, &params).context("Failed to set up CrossFade")?;
            write_output(&node, &output)
        }

        Command::Mix {
            clip1,
            clip2,
            output,
            clip1_gain,
            clip2_gain,
            relative_gain,
            clip2_offset_samples,
            clip2_offset_seconds,
            fadein_samples,
            fadein_seconds,
            fadeout_samples,
            fadeout_seconds,
            fade_type,
            extend_start,
            extend_end,
            channels,
            overflow,
        } => {
            let clip1 = read_input(&clip1, frame_samples)?;
            let clip2 = read_input(&clip2, frame_samples)?;
            let params = MixParams {
                clip1_gain,
                clip2_gain,
                relative_gain,
                clip2_offset_samples,
                clip2_offset_seconds,
                fadein_samples,
                fadein_seconds,
                fadeout_samples,
                fadeout_seconds,
                fade_type: fade_type.unwrap_or(settings.fade_type),
                extend_start,
                extend_end,
                channels,
                overflow: overflow.resolve(settings),
            };
            let node = filters::mix(clip1, clip2, &params).context("Failed to set up Mix")?;
            write_output(&node, &output)
        }

        Command::Normalize {
            input,
            output,
            peak,
            lower_only,
            channels,
            overflow,
        } => {
            let clip = read_input(&input, frame_samples)?;
            let params = NormalizeParams {
                peak,
                lower_only,
                channels,
                overflow: overflow.resolve(settings),
            };
            let node = filters::normalize(clip, &params).context("Failed to set up Normalize")?;
            write_output(&node, &output)
        }

        Command::Convert {
            input,
            output,
            sample_type,
            overflow,
        } => {
            let clip = read_input(&input, frame_samples)?;
            let params = ConvertParams {
                sample_type,
                overflow: overflow.resolve(settings),
            };
            let node = filters::convert(clip, &params).context("Failed to set up Convert")?;
            write_output(&node, &output)
        }

        Command::SetSamples {
            input,
            output,
            sample,
            start_sample,
            end_sample,
            channels,
            overflow,
        } => {
            let clip = read_input(&input, frame_samples)?;
            let params = SetSamplesParams {
                sample,
                start_sample,
                end_sample,
                channels,
                overflow: overflow.resolve(settings),
            };
            let node = filters::set_samples(clip, &params).context("Failed to set up SetSamples")?;
            write_output(&node, &output)
        }

        Command::SineTone {
            output,
            sample_rate,
            samples,
            seconds,
            sample_type,
            freq,
            amplitude,
            num_channels,
            overflow,
        } => {
            let params = SineToneParams {
                sample_rate,
                samples,
                seconds,
                sample_type,
                freq,
                amplitude,
                num_channels,
                frame_samples,
                overflow: overflow.resolve(settings),
            };
            let node = filters::sine_tone(&params).context("Failed to set up SineTone")?;
            write_output(&node, &output)
        }

        Command::FindPeak {
            input,
            channels,
            raw,
            json,
        } => {
            let clip = read_input(&input, frame_samples)?;
            let params = FindPeakParams {
                channels,
                normalize: !raw,
            };
            let peak = filters::find_peak(clip.as_ref(), &params).context("Failed to scan peak")?;

            if json {
                let report = serde_json::json!({
                    "input": input.display().to_string(),
                    "peak": peak,
                    "normalized": !raw,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", peak);
            }
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Settings decide the default log level, so they load before tracing exists
    let settings = load_settings(args.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&settings.log_level);
    debug!("Effective settings: {:?}", settings);

    let frame_samples = args.frame_samples.unwrap_or(settings.frame_samples);
    if frame_samples == 0 {
        anyhow::bail!("--frame-samples must be greater than 0");
    }

    info!("Running {:?} with {} samples per frame", args.command, frame_samples);
    run(args.command, &settings, frame_samples)
}

#![deny(unsafe_code)]
//! CLI binary for skyfx.
//!
//! Subcommands:
//! - `render <effect>`: drive an effect for N frames, write the last one as PNG
//! - `list`: print available effects

mod error;

use clap::{ArgAction, Parser, Subcommand};
use error::CliError;
use serde_json::Value;
use skyfx_core::{AnimationHost, Canvas, Effect, FrameOutcome, HostConfig, PointerEvent, Srgb};
use skyfx_engines::EffectKind;
use std::f64::consts::TAU;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "skyfx", about = "Animated particle-layer renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an effect for N frames and write the last frame as PNG.
    Render {
        /// Effect name (e.g. "starfield").
        effect: String,

        /// Canvas width in pixels.
        #[arg(short = 'W', long, default_value_t = 960)]
        width: usize,

        /// Canvas height in pixels.
        #[arg(short = 'H', long, default_value_t = 540)]
        height: usize,

        /// Number of frames to run.
        #[arg(short, long, default_value_t = 60)]
        frames: usize,

        /// Frame rate; defaults to the effect's preferred rate.
        #[arg(long)]
        fps: Option<f64>,

        /// PRNG seed for deterministic output.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Effect parameters as a JSON object, merged over the defaults.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Background color as "#rrggbb"; omitted keeps transparency.
        #[arg(long)]
        background: Option<String>,

        /// Output file path.
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,
    },
    /// List available effects.
    List,
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Position of the synthetic pointer at `progress` in [0, 1]: a left to
/// right sweep with two vertical waves.
fn pointer_path(width: usize, height: usize, progress: f64) -> (f64, f64) {
    let (w, h) = (width as f64, height as f64);
    let x = w * (0.1 + 0.8 * progress);
    let y = h * (0.5 + 0.3 * (TAU * 2.0 * progress).sin());
    (x, y)
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let effects = EffectKind::list_effects();
            if cli.json {
                let defaults = effects
                    .iter()
                    .map(|name| {
                        EffectKind::from_name(name, Some(0), &Value::Null)
                            .map(|e| (name.to_string(), e.params()))
                    })
                    .collect::<Result<serde_json::Map<_, _>, _>>()?;
                let info = serde_json::json!({
                    "effects": effects,
                    "defaults": defaults,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Effects:");
                for name in effects {
                    println!("  {name}");
                }
            }
        }
        Command::Render {
            effect,
            width,
            height,
            frames,
            fps,
            seed,
            params,
            background,
            output,
        } => {
            let params: Value = serde_json::from_str(&params)
                .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
            let background = background
                .as_deref()
                .map(Srgb::from_hex)
                .transpose()
                .map_err(|e| CliError::Input(e.to_string()))?;
            if fps.is_some_and(|f| !(f.is_finite() && f > 0.0)) {
                return Err(CliError::Input("--fps must be positive".into()));
            }

            let fx = EffectKind::from_name(&effect, Some(seed), &params)?;
            let interactive = fx.is_interactive();
            let fps = fps.or_else(|| fx.preferred_fps()).unwrap_or(60.0);
            let interval_ms = 1000.0 / fps;

            // Timestamps are exact multiples of the period, so the cap is off.
            let config = HostConfig {
                target_fps: Some(0.0),
                ..HostConfig::default()
            };
            let mut host = AnimationHost::attach(Some(Canvas::new(width, height)?), fx, config)?;
            info!(effect = %effect, width, height, frames, fps, seed, "rendering");

            for frame in 0..frames {
                let now = frame as f64 * interval_ms;
                if interactive {
                    let progress = frame as f64 / frames.saturating_sub(1).max(1) as f64;
                    let (x, y) = pointer_path(width, height, progress);
                    host.pointer(PointerEvent::Move {
                        x,
                        y,
                        time: now / 1000.0,
                    });
                }
                if host.frame(now) == FrameOutcome::Dropped {
                    debug!(frame, "frame dropped");
                }
            }
            let dropped = host.frames_dropped();
            host.teardown();

            skyfx_engines::snapshot::write_png(host.surface(), background, &output)?;

            if cli.json {
                let info = serde_json::json!({
                    "effect": effect,
                    "width": width,
                    "height": height,
                    "frames": frames,
                    "fps": fps,
                    "seed": seed,
                    "dropped": dropped,
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {effect} ({width}x{height}, {frames} frames at {fps} fps, seed {seed}) -> {}",
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(log_level(cli.verbose))
        .init();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_defaults_parse() {
        let cli = Cli::try_parse_from(["skyfx", "render", "starfield"]).unwrap();
        match cli.command {
            Command::Render {
                effect,
                width,
                height,
                frames,
                fps,
                background,
                ..
            } => {
                assert_eq!(effect, "starfield");
                assert_eq!((width, height, frames), (960, 540, 60));
                assert_eq!(fps, None);
                assert_eq!(background, None);
            }
            Command::List => panic!("expected render"),
        }
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["skyfx", "list", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(log_level(cli.verbose), Level::DEBUG);
    }

    #[test]
    fn pointer_path_stays_inside_canvas() {
        for i in 0..=20 {
            let (x, y) = pointer_path(200, 100, i as f64 / 20.0);
            assert!((0.0..200.0).contains(&x));
            assert!((0.0..100.0).contains(&y));
        }
    }

    #[test]
    fn list_json_builds_every_default_config() {
        let cli = Cli::try_parse_from(["skyfx", "list", "--json"]).unwrap();
        assert!(run(cli).is_ok());
    }

    #[test]
    fn bad_params_are_input_errors() {
        let cli = Cli::try_parse_from(["skyfx", "render", "starfield", "--params", "{nope"]).unwrap();
        assert_eq!(run(cli).unwrap_err().exit_code(), 12);
    }

    #[test]
    fn unknown_effect_is_effect_error() {
        let cli = Cli::try_parse_from(["skyfx", "render", "aurora"]).unwrap();
        assert_eq!(run(cli).unwrap_err().exit_code(), 10);
    }

    #[test]
    fn render_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trail.png");
        let cli = Cli::try_parse_from([
            "skyfx",
            "render",
            "cursor-trail",
            "-W",
            "64",
            "-H",
            "48",
            "--frames",
            "10",
            "--background",
            "#000010",
            "-o",
            path.to_str().unwrap(),
        ])
        .unwrap();
        run(cli).unwrap();
        assert!(path.exists());
    }
}

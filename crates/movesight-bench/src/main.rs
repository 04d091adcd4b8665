//! movesight-bench: CLI tool for running the move-detection pipeline on a
//! before/after image pair.
//!
//! Diffs two captures with configurable parameters, printing the changed
//! squares and per-stage diagnostics. Useful for:
//!
//! - Tuning the border color thresholds for a new lighting setup
//! - Calibrating crop margins and the mount rotation for a new rig
//! - Measuring per-stage durations to identify bottlenecks
//! - Inspecting intermediates with `--dump-dir`
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin movesight-bench -- [OPTIONS] <BEFORE> <AFTER>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use movesight_pipeline::annotate::{annotate_border, annotate_changes};
use movesight_pipeline::decode::decode_frame;
use movesight_pipeline::diagnostics::DiffDiagnostics;
use movesight_pipeline::{
    BorderColor, DiffConfig, Dimensions, FrameResult, FrameRole, HueRange, Margins, RgbImage,
    Rotation, StagedDiff,
};

/// Move detection experimentation and diagnostics for movesight.
///
/// Diffs a before/after pair of board photographs with configurable
/// parameters and prints the changed squares along with per-stage timing
/// and count diagnostics.
#[derive(Parser)]
#[command(name = "movesight-bench", version)]
struct Cli {
    /// Capture taken before the move (PNG, JPEG, BMP, WebP).
    before: PathBuf,

    /// Capture taken after the move.
    after: PathBuf,

    /// Mounting correction applied to both captures.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_ROTATION)]
    rotation: MountRotation,

    /// Lower hue interval of the border color, as LOW-HIGH (0-179).
    #[arg(long, default_value_t = BorderColor::DEFAULT_HUE_RANGES[0], value_parser = parse_hue_range)]
    hue_low: HueRange,

    /// Upper hue interval of the border color, as LOW-HIGH (0-179).
    #[arg(long, default_value_t = BorderColor::DEFAULT_HUE_RANGES[1], value_parser = parse_hue_range)]
    hue_high: HueRange,

    /// Minimum saturation of a border pixel.
    #[arg(long, default_value_t = BorderColor::DEFAULT_MIN_SATURATION)]
    min_saturation: u8,

    /// Minimum value (brightness) of a border pixel.
    #[arg(long, default_value_t = BorderColor::DEFAULT_MIN_VALUE)]
    min_value: u8,

    /// Close then open the border mask before contour search.
    #[arg(long)]
    border_cleanup: bool,

    /// Kernel size for the border mask cleanup (odd).
    #[arg(long, default_value_t = DiffConfig::DEFAULT_BORDER_CLEANUP_KERNEL_SIZE)]
    border_cleanup_kernel: u32,

    /// Minimum border candidate area in square pixels.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_MIN_BORDER_AREA)]
    min_border_area: f64,

    /// Polygon approximation tolerance as a fraction of the perimeter.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_APPROX_EPSILON_FACTOR)]
    epsilon_factor: f64,

    /// Edge length of the rectified board in pixels.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_BOARD_EDGE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(8..))]
    board_size: u32,

    /// Pixels trimmed from the top of the rectified board.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_CROP_MARGINS.top)]
    margin_top: u32,

    /// Pixels trimmed from the bottom of the rectified board.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_CROP_MARGINS.bottom)]
    margin_bottom: u32,

    /// Pixels trimmed from the left of the rectified board.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_CROP_MARGINS.left)]
    margin_left: u32,

    /// Pixels trimmed from the right of the rectified board.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_CROP_MARGINS.right)]
    margin_right: u32,

    /// Gaussian blur kernel size (odd).
    #[arg(long, default_value_t = DiffConfig::DEFAULT_BLUR_KERNEL_SIZE)]
    blur_kernel: u32,

    /// Binarization threshold for the difference image.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_DIFF_THRESHOLD)]
    threshold: u8,

    /// Morphology kernel size (odd).
    #[arg(long, default_value_t = DiffConfig::DEFAULT_MORPH_KERNEL_SIZE)]
    morph_kernel: u32,

    /// Minimum changed-region area in square pixels.
    #[arg(long, default_value_t = DiffConfig::DEFAULT_MIN_REGION_AREA)]
    min_region_area: f64,

    /// Write intermediate images as PNG into this directory.
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Log every stage at debug level (otherwise `RUST_LOG` decides).
    #[arg(short, long)]
    verbose: bool,

    /// Full diff config as a JSON string.
    ///
    /// When provided, all other diff parameter flags are ignored.
    /// The JSON must be a valid `DiffConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Mount rotation selection.
#[derive(Clone, Copy, ValueEnum)]
enum MountRotation {
    /// Camera already upright.
    None,
    /// 90 degrees clockwise.
    #[value(name = "90")]
    Cw90,
    /// 180 degrees.
    #[value(name = "180")]
    Cw180,
    /// 270 degrees clockwise.
    #[value(name = "270")]
    Cw270,
}

/// Maps a [`Rotation`] to the local CLI [`MountRotation`] enum.
const fn rotation_from_pipeline(rotation: Rotation) -> MountRotation {
    match rotation {
        Rotation::None => MountRotation::None,
        Rotation::Rotate90 => MountRotation::Cw90,
        Rotation::Rotate180 => MountRotation::Cw180,
        Rotation::Rotate270 => MountRotation::Cw270,
    }
}

/// The CLI default rotation, derived from
/// [`DiffConfig::DEFAULT_MOUNT_ROTATION`] so the two cannot diverge.
const CLI_DEFAULT_ROTATION: MountRotation =
    rotation_from_pipeline(DiffConfig::DEFAULT_MOUNT_ROTATION);

fn parse_hue_range(s: &str) -> Result<HueRange, String> {
    let (low, high) = s
        .split_once('-')
        .ok_or_else(|| format!("expected LOW-HIGH, got {s:?}"))?;
    let low: u8 = low.trim().parse().map_err(|e| format!("bad low hue: {e}"))?;
    let high: u8 = high.trim().parse().map_err(|e| format!("bad high hue: {e}"))?;
    if low > high || high > 179 {
        return Err(format!("hue range {low}-{high} must satisfy LOW <= HIGH <= 179"));
    }
    Ok(HueRange::new(low, high))
}

/// Build a [`DiffConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<DiffConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(DiffConfig {
        mount_rotation: match cli.rotation {
            MountRotation::None => Rotation::None,
            MountRotation::Cw90 => Rotation::Rotate90,
            MountRotation::Cw180 => Rotation::Rotate180,
            MountRotation::Cw270 => Rotation::Rotate270,
        },
        border_color: BorderColor {
            hue_ranges: [cli.hue_low, cli.hue_high],
            min_saturation: cli.min_saturation,
            min_value: cli.min_value,
        },
        border_mask_cleanup: cli.border_cleanup,
        border_cleanup_kernel_size: cli.border_cleanup_kernel,
        min_border_area: cli.min_border_area,
        approx_epsilon_factor: cli.epsilon_factor,
        board_size: Dimensions {
            width: cli.board_size,
            height: cli.board_size,
        },
        crop_margins: Margins {
            top: cli.margin_top,
            bottom: cli.margin_bottom,
            left: cli.margin_left,
            right: cli.margin_right,
        },
        blur_kernel_size: cli.blur_kernel,
        diff_threshold: cli.threshold,
        morph_kernel_size: cli.morph_kernel,
        min_region_area: cli.min_region_area,
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn read_frame(path: &Path, role: FrameRole) -> Result<RgbImage, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    eprintln!("{role}: {} ({} bytes)", path.display(), bytes.len());
    decode_frame(&bytes, role).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let frames = read_frame(&cli.before, FrameRole::Before)
        .and_then(|before| Ok((before, read_frame(&cli.after, FrameRole::After)?)));
    let (before, after) = match frames {
        Ok(frames) => frames,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    let mut squares = String::new();

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match movesight_pipeline::diff_staged(&before, &after, &config) {
            Ok(staged) => {
                if cli.json {
                    match serde_json::to_string_pretty(&staged.diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", staged.diagnostics.report());
                }

                // Dump intermediates on the first run only.
                if run == 0 {
                    squares = staged
                        .squares()
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" ");
                    if let Some(ref dir) = cli.dump_dir
                        && let Err(e) = dump_intermediates(dir, &staged)
                    {
                        eprintln!("Error writing images to {}: {e}", dir.display());
                    }
                }

                all_diagnostics.push(staged.diagnostics);
            }
            Err(e) => {
                eprintln!("Diff error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    if !cli.json {
        println!();
        println!("{squares}");
    }

    ExitCode::SUCCESS
}

/// Write every intermediate of `staged` into `dir` as PNG.
fn dump_intermediates(dir: &Path, staged: &StagedDiff) -> image::ImageResult<()> {
    std::fs::create_dir_all(dir)?;

    dump_frame(dir, &staged.before)?;
    dump_frame(dir, &staged.after)?;

    let comparison = &staged.comparison;
    save(dir, "difference.png", &comparison.difference)?;
    save(dir, "change_mask.png", &comparison.change_mask)?;
    let annotated = annotate_changes(
        &staged.after.board.rgb,
        &comparison.regions,
        &comparison.squares,
    );
    save(dir, "changes_annotated.png", &annotated)?;

    eprintln!("Intermediates written to {}", dir.display());
    Ok(())
}

fn dump_frame(dir: &Path, frame: &FrameResult) -> image::ImageResult<()> {
    let role = frame.role;
    save(dir, &format!("{role}_oriented.png"), &frame.oriented)?;
    save(dir, &format!("{role}_color_mask.png"), &frame.color_mask)?;
    save(
        dir,
        &format!("{role}_border.png"),
        &annotate_border(&frame.oriented, &frame.board.border),
    )?;
    save(dir, &format!("{role}_rectified.png"), &frame.rectified)?;
    save(dir, &format!("{role}_normalized.png"), &frame.board.rgb)?;
    save(dir, &format!("{role}_normalized_gray.png"), &frame.board.gray)
}

fn save<P>(dir: &Path, name: &str, img: &image::ImageBuffer<P, Vec<u8>>) -> image::ImageResult<()>
where
    P: image::PixelWithColorType<Subpixel = u8>,
{
    let path = dir.join(name);
    log::debug!("writing {}", path.display());
    img.save(path)
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&DiffDiagnostics) -> std::time::Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[DiffDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means, both frames summed.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Orient", |d| d.before.orient.duration + d.after.orient.duration),
        ("Color Mask", |d| {
            d.before.color_mask.duration + d.after.color_mask.duration
        }),
        ("Border", |d| d.before.border.duration + d.after.border.duration),
        ("Rectify", |d| d.before.rectify.duration + d.after.rectify.duration),
        ("Normalize", |d| {
            d.before.normalize.duration + d.after.normalize.duration
        }),
        ("Change Detection", |d| d.comparison.change_detection.duration),
        ("Clustering", |d| d.comparison.clustering.duration),
        ("Grid Mapping", |d| d.comparison.grid_mapping.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

use clap::{Parser, Subcommand};
use photo_fit::config::{self, TargetOverrides};
use photo_fit::imaging::{RustBackend, TargetFormat};
use photo_fit::intake::{self, Adjustments, CropRect, Rotation};
use photo_fit::output;
use photo_fit::process::{self, OutputLocation, ProcessOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-fit")]
#[command(about = "Resize and re-encode photos until they fit a file-size budget")]
#[command(long_about = "\
Resize and re-encode photos until they fit a file-size budget

Each image is resampled to the requested dimensions, then encoded at the
highest quality that stays under the size limit. With --auto-resize, images
that only fit at low quality are shrunk step by step instead.

  photo-fit compress scan.png --max-kb 50                 # scan_compressed.jpg
  photo-fit compress photos/ -o out/ --width 800          # whole directory
  photo-fit compress id.jpg --format pdf --preset passport

Defaults come from photo-fit.toml in the working directory, if present.
Command-line flags override the config and any --preset.

Run 'photo-fit gen-config' to generate a documented photo-fit.toml.")]
#[command(version)]
struct Cli {
    /// Show every search step and debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress images to fit a size budget
    Compress(CompressArgs),
    /// Check that inputs are readable JPEG or PNG images
    Check {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print a stock photo-fit.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct CompressArgs {
    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory, or output file for a single input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum output size in kilobytes (1 KB = 1024 bytes)
    #[arg(long = "max-kb", value_name = "KB", allow_hyphen_values = true)]
    max_kb: Option<f64>,

    /// Output format: jpeg, png, or pdf
    #[arg(long, value_name = "FORMAT")]
    format: Option<TargetFormat>,

    /// Target width in pixels
    #[arg(long, allow_hyphen_values = true)]
    width: Option<f64>,

    /// Target height in pixels
    #[arg(long, allow_hyphen_values = true)]
    height: Option<f64>,

    /// Shrink the image when quality alone cannot reach the budget
    #[arg(long, conflicts_with = "no_auto_resize")]
    auto_resize: bool,

    /// Keep the resolved dimensions even if the budget needs low quality
    #[arg(long)]
    no_auto_resize: bool,

    /// Named target from photo-fit.toml
    #[arg(long)]
    preset: Option<String>,

    /// Rotate clockwise by a multiple of 90 degrees before compressing
    #[arg(long, value_name = "DEGREES", default_value = "0", allow_hyphen_values = true)]
    rotate: Rotation,

    /// Crop after rotating
    #[arg(long, value_name = "X,Y,W,H")]
    crop: Option<CropRect>,

    /// Config file to use instead of ./photo-fit.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the batch report as JSON instead of progress lines
    #[arg(long)]
    json: bool,
}

impl CompressArgs {
    fn overrides(&self) -> TargetOverrides {
        let auto_resize = if self.auto_resize {
            Some(true)
        } else if self.no_auto_resize {
            Some(false)
        } else {
            None
        };
        TargetOverrides {
            max_size_kb: self.max_kb,
            format: self.format,
            width: self.width,
            height: self.height,
            auto_resize,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compress(args) => {
            if !compress(&args, cli.verbose)? {
                std::process::exit(1);
            }
        }
        Command::Check { inputs } => {
            let entries: Vec<_> = process::collect_inputs(&inputs)?
                .into_iter()
                .map(|path| {
                    let info = intake::inspect(&path);
                    (path, info)
                })
                .collect();
            output::print_check(&entries);
            if entries.is_empty() || entries.iter().any(|(_, info)| info.is_err()) {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run a compression batch. Returns whether every input was written.
fn compress(args: &CompressArgs, verbose: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let fit_config = config::load_config(args.config.as_deref(), &cwd)?;
    let spec = fit_config.resolve_target(args.preset.as_deref(), &args.overrides())?;

    let inputs = process::collect_inputs(&args.inputs)?;
    let options = ProcessOptions {
        spec,
        adjustments: Adjustments {
            rotation: args.rotate,
            crop: args.crop,
        },
        output: OutputLocation::resolve(args.output.as_deref(), inputs.len())?,
    };

    init_thread_pool(&fit_config.processing);
    let backend = RustBackend::new();

    if args.json {
        let report = process::process(&backend, &inputs, &options, None)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report.all_written());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event, verbose);
        }
    });
    let result = process::process(&backend, &inputs, &options, Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let report = result?;
    output::print_summary(&report);

    Ok(report.all_written())
}

/// Log to stderr. `RUST_LOG` wins over the default level.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "photo_fit=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stereopair::config::{self, StereoConfig};
use stereopair::conflict::{ConflictResolver, Decision, LinePrompt};
use stereopair::interactive::{Controller, LineController};
use stereopair::process::{self, Action, Batch};
use stereopair::{output, scan};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stereopair")]
#[command(about = "Batch correction and conversion of stereo image pairs")]
#[command(long_about = "\
Batch correction and conversion of stereo image pairs

A pair is either one side-by-side image or two files given with --left and
--right. Each pair is corrected, then written as a merged side-by-side image,
as separate left/right images, or as an animated GIF.

Actions (-a, repeatable, run in order after the configured adjustments):

  brightness=F  contrast=F     tone multipliers (1.0 = unchanged)
  slice=P       align=P        trim P percent horizontally / vertically
  rotate=D                     counter-rotate the sides by D degrees
  squash                       halve the height
  scale=F       fit=WxH        resize both sides
  match         equalize       histogram matching / equalization
  merge  split  animate        queue outputs

Without an output action, side-by-side sources are merged back and separate
files are split.

Animations need ImageMagick ('convert') on the PATH.

Run 'stereopair gen-config' to generate a documented stereopair.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./stereopair.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More diagnostics (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Correct and convert stereo pairs
    Process(ProcessArgs),
    /// List the pairs a run would process and validate the configuration
    Check(InputArgs),
    /// Print a stock stereopair.toml with all options documented
    GenConfig,
}

/// Where pairs come from.
#[derive(Args, Clone)]
struct InputArgs {
    /// Side-by-side images or directories of them
    inputs: Vec<PathBuf>,

    /// Left image of a separate pair
    #[arg(long, requires = "right")]
    left: Option<PathBuf>,

    /// Right image of a separate pair
    #[arg(long, requires = "left")]
    right: Option<PathBuf>,

    /// Pixels between the two halves of side-by-side images
    #[arg(long)]
    middle_gap: Option<u32>,
}

#[derive(Args, Clone)]
struct ProcessArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Action to run, e.g. `rotate=1.5`, `fit=1920x1080`, `animate`
    #[arg(short, long = "action", value_name = "ACTION")]
    actions: Vec<Action>,

    #[arg(long)]
    brightness: Option<f64>,
    #[arg(long)]
    contrast: Option<f64>,
    /// Percent of width trimmed from the inner edges
    #[arg(long, allow_hyphen_values = true)]
    slice: Option<f64>,
    /// Percent of height trimmed in opposite directions
    #[arg(long, allow_hyphen_values = true)]
    align: Option<f64>,
    /// Degrees of counter-rotation
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<f64>,

    /// Suffix appended to output names
    #[arg(long)]
    suffix: Option<String>,
    /// Directory for outputs (default: next to the source)
    #[arg(long)]
    dest_dir: Option<PathBuf>,
    /// Exact output file (single pair only)
    #[arg(long, conflicts_with = "dest_dir")]
    dest_path: Option<PathBuf>,
    /// JPEG quality, 1-100
    #[arg(long)]
    quality: Option<u32>,

    /// Animation frame delay in hundredths of a second
    #[arg(long)]
    delay: Option<u32>,
    /// Animation resize geometry, e.g. `50%` or `800x`
    #[arg(long)]
    resize: Option<String>,

    /// Replace existing outputs without asking
    #[arg(long)]
    force: bool,
    /// Keep existing outputs without asking
    #[arg(long, conflicts_with = "force")]
    skip_existing: bool,

    /// Tune adjustments per pair with a live preview
    #[arg(short, long)]
    interactive: bool,
    /// Where the interactive preview is written
    #[arg(long, requires = "interactive")]
    preview: Option<PathBuf>,

    /// Report failed pairs and continue with the next one
    #[arg(long)]
    keep_going: bool,
}

impl ProcessArgs {
    /// Command-line settings as a config layer.
    fn overrides(&self) -> toml::Value {
        let mut layer = self.input.overrides();
        let mut set = |section: &str, key: &str, value: toml::Value| {
            set_key(&mut layer, section, key, value);
        };

        for (key, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("slice", self.slice),
            ("align", self.align),
            ("rotate", self.rotate),
        ] {
            if let Some(v) = value {
                set("adjust", key, v.into());
            }
        }
        if let Some(suffix) = &self.suffix {
            set("output", "suffix", suffix.as_str().into());
        }
        if let Some(dir) = &self.dest_dir {
            set("output", "dest_dir", path_value(dir));
        }
        if let Some(path) = &self.dest_path {
            set("output", "dest_path", path_value(path));
        }
        if let Some(q) = self.quality {
            set("output", "quality", i64::from(q).into());
        }
        if self.force {
            set("output", "force", true.into());
        }
        if let Some(delay) = self.delay {
            set("animate", "delay", i64::from(delay).into());
        }
        if let Some(resize) = &self.resize {
            set("animate", "resize", resize.as_str().into());
        }
        if self.keep_going {
            set("batch", "on_error", "skip".into());
        }
        layer
    }
}

impl InputArgs {
    fn overrides(&self) -> toml::Value {
        let mut layer = toml::Value::Table(toml::Table::new());
        if let Some(gap) = self.middle_gap {
            set_key(&mut layer, "batch", "middle_gap", i64::from(gap).into());
        }
        layer
    }

    fn explicit_pair(&self) -> Option<(PathBuf, PathBuf)> {
        self.left.clone().zip(self.right.clone())
    }
}

fn set_key(layer: &mut toml::Value, section: &str, key: &str, value: toml::Value) {
    if let toml::Value::Table(root) = layer {
        let entry = root
            .entry(section)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if let toml::Value::Table(table) = entry {
            table.insert(key.to_string(), value);
        }
    }
}

fn path_value(path: &Path) -> toml::Value {
    toml::Value::String(path.to_string_lossy().into_owned())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_report(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

/// Messages already carry their causes, so only the outermost is shown.
fn error_report(err: &dyn Error) -> String {
    format!("error: {err}")
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Process(args) => {
            let (config, _) = load_config(cli.config.as_deref(), args.overrides())?;
            let sources = scan::discover(&args.input.inputs, args.input.explicit_pair())?;

            let mut resolver = conflict_resolver(&config, args.skip_existing);
            let mut controller = args.interactive.then(|| {
                let preview = args
                    .preview
                    .clone()
                    .unwrap_or_else(|| std::env::temp_dir().join("stereopair-preview.png"));
                eprintln!("Preview: {}", preview.display());
                LineController::stdio(config.interactive.steps).with_preview_path(preview)
            });

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let batch = Batch {
                sources: &sources,
                config: &config,
                actions: &args.actions,
            };
            let result = process::process(
                &batch,
                &mut resolver,
                controller.as_mut().map(|c| c as &mut dyn Controller),
                Some(tx),
            );
            printer.join().ok();

            match result {
                Ok(summary) => output::print_process_summary(&summary),
                Err(e) if e.is_cancelled() => println!("Cancelled."),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Check(args) => {
            let (config, file) = load_config(cli.config.as_deref(), args.overrides())?;
            let sources = scan::discover(&args.inputs, args.explicit_pair())?;
            output::print_check_output(&sources, &config, file.as_deref());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "stereopair=warn",
        1 => "stereopair=info",
        _ => "stereopair=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Effective configuration plus the file it was read from, if any.
fn load_config(
    explicit: Option<&Path>,
    overrides: toml::Value,
) -> Result<(StereoConfig, Option<PathBuf>), config::ConfigError> {
    let file = config::find_config_file(Path::new("."), explicit);
    let config = config::load_config(file.as_deref(), Some(overrides))?;
    Ok((config, file))
}

/// `--force` (or `output.force`) replaces, `--skip-existing` keeps; otherwise
/// ask on a terminal and refuse to overwrite when not on one.
fn conflict_resolver(config: &StereoConfig, skip_existing: bool) -> ConflictResolver {
    if config.output.force {
        ConflictResolver::always(Decision::Replace)
    } else if skip_existing {
        ConflictResolver::always(Decision::Ignore)
    } else if std::io::stdin().is_terminal() {
        ConflictResolver::interactive(Box::new(LinePrompt::stdio()))
    } else {
        ConflictResolver::always(Decision::Abort)
    }
}

use std::io;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use tracing_subscriber::EnvFilter;

use jump_rectifier::config::{GeneratorConfig, PipelineConfig};
use jump_rectifier::generator::TestSignal;
use jump_rectifier::rectifier::{RectifyOutcome, RectifyStrategy};
use jump_rectifier::sample_file::{write_samples, write_stage_csv};
use jump_rectifier::signal_rectifier::SignalRectifier;
use jump_rectifier::validation::{validate_directory, ValidationStatus, EXPECTED_JUMPS};

#[derive(Parser, Debug)]
#[command(author, version, about = "Detect and rectify jumps in motion-capture trajectories", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter a sample file, detect its jumps and rectify them
    Rectify(RectifyArgs),
    /// Write synthetic Gaussian-pulse fixtures with known jump points
    Generate(GenerateArgs),
    /// Check jump detection on every .txt fixture in a directory
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Butterworth filter order
    #[arg(long)]
    order: Option<usize>,

    /// Cutoff as a fraction of Nyquist, in (0, 1)
    #[arg(long)]
    cutoff: Option<f64>,

    /// Index distance between compared samples
    #[arg(long)]
    sweep: Option<usize>,

    /// Minimum rounded difference that marks a jump onset
    #[arg(long)]
    threshold: Option<f64>,
}

impl FilterArgs {
    fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(order) = self.order {
            config.filter_order = order;
        }
        if let Some(cutoff) = self.cutoff {
            config.cutoff = cutoff;
        }
        if let Some(sweep) = self.sweep {
            config.sweep = sweep;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        config
    }
}

#[derive(Args, Debug)]
struct RectifyArgs {
    /// Sample file: header line, then "<time> <value>" per line
    #[arg(long, value_hint = ValueHint::FilePath)]
    path: PathBuf,

    /// Bridge shape used across each jump
    #[arg(long, value_enum, default_value_t = RectifyStrategy::Linear)]
    strategy: RectifyStrategy,

    /// Half-width of the rectified window, in samples
    #[arg(long)]
    width: Option<usize>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Print the rectified samples to stdout
    #[arg(long, action = ArgAction::SetTrue)]
    print: bool,

    /// Write the rectified series in the sample file format
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Write time,raw,denoised,rectified columns for plotting
    #[arg(long, value_hint = ValueHint::FilePath)]
    csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Output file; with --count > 1 an index is appended to the stem
    #[arg(long, value_hint = ValueHint::FilePath)]
    path: PathBuf,

    /// Number of fixtures to write
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Seed for reproducible fixtures (fixture k uses seed + k)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of Gaussian pulses
    #[arg(long)]
    pulses: Option<usize>,

    #[arg(long)]
    start: Option<f64>,

    #[arg(long)]
    end: Option<f64>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Directory holding the .txt fixtures
    #[arg(value_hint = ValueHint::DirPath)]
    dir: PathBuf,

    /// Write a per-file CSV report
    #[arg(long, value_hint = ValueHint::FilePath)]
    report: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Rectify(args) => run_rectify(args),
        Command::Generate(args) => run_generate(args),
        Command::Validate(args) => run_validate(args),
    }
}

fn run_rectify(args: RectifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = args.filter.apply(PipelineConfig::default());
    config.strategy = args.strategy;
    if let Some(width) = args.width {
        config.rect_width = width;
    }

    println!("📂 Loading samples from: {}", args.path.display());
    let mut sr = SignalRectifier::from_file(&args.path)?;
    println!("✅ Loaded {} samples", sr.raw().len());

    let outcome = sr.run(&config)?;
    println!("📍 Jump points: {:?}", sr.jump_points());

    match &outcome {
        RectifyOutcome::NothingToRectify => println!("🟰 No jumps detected, nothing to rectify"),
        RectifyOutcome::Rectified(windows) => {
            println!(
                "🔧 Rectified {} window(s) with {} bridge (width {})",
                windows.len(),
                config.strategy,
                config.rect_width
            );
        }
    }

    let rectified = sr.rectified()?;
    if args.print {
        for (t, v) in rectified.iter() {
            println!("{} {}", t, v);
        }
    }

    if let Some(output) = &args.output {
        write_samples(output, rectified)?;
        println!("📄 Rectified samples saved to: {}", output.display());
    }

    if let Some(csv_path) = &args.csv {
        write_stage_csv(csv_path, sr.raw(), sr.denoised()?, rectified)?;
        println!("📄 Stage CSV saved to: {}", csv_path.display());
    }

    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = args.path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(format!("couldn't find the given path: {}", parent.display()).into());
        }
    }

    let mut base = GeneratorConfig::default();
    if let Some(pulses) = args.pulses {
        base.pulses = pulses;
    }
    if let Some(start) = args.start {
        base.start = start;
    }
    if let Some(end) = args.end {
        base.end = end;
    }

    for k in 0..args.count {
        let config = GeneratorConfig {
            seed: args.seed.map(|s| s.wrapping_add(k as u64)),
            ..base
        };
        let path = fixture_path(&args.path, k, args.count);
        let signal = TestSignal::generate(&config)?;
        signal.save_to_file(&path)?;
        println!(
            "💾 Saved {} ({} samples, jumps at {:?})",
            path.display(),
            signal.series().len(),
            signal.expected_jumps()
        );
    }

    Ok(())
}

fn fixture_path(path: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("fixture");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("txt");
    path.with_file_name(format!("{}_{}.{}", stem, index, ext))
}

fn run_validate(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = std::time::Instant::now();
    let config = args.filter.apply(PipelineConfig::acceptance());

    println!("📂 Validating fixtures in: {}", args.dir.display());
    println!("⚡ Using parallel processing on {} cores", num_cpus::get());
    let report = validate_directory(&args.dir, &config, &EXPECTED_JUMPS)?;

    for entry in &report.entries {
        match &entry.status {
            ValidationStatus::Passed => println!("File OK: {}", entry.path.display()),
            ValidationStatus::WrongJumps => println!(
                "TEST FAILED: Wrong jump points in file: {} (got {:?})",
                entry.path.display(),
                entry.detected
            ),
            ValidationStatus::Error(msg) => {
                println!("TEST FAILED: {}: {}", entry.path.display(), msg)
            }
        }
    }

    if let Some(report_path) = &args.report {
        report.write_csv(report_path)?;
        println!("📄 Report saved to: {}", report_path.display());
    }

    if report.all_passed() {
        println!("✅ TEST PASSED ({} files in {:.2}s)", report.entries.len(), start.elapsed().as_secs_f64());
    } else {
        println!("❌ Total number of errors: {}", report.failed());
    }

    Ok(())
}

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Approximate an image with the polygon engine and write the result as a PNG.
    Run(RunArgs),
    /// Print the default session config as JSON.
    Config,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Source image (any format the `image` crate decodes).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Session config JSON. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hard iteration cap.
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Accuracy in (0, 1] at which the session finishes.
    #[arg(long)]
    target_accuracy: Option<f32>,

    /// Engine iterations per batch.
    #[arg(long)]
    batch_size: Option<u32>,

    /// Strategy: 0 evolution strategy, 1 simulated annealing, 2 differential evolution.
    #[arg(long)]
    algorithm: Option<u8>,

    /// RNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Candidate scoring metric.
    #[arg(long, value_enum, default_value_t = MetricChoice::Sad)]
    metric: MetricChoice,

    /// Refresh rate of the foreground loop.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    tick_hz: u32,

    /// Issue a user stop after this many milliseconds.
    #[arg(long)]
    stop_after_ms: Option<u64>,

    /// Print the final report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricChoice {
    Sad,
    Mse,
}

#[derive(serde::Serialize)]
struct Report<'a> {
    state: Option<tessera::RunState>,
    status: &'a tessera::StatusDisplay,
    outcome: Option<&'a tessera::SessionOutcome>,
    frames: tessera::RenderStats,
    elapsed_ms: u128,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Config => cmd_config(),
    }
}

fn cmd_config() -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&tessera::SessionConfig::default())
        .context("serialize default config")?;
    println!("{json}");
    Ok(())
}

fn session_config(args: &RunArgs) -> anyhow::Result<tessera::SessionConfig> {
    let mut cfg = match &args.config {
        Some(path) => tessera::SessionConfig::from_json_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => tessera::SessionConfig::default(),
    };
    if let Some(v) = args.max_iterations {
        cfg.max_iterations = v;
    }
    if let Some(v) = args.target_accuracy {
        cfg.target_accuracy = v;
    }
    if let Some(v) = args.batch_size {
        cfg.batch_size = v;
    }
    if let Some(v) = args.algorithm {
        cfg.algorithm = tessera::AlgorithmVariant(v);
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    cfg.validate().context("invalid session config")?;
    Ok(cfg)
}

fn load_rgba(path: &Path) -> anyhow::Result<image::RgbaImage> {
    let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
    Ok(img.to_rgba8())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = session_config(&args)?;
    let source = load_rgba(&args.in_path)?;
    let (width, height) = source.dimensions();

    let opts = tessera::PolygonEngineOpts {
        metric: match args.metric {
            MetricChoice::Sad => tessera::Metric::Sad,
            MetricChoice::Mse => tessera::Metric::Mse,
        },
        ..tessera::PolygonEngineOpts::default()
    };
    let factory = Arc::new(tessera::PolygonEngine::factory(opts));
    let mut ctrl =
        tessera::LifecycleController::new(factory, tessera::CanvasSurface::new(width, height));
    ctrl.load_image(source.into_raw(), width, height)?;
    ctrl.set_config(cfg);

    let started = Instant::now();
    ctrl.start()?;

    let period = Duration::from_secs_f64(1.0 / f64::from(args.tick_hz));
    let stop_after = args.stop_after_ms.map(Duration::from_millis);
    while ctrl.state() == tessera::RunState::Running {
        ctrl.tick();
        if ctrl.state() != tessera::RunState::Running {
            break;
        }
        if stop_after.is_some_and(|limit| started.elapsed() >= limit) {
            ctrl.stop()?;
            break;
        }
        std::thread::sleep(period);
    }
    ctrl.shutdown().context("join background contexts")?;
    let elapsed = started.elapsed();

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    ctrl.surface().save_png(&args.out)?;

    let status = ctrl.status();
    if args.json {
        let report = Report {
            state: ctrl.last_terminal(),
            status,
            outcome: ctrl.outcomes().last().map(|(_, o)| o),
            frames: ctrl.render_stats(),
            elapsed_ms: elapsed.as_millis(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    } else {
        eprintln!("{}", status.status);
        eprintln!("{}", status.iteration);
        eprintln!("{}", status.accuracy);
        eprintln!("Progress: {:.1}%", status.progress);
    }
    eprintln!("wrote {}", args.out.display());

    if ctrl.last_terminal() == Some(tessera::RunState::Errored) {
        anyhow::bail!("session failed: {}", status.status);
    }
    Ok(())
}

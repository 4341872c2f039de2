use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use gpsur::{StudyConfig, export, plot, study};
use std::path::PathBuf;

/// Environment variable controlling the log level
const GPSUR_LOG: &str = "GPSUR_LOG";

/// Gaussian process surrogate mockup on a shifted Rosenbrock function
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Shift parameter r of the mockup function
    #[arg(short, long, default_value_t = 0.25)]
    r: f64,

    /// Number of levels of each input in the reference grid
    #[arg(long, default_value_t = 20)]
    levels: usize,

    /// Training set keeps every step-th level of each input
    #[arg(long, default_value_t = 5)]
    train_step: usize,

    /// Index of the training v level used as test slice
    #[arg(long, default_value_t = 1)]
    test_row: usize,

    /// Number of points of the length scale likelihood profile
    #[arg(long, default_value_t = 100)]
    length_scale_points: usize,

    /// Number of points of the noise likelihood profile
    #[arg(long, default_value_t = 40)]
    noise_points: usize,

    /// Seed of the hyperparameters optimization multistart
    #[arg(long, default_value_t = gpsur_gp::GP_OPTIM_SEED)]
    seed: u64,

    /// Output directory of figures and arrays
    #[arg(short, long, default_value = "mockup_out")]
    outdir: PathBuf,

    /// Figure width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Dump study arrays as .npy files
    #[arg(long)]
    npy: bool,
}

impl From<Args> for StudyConfig {
    fn from(args: Args) -> Self {
        StudyConfig {
            r: args.r,
            levels: args.levels,
            train_step: args.train_step,
            test_row: args.test_row,
            length_scale_points: args.length_scale_points,
            noise_scan_points: args.noise_points,
            seed: args.seed,
            out_dir: args.outdir,
            plot_size: (args.width, args.height),
            export_npy: args.npy,
            ..StudyConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let env = Env::new().filter_or(GPSUR_LOG, "info");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();

    let cfg = StudyConfig::from(Args::parse());
    let report = study::run(&cfg)?;

    for figure in plot::draw_figures(&report, &cfg)? {
        println!("{}", figure.display());
    }
    if cfg.export_npy {
        export::dump_arrays(&report, &cfg.out_dir)?;
    }
    Ok(())
}

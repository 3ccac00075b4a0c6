use std::alloc::System;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use runner::{
    console_sink, file_then_console, open_sink, output_path,
    parse_digest_modes, registry, select_schemes, OutputFormat,
};
use sweep::config::{
    DEFAULT_GROWTH_FACTOR, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH,
    DEFAULT_TRIALS_PER_STEP,
};
use sweep::{
    DigestMode, SignatureScheme, Sweep, SweepConfig, TrackingAllocator,
    RECORD_HEADER,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

static SYSTEM_ALLOC: System = System;

#[global_allocator]
static GLOBAL: TrackingAllocator<System> =
    TrackingAllocator::new(&SYSTEM_ALLOC);

#[derive(Parser, Debug)]
#[command(name = "sigsweep")]
#[command(
    about = "Sweep signature schemes over growing message sizes",
    long_about = None
)]
struct Cli {
    /// Scheme to sweep; repeat for several, or `all`
    #[arg(short, long = "scheme", value_name = "NAME")]
    schemes: Vec<String>,

    /// Message preprocessing: none, sha256, sha512 or all
    #[arg(short, long, default_value = "all")]
    digest: String,

    /// First message length in bytes
    #[arg(long, env = "MIN_LEN", default_value_t = DEFAULT_MIN_LENGTH)]
    min_len: usize,

    /// Sweep stops before reaching this length
    #[arg(long, env = "MAX_LEN", default_value_t = DEFAULT_MAX_LENGTH)]
    max_len: usize,

    /// Multiplier between consecutive lengths
    #[arg(long, env = "GROWTH", default_value_t = DEFAULT_GROWTH_FACTOR)]
    growth: f64,

    /// Trials averaged per length
    #[arg(
        short,
        long,
        env = "ITERATIONS",
        default_value_t = DEFAULT_TRIALS_PER_STEP
    )]
    iterations: usize,

    /// Flip a byte of every signed message and expect rejection
    #[arg(long)]
    corrupt: bool,

    /// Fixed seed for payloads and corruption offsets
    #[arg(long, env = "SEED")]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Pipe)]
    format: OutputFormat,

    #[arg(short, long, env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Print the registered schemes and exit
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn sweep_config(&self, digest_mode: DigestMode) -> SweepConfig {
        SweepConfig {
            min_length: self.min_len,
            max_length: self.max_len,
            growth_factor: self.growth,
            trials_per_step: self.iterations,
            digest_mode,
            corruption_check: self.corrupt,
            seed: self.seed,
        }
    }
}

fn print_registry() {
    for scheme in registry() {
        let sizes = scheme.sizes();
        println!(
            "{:<28} {:<10} pk={} sk={} sig<={}",
            scheme.algorithm_name(),
            scheme.family().as_str(),
            sizes.public_key_bytes,
            sizes.secret_key_bytes,
            sizes.max_signature_bytes
        );
    }
}

fn run_sweep(
    cli: &Cli,
    scheme: &dyn SignatureScheme,
    digest_mode: DigestMode,
) -> Result<usize, Box<dyn Error>> {
    let sweep = Sweep::new(scheme, cli.sweep_config(digest_mode))?;
    let path = output_path(
        &cli.output_dir,
        scheme.algorithm_name(),
        digest_mode,
        cli.format,
    );
    let file = open_sink(&path, cli.format)?;
    info!(
        algorithm = scheme.algorithm_name(),
        %digest_mode,
        path = %path.display(),
        "writing results"
    );

    println!("{} ({})", scheme.algorithm_name(), digest_mode);
    println!("{RECORD_HEADER}");
    Ok(sweep.run(file_then_console(file, console_sink()))?)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.list {
        print_registry();
        return Ok(());
    }

    let schemes = select_schemes(&cli.schemes)?;
    let digest_modes = parse_digest_modes(&cli.digest)?;
    // Reject a bad configuration before any output file exists.
    cli.sweep_config(DigestMode::None).validate()?;

    for scheme in &schemes {
        for &digest_mode in &digest_modes {
            match run_sweep(&cli, scheme.as_ref(), digest_mode) {
                Ok(records) => info!(
                    algorithm = scheme.algorithm_name(),
                    %digest_mode,
                    records,
                    "sweep complete"
                ),
                Err(err) => {
                    error!(
                        algorithm = scheme.algorithm_name(),
                        %digest_mode,
                        error = %err,
                        "run aborted"
                    );
                    return Err(err);
                }
            }
        }
    }
    Ok(())
}

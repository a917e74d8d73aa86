use anyhow::Result;
use clap::Parser;
use log::info;
use std::time::Duration;

pub mod io;
#[cfg(feature = "python")]
mod python;
pub mod stats;
pub mod util;

use stats::correlation::CorrelationType;
use stats::paired::StatConfig;

/// Correlate two paired conditions across units of observation (e.g.
/// subjects), for every observation (voxel, channel, timepoint) in a data
/// matrix, and convert the correlation to a t-statistic.
#[derive(Parser, Debug)]
#[command(author, version)]
pub struct InputArguments {
    /// Path to the data matrix (observations x replications)
    #[arg(short = 'i', long)]
    pub data: String,

    /// Path to the design matrix (design variables x replications)
    #[arg(short, long)]
    pub design: String,

    /// Path to the output file
    #[arg(short, long)]
    pub output_file: String,

    /// Path to an optional summary file (degrees of freedom, critical values)
    #[arg(long)]
    pub summary_file: Option<String>,

    /// Design row (1-based) holding the unit of observation ids
    #[arg(long)]
    pub uvar: Option<usize>,

    /// Design row (1-based) holding the condition labels (1 or 2)
    #[arg(long, default_value_t = 1)]
    pub ivar: usize,

    /// Tail of the test: -1 left, 0 two-tailed, 1 right
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub tail: i32,

    /// Significance level for the critical values
    #[arg(long, default_value_t = 0.05)]
    pub alpha: f64,

    /// Correlation coefficient to compute
    #[arg(long, value_enum, default_value_t = CorrelationType::Spearman)]
    pub correlation_type: CorrelationType,

    /// Skip the per-observation statistic
    #[arg(long, default_value_t = false)]
    pub no_stat: bool,

    /// Compute critical values
    #[arg(long, default_value_t = false)]
    pub critval: bool,

    /// Compute p-values
    #[arg(long, default_value_t = false)]
    pub prob: bool,

    /// Number of observations to read per chunk
    #[arg(long, default_value_t = 100000)]
    pub chunksize: usize,

    /// Number of threads to use
    #[arg(short, long, default_value_t = 1)]
    pub num_threads: usize,

    /// Number of data chunks to hold in memory at once
    #[arg(long, default_value_t = 25)]
    pub capacity: usize,

    /// Whether to compress the output using zstd
    #[arg(long, default_value_t = false)]
    pub compress: bool,

    /// Suppress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl InputArguments {
    pub fn stat_config(&self) -> StatConfig {
        StatConfig {
            compute_stat: Some(!self.no_stat),
            compute_critval: Some(self.critval),
            compute_prob: Some(self.prob),
            alpha: Some(self.alpha),
            tail: Some(self.tail),
            correlation_type: Some(self.correlation_type),
            ivar: Some(self.ivar),
            uvar: self.uvar,
        }
    }
}

pub fn run_cli(args: InputArguments) -> Result<()> {
    info!("Received arguments: {:#?}", &args);

    info!("Starting paired correlation");
    let start = std::time::Instant::now();

    let stat_config = args.stat_config();

    let runtime_config = util::RuntimeConfig {
        num_threads: args.num_threads,
        chunksize: args.chunksize,
        compress: args.compress,
        capacity: args.capacity,
    };

    util::run(
        &args.data,
        &args.design,
        &args.output_file,
        args.summary_file.as_deref(),
        &stat_config,
        runtime_config,
    )?;

    let duration = Duration::new(start.elapsed().as_secs(), 0);
    info!(
        "Finished paired correlation in {}",
        humantime::format_duration(duration)
    );

    Ok(())
}

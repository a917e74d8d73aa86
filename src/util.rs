use anyhow::{anyhow, ensure, Context, Result};
use crossbeam_channel::Sender;
use log::{debug, info, warn};

use crate::io;
use crate::io::matrix::{ChunkedMatrixReader, LabeledMatrix};
use crate::io::results::{ResultWriter, Summary};
use crate::stats::paired::{PairedCorrelation, StatConfig};

pub struct RuntimeConfig {
    pub num_threads: usize,
    pub chunksize: usize,
    pub compress: bool,
    pub capacity: usize,
}

/// Check that the data and design describe the same replications, in the
/// same order.
fn check_inputs(data_labels: &[String], design_labels: &[String]) -> Result<()> {
    ensure!(
        data_labels.len() == design_labels.len(),
        "Data has {} replication columns but the design has {}",
        data_labels.len(),
        design_labels.len()
    );
    if let Some((i, (data, design))) = data_labels
        .iter()
        .zip(design_labels)
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(anyhow!(
            "Replication column {} is labeled '{}' in the data but '{}' in the design",
            i + 1,
            data,
            design
        ));
    }
    Ok(())
}

fn data_reader(mut reader: ChunkedMatrixReader, output: Sender<LabeledMatrix>) -> Result<()> {
    while let Some(chunk) = reader.next_chunk()? {
        debug!(
            "Read {} observations ({} so far)",
            chunk.row_labels.len(),
            reader.rows_read()
        );
        output
            .send(chunk)
            .map_err(|_| anyhow!("Result writer stopped before all chunks were read"))?;
    }
    Ok(())
}

pub fn run(
    data_path: &str,
    design_path: &str,
    output_file: &str,
    summary_file: Option<&str>,
    stat_config: &StatConfig,
    runtime_config: RuntimeConfig,
) -> Result<Summary> {
    let design = io::matrix::read_labeled_matrix(design_path)
        .with_context(|| format!("Error reading design matrix: {}", design_path))?;

    info!("Design shape {:?}", design.matrix.shape());
    info!("Design rows {:?}", design.row_labels);

    let plan = PairedCorrelation::new(stat_config, &design.matrix)?;
    let config = plan.config();
    info!(
        "Found {} units of observation, {} degrees of freedom",
        plan.n_units(),
        plan.df()
    );

    let critval = plan.critical_values()?;
    if let Some(critval) = critval {
        info!(
            "Critical value(s) for alpha = {}, tail = {}: {:?}",
            config.alpha,
            config.tail,
            critval.to_vec()
        );
    }

    let reader = ChunkedMatrixReader::open(data_path, runtime_config.chunksize)
        .with_context(|| format!("Error reading data matrix: {}", data_path))?;
    check_inputs(reader.col_labels(), &design.col_labels)?;

    let mut n_observations = 0;
    if config.compute_stat {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(runtime_config.num_threads)
            .build()?;

        let mut writer =
            ResultWriter::create(output_file, config.compute_prob, runtime_config.compress)
                .with_context(|| format!("Error creating output file: {}", output_file))?;

        let (sender, receiver) =
            crossbeam_channel::bounded::<LabeledMatrix>(runtime_config.capacity.max(1));
        let reader = std::thread::spawn(move || data_reader(reader, sender));

        for chunk in receiver.iter() {
            let results = pool.install(|| plan.compute(&chunk.matrix))?;
            writer
                .write_chunk(&chunk.row_labels, &results)
                .with_context(|| format!("Error writing results to file: {}", output_file))?;
            info!("Processed {} observations", writer.rows_written());
        }

        reader
            .join()
            .map_err(|_| anyhow!("Data reader thread panicked"))?
            .with_context(|| format!("Error reading data matrix: {}", data_path))?;

        n_observations = writer.finish()?;
        info!("Wrote {} observations to {}", n_observations, output_file);
    } else {
        warn!("Statistic not requested, no per-observation results written");
    }

    let summary = Summary {
        n_observations,
        n_units: plan.n_units(),
        df: plan.df(),
        tail: config.tail,
        alpha: config.alpha,
        correlation_type: config.correlation_type,
        critval,
    };

    if let Some(summary_file) = summary_file {
        info!("Writing summary to file: {}", summary_file);
        io::results::write_summary(&summary, summary_file)
            .with_context(|| format!("Error writing summary to file: {}", summary_file))?;
    }

    Ok(summary)
}

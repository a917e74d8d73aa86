use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{ensure, Context, Result};

use crate::stats::correlation::CorrelationType;
use crate::stats::paired::CorrelationT;
use crate::stats::tdist::{CriticalValues, Tail};

/// Output stream of a `ResultWriter`, optionally zstd-compressed.
enum Sink<W: Write> {
    Plain(W),
    Zstd(zstd::Encoder<'static, W>),
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Zstd(e) => e.flush(),
        }
    }
}

impl<W: Write> Sink<W> {
    /// Ends the zstd frame, if any, and hands back the underlying writer.
    fn finish(self) -> std::io::Result<W> {
        match self {
            Sink::Plain(w) => Ok(w),
            Sink::Zstd(e) => e.finish(),
        }
    }
}

/// Writes per-observation results as CSV, one chunk at a time, in the order
/// the chunks are handed over.
pub struct ResultWriter<W: Write = BufWriter<File>> {
    writer: csv::Writer<Sink<W>>,
    include_prob: bool,
    rows_written: usize,
}

impl ResultWriter {
    pub fn create(filename: &str, include_prob: bool, compress: bool) -> Result<Self> {
        let file = BufWriter::new(File::create(filename)?);
        ResultWriter::from_writer(file, include_prob, compress)
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn from_writer(inner: W, include_prob: bool, compress: bool) -> Result<Self> {
        let sink = if compress {
            Sink::Zstd(zstd::Encoder::new(inner, 0)?)
        } else {
            Sink::Plain(inner)
        };
        let mut writer = csv::Writer::from_writer(sink);

        let mut header = vec!["observation_id", "rho", "t_stat"];
        if include_prob {
            header.push("p_value");
        }
        writer.write_record(&header)?;

        Ok(ResultWriter {
            writer,
            include_prob,
            rows_written: 0,
        })
    }

    pub fn write_chunk(
        &mut self,
        observation_ids: &[String],
        results: &CorrelationT,
    ) -> Result<()> {
        let rho = results.rho.as_ref().context("Results do not contain rho")?;
        let stat = results.stat.as_ref().context("Results do not contain t-statistics")?;
        ensure!(
            rho.len() == observation_ids.len(),
            "Got {} results for {} observations",
            rho.len(),
            observation_ids.len()
        );

        let prob = if self.include_prob {
            Some(results.prob.as_ref().context("Results do not contain p-values")?)
        } else {
            None
        };

        for (i, id) in observation_ids.iter().enumerate() {
            let mut record = vec![id.clone(), rho[i].to_string(), stat[i].to_string()];
            if let Some(prob) = prob {
                record.push(prob[i].to_string());
            }
            self.writer.write_record(&record)?;
        }
        self.rows_written += observation_ids.len();

        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush all buffered rows, end the compressed frame and flush the
    /// underlying writer. Returns the number of rows written.
    pub fn finish(self) -> Result<usize> {
        let rows_written = self.rows_written;
        self.into_inner()?;
        Ok(rows_written)
    }

    pub fn into_inner(self) -> Result<W> {
        let sink = self
            .writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Error flushing results")?;
        let mut inner = sink.finish().context("Error finishing compressed output")?;
        inner.flush()?;
        Ok(inner)
    }
}

pub struct Summary {
    pub n_observations: usize,
    pub n_units: usize,
    pub df: usize,
    pub tail: Tail,
    pub alpha: f64,
    pub correlation_type: CorrelationType,
    pub critval: Option<CriticalValues>,
}

/// Write run-level values as `key,value` rows.
pub fn write_summary(summary: &Summary, filename: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;

    let mut rows: Vec<(&str, String)> = vec![
        ("n_observations", summary.n_observations.to_string()),
        ("n_units", summary.n_units.to_string()),
        ("df", summary.df.to_string()),
        ("tail", summary.tail.to_string()),
        ("alpha", summary.alpha.to_string()),
        ("correlation_type", summary.correlation_type.to_string()),
    ];
    if let Some(critval) = summary.critval {
        for value in critval.to_vec() {
            rows.push(("critval", value.to_string()));
        }
    }

    writer.write_record(["key", "value"])?;
    for (key, value) in rows {
        writer.write_record([key, value.as_str()])?;
    }

    writer.flush()?;
    Ok(())
}

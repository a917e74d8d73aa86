use std::fs::File;

use anyhow::Result;
use log::debug;
use nalgebra::DMatrix;

use crate::io::error::ReadError;

/// A numeric matrix with one label per row and per column. In a file the
/// first column holds the row labels and the header holds the column labels.
pub struct LabeledMatrix {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub matrix: DMatrix<f64>,
}

const DELIMITERS: [u8; 5] = [b',', b'\t', b';', b'|', b' '];

fn open_reader(filename: &str) -> Result<csv::Reader<File>> {
    let delimiter = match csv_sniffer::Sniffer::new().sniff_path(filename) {
        Ok(metadata) if DELIMITERS.contains(&metadata.dialect.delimiter) => {
            metadata.dialect.delimiter
        }
        Ok(metadata) => {
            debug!(
                "Ignoring unlikely delimiter {:?} detected in {}, assuming ','",
                metadata.dialect.delimiter as char, filename
            );
            b','
        }
        Err(e) => {
            debug!("Could not detect delimiter of {}, assuming ',': {}", filename, e);
            b','
        }
    };
    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(filename)?;
    Ok(reader)
}

fn parse_record(
    record: &csv::StringRecord,
    col_labels: &[String],
    row_labels: &mut Vec<String>,
    values: &mut Vec<f64>,
) -> Result<(), ReadError> {
    let row_label = record.get(0).unwrap_or_default().to_string();
    for (value, column) in record.iter().skip(1).zip(col_labels) {
        let parsed = value
            .trim()
            .parse::<f64>()
            .map_err(|_| ReadError::InvalidValue {
                row: row_label.clone(),
                column: column.clone(),
                value: value.to_string(),
            })?;
        values.push(parsed);
    }
    row_labels.push(row_label);
    Ok(())
}

fn read_col_labels(reader: &mut csv::Reader<File>) -> Result<Vec<String>, ReadError> {
    Ok(reader
        .headers()?
        .iter()
        .skip(1)
        .map(|x| x.to_string())
        .collect())
}

/// Read a whole matrix from a file
pub fn read_labeled_matrix(filename: &str) -> Result<LabeledMatrix> {
    let mut reader = open_reader(filename)?;
    let col_labels = read_col_labels(&mut reader)?;

    let mut row_labels = Vec::new();
    let mut values = Vec::new();
    for result in reader.records() {
        let record = result.map_err(ReadError::from)?;
        parse_record(&record, &col_labels, &mut row_labels, &mut values)?;
    }

    let matrix = DMatrix::from_row_slice(row_labels.len(), col_labels.len(), &values);

    Ok(LabeledMatrix {
        row_labels,
        col_labels,
        matrix,
    })
}

/// Streams a matrix file in blocks of at most `chunksize` rows.
pub struct ChunkedMatrixReader {
    reader: csv::Reader<File>,
    col_labels: Vec<String>,
    chunksize: usize,
    rows_read: usize,
}

impl ChunkedMatrixReader {
    pub fn open(filename: &str, chunksize: usize) -> Result<Self> {
        let mut reader = open_reader(filename)?;
        let col_labels = read_col_labels(&mut reader)?;
        Ok(ChunkedMatrixReader {
            reader,
            col_labels,
            chunksize: chunksize.max(1),
            rows_read: 0,
        })
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// The next block of rows, or `None` once the file is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<LabeledMatrix>> {
        let mut row_labels = Vec::with_capacity(self.chunksize);
        let mut values = Vec::with_capacity(self.chunksize * self.col_labels.len());
        let mut record = csv::StringRecord::new();

        while row_labels.len() < self.chunksize
            && self.reader.read_record(&mut record).map_err(ReadError::from)?
        {
            parse_record(&record, &self.col_labels, &mut row_labels, &mut values)?;
        }

        if row_labels.is_empty() {
            return Ok(None);
        }
        self.rows_read += row_labels.len();

        let matrix = DMatrix::from_row_slice(row_labels.len(), self.col_labels.len(), &values);
        Ok(Some(LabeledMatrix {
            row_labels,
            col_labels: self.col_labels.clone(),
            matrix,
        }))
    }
}

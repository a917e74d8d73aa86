use std::fmt;

#[derive(Debug)]
pub enum ReadError {
    InvalidValue {
        row: String,
        column: String,
        value: String,
    },
    CsvError(csv::Error),
}

impl std::error::Error for ReadError {}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReadError::InvalidValue {
                ref row,
                ref column,
                ref value,
            } => write!(
                f,
                "Value '{}' in row '{}', column '{}' is not a number",
                value, row, column
            ),
            ReadError::CsvError(ref e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl From<csv::Error> for ReadError {
    fn from(e: csv::Error) -> Self {
        ReadError::CsvError(e)
    }
}

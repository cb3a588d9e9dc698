use thiserror::Error;

use crate::constants::Serial;

#[derive(Error, Debug)]
pub enum SmoldynError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Time lag {lag} is bigger than the trajectory allows (length {len})")]
    LagTooLarge { lag: usize, len: usize },

    #[error("Input contained no data: {0}")]
    EmptyInput(String),

    #[error(
        "Not a fixed grid: serial {serial} has {found} timepoints, expected {expected}"
    )]
    IrregularGrid {
        serial: Serial,
        expected: usize,
        found: usize,
    },

    #[error("Row at line {line} has {found} fields, at least {expected} are required")]
    MalformedRow {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("Invalid value {value:?} in column {column} at line {line}")]
    InvalidField {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not enough data points for the fit: {found} given, {required} required")]
    NotEnoughPoints { required: usize, found: usize },

    #[error("Curve fit failed: {0}")]
    FitFailed(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl PartialEq for SmoldynError {
    fn eq(&self, other: &Self) -> bool {
        use SmoldynError::*;
        match (self, other) {
            (ShapeMismatch(a), ShapeMismatch(b)) => a == b,
            (TypeMismatch(a), TypeMismatch(b)) => a == b,
            (
                LagTooLarge { lag: l1, len: n1 },
                LagTooLarge { lag: l2, len: n2 },
            ) => l1 == l2 && n1 == n2,
            (EmptyInput(a), EmptyInput(b)) => a == b,
            (
                IrregularGrid {
                    serial: s1,
                    expected: e1,
                    found: f1,
                },
                IrregularGrid {
                    serial: s2,
                    expected: e2,
                    found: f2,
                },
            ) => s1 == s2 && e1 == e2 && f1 == f2,
            (
                MalformedRow {
                    line: l1,
                    found: f1,
                    expected: e1,
                },
                MalformedRow {
                    line: l2,
                    found: f2,
                    expected: e2,
                },
            ) => l1 == l2 && f1 == f2 && e1 == e2,
            (
                InvalidField {
                    line: l1,
                    column: c1,
                    value: v1,
                },
                InvalidField {
                    line: l2,
                    column: c2,
                    value: v2,
                },
            ) => l1 == l2 && c1 == c2 && v1 == v2,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (
                NotEnoughPoints {
                    required: r1,
                    found: f1,
                },
                NotEnoughPoints {
                    required: r2,
                    found: f2,
                },
            ) => r1 == r2 && f1 == f2,
            (FitFailed(a), FitFailed(b)) => a == b,

            // Wrapped foreign errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}

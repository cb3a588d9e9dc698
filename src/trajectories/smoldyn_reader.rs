//! # Smoldyn position-log reader
//!
//! Parse the delimiter-separated position logs written by Smoldyn (`listmols2`-style
//! output) into a [`TrajectorySet`], assuming every particle was observed at the same
//! number of timepoints (a **fixed grid**).
//!
//! ## Row layout
//! -----------------
//! One observation per row, no header, at least six numeric fields:
//!
//! ```text
//! time, speciesCode, <unused>, x, y, particleSerial
//! ```
//!
//! Extra fields are ignored and blank lines are skipped. A whitespace delimiter (`b' '` or
//! `b'\t'`) splits on runs of whitespace; any other delimiter goes through the `csv` reader.
//!
//! ## Pipeline
//! -----------------
//! 1. Read all rows; zero rows fail with [`SmoldynError::EmptyInput`].
//! 2. Stable sort by serial, then by time within a serial.
//! 3. Group by serial; every group must have the size of the first one, else
//!    [`SmoldynError::IrregularGrid`].
//! 4. Build one [`Trajectory`] per group, unwrapping `x` and `y` with
//!    [`Trajectory::unwrap_periodic_boundaries`] when **both** bounds are configured.
//!
//! The returned set is in ascending serial order. Large-jump diagnostics of every
//! trajectory travel with it in the [`Diagnosed`] wrapper.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use smoldyn_msd::trajectories::smoldyn_reader::SmoldynParser;
//!
//! # fn run() -> Result<(), smoldyn_msd::smoldyn_errors::SmoldynError> {
//! let parser = SmoldynParser::builder("molecules.csv")
//!     .bounds(0.0, 12.8)
//!     .build()?;
//! let parsed = parser.parse_fixed_grid()?;
//! for diagnostic in parsed.diagnostics() {
//!     eprintln!("{diagnostic}");
//! }
//! let trajectories = parsed.into_value();
//! # Ok(()) }
//! ```
use std::{
    cmp::Ordering::Greater,
    fmt,
    fs::File,
    io::{BufReader, Read},
};

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;

use super::{trajectory::Trajectory, trajectory_set::TrajectorySet};
use crate::{
    constants::{
        Position, Serial, SpeciesCode, Time, COL_SERIAL, COL_SPECIES, COL_TIME, COL_X, COL_Y,
        DEFAULT_DELIMITER, DEFAULT_JUMP_FRACTION, MIN_FIELDS,
    },
    diagnostics::{Diagnosed, DiagnosticSink},
    smoldyn_errors::SmoldynError,
};

/// Storage precision applied to parsed floating-point columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatPrecision {
    /// Round values through `f32`.
    Single,
    #[default]
    Double,
}

impl FloatPrecision {
    #[inline]
    fn apply(self, value: f64) -> f64 {
        match self {
            FloatPrecision::Single => f64::from(value as f32),
            FloatPrecision::Double => value,
        }
    }
}

impl fmt::Display for FloatPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatPrecision::Single => write!(f, "f32"),
            FloatPrecision::Double => write!(f, "f64"),
        }
    }
}

/// Reader configuration for Smoldyn position logs.
///
/// Fields
/// -----------------
/// * `path` – file to read.
/// * `delimiter` – column delimiter (default `,`).
/// * `min_val`, `max_val` – bounds of the periodic domain; unwrapping is applied only when
///   both are set.
/// * `jump_fraction` – fraction of the largest absolute axis value above which a single step
///   is reported as a large jump (default 0.5).
/// * `time_precision`, `position_precision` – storage precision of the time and x/y columns.
///
/// Species codes are stored as `u16` and serials as `u32`.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoldynParser {
    pub path: Utf8PathBuf,
    pub delimiter: u8,
    pub min_val: Option<f64>,
    pub max_val: Option<f64>,
    pub jump_fraction: f64,
    pub time_precision: FloatPrecision,
    pub position_precision: FloatPrecision,
}

/// One parsed observation row.
#[derive(Debug, Clone, Copy)]
struct SmoldynRow {
    time: Time,
    species: SpeciesCode,
    x: Position,
    y: Position,
    serial: Serial,
}

impl SmoldynParser {
    /// Parser with default settings for `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        SmoldynParser {
            path: path.into(),
            delimiter: DEFAULT_DELIMITER,
            min_val: None,
            max_val: None,
            jump_fraction: DEFAULT_JUMP_FRACTION,
            time_precision: FloatPrecision::default(),
            position_precision: FloatPrecision::default(),
        }
    }

    /// Fluent, validating builder for a parser reading `path`.
    pub fn builder(path: impl Into<Utf8PathBuf>) -> SmoldynParserBuilder {
        SmoldynParserBuilder::new(path)
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Periodic domain, if both bounds are configured.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.min_val.zip(self.max_val)
    }

    /// Read [`Self::path`] and build one trajectory per particle.
    ///
    /// Return
    /// ----------
    /// * The trajectories in ascending serial order, with their large-jump diagnostics.
    /// * [`SmoldynError::EmptyInput`] if the file has no rows,
    ///   [`SmoldynError::IrregularGrid`] if particles have different numbers of timepoints,
    ///   [`SmoldynError::MalformedRow`] / [`SmoldynError::InvalidField`] on bad rows,
    ///   [`SmoldynError::IoError`] / [`SmoldynError::CsvError`] on read failures.
    pub fn parse_fixed_grid(&self) -> Result<Diagnosed<TrajectorySet>, SmoldynError> {
        let file = File::open(&self.path)?;
        self.parse_fixed_grid_from_reader(BufReader::new(file))
    }

    /// Same as [`Self::parse_fixed_grid`] for any byte source.
    pub fn parse_fixed_grid_from_reader<R: Read>(
        &self,
        reader: R,
    ) -> Result<Diagnosed<TrajectorySet>, SmoldynError> {
        let mut rows = self.read_rows(reader)?;
        if rows.is_empty() {
            return Err(SmoldynError::EmptyInput(format!(
                "{} contains no rows",
                self.path
            )));
        }

        // Serial dominates, time breaks ties; sort_by is stable.
        rows.sort_by(|a, b| {
            a.serial
                .cmp(&b.serial)
                .then_with(|| a.time.total_cmp(&b.time))
        });

        let groups: Vec<(Serial, Vec<SmoldynRow>)> = rows
            .into_iter()
            .chunk_by(|row| row.serial)
            .into_iter()
            .map(|(serial, group)| (serial, group.collect()))
            .collect();

        let expected = groups.first().map_or(0, |(_, group)| group.len());
        if let Some((serial, group)) = groups.iter().find(|(_, group)| group.len() != expected) {
            return Err(SmoldynError::IrregularGrid {
                serial: *serial,
                expected,
                found: group.len(),
            });
        }

        let mut sink = DiagnosticSink::new();
        let mut trajectories = Vec::with_capacity(groups.len());
        for (serial, group) in groups {
            let trajectory = self.build_trajectory(serial, &group)?;
            for diagnostic in trajectory.jump_diagnostics(self.jump_fraction) {
                sink.record(diagnostic);
            }
            trajectories.push(trajectory);
        }

        Ok(sink.finish(TrajectorySet::new(trajectories)))
    }

    fn build_trajectory(
        &self,
        serial: Serial,
        group: &[SmoldynRow],
    ) -> Result<Trajectory, SmoldynError> {
        let t = group.iter().map(|r| r.time).collect();
        let species = group.iter().map(|r| r.species).collect();
        let mut x: Vec<Position> = group.iter().map(|r| r.x).collect();
        let mut y: Vec<Position> = group.iter().map(|r| r.y).collect();

        if let Some((min_val, max_val)) = self.bounds() {
            x = Trajectory::unwrap_periodic_boundaries(&x, min_val, max_val);
            y = Trajectory::unwrap_periodic_boundaries(&y, min_val, max_val);
        }

        Trajectory::validated(serial, t, x, y, species)
    }

    fn read_rows<R: Read>(&self, reader: R) -> Result<Vec<SmoldynRow>, SmoldynError> {
        if matches!(self.delimiter, b' ' | b'\t') {
            self.read_whitespace_rows(reader)
        } else {
            self.read_delimited_rows(reader)
        }
    }

    fn read_delimited_rows<R: Read>(&self, reader: R) -> Result<Vec<SmoldynRow>, SmoldynError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            let line = record
                .position()
                .map_or(index as u64 + 1, |position| position.line());
            let fields: Vec<&str> = record.iter().collect();
            rows.push(self.parse_row(line, &fields)?);
        }
        Ok(rows)
    }

    fn read_whitespace_rows<R: Read>(
        &self,
        mut reader: R,
    ) -> Result<Vec<SmoldynRow>, SmoldynError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                self.parse_row(index as u64 + 1, &fields)
            })
            .collect()
    }

    fn parse_row(&self, line: u64, fields: &[&str]) -> Result<SmoldynRow, SmoldynError> {
        if fields.len() < MIN_FIELDS {
            return Err(SmoldynError::MalformedRow {
                line,
                found: fields.len(),
                expected: MIN_FIELDS,
            });
        }

        let number = |column: usize| -> Result<f64, SmoldynError> {
            let raw = fields[column];
            raw.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| SmoldynError::InvalidField {
                    line,
                    column,
                    value: raw.to_string(),
                })
        };
        let unsigned = |column: usize, max: f64| -> Result<u64, SmoldynError> {
            let value = number(column)?;
            if value < 0.0 || value.fract() != 0.0 || value > max {
                return Err(SmoldynError::InvalidField {
                    line,
                    column,
                    value: fields[column].to_string(),
                });
            }
            Ok(value as u64)
        };

        Ok(SmoldynRow {
            time: self.time_precision.apply(number(COL_TIME)?),
            species: unsigned(COL_SPECIES, f64::from(SpeciesCode::MAX))? as SpeciesCode,
            x: self.position_precision.apply(number(COL_X)?),
            y: self.position_precision.apply(number(COL_Y)?),
            serial: unsigned(COL_SERIAL, f64::from(Serial::MAX))? as Serial,
        })
    }
}

/// Builder for [`SmoldynParser`], with validation.
#[derive(Debug, Clone)]
pub struct SmoldynParserBuilder {
    parser: SmoldynParser,
}

impl SmoldynParserBuilder {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            parser: SmoldynParser::new(path),
        }
    }

    pub fn delimiter(mut self, v: u8) -> Self {
        self.parser.delimiter = v;
        self
    }
    pub fn min_val(mut self, v: f64) -> Self {
        self.parser.min_val = Some(v);
        self
    }
    pub fn max_val(mut self, v: f64) -> Self {
        self.parser.max_val = Some(v);
        self
    }
    /// Set both bounds of the periodic domain at once.
    pub fn bounds(self, min_val: f64, max_val: f64) -> Self {
        self.min_val(min_val).max_val(max_val)
    }
    pub fn jump_fraction(mut self, v: f64) -> Self {
        self.parser.jump_fraction = v;
        self
    }
    pub fn time_precision(mut self, v: FloatPrecision) -> Self {
        self.parser.time_precision = v;
        self
    }
    pub fn position_precision(mut self, v: FloatPrecision) -> Self {
        self.parser.position_precision = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `delimiter` must be an ASCII byte.
    /// * `jump_fraction` must be finite and `> 0`.
    /// * bounds, when given, must be finite; with both given, `min_val < max_val`.
    ///
    /// A single bound is accepted but does not activate unwrapping.
    pub fn build(self) -> Result<SmoldynParser, SmoldynError> {
        let p = &self.parser;

        if !p.delimiter.is_ascii() {
            return Err(SmoldynError::InvalidParameter(
                "delimiter must be an ASCII character".into(),
            ));
        }
        if matches!(p.delimiter, b'\n' | b'\r' | 0x0B | 0x0C) {
            return Err(SmoldynError::InvalidParameter(
                "delimiter must not be a line terminator".into(),
            ));
        }
        if !(Self::gt0(p.jump_fraction) && p.jump_fraction.is_finite()) {
            return Err(SmoldynError::InvalidParameter(
                "jump_fraction must be finite and > 0".into(),
            ));
        }
        if p.min_val.iter().chain(p.max_val.iter()).any(|b| !b.is_finite()) {
            return Err(SmoldynError::InvalidParameter(
                "periodic bounds must be finite".into(),
            ));
        }
        if let Some((min_val, max_val)) = p.bounds() {
            if max_val.partial_cmp(&min_val) != Some(Greater) {
                return Err(SmoldynError::InvalidParameter(
                    "require min_val < max_val".into(),
                ));
            }
        }

        Ok(self.parser)
    }
}

impl fmt::Display for SmoldynParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<f64>| b.map_or_else(|| "-".to_string(), |v| format!("{v}"));
        if f.alternate() {
            writeln!(f, "Smoldyn reader")?;
            writeln!(f, "--------------")?;
            writeln!(f, "  path               = {}", self.path)?;
            writeln!(f, "  delimiter          = {:?}", self.delimiter as char)?;
            writeln!(f, "  min_val            = {}", bound(self.min_val))?;
            writeln!(f, "  max_val            = {}", bound(self.max_val))?;
            writeln!(f, "  jump_fraction      = {:.3}", self.jump_fraction)?;
            writeln!(f, "  time_precision     = {}", self.time_precision)?;
            write!(f, "  position_precision = {}", self.position_precision)
        } else {
            write!(
                f,
                "SmoldynParser(path={}, delimiter={:?}, bounds=[{}, {}], jump_fraction={:.2})",
                self.path,
                self.delimiter as char,
                bound(self.min_val),
                bound(self.max_val),
                self.jump_fraction,
            )
        }
    }
}

//! # CSV export
//!
//! Hand computed arrays over to plotting or downstream analysis as headed CSV tables.
//!
//! * [`write_msd_curve`] – columns `time,msd`.
//! * [`write_diffusion_estimates`] – columns `key_kind,key,diffusion_coefficient`, one row per
//!   particle in map order.
//!
//! Both accept any [`std::io::Write`]; the `*_to_path` variants create (or truncate) a file.
use std::{fs::File, io::Write};

use camino::Utf8Path;
use itertools::Itertools;
use serde::Serialize;

use crate::{smoldyn_errors::SmoldynError, workflows::DiffusionEstimates};

#[derive(Debug, Serialize)]
struct MsdRow {
    time: f64,
    msd: f64,
}

#[derive(Debug, Serialize)]
struct DiffusionRow {
    key_kind: &'static str,
    key: u64,
    diffusion_coefficient: f64,
}

/// Write an MSD curve as `time,msd` rows.
///
/// Return
/// ----------
/// * [`SmoldynError::ShapeMismatch`] if `times` and `msd` differ in length; nothing is written.
/// * [`SmoldynError::CsvError`] / [`SmoldynError::IoError`] on write failures.
pub fn write_msd_curve<W: Write>(
    writer: W,
    times: &[f64],
    msd: &[f64],
) -> Result<(), SmoldynError> {
    if times.len() != msd.len() {
        return Err(SmoldynError::ShapeMismatch(format!(
            "{} times for {} MSD values",
            times.len(),
            msd.len()
        )));
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    if times.is_empty() {
        csv_writer.write_record(["time", "msd"])?;
    }
    for (&time, &msd) in times.iter().zip_eq(msd) {
        csv_writer.serialize(MsdRow { time, msd })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// [`write_msd_curve`] into a file at `path`.
pub fn write_msd_curve_to_path(
    path: &Utf8Path,
    times: &[f64],
    msd: &[f64],
) -> Result<(), SmoldynError> {
    write_msd_curve(File::create(path)?, times, msd)
}

/// Write one `key_kind,key,diffusion_coefficient` row per particle.
pub fn write_diffusion_estimates<W: Write>(
    writer: W,
    estimates: &DiffusionEstimates,
) -> Result<(), SmoldynError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if estimates.is_empty() {
        csv_writer.write_record(["key_kind", "key", "diffusion_coefficient"])?;
    }
    for (key, &diffusion_coefficient) in estimates {
        csv_writer.serialize(DiffusionRow {
            key_kind: key.kind(),
            key: key.value(),
            diffusion_coefficient,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// [`write_diffusion_estimates`] into a file at `path`.
pub fn write_diffusion_estimates_to_path(
    path: &Utf8Path,
    estimates: &DiffusionEstimates,
) -> Result<(), SmoldynError> {
    write_diffusion_estimates(File::create(path)?, estimates)
}

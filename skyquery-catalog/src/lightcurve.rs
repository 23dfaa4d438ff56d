//! Per-filter light curves from PS1 single-epoch detections.
//!
//! The DR2 `detection` table has one row per detection with `obsTime`
//! (MJD), `psfFlux` and `psfFluxErr` (Jy) and a numeric `filterID`. A
//! [`LightCurve`] is the time-ordered series of AB magnitudes in one filter.

use crate::ps1::{CatalogTable, Ps1Query, Release};
use crate::ArchiveClient;
use serde::Serialize;
use skyquery_core::photometry::flux_err_to_mag_err;
use skyquery_core::{flux_to_ab_mag, phase_fold, Column, Ps1Filter, QueryResult, Table};

pub const TIME_COLUMN: &str = "obsTime";
pub const FLUX_COLUMN: &str = "psfFlux";
pub const FLUX_ERR_COLUMN: &str = "psfFluxErr";
pub const FILTER_ID_COLUMN: &str = "filterID";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightCurvePoint {
    /// Observation time, MJD.
    pub time: f64,
    pub mag: f64,
    pub mag_err: Option<f64>,
    pub flux_jy: f64,
    /// Set by [`LightCurve::fold`].
    pub phase: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightCurve {
    pub filter: Ps1Filter,
    pub points: Vec<LightCurvePoint>,
}

impl LightCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn mags(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mag).collect()
    }

    /// Fill in the phase of every point for a known `period` (days).
    pub fn fold(&mut self, period: f64, epoch: f64) -> QueryResult<()> {
        let phases = phase_fold(&self.times(), period, epoch)?;
        for (point, phase) in self.points.iter_mut().zip(phases) {
            point.phase = Some(phase);
        }
        Ok(())
    }

    /// Magnitude span, brightest to faintest.
    pub fn amplitude(&self) -> Option<f64> {
        let mut mags = self.points.iter().map(|p| p.mag);
        let first = mags.next()?;
        let (min, max) = mags.fold((first, first), |(lo, hi), m| (lo.min(m), hi.max(m)));
        Some(max - min)
    }
}

/// Split a detection table into light curves, one per filter present.
///
/// Curves come out in g, r, i, z, y order with points sorted by time. Rows
/// without a time, without a usable (positive) flux, or with an unknown
/// filter id are skipped.
///
/// # Errors
/// [`QueryError::UnknownColumns`](skyquery_core::QueryError::UnknownColumns)
/// if a required column is missing, or a parse error for non-numeric cells.
pub fn light_curves(table: &Table) -> QueryResult<Vec<LightCurve>> {
    let times = table.column_f64(TIME_COLUMN)?;
    let fluxes = table.column_f64(FLUX_COLUMN)?;
    let filter_ids = table.column_f64(FILTER_ID_COLUMN)?;
    let flux_errs = match table.column_index(FLUX_ERR_COLUMN) {
        Some(_) => table.column_f64(FLUX_ERR_COLUMN)?,
        None => vec![None; table.num_rows()],
    };

    let mut curves: Vec<LightCurve> = Ps1Filter::ALL
        .iter()
        .map(|&filter| LightCurve {
            filter,
            points: Vec::new(),
        })
        .collect();

    let mut skipped = 0usize;
    for row in 0..table.num_rows() {
        let filter = filter_ids[row].and_then(filter_from_id);
        let point = match (times[row], fluxes[row], filter) {
            (Some(time), Some(flux_jy), Some(filter)) => flux_to_ab_mag(flux_jy).map(|mag| {
                (
                    filter,
                    LightCurvePoint {
                        time,
                        mag,
                        mag_err: flux_errs[row].and_then(|err| flux_err_to_mag_err(flux_jy, err)),
                        flux_jy,
                        phase: None,
                    },
                )
            }),
            _ => None,
        };
        match point.and_then(|(filter, point)| {
            curves.iter_mut().find(|c| c.filter == filter).map(|c| (c, point))
        }) {
            Some((curve, point)) => curve.points.push(point),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!("skipped {} of {} detections", skipped, table.num_rows());
    }

    curves.retain(|c| !c.is_empty());
    for curve in &mut curves {
        curve
            .points
            .sort_by(|a, b| a.time.total_cmp(&b.time));
    }
    Ok(curves)
}

/// Append a `filter` column holding the band letter for each `filterID`.
///
/// Unknown ids get an empty cell.
pub fn add_filter_column(table: &mut Table) -> QueryResult<()> {
    let letters = table
        .column_f64(FILTER_ID_COLUMN)?
        .into_iter()
        .map(|id| {
            id.and_then(filter_from_id)
                .map(|f| f.letter().to_string())
                .unwrap_or_default()
        })
        .collect();
    table.add_column(Column::typed("filter", "char"), letters)
}

/// Only whole-number ids name a filter; `1.9` is not `g`.
fn filter_from_id(id: f64) -> Option<Ps1Filter> {
    if id.fract() != 0.0 {
        return None;
    }
    Ps1Filter::from_filter_id(id as i64)
}

impl ArchiveClient {
    /// All DR2 detections of one object, sorted by observation time.
    pub fn detections(&self, obj_id: &str) -> QueryResult<Table> {
        let query = Ps1Query::new(CatalogTable::Detection, Release::Dr2).constraint("objID", obj_id);
        let mut table = self.search_table(&query)?;
        table.sort_by_f64(TIME_COLUMN)?;
        log::debug!("{} detections for objID {}", table.num_rows(), obj_id);
        Ok(table)
    }

    /// Fetch the detections of one object and build its light curves.
    pub fn light_curves(&self, obj_id: &str) -> QueryResult<Vec<LightCurve>> {
        light_curves(&self.detections(obj_id)?)
    }
}

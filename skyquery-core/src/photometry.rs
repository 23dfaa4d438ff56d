//! Photometric conversions for Pan-STARRS measurements.
//!
//! PS1 catalog fluxes are in Janskys. AB magnitudes follow from
//! `m = -2.5 log10(f / 3631 Jy) = -2.5 log10(f) + 8.90`.

use crate::errors::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AB zero point for fluxes expressed in Janskys.
pub const AB_ZERO_POINT_JY: f64 = 8.90;

/// Convert a flux in Janskys to an AB magnitude.
///
/// Returns `None` for non-positive or non-finite flux; the detection tables
/// use those values for missing measurements.
pub fn flux_to_ab_mag(flux_jy: f64) -> Option<f64> {
    if !flux_jy.is_finite() || flux_jy <= 0.0 {
        return None;
    }
    Some(-2.5 * flux_jy.log10() + AB_ZERO_POINT_JY)
}

/// Convert an AB magnitude back to a flux in Janskys.
pub fn ab_mag_to_flux(mag: f64) -> f64 {
    10f64.powf((AB_ZERO_POINT_JY - mag) / 2.5)
}

/// Magnitude error from a flux and its uncertainty (both in Janskys).
pub fn flux_err_to_mag_err(flux_jy: f64, flux_err_jy: f64) -> Option<f64> {
    if !flux_jy.is_finite() || flux_jy <= 0.0 || !flux_err_jy.is_finite() {
        return None;
    }
    Some(2.5 / std::f64::consts::LN_10 * (flux_err_jy / flux_jy).abs())
}

/// Fold observation times on a known period.
///
/// Each phase is `((t - epoch) / period) mod 1`, always in `[0, 1)`, including
/// for times before `epoch`.
///
/// # Errors
/// Returns [`QueryError::InvalidParameter`] if `period` is not a positive
/// finite number.
pub fn phase_fold(times: &[f64], period: f64, epoch: f64) -> QueryResult<Vec<f64>> {
    if !period.is_finite() || period <= 0.0 {
        return Err(QueryError::invalid_parameter(
            "period",
            &format!("must be positive, got {}", period),
        ));
    }
    Ok(times
        .iter()
        .map(|&t| {
            let phase = ((t - epoch) / period).rem_euclid(1.0);
            // rem_euclid can return exactly 1.0 through rounding of tiny negatives
            if phase >= 1.0 {
                0.0
            } else {
                phase
            }
        })
        .collect())
}

/// Pan-STARRS photometric bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ps1Filter {
    G,
    R,
    I,
    Z,
    Y,
}

/// Filter letters ordered from red to blue.
const RED_TO_BLUE: &str = "yzirg";

impl Ps1Filter {
    pub const ALL: [Ps1Filter; 5] = [Self::G, Self::R, Self::I, Self::Z, Self::Y];

    /// Map a catalog `filterID` (1 = g … 5 = y) to its band.
    pub fn from_filter_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::G),
            2 => Some(Self::R),
            3 => Some(Self::I),
            4 => Some(Self::Z),
            5 => Some(Self::Y),
            _ => None,
        }
    }

    pub fn filter_id(self) -> i64 {
        match self {
            Self::G => 1,
            Self::R => 2,
            Self::I => 3,
            Self::Z => 4,
            Self::Y => 5,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::G => 'g',
            Self::R => 'r',
            Self::I => 'i',
            Self::Z => 'z',
            Self::Y => 'y',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'g' => Some(Self::G),
            'r' => Some(Self::R),
            'i' => Some(Self::I),
            'z' => Some(Self::Z),
            'y' => Some(Self::Y),
            _ => None,
        }
    }

    /// Position in red-to-blue order (`y` = 0 … `g` = 4).
    pub fn red_to_blue_rank(self) -> usize {
        RED_TO_BLUE.find(self.letter()).unwrap_or(RED_TO_BLUE.len())
    }

    /// Parse a filter string such as `"grizy"` or `"gri"`.
    ///
    /// Duplicates are dropped, order of first appearance is kept.
    pub fn parse_list(s: &str) -> QueryResult<Vec<Ps1Filter>> {
        let mut out = Vec::new();
        for c in s.chars().filter(|c| !c.is_whitespace() && *c != ',') {
            let f = Self::from_letter(c).ok_or_else(|| {
                QueryError::invalid_parameter(
                    "filters",
                    &format!("'{}' is not a PS1 filter (expected g, r, i, z, y)", c),
                )
            })?;
            if !out.contains(&f) {
                out.push(f);
            }
        }
        if out.is_empty() {
            return Err(QueryError::invalid_parameter("filters", "no filters given"));
        }
        Ok(out)
    }

    /// Join filters back into the compact form the image services expect.
    pub fn join(filters: &[Ps1Filter]) -> String {
        filters.iter().map(|f| f.letter()).collect()
    }
}

impl fmt::Display for Ps1Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Ps1Filter {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c),
            _ => None,
        }
        .ok_or_else(|| {
            QueryError::invalid_parameter("filter", &format!("'{}' is not a PS1 filter", s))
        })
    }
}

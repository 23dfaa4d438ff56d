//! Sky positions and search cones.
//!
//! Archive services take coordinates as plain decimal degrees and do no
//! range checking of their own, so neither does this module: a [`Position`]
//! is just two numbers. What it adds is parsing of the forms people type
//! on the command line.
//!
//! ```text
//! Decimal degrees:  187.70593   -5.375
//! Colon-separated:  12:30:49.42  +12:23:28.0
//! Letter markers:   12h30m49.42s  +12d23m28s
//! ```
//!
//! Right ascension strings in sexagesimal form are read as hours; declination
//! strings as degrees. Signs are only valid at the beginning.

use crate::errors::{QueryError, QueryResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ICRS sky position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl Position {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }

    /// Parse RA and Dec from user input.
    ///
    /// RA accepts decimal degrees or sexagesimal hours; Dec accepts decimal
    /// or sexagesimal degrees.
    pub fn parse(ra: &str, dec: &str) -> QueryResult<Self> {
        Ok(Self {
            ra_deg: parse_ra(ra)?,
            dec_deg: parse_dec(dec)?,
        })
    }

    /// Great-circle distance to `other`, in degrees.
    pub fn separation_deg(&self, other: &Position) -> f64 {
        angular_separation_deg(self.ra_deg, self.dec_deg, other.ra_deg, other.dec_deg)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RA={:.6}° Dec={:+.6}°", self.ra_deg, self.dec_deg)
    }
}

/// A cone search region: center plus radius, all in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cone {
    pub center: Position,
    pub radius_deg: f64,
}

impl Cone {
    pub fn new(ra_deg: f64, dec_deg: f64, radius_deg: f64) -> Self {
        Self {
            center: Position::new(ra_deg, dec_deg),
            radius_deg,
        }
    }

    pub fn around(center: Position, radius_deg: f64) -> Self {
        Self { center, radius_deg }
    }

    /// Whether `p` lies inside the cone (boundary included).
    pub fn contains(&self, p: &Position) -> bool {
        self.center.separation_deg(p) <= self.radius_deg
    }
}

/// Angular separation between two points, in degrees.
///
/// Uses the haversine form, which stays accurate for small separations.
pub fn angular_separation_deg(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (ra1, dec1) = (ra1.to_radians(), dec1.to_radians());
    let (ra2, dec2) = (ra2.to_radians(), dec2.to_radians());

    let sin_ddec = ((dec2 - dec1) / 2.0).sin();
    let sin_dra = ((ra2 - ra1) / 2.0).sin();
    let h = sin_ddec * sin_ddec + dec1.cos() * dec2.cos() * sin_dra * sin_dra;

    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

static SEXAGESIMAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        ^\s*
        ([+-])?                      # optional sign
        (\d{1,3})                    # hours or degrees
        (?:\s*[:hHdD]\s*|\s+)        # separator
        (\d{1,2})                    # minutes
        (?:\s*[:mM']\s*|\s+)         # separator
        (\d{1,2}(?:\.\d*)?)          # seconds with optional fraction
        \s*[sS"]?
        \s*$
        "#,
    )
    .unwrap()
});

/// Parse a right ascension: decimal degrees, or sexagesimal hours.
pub fn parse_ra(s: &str) -> QueryResult<f64> {
    if let Some(hours) = parse_sexagesimal(s) {
        return Ok(hours? * 15.0);
    }
    parse_decimal("ra", s)
}

/// Parse a declination: decimal or sexagesimal degrees.
pub fn parse_dec(s: &str) -> QueryResult<f64> {
    if let Some(degrees) = parse_sexagesimal(s) {
        return degrees;
    }
    parse_decimal("dec", s)
}

fn parse_decimal(name: &str, s: &str) -> QueryResult<f64> {
    let value: f64 = s.trim().parse().map_err(|_| {
        QueryError::invalid_parameter(name, &format!("Cannot parse '{}' as a coordinate", s))
    })?;
    if !value.is_finite() {
        return Err(QueryError::invalid_parameter(
            name,
            &format!("'{}' is not a finite number", s),
        ));
    }
    Ok(value)
}

/// Returns `None` when `s` is not sexagesimal at all.
fn parse_sexagesimal(s: &str) -> Option<QueryResult<f64>> {
    let caps = SEXAGESIMAL_REGEX.captures(s)?;
    let sign = match caps.get(1).map(|m| m.as_str()) {
        Some("-") => -1.0,
        _ => 1.0,
    };

    let field = |i: usize| -> QueryResult<f64> {
        caps[i].parse::<f64>().map_err(|_| {
            QueryError::invalid_parameter("coordinate", &format!("Bad field in '{}'", s))
        })
    };

    Some((|| -> QueryResult<f64> {
        let whole = field(2)?;
        let minutes = field(3)?;
        let seconds = field(4)?;
        if minutes >= 60.0 || seconds >= 60.0 {
            return Err(QueryError::invalid_parameter(
                "coordinate",
                &format!("Minutes and seconds must be below 60 in '{}'", s),
            ));
        }
        Ok(sign * (whole + minutes / 60.0 + seconds / 3600.0))
    })())
}

/// Format degrees of RA as `HHhMMmSS.ssss s`.
pub fn format_hms(ra_deg: f64, frac_digits: usize) -> String {
    let (_, h, m, s) = split_sexagesimal(ra_deg / 15.0, frac_digits);
    format!("{:02}h{:02}m{:0width$.prec$}s", h, m, s, width = frac_digits + 3, prec = frac_digits)
}

/// Format degrees of Dec as `±DD°MM'SS.ss"`.
pub fn format_dms(dec_deg: f64, frac_digits: usize) -> String {
    let (negative, d, m, s) = split_sexagesimal(dec_deg, frac_digits);
    let sign = if negative { '-' } else { '+' };
    format!(
        "{}{:02}°{:02}'{:0width$.prec$}\"",
        sign,
        d,
        m,
        s,
        width = frac_digits + 3,
        prec = frac_digits
    )
}

fn split_sexagesimal(value: f64, frac_digits: usize) -> (bool, u32, u32, f64) {
    let negative = value < 0.0;
    let scale = 10f64.powi(frac_digits as i32);
    // Round at the last printed digit so 59.99996 carries into the minutes.
    let total = (value.abs() * 3600.0 * scale).round() / scale;
    let whole = (total / 3600.0).floor();
    let rem = total - whole * 3600.0;
    let minutes = (rem / 60.0).floor();
    let seconds = rem - minutes * 60.0;
    (negative, whole as u32, minutes as u32, seconds)
}

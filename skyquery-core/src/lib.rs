//! Shared building blocks for talking to astronomical archive services.
//!
//! Nothing in this crate touches the network. It holds the pieces every
//! service client needs: one error type, sky positions, a table decoded from
//! the text payloads the services return, and the photometric conversions
//! that catalog fluxes usually go through next.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | [`QueryError`] and the [`QueryResult`] alias |
//! | [`position`] | [`Position`], [`Cone`], RA/Dec parsing and formatting, angular separation |
//! | [`table`] | [`Table`] decoded from CSV, VOTable, JSON or whitespace ASCII |
//! | [`photometry`] | Flux ↔ AB magnitude, phase folding, [`Ps1Filter`] |
//!
//! # Quick Start
//!
//! ```
//! use skyquery_core::{Position, Table};
//!
//! let pos = Position::parse("12:30:49.4", "+12:23:28").unwrap();
//! assert!((pos.ra_deg - 187.7058).abs() < 1e-3);
//!
//! let table = Table::from_csv("objID,raMean\n1,187.7\n2,187.8\n").unwrap();
//! assert_eq!(table.num_rows(), 2);
//! ```

pub mod errors;
pub mod photometry;
pub mod position;
pub mod table;

pub use errors::{QueryError, QueryResult};
pub use photometry::{ab_mag_to_flux, flux_to_ab_mag, phase_fold, Ps1Filter};
pub use position::{angular_separation_deg, Cone, Position};
pub use table::{Column, Table};

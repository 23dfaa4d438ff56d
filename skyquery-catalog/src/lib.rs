//! Blocking client for the STScI archive services.
//!
//! One [`ArchiveClient`] covers every service; each module below adds its
//! operations as methods on it.
//!
//! | Module | Service |
//! |--------|---------|
//! | [`ps1`] | Pan-STARRS catalog search and table metadata (MAST catalog API) |
//! | [`mast`] | MAST portal requests, object name resolution |
//! | [`images`] | PS1 image listing and cutouts |
//! | [`hla`] | Hubble Legacy Archive source lists |
//! | [`lightcurve`] | Per-filter light curves from PS1 detections |
//! | [`config`] | Endpoints, timeout and user agent |
//!
//! Requests are sent once; failures come back as
//! [`QueryError`](skyquery_core::QueryError) and
//! [`is_recoverable`](skyquery_core::QueryError::is_recoverable) tells the
//! caller whether trying again could help. Validation errors are raised
//! before anything is sent.
//!
//! ```no_run
//! use skyquery_catalog::ps1::{CatalogTable, Ps1Query, Release};
//! use skyquery_catalog::ArchiveClient;
//! use skyquery_core::Cone;
//!
//! let client = ArchiveClient::new()?;
//! let (ra, dec) = client.resolve("M87")?;
//! let query = Ps1Query::new(CatalogTable::Mean, Release::Dr2).constraint("nDetections.gt", 1);
//! let payload = client.cone(&Cone::new(ra, dec, 0.05), query)?;
//! println!("{}", payload.as_text());
//! # Ok::<(), skyquery_core::QueryError>(())
//! ```

pub mod config;
pub mod hla;
mod http;
pub mod images;
pub mod lightcurve;
pub mod mast;
pub mod ps1;

pub use config::ClientConfig;
pub use http::ArchiveClient;

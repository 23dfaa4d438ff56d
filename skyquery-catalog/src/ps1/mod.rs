//! Pan-STARRS catalog searches through the MAST catalog API.
//!
//! - [`legal`]: releases, tables, formats and the legal (table, release) set
//! - [`query`]: [`Ps1Query`] builder, column validation, [`Payload`]
//! - `client`: [`metadata`](crate::ArchiveClient::metadata),
//!   [`search`](crate::ArchiveClient::search), [`cone`](crate::ArchiveClient::cone)
//!
//! ```no_run
//! use skyquery_catalog::ps1::{CatalogTable, Ps1Query, Release};
//! use skyquery_catalog::ArchiveClient;
//! use skyquery_core::Cone;
//!
//! let client = ArchiveClient::new()?;
//! let query = Ps1Query::new(CatalogTable::Mean, Release::Dr2)
//!     .columns(["objID", "raMean", "decMean", "gMeanPSFMag"])
//!     .constraint("nDetections.gt", 1);
//! let table = client.cone(&Cone::new(187.706, 12.391, 0.05), query)?.to_table()?;
//! println!("{} objects", table.num_rows());
//! # Ok::<(), skyquery_core::QueryError>(())
//! ```

mod client;
pub mod legal;
pub mod query;

pub use legal::{check_legal, parse_legal, CatalogTable, Format, Release};
pub use query::{validate_columns, ColumnInfo, Payload, Ps1Query};

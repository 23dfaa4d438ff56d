#![cfg(feature = "integration-tests")]

//! Queries against the real STScI services. Needs network access.

use skyquery_catalog::hla::{HlaCatalog, HlaFormat};
use skyquery_catalog::images::CutoutRequest;
use skyquery_catalog::ps1::{CatalogTable, Ps1Query, Release};
use skyquery_catalog::ArchiveClient;
use skyquery_core::{Cone, Position};

#[test]
fn test_resolve_m87() {
    let client = ArchiveClient::new().expect("Failed to create client");
    let (ra, dec) = client.resolve("M87").expect("Failed to resolve M87");
    assert!((ra - 187.706).abs() < 0.01, "RA {}", ra);
    assert!((dec - 12.391).abs() < 0.01, "Dec {}", dec);
}

#[test]
fn test_mean_metadata_has_obj_id() {
    let client = ArchiveClient::new().expect("Failed to create client");
    let columns = client
        .metadata(CatalogTable::Mean, Release::Dr2)
        .expect("Failed to fetch metadata");
    assert!(columns.iter().any(|c| c.name == "objID"));
}

#[test]
fn test_cone_around_m87() {
    let client = ArchiveClient::new().expect("Failed to create client");
    let query = Ps1Query::new(CatalogTable::Mean, Release::Dr2)
        .columns(["objID", "raMean", "decMean", "nDetections"])
        .constraint("nDetections.gt", 1);
    let cone = Cone::new(187.706, 12.391, 0.2 / 60.0);
    let table = client
        .cone(&cone, query)
        .and_then(|p| p.to_table())
        .expect("Cone search failed");
    assert!(table.num_rows() > 0);

    for (ra, dec) in table
        .column_f64("raMean")
        .unwrap()
        .into_iter()
        .zip(table.column_f64("decMean").unwrap())
    {
        let p = Position::new(ra.unwrap(), dec.unwrap());
        assert!(cone.center.separation_deg(&p) < 0.01);
    }
}

#[test]
fn test_cutout_urls_for_m87() {
    let client = ArchiveClient::new().expect("Failed to create client");
    let request = CutoutRequest::new(Position::new(187.706, 12.391)).color(true);
    let urls = client.cutout_urls(&request).expect("Failed to list images");
    assert_eq!(urls.len(), 1);
}

#[test]
fn test_hla_source_list() {
    let client = ArchiveClient::new().expect("Failed to create client");
    let table = client
        .source_list_table("hst_8992_52_acs_wfc_f606w", HlaCatalog::Dao, HlaFormat::Csv, true)
        .expect("Failed to fetch source list");
    assert!(table.num_rows() > 0);
}

//! CLI argument definitions for skyquery

use clap::{Args, Parser, Subcommand, ValueEnum};
use skyquery_catalog::images::DEFAULT_SIZE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skyquery")]
#[command(about = "Query MAST catalogs, Pan-STARRS images and HLA source lists")]
#[command(version)]
pub struct Cli {
    /// Log specification, e.g. "info" or "warn,skyquery_catalog=debug"
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Send every request to this base URL instead of the STScI endpoints
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds (0, the default, waits indefinitely)
    #[arg(long, global = true, default_value = "0")]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an object name to coordinates
    Resolve(ResolveArgs),

    /// List the columns of a catalog table
    Metadata(MetadataArgs),

    /// Search a catalog table with key/value constraints
    Search(SearchArgs),

    /// Cone search around coordinates or a named object
    Cone(ConeArgs),

    /// List the PS1 stacked images covering a position
    Images(ImagesArgs),

    /// Build (and optionally download) PS1 cutouts
    Cutout(CutoutArgs),

    /// Fetch the source list of an HLA image
    SourceList(SourceListArgs),

    /// Per-filter light curves of a PS1 object
    Lightcurve(LightcurveArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Payload exactly as the service returned it
    Raw,
    /// Aligned columns
    Table,
    /// JSON records
    Json,
}

/// Position given as coordinates or as an object name.
#[derive(Args)]
pub struct TargetArgs {
    /// Right ascension (degrees, or HMS e.g. 12h30m49s, 12:30:49)
    #[arg(allow_hyphen_values = true, required_unless_present = "name")]
    pub ra: Option<String>,

    /// Declination (degrees, or DMS e.g. +12d23m28s, -5:22:30)
    #[arg(allow_hyphen_values = true, required_unless_present = "name")]
    pub dec: Option<String>,

    /// Object name, resolved through MAST
    #[arg(long, conflicts_with_all = ["ra", "dec"])]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct CatalogArgs {
    /// Catalog table (mean, stack, detection, forced_mean)
    #[arg(long, default_value = "mean")]
    pub table: String,

    /// Data release (dr1, dr2)
    #[arg(long, default_value = "dr2")]
    pub release: String,
}

#[derive(Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Columns to return (comma-separated, checked against the table schema)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Constraint as key=value, e.g. nDetections.gt=1 (repeatable)
    #[arg(short = 'c', long = "constraint", value_parser = parse_key_val)]
    pub constraints: Vec<(String, String)>,

    /// Payload format requested from the service (csv, votable, json)
    #[arg(long, default_value = "csv")]
    pub format: String,

    /// How to print the result
    #[arg(long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Parser)]
pub struct ResolveArgs {
    /// Object name, e.g. "M87"
    pub name: String,

    /// Print the resolver's full answer as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct MetadataArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// How to print the schema
    #[arg(long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Parser)]
pub struct SearchArgs {
    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Parser)]
pub struct ConeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Search radius in degrees
    #[arg(long, default_value = "0.008333")]
    pub radius: f64,

    /// Add a `distance` column (degrees from the center) and sort on it
    #[arg(long)]
    pub sort_distance: bool,

    /// RA and Dec columns used by --sort-distance
    #[arg(long, num_args = 2, value_names = ["RA_COL", "DEC_COL"], default_values = ["raMean", "decMean"])]
    pub position_columns: Vec<String>,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Parser)]
pub struct ImagesArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Region size in pixels (0.25 arcsec each)
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    pub size: u32,

    /// Filters to list, e.g. "grizy" or "gri"
    #[arg(long, default_value = "grizy")]
    pub filters: String,
}

#[derive(Parser)]
pub struct CutoutArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Cutout size in pixels (0.25 arcsec each)
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    pub size: u32,

    /// Resample the output to this many pixels per side
    #[arg(long)]
    pub output_size: Option<u32>,

    /// Filters to use, e.g. "grizy" or "gri"
    #[arg(long, default_value = "grizy")]
    pub filters: String,

    /// Image format (jpg, png, fits)
    #[arg(long, default_value = "jpg")]
    pub format: String,

    /// Combine three filters into one color image
    #[arg(long)]
    pub color: bool,

    /// Download the cutouts into this directory instead of printing URLs
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SourceListArgs {
    /// HLA image name, e.g. hst_8992_52_acs_wfc_f606w
    pub image: String,

    /// Source extraction (DAO, SEX)
    #[arg(long, default_value = "DAO")]
    pub catalog: String,

    /// Format requested from the service (text, votable, tsv, csv, html, kml, json)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Keep flagged sources
    #[arg(long)]
    pub untrimmed: bool,

    /// How to print the list (table and json need a tabular format)
    #[arg(long, value_enum, default_value = "raw")]
    pub output: OutputFormat,
}

#[derive(Parser)]
pub struct LightcurveArgs {
    /// PS1 objID
    pub obj_id: String,

    /// Fold on this period (days)
    #[arg(long)]
    pub period: Option<f64>,

    /// Epoch of phase zero (MJD)
    #[arg(long, default_value = "0.0", requires = "period")]
    pub epoch: f64,

    /// How to print the curves
    #[arg(long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("nDetections.gt=1").unwrap(),
            ("nDetections.gt".to_string(), "1".to_string())
        );
        assert!(parse_key_val("objID").is_err());
        assert!(parse_key_val("=3").is_err());
    }

    #[test]
    fn test_cone_by_name() {
        let cli = Cli::try_parse_from(["skyquery", "cone", "--name", "M87", "--radius", "0.01"]).unwrap();
        match cli.command {
            Commands::Cone(args) => {
                assert_eq!(args.target.name.as_deref(), Some("M87"));
                assert!(args.target.ra.is_none());
                assert_eq!(args.query.catalog.table, "mean");
            }
            _ => panic!("expected cone"),
        }
    }

    #[test]
    fn test_cone_negative_dec() {
        let cli = Cli::try_parse_from(["skyquery", "cone", "187.7", "-5:22:30", "-c", "nDetections.gt=1"]).unwrap();
        match cli.command {
            Commands::Cone(args) => {
                assert_eq!(args.target.dec.as_deref(), Some("-5:22:30"));
                assert_eq!(args.query.constraints.len(), 1);
            }
            _ => panic!("expected cone"),
        }
    }

    #[test]
    fn test_cone_sort_distance() {
        let cli = Cli::try_parse_from(["skyquery", "cone", "187.7", "12.39", "--sort-distance"]).unwrap();
        match cli.command {
            Commands::Cone(args) => {
                assert!(args.sort_distance);
                assert_eq!(args.position_columns, vec!["raMean", "decMean"]);
            }
            _ => panic!("expected cone"),
        }

        let cli = Cli::try_parse_from([
            "skyquery", "cone", "187.7", "12.39", "--table", "stack",
            "--sort-distance", "--position-columns", "raStack", "decStack",
        ])
        .unwrap();
        match cli.command {
            Commands::Cone(args) => assert_eq!(args.position_columns, vec!["raStack", "decStack"]),
            _ => panic!("expected cone"),
        }
    }

    #[test]
    fn test_cone_needs_target() {
        assert!(Cli::try_parse_from(["skyquery", "cone"]).is_err());
    }
}

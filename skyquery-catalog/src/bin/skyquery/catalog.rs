//! Catalog subcommands: resolve, metadata, search, cone, lightcurve

use crate::cli::{
    ConeArgs, LightcurveArgs, MetadataArgs, OutputFormat, QueryArgs, ResolveArgs, SearchArgs,
    TargetArgs,
};
use crate::output::{print_payload, print_table};
use anyhow::Context;
use skyquery_catalog::lightcurve::LightCurve;
use skyquery_catalog::ps1::{parse_legal, Format, Ps1Query};
use skyquery_catalog::ArchiveClient;
use skyquery_core::position::{format_dms, format_hms};
use skyquery_core::{Column, Cone, Position, Table};

pub fn resolve(client: &ArchiveClient, args: &ResolveArgs) -> anyhow::Result<()> {
    let object = client.resolve_object(&args.name)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&object)?);
        return Ok(());
    }
    println!(
        "{}  {} {}  ({:.6}, {:+.6})  [{}]",
        object.canonical_name,
        format_hms(object.ra, 3),
        format_dms(object.dec, 2),
        object.ra,
        object.dec,
        object.resolver
    );
    Ok(())
}

pub fn metadata(client: &ArchiveClient, args: &MetadataArgs) -> anyhow::Result<()> {
    let (table, release) = parse_legal(&args.catalog.table, &args.catalog.release)?;
    let columns = client.metadata(table, release)?;
    if args.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
        return Ok(());
    }

    let mut schema = Table::new(vec![
        Column::new("name"),
        Column::new("type"),
        Column::new("description"),
    ]);
    for c in columns {
        schema.push_row(vec![c.name, c.datatype, c.description])?;
    }
    print_table(&schema, args.output)
}

pub fn search(client: &ArchiveClient, args: &SearchArgs) -> anyhow::Result<()> {
    let query = build_query(&args.query)?;
    log::info!("searching {}", query);
    let payload = client.search(&query)?;
    print_payload(&payload, args.query.output)
}

pub fn cone(client: &ArchiveClient, args: &ConeArgs) -> anyhow::Result<()> {
    let center = target_position(client, &args.target)?;
    let cone = Cone::around(center, args.radius);
    log::info!("cone search around {} radius {} deg", center, args.radius);
    let payload = client.cone(&cone, build_query(&args.query)?)?;
    if !args.sort_distance {
        return print_payload(&payload, args.query.output);
    }

    let mut table = payload.to_table()?;
    let (ra, dec) = (&args.position_columns[0], &args.position_columns[1]);
    table
        .sort_by_separation(ra, dec, &center)
        .with_context(|| format!("sorting on {} and {}", ra, dec))?;
    print_table(&table, args.query.output)
}

pub fn lightcurve(client: &ArchiveClient, args: &LightcurveArgs) -> anyhow::Result<()> {
    let mut curves = client.light_curves(&args.obj_id)?;
    if curves.is_empty() {
        anyhow::bail!("no usable detections for objID {}", args.obj_id);
    }
    if let Some(period) = args.period {
        for curve in &mut curves {
            curve.fold(period, args.epoch)?;
        }
    }
    if args.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&curves)?);
        return Ok(());
    }
    for curve in &curves {
        log::info!(
            "{}: {} points, amplitude {:.3} mag",
            curve.filter,
            curve.len(),
            curve.amplitude().unwrap_or(0.0)
        );
    }
    print_table(&curves_table(&curves)?, args.output)
}

/// Position from coordinates or, failing that, a resolved name.
pub fn target_position(client: &ArchiveClient, target: &TargetArgs) -> anyhow::Result<Position> {
    if let Some(name) = &target.name {
        let (ra, dec) = client
            .resolve(name)
            .with_context(|| format!("resolving '{}'", name))?;
        return Ok(Position::new(ra, dec));
    }
    match (&target.ra, &target.dec) {
        (Some(ra), Some(dec)) => Ok(Position::parse(ra, dec)?),
        _ => anyhow::bail!("give RA and Dec, or --name"),
    }
}

fn build_query(args: &QueryArgs) -> anyhow::Result<Ps1Query> {
    let format: Format = args.format.parse()?;
    let mut query = Ps1Query::parse(&args.catalog.table, &args.catalog.release)?.format(format);
    if !args.columns.is_empty() {
        query = query.columns(args.columns.iter().map(|c| c.trim().to_string()));
    }
    for (key, value) in &args.constraints {
        query = query.constraint(key.as_str(), value);
    }
    Ok(query)
}

fn curves_table(curves: &[LightCurve]) -> anyhow::Result<Table> {
    let mut table = Table::new(vec![
        Column::new("filter"),
        Column::typed("obsTime", "double"),
        Column::typed("mag", "double"),
        Column::typed("magErr", "double"),
        Column::typed("phase", "double"),
    ]);
    let optional = |v: Option<f64>| v.map(|x| format!("{:.4}", x)).unwrap_or_default();
    for curve in curves {
        for p in &curve.points {
            table.push_row(vec![
                curve.filter.to_string(),
                format!("{:.6}", p.time),
                format!("{:.4}", p.mag),
                optional(p.mag_err),
                optional(p.phase),
            ])?;
        }
    }
    Ok(table)
}

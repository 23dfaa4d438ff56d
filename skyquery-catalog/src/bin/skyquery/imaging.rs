//! Image subcommands: images, cutout, source-list

use crate::catalog::target_position;
use crate::cli::{CutoutArgs, ImagesArgs, OutputFormat, SourceListArgs};
use crate::output::print_table;
use anyhow::Context;
use skyquery_catalog::hla::{HlaCatalog, HlaFormat};
use skyquery_catalog::images::{CutoutRequest, ImageFormat};
use skyquery_catalog::ArchiveClient;
use skyquery_core::Ps1Filter;
use std::fs;

pub fn images(client: &ArchiveClient, args: &ImagesArgs) -> anyhow::Result<()> {
    let position = target_position(client, &args.target)?;
    let filters = Ps1Filter::parse_list(&args.filters)?;
    let files = client.list_images(&position, args.size, &filters)?;
    if files.is_empty() {
        println!("No PS1 images cover {}", position);
    }
    for file in files {
        println!("{}  {}", file.filter, file.filename);
    }
    Ok(())
}

pub fn cutout(client: &ArchiveClient, args: &CutoutArgs) -> anyhow::Result<()> {
    let position = target_position(client, &args.target)?;
    let format: ImageFormat = args.format.parse()?;
    let mut request = CutoutRequest::new(position)
        .size(args.size)
        .filters(Ps1Filter::parse_list(&args.filters)?)
        .format(format)
        .color(args.color);
    if let Some(output_size) = args.output_size {
        request = request.output_size(output_size);
    }

    let urls = client.cutout_urls(&request)?;
    let Some(dir) = &args.output_dir else {
        for url in &urls {
            println!("{}", url);
        }
        return Ok(());
    };

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (i, url) in urls.iter().enumerate() {
        let name = if args.color {
            format!("cutout_{:.5}_{:+.5}_color.{}", position.ra_deg, position.dec_deg, format)
        } else {
            format!("cutout_{:.5}_{:+.5}_{}.{}", position.ra_deg, position.dec_deg, i, format)
        };
        let path = dir.join(name);
        let bytes = client.download_cutout(url, &path)?;
        println!("{} ({} bytes)", path.display(), bytes);
    }
    Ok(())
}

pub fn source_list(client: &ArchiveClient, args: &SourceListArgs) -> anyhow::Result<()> {
    let catalog: HlaCatalog = args.catalog.parse()?;
    let format: HlaFormat = args.format.parse()?;
    let trimmed = !args.untrimmed;

    if args.output == OutputFormat::Raw {
        print!("{}", client.source_list(&args.image, catalog, format, trimmed)?);
        return Ok(());
    }
    let table = client.source_list_table(&args.image, catalog, format, trimmed)?;
    print_table(&table, args.output)
}

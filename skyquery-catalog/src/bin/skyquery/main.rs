//! skyquery: command-line access to the STScI archive services
//!
//! Pan-STARRS catalog searches, MAST name resolution, PS1 cutouts and HLA
//! source lists. Results go to stdout; logging goes to stderr.

mod catalog;
mod cli;
mod imaging;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use flexi_logger::{Logger, LoggerHandle};
use skyquery_catalog::{ArchiveClient, ClientConfig};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli)?;

    let client = ArchiveClient::with_config(client_config(&cli))?;
    log::debug!("using catalogs endpoint {}", client.config().catalogs_url);

    match &cli.command {
        Commands::Resolve(args) => catalog::resolve(&client, args),
        Commands::Metadata(args) => catalog::metadata(&client, args),
        Commands::Search(args) => catalog::search(&client, args),
        Commands::Cone(args) => catalog::cone(&client, args),
        Commands::Lightcurve(args) => catalog::lightcurve(&client, args),
        Commands::Images(args) => imaging::images(&client, args),
        Commands::Cutout(args) => imaging::cutout(&client, args),
        Commands::SourceList(args) => imaging::source_list(&client, args),
    }
}

fn setup_logging(cli: &Cli) -> anyhow::Result<LoggerHandle> {
    let spec = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    let handle = Logger::try_with_str(spec)?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()?;
    Ok(handle)
}

fn client_config(cli: &Cli) -> ClientConfig {
    let config = match &cli.base_url {
        Some(base) => ClientConfig::with_base_url(base),
        None => ClientConfig::default(),
    };
    let timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));
    config.timeout(timeout)
}

//! Printing tables and payloads

use crate::cli::OutputFormat;
use skyquery_catalog::ps1::Payload;
use skyquery_core::Table;

pub fn print_table(table: &Table, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Raw => print!("{}", table.to_csv()?),
        OutputFormat::Table => {
            println!("{}", table);
            println!("({} rows)", table.num_rows());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&table.to_json_records())?)
        }
    }
    Ok(())
}

pub fn print_payload(payload: &Payload, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Raw => {
            println!("{}", payload.as_text());
            Ok(())
        }
        _ => print_table(&payload.to_table()?, output),
    }
}

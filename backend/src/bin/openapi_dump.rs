//! Print the OpenAPI document to stdout.
//!
//! JSON by default; pass `--yaml` for YAML.

use std::io;

use clap::Parser;
use registrar::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, Parser)]
#[command(name = "openapi-dump", about = "Print the registrar OpenAPI document", version)]
struct CliArgs {
    /// Emit YAML instead of pretty-printed JSON.
    #[arg(long)]
    yaml: bool,
}

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let doc = ApiDoc::openapi();
    let rendered = if args.yaml {
        doc.to_yaml().map_err(io::Error::other)?
    } else {
        doc.to_pretty_json().map_err(io::Error::other)?
    };
    println!("{rendered}");
    Ok(())
}

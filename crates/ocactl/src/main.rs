use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ocactl::cmd_delete;
use ocactl::cmd_list;
use ocactl::cmd_show::{self, Selector};
use ocactl::common::{DirTransport, KindArg};

#[derive(Parser, Debug)]
#[command(name = "ocactl", version, about = "OpenNebula pool and entity CLI")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    /// Directory of canned responses named `<method>.xml`
    #[arg(long, default_value = ".")]
    dir: PathBuf,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List every entity of a pool
    List {
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Ownership filter forwarded to the pool info call
        #[arg(long, allow_hyphen_values = true)]
        filter: Option<i64>,
    },
    /// Show all fields of one entity
    Show {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete one entity by id
    Delete {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        id: i64,
    },
}

fn main() -> Result<()> {
    let Cli {
        verbose,
        json,
        dir,
        cmd,
    } = Cli::parse();

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let transport = DirTransport::new(dir);
    match cmd {
        Cmd::List { kind, filter } => cmd_list::run(&transport, kind, filter, json)?,
        Cmd::Show { kind, id, name } => {
            let selector = Selector::from_args(id, name).context("select entity")?;
            cmd_show::run(&transport, kind, selector, json)?
        }
        Cmd::Delete { kind, id } => cmd_delete::run(&transport, kind, id, json)?,
    };

    Ok(())
}

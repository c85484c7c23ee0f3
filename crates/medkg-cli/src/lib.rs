//! The `medkg` command line front end: wires the store, embedder and generator from
//! configuration and prints the hybrid report for one question.
pub mod config;
pub mod report;
pub mod tracing_setup;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use color_eyre::eyre::{bail, Result, WrapErr};
use medkg_error::ResultExt;
use medkg_rag::RagService;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::config::MedkgConfig;

#[derive(Debug, Parser)]
#[command(name = "medkg", version, about = "Answer a biomedical question from the knowledge graph")]
pub struct Cli {
    /// The question. Read from stdin when omitted.
    pub question: Option<String>,

    /// Configuration file applied over the user configuration.
    #[arg(long, short, env = "MEDKG_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Load `.env` (or `path`) into the process environment without overriding variables that are
/// already set. Call before parsing arguments and installing tracing, so `MEDKG_CONFIG` and
/// `RUST_LOG` from the file reach both.
pub fn load_dotenv(path: Option<&Path>) {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    if let Err(e) = loaded {
        if !e.not_found() {
            eprintln!("ignoring unreadable .env: {e}");
        }
    }
}

async fn read_question() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Enter your question: ").await?;
    stdout.flush().await?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .wrap_err("failed to read question from stdin")?;
    Ok(line)
}

pub async fn try_main(cli: Cli) -> Result<ExitCode> {
    let config = MedkgConfig::load(cli.config.as_deref())?;

    let question = match cli.question {
        Some(q) => q,
        None => read_question().await?,
    };
    let question = question.trim();
    if question.is_empty() {
        bail!("no question given");
    }

    let embedder = config.load_embedder().await?;
    let db = config.open_db(embedder.dimensions())?;
    let generator = config.llm.build();
    let rag = RagService::new(embedder, db.clone(), db, generator, config.rag());

    match rag
        .answer(question)
        .await
        .map_err(medkg_error::Error::from)
        .emit_event()
    {
        Ok(report) => {
            print!("{}", report::render(&report));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Request aborted: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod coordinator;
mod history;
mod integrator;
mod metrics;
mod payload;
mod prelude;
mod quantity;
mod sensor;
mod state;
mod tables;

use clap::{Parser, crate_version};
use tracing_subscriber::EnvFilter;

use crate::{cli::Args, prelude::*};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .compact()
        .init();
    info!(version = crate_version!(), "starting…");

    Args::parse().run().await?;

    info!("done!");
    Ok(())
}

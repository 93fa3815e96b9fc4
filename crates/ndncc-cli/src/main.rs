//! `ndncc`: manage a local NFD from the command line.

mod cli;
mod logging;
mod output;

use std::{io, process::ExitCode, sync::Arc};

use clap::Parser;
use ndncc_client::{ClientConfig, ClientError, Controller, FchDiscovery, Runtime, UnixFace};
use ndncc_core::{EventPayload, FaceError, SystemEnv};
use ndncc_proto::ControlResponse;
use thiserror::Error;
use tracing::{error, info};

use crate::cli::{Cli, Command, SetupError};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("connecting to {path}: {source}")]
    Connect { path: String, source: io::Error },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Face(#[from] FaceError),

    #[error("writing output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&logging::directive(cli.verbose, cli.quiet));

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        },
    }
}

/// Execute the subcommand. `Ok(false)` means the forwarder refused it.
async fn run(cli: Cli) -> Result<bool, CliError> {
    let config = cli.client_config();
    let stamper = Arc::new(cli.stamper()?);

    let face = UnixFace::connect(&config.socket_path).await.map_err(|source| {
        CliError::Connect { path: config.socket_path.display().to_string(), source }
    })?;
    let face = Arc::new(face);

    let controller = Controller::new(Arc::clone(&face), SystemEnv, stamper, config.clone());
    let runtime = Runtime::new(face, SystemEnv, config.clone());

    let response = match cli.command {
        Command::AddFace { uri } => runtime.run_until(controller.add_face(&uri)).await??,
        Command::RemoveFace { face_id } => {
            runtime.run_until(controller.remove_face(face_id)).await??
        },
        Command::AddRoute { name, face_id } => {
            runtime.run_until(controller.add_route(&name, face_id)).await??
        },
        Command::RemoveRoute { name, face_id } => {
            runtime.run_until(controller.remove_route(&name, face_id)).await??
        },
        Command::QueryFaceId { uri } => {
            let face_id = runtime.run_until(controller.query_face_id(&uri)).await??;
            let line = face_id.map_or_else(|| "not found".to_owned(), |id| id.to_string());
            output::emit(&line)?;
            return Ok(face_id.is_some());
        },
        Command::Autoconf { .. } => {
            let discovery = FchDiscovery::new(config.autoconf.discovery_url.clone());
            let outcome = runtime.run_until(controller.autoconf(&discovery)).await??;
            output::emit(&outcome.message)?;
            return Ok(outcome.success);
        },
        Command::Watch => {
            watch(&runtime, &config).await?;
            return Ok(true);
        },
    };

    output::emit(&output::response_line(response.as_ref()))?;
    Ok(response.as_ref().is_some_and(ControlResponse::is_success))
}

/// Print face events until Ctrl-C or a transport fault.
async fn watch(
    runtime: &Runtime<Arc<UnixFace>, SystemEnv>,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let sink = |event: &str, payload: EventPayload| {
        if let Err(e) = output::emit(&output::event_line(event, &payload)) {
            error!(error = %e, "writing event failed");
        }
    };

    info!(prefix = %config.subscription.prefix, "watching face events");
    let stop = runtime.stop_handle();
    tokio::select! {
        result = runtime.run(&sink) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            stop.stop();
        },
    }
    Ok(())
}

//! WebServer process entry point
//!
//! Embeds the orchestrator with the real file system and serves the upload
//! and polling API until Ctrl+C or SIGTERM. Queued tasks are drained before
//! the process exits.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use orchestrator::{Orchestrator, PipelineConfig, RealFileSystem};
use shared::{logging, process_debug, ProcessId};

use webserver::{WebServer, WebServerError, WebServerResult};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "webserver")]
#[command(about = "HTTP service that aggregates uploaded play-count CSV files")]
struct Args {
    /// Address for the HTTP server
    #[arg(long, env = "PLAYTALLY_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PLAYTALLY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(flatten)]
    pipeline: PipelineConfig,
}

#[tokio::main]
async fn main() -> WebServerResult<()> {
    let args = Args::parse();

    // Initialize process ID singleton for webserver
    ProcessId::init_webserver();
    logging::init_tracing_with_level(Some(&args.log_level));

    let address: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| WebServerError::config(format!("Invalid bind address {}: {}", args.bind, e)))?;

    logging::log_startup(ProcessId::current(), &format!("webserver on {}", address));
    process_debug!(
        ProcessId::current(),
        "Data dir: {}, workers: {}, batch size: {}",
        args.pipeline.data_dir.display(),
        args.pipeline.workers,
        args.pipeline.batch_size
    );

    let file_system = RealFileSystem::with_base_dir(args.pipeline.data_dir.clone());
    file_system.ensure_base_dir().await?;

    let orchestrator = Arc::new(Orchestrator::start(file_system, &args.pipeline)?);
    let webserver = WebServer::new(orchestrator.clone());

    let served = webserver.run(address).await;

    // finish whatever was accepted before exiting
    orchestrator.shutdown().await;

    served?;
    logging::log_success(ProcessId::current(), "WebServer stopped gracefully");
    Ok(())
}

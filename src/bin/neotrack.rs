// Stdio host for the tracker: panel requests in on stdin, snapshots out on stdout.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;

use neotrack::{
    config::load,
    controller::TrackerController,
    messages::{ControllerRequest, ViewRequest},
    source_rpc::RpcSource,
    types::ViewState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    // stderr only; stdout carries the protocol
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = load().context("Failed to load configuration")?;
    cfg.print_summary();

    let source = Arc::new(RpcSource::from_config(&cfg));
    log::info!("👀 tracking {}", source.url());
    let (tx, mut rx) = unbounded_channel::<Arc<ViewState>>();
    let handle = TrackerController::spawn(source, Arc::new(tx), cfg.tracker_options());

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = stdin.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match ViewRequest::from_json_line(&line) {
                        Ok(request) => {
                            if let Err(e) = handle.handle_request(request).await {
                                log::warn!("request failed, view unchanged: {e}");
                            }
                        }
                        Err(e) => log::warn!("ignoring malformed request {line:?}: {e}"),
                    },
                    // panel went away
                    None => break,
                }
            }
            Some(view_state) = rx.recv() => {
                let line = ControllerRequest { view_state }
                    .to_json_line()
                    .context("Failed to encode view state")?;
                stdout.write_all(line.as_bytes()).await?;
                stdout.flush().await?;
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

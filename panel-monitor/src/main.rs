//! Headless panel monitor
//!
//! Connects the panel engine to a real radio over a serial port and prints
//! every publication. Useful for bring-up and for watching CAT traffic
//! without the display attached.
//!
//! ```text
//! panel-monitor <port> [baud]
//! ```

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use panel_core::{
    run_panel_actor, AntennaRequest, ChannelSink, Engine, FileNameStore, InboundQueue,
    OutboundQueue, PanelCommand, Publication, SerialLink, StatusSink,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Default CAT baud rate for the TS-590SG rear COM port
const DEFAULT_BAUD: u32 = 115_200;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(port) = args.next() else {
        bail!("usage: panel-monitor <port> [baud]");
    };
    let baud = match args.next() {
        Some(s) => s.parse().context("invalid baud rate")?,
        None => DEFAULT_BAUD,
    };

    let (sink, mut pub_rx) = ChannelSink::new(512);
    let dyn_sink: Arc<dyn StatusSink> = Arc::new(sink);
    let mut engine = Engine::new(dyn_sink);

    // Restore persisted antenna names, if any
    let store = FileNameStore::new("antenna-names.json");
    if let Err(e) = engine.load_antenna_names(&store) {
        warn!(error = %e, "could not load antenna names");
    }

    let inbound = Arc::new(InboundQueue::new());
    let (outbound, out_rx) = OutboundQueue::new(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    // No relay controller attached in monitor mode; requests are logged
    let (ant_tx, mut ant_rx) = mpsc::channel::<AntennaRequest>(16);

    let link = SerialLink::connect(&port, baud, Arc::clone(&inbound), out_rx)
        .with_context(|| format!("opening {}", port))?;
    info!(%port, baud, "serial link open");

    tokio::spawn(link.run());
    let actor = tokio::spawn(run_panel_actor(engine, inbound, outbound, cmd_rx, ant_tx));

    cmd_tx.send(PanelCommand::Start).await?;
    cmd_tx.send(PanelCommand::SetPollingEnabled(true)).await?;

    tokio::spawn(async move {
        while let Some(request) = ant_rx.recv().await {
            info!(?request, "antenna request (no controller attached)");
        }
    });

    loop {
        tokio::select! {
            publication = pub_rx.recv() => {
                match publication {
                    Some(Publication::Scalar { topic, value }) => {
                        info!(?topic, value, "scalar");
                    }
                    Some(Publication::Blob { topic, value }) => {
                        info!(?topic, ?value, "blob");
                    }
                    Some(Publication::Notify { topic }) => {
                        info!(?topic, "notify");
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                let _ = cmd_tx.send(PanelCommand::Shutdown).await;
                break;
            }
        }
    }

    actor.await?;
    Ok(())
}

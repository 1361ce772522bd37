//! The panel actor: single decode worker plus all scheduler timers
//!
//! Everything that mutates reconciled state runs here, on one task. The
//! serial reader only pushes framed commands into the bounded inbound
//! queue; timers only ever enqueue outbound commands; the GUI talks to the
//! actor through [`PanelCommand`] messages and reads state through the
//! publication sink. Timers run for the lifetime of the actor - a closed
//! gate makes a tick a no-op, it never destroys the timer.

use std::sync::Arc;
use std::time::Instant;

use cat_ts590::AiMode;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::antenna::{AntennaEvent, AntennaRequest};
use crate::engine::Engine;
use crate::queue::{InboundQueue, OutboundQueue};
use crate::scheduler::{
    AGC_RETRY_INTERVAL, METER_CYCLE_INTERVAL, PACE_INTERVAL, REPOLL_INTERVAL,
    RX_VFO_POLL_INTERVAL, SMETER_POLL_INTERVAL, STATUS_POLL_INTERVAL, TX_VFO_POLL_INTERVAL,
    VFO_POLL_INTERVAL,
};
use crate::vfo::VfoDisplay;

/// Cadence of the link-liveness check
const LINK_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Control messages into the panel actor
#[derive(Debug)]
pub enum PanelCommand {
    /// Begin a session: assert auto-info, learn power state
    Start,
    /// End the session and reset scheduler state
    Stop,
    /// Set the user polling override
    SetPollingEnabled(bool),
    /// Assert an auto-info mode on the radio
    SetAutoInfo(AiMode),
    /// Flip the local transverter mix toggle
    SetMixOffset(bool),
    /// UI-originated raw CAT command (button presses, tuning steps)
    SendCommand(String),
    /// Aggregate antenna select
    SelectAntenna(u8),
    /// Server-pushed antenna event
    AntennaEvent(AntennaEvent),
    /// An aggregate select failed; run the individual-toggle fallback
    AntennaSelectFailed(u8),
    /// All fallback toggles have completed or failed
    AntennaFallbackComplete,
    /// Restore antenna names from a persisted blob
    LoadAntennaNames(Vec<u8>),
    /// Read back the last consolidated display tuple
    QueryDisplay {
        /// Where to send the answer
        respond_to: oneshot::Sender<Option<VfoDisplay>>,
    },
    /// Stop the actor
    Shutdown,
}

/// Run the panel actor until shutdown
///
/// * `inbound` - framed commands from the serial reader
/// * `outbound` - commands for the serial writer
/// * `cmd_rx` - control messages from the GUI/lifecycle
/// * `antenna_tx` - requests for the remote relay collaborator
pub async fn run_panel_actor(
    mut engine: Engine,
    inbound: Arc<InboundQueue>,
    outbound: OutboundQueue,
    mut cmd_rx: mpsc::Receiver<PanelCommand>,
    antenna_tx: mpsc::Sender<AntennaRequest>,
) {
    info!("panel actor started");

    let mut t_status = interval(STATUS_POLL_INTERVAL);
    let mut t_smeter = interval(SMETER_POLL_INTERVAL);
    let mut t_meter = interval(METER_CYCLE_INTERVAL);
    let mut t_rx_vfo = interval(RX_VFO_POLL_INTERVAL);
    let mut t_vfo_a = interval(VFO_POLL_INTERVAL);
    let mut t_vfo_b = interval(VFO_POLL_INTERVAL);
    let mut t_tx_vfo = interval(TX_VFO_POLL_INTERVAL);
    let mut t_pace = interval(PACE_INTERVAL);
    let mut t_agc = interval(AGC_RETRY_INTERVAL);
    let mut t_repoll = interval(REPOLL_INTERVAL);
    let mut t_link = interval(LINK_CHECK_INTERVAL);
    for timer in [
        &mut t_status, &mut t_smeter, &mut t_meter, &mut t_rx_vfo, &mut t_vfo_a, &mut t_vfo_b,
        &mut t_tx_vfo, &mut t_pace, &mut t_agc, &mut t_repoll, &mut t_link,
    ] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    }
    // The first repoll tick fires immediately; swallow it so the first full
    // re-poll happens one period after startup, not at startup
    t_repoll.reset();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    PanelCommand::Start => {
                        for out in engine.start() {
                            send_out(&outbound, out).await;
                        }
                    }
                    PanelCommand::Stop => engine.stop(),
                    PanelCommand::SetPollingEnabled(on) => engine.set_polling_enabled(on),
                    PanelCommand::SetAutoInfo(mode) => {
                        if let Some(out) = engine.assert_auto_info(mode) {
                            send_out(&outbound, out).await;
                        }
                    }
                    PanelCommand::SetMixOffset(on) => engine.set_mix_offset(on, Instant::now()),
                    PanelCommand::SendCommand(cmd) => send_out(&outbound, cmd).await,
                    PanelCommand::SelectAntenna(id) => match engine.select_antenna(id) {
                        Ok(request) => send_antenna(&antenna_tx, request).await,
                        Err(e) => warn!(error = %e, "antenna select rejected"),
                    },
                    PanelCommand::AntennaEvent(event) => engine.apply_antenna_event(&event),
                    PanelCommand::AntennaSelectFailed(id) => {
                        match engine.antenna_select_failed(id) {
                            Ok(requests) => {
                                for request in requests {
                                    send_antenna(&antenna_tx, request).await;
                                }
                            }
                            Err(e) => warn!(error = %e, "antenna fallback rejected"),
                        }
                    }
                    PanelCommand::AntennaFallbackComplete => engine.antenna_fallback_complete(),
                    PanelCommand::LoadAntennaNames(blob) => {
                        if let Err(e) = engine.antenna_names_from_blob(&blob) {
                            warn!(error = %e, "bad antenna name blob");
                        }
                    }
                    PanelCommand::QueryDisplay { respond_to } => {
                        let _ = respond_to.send(engine.vfo().last_display());
                    }
                    PanelCommand::Shutdown => break,
                }
            }

            _ = inbound.wait() => {
                while let Some(cmd) = inbound.pop() {
                    for out in engine.handle_command(&cmd, Instant::now()) {
                        send_out(&outbound, out).await;
                    }
                }
            }

            _ = t_status.tick() => send_tick(&outbound, engine.status_tick()).await,
            _ = t_smeter.tick() => send_tick(&outbound, engine.smeter_tick()).await,
            _ = t_meter.tick() => send_tick(&outbound, engine.meter_tick()).await,
            _ = t_rx_vfo.tick() => send_tick(&outbound, engine.rx_vfo_tick()).await,
            _ = t_vfo_a.tick() => send_tick(&outbound, engine.vfo_a_tick()).await,
            _ = t_vfo_b.tick() => send_tick(&outbound, engine.vfo_b_tick()).await,
            _ = t_tx_vfo.tick() => send_tick(&outbound, engine.tx_vfo_tick()).await,
            _ = t_agc.tick() => send_tick(&outbound, engine.agc_tick()).await,
            _ = t_pace.tick() => {
                if let Some(out) = engine.pace_tick() {
                    send_out(&outbound, out).await;
                }
            }
            _ = t_repoll.tick() => engine.repoll_due(),
            _ = t_link.tick() => engine.check_connection(Instant::now()),
        }
    }

    info!("panel actor stopped");
}

async fn send_tick(outbound: &OutboundQueue, cmd: Option<&'static str>) {
    if let Some(cmd) = cmd {
        send_out(outbound, cmd.to_string()).await;
    }
}

async fn send_out(outbound: &OutboundQueue, cmd: String) {
    if let Err(e) = outbound.enqueue(cmd).await {
        // Degraded mode: the command is lost, the system keeps running
        warn!(error = %e, "outbound enqueue failed");
    }
}

async fn send_antenna(antenna_tx: &mpsc::Sender<AntennaRequest>, request: AntennaRequest) {
    if antenna_tx.send(request).await.is_err() {
        debug!("antenna collaborator gone, request dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, StatusSink};

    fn spawn_actor() -> (
        mpsc::Sender<PanelCommand>,
        mpsc::Receiver<String>,
        mpsc::Receiver<AntennaRequest>,
        Arc<RecordingSink>,
        tokio::task::JoinHandle<()>,
    ) {
        let sink = Arc::new(RecordingSink::new());
        let dyn_sink: Arc<dyn StatusSink> = sink.clone();
        let engine = Engine::new(dyn_sink);
        let inbound = Arc::new(InboundQueue::new());
        let (outbound, out_rx) = OutboundQueue::new(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ant_tx, ant_rx) = mpsc::channel(16);
        let handle = tokio::spawn(run_panel_actor(engine, inbound, outbound, cmd_rx, ant_tx));
        (cmd_tx, out_rx, ant_rx, sink, handle)
    }

    #[tokio::test]
    async fn test_start_emits_session_commands() {
        let (cmd_tx, mut out_rx, _ant_rx, _sink, handle) = spawn_actor();

        cmd_tx.send(PanelCommand::Start).await.unwrap();
        assert_eq!(out_rx.recv().await.as_deref(), Some("PS"));
        assert_eq!(out_rx.recv().await.as_deref(), Some("AI2"));

        cmd_tx.send(PanelCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_user_command_passthrough() {
        let (cmd_tx, mut out_rx, _ant_rx, _sink, handle) = spawn_actor();

        cmd_tx
            .send(PanelCommand::SendCommand("FA00007074000".to_string()))
            .await
            .unwrap();
        assert_eq!(out_rx.recv().await.as_deref(), Some("FA00007074000"));

        cmd_tx.send(PanelCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_antenna_select_forwarded() {
        let (cmd_tx, _out_rx, mut ant_rx, _sink, handle) = spawn_actor();

        cmd_tx.send(PanelCommand::SelectAntenna(3)).await.unwrap();
        assert_eq!(
            ant_rx.recv().await,
            Some(AntennaRequest::SelectAntenna { id: 3 })
        );

        cmd_tx.send(PanelCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_query_display_round_trip() {
        let (cmd_tx, _out_rx, _ant_rx, _sink, handle) = spawn_actor();

        let (tx, rx) = oneshot::channel();
        cmd_tx
            .send(PanelCommand::QueryDisplay { respond_to: tx })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), None, "nothing decoded yet");

        cmd_tx.send(PanelCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}

//! Async bridge between a [`SimRadio`] and a byte stream
//!
//! Runs the simulated radio behind any `AsyncRead + AsyncWrite` pair -
//! typically one half of `tokio::io::duplex()` - so the engine's serial
//! task talks to it exactly as it would to a physical port.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::radio::SimRadio;

/// Drive a simulated radio over a byte stream until the peer closes
pub async fn run_sim_task<T>(mut io: T, mut radio: SimRadio)
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut buf = vec![0u8; 256];
    let mut line = Vec::new();

    loop {
        // Flush anything the radio wants to say first
        while let Some(response) = radio.take_output() {
            let mut bytes = response.into_bytes();
            bytes.push(b';');
            if io.write_all(&bytes).await.is_err() {
                return;
            }
        }
        if io.flush().await.is_err() {
            return;
        }

        match tokio::time::timeout(Duration::from_millis(20), io.read(&mut buf)).await {
            Ok(Ok(0)) => {
                debug!("sim peer closed");
                return;
            }
            Ok(Ok(n)) => {
                for &byte in &buf[..n] {
                    match byte {
                        b';' | b'\r' | b'\n' => {
                            if !line.is_empty() {
                                let cmd = String::from_utf8_lossy(&line).into_owned();
                                radio.handle_command(&cmd);
                                line.clear();
                            }
                        }
                        _ => line.push(byte),
                    }
                }
            }
            Ok(Err(_)) => return,
            Err(_) => {} // timeout: loop to flush pending unsolicited output
        }
    }
}

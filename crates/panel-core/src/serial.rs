//! Async serial transport for the radio link
//!
//! One task per link. Inbound bytes run through the framer into the bounded
//! inbound queue (where the overload policy lives); outbound commands are
//! drained from the writer channel, wire-framed and flushed. Generic over
//! the I/O type so tests drive it with `tokio::io::duplex()` instead of a
//! physical port.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use cat_ts590::{wire_frame, LineFramer};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::queue::InboundQueue;

/// Read chunk size; CAT frames are tiny, this is plenty
const READ_BUF_LEN: usize = 256;

/// Poll interval for the read side
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// One serial link: reader into the inbound queue, writer from the
/// outbound channel
pub struct SerialLink<T> {
    name: String,
    io: T,
    framer: LineFramer,
    inbound: Arc<InboundQueue>,
    out_rx: mpsc::Receiver<String>,
}

impl SerialLink<SerialStream> {
    /// Open a physical serial port
    pub fn connect(
        port: &str,
        baud_rate: u32,
        inbound: Arc<InboundQueue>,
        out_rx: mpsc::Receiver<String>,
    ) -> Result<Self, tokio_serial::Error> {
        let stream = tokio_serial::new(port, baud_rate)
            .timeout(Duration::from_millis(100))
            .open_native_async()?;
        Ok(Self::new(port.to_string(), stream, inbound, out_rx))
    }
}

impl<T> SerialLink<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an existing I/O object (e.g. a duplex stream in tests)
    pub fn new(
        name: String,
        io: T,
        inbound: Arc<InboundQueue>,
        out_rx: mpsc::Receiver<String>,
    ) -> Self {
        Self {
            name,
            io,
            framer: LineFramer::new(),
            inbound,
            out_rx,
        }
    }

    /// Run until the writer channel closes or the link errors out
    pub async fn run(mut self) {
        info!(link = %self.name, "serial link task started");
        let mut buf = vec![0u8; READ_BUF_LEN];

        loop {
            tokio::select! {
                cmd = self.out_rx.recv() => {
                    let Some(cmd) = cmd else {
                        info!(link = %self.name, "writer channel closed");
                        break;
                    };
                    match wire_frame(&cmd) {
                        Ok(bytes) => {
                            if let Err(e) = self.write_all(&bytes).await {
                                warn!(link = %self.name, error = %e, "write failed");
                                break;
                            }
                        }
                        Err(e) => warn!(link = %self.name, error = %e, "command rejected"),
                    }
                }

                result = tokio::time::timeout(READ_TIMEOUT, self.io.read(&mut buf)) => {
                    match result {
                        Ok(Ok(n)) if n > 0 => {
                            debug!(link = %self.name, bytes = n, "read");
                            for cmd in self.framer.push(&buf[..n]) {
                                self.inbound.push(cmd);
                            }
                        }
                        Ok(Ok(_)) => {} // 0 bytes
                        Ok(Err(e)) => {
                            if e.kind() == ErrorKind::WouldBlock {
                                continue;
                            }
                            if e.kind() == ErrorKind::ConnectionAborted {
                                debug!(link = %self.name, "peer closed");
                                break;
                            }
                            warn!(link = %self.name, error = %e, "read failed");
                            break;
                        }
                        Err(_) => {} // timeout, loop
                    }
                }
            }
        }

        info!(link = %self.name, "serial link task stopped");
    }

    async fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.io.write_all(bytes).await?;
        self.io.flush().await
    }
}

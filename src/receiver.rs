use crate::types::{TelemetryFrame, FRAME_BYTES};
use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tracing::{info, warn};

/// Receives telemetry datagrams and decodes them into frames. Reconnect and
/// backoff policy live with the operator, not here.
pub struct Receiver {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl Receiver {
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("Failed to bind telemetry socket {addr}"))?;
        info!("Listening for telemetry on {addr}");
        Ok(Self {
            socket,
            buffer: vec![0u8; 2048],
        })
    }

    /// Waits for the next decodable frame, skipping undersized datagrams.
    pub async fn next_frame(&mut self) -> Result<TelemetryFrame> {
        loop {
            let received = self
                .socket
                .recv(&mut self.buffer)
                .await
                .context("Telemetry socket receive failed")?;
            match TelemetryFrame::decode(&self.buffer[..received]) {
                Some(frame) => return Ok(frame),
                None => warn!("Skipping undersized datagram ({received} bytes, need {FRAME_BYTES})"),
            }
        }
    }
}

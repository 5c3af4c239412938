use std::{
    io::ErrorKind,
    net::{SocketAddr, UdpSocket},
    thread,
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use log::warn;
use serde::Serialize;

use crate::{robot::Telemetry, traits::TelemetrySink};

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY: Duration = Duration::from_secs(3);

/// MessagePack datagrams to a single peer.
pub struct UdpSender {
    socket: UdpSocket,
}

impl UdpSender {
    /// Binds `src_port` (0 picks a free one) and connects to `dst_address`.
    /// Hostname lookup is retried a few times since the dashboard may not be
    /// on the network yet.
    pub fn new(src_port: u16, dst_address: &str) -> Result<UdpSender> {
        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], src_port)))
            .with_context(|| format!("Failed to bind UDP port {}", src_port))?;

        let mut attempt = 1;
        while let Err(err) = socket.connect(dst_address) {
            // Malformed addresses will not start resolving later.
            if attempt >= CONNECT_ATTEMPTS || err.kind() == ErrorKind::InvalidInput {
                return Err(err).with_context(|| format!("Failed to connect to {}", dst_address));
            }

            warn!("connecting to {} failed ({}), retrying", dst_address, err);
            thread::sleep(CONNECT_RETRY);
            attempt += 1;
        }

        socket
            .set_nonblocking(true)
            .context("Failed to make UDP socket non-blocking")?;

        Ok(UdpSender { socket })
    }

    pub fn send(&self, msg: &impl Serialize) -> Result<usize> {
        let buf = rmp_serde::to_vec(msg).context("Failed to encode message")?;
        self.socket.send(&buf).context("Failed to send datagram")
    }
}

impl TelemetrySink for UdpSender {
    /// Sends `(unix seconds, telemetry)`.
    fn publish(&mut self, telemetry: &Telemetry) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .context("System clock is before the epoch")?
            .as_secs_f64();

        self.send(&(timestamp, telemetry))?;
        Ok(())
    }
}

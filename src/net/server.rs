//! UDP input server
//!
//! A background task owns the socket, decodes every datagram and overwrites
//! the matching joystick slot. It never touches simulation state.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::input::DeviceRegistry;

use super::protocol::{decode, MAX_DATAGRAM_LEN};

/// Receives control datagrams and routes them to registered devices
pub struct InputServer {
    socket: UdpSocket,
    devices: Arc<DeviceRegistry>,
}

impl InputServer {
    /// Bind the receiving socket
    pub async fn bind(addr: SocketAddr, devices: Arc<DeviceRegistry>) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self { socket, devices })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Start the receive loop on a background task
    pub fn spawn(self) -> Result<InputServerHandle, ServerError> {
        let local_addr = self.local_addr()?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));

        info!(addr = %local_addr, "Input server listening");

        Ok(InputServerHandle {
            local_addr,
            stop_tx,
            task: Some(task),
        })
    }

    /// Receive until told to stop or the socket fails; returns accepted update count
    async fn run(self, mut stop_rx: watch::Receiver<bool>) -> u64 {
        let mut buf = [0u8; MAX_DATAGRAM_LEN];
        let mut accepted = 0u64;

        loop {
            if *stop_rx.borrow() {
                break;
            }

            tokio::select! {
                changed = stop_rx.changed() => {
                    // A dropped handle counts as a stop request.
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                received = self.socket.recv_from(&mut buf) => {
                    match received {
                        Ok((len, peer)) => {
                            if self.handle_datagram(&buf[..len], peer) {
                                accepted += 1;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Input socket receive failed, stopping");
                            break;
                        }
                    }
                }
            }
        }

        info!(accepted, "Input server stopped");
        accepted
        // socket dropped (closed) here
    }

    fn handle_datagram(&self, datagram: &[u8], peer: SocketAddr) -> bool {
        let packet = match decode(datagram) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(peer = %peer, error = %e, "Dropping malformed datagram");
                return false;
            }
        };

        if self.devices.apply(&packet.name, packet.x, packet.y) {
            true
        } else {
            debug!(peer = %peer, device = %packet.name, "Dropping datagram for unknown device");
            false
        }
    }
}

/// Handle to a running input server
pub struct InputServerHandle {
    local_addr: SocketAddr,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<u64>>,
}

impl InputServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal the receive loop to exit; safe to call repeatedly
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// True once the receive task has finished
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop and wait for the receive loop; later calls return `None`
    pub async fn shutdown(&mut self) -> Option<u64> {
        self.stop();
        let task = self.task.take()?;
        match task.await {
            Ok(accepted) => Some(accepted),
            Err(e) => {
                warn!(error = %e, "Input server task did not finish cleanly");
                None
            }
        }
    }
}

/// Input server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind input socket on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("input socket error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::encode;
    use std::time::Duration;

    async fn spawn_server(devices: Arc<DeviceRegistry>) -> InputServerHandle {
        let server = InputServer::bind("127.0.0.1:0".parse().unwrap(), devices)
            .await
            .unwrap();
        server.spawn().unwrap()
    }

    #[tokio::test]
    async fn handle_datagram_ignores_unknown_and_malformed() {
        let devices = Arc::new(DeviceRegistry::new());
        let joystick = devices.register("joystick1");
        let server = InputServer::bind("127.0.0.1:0".parse().unwrap(), devices)
            .await
            .unwrap();
        let peer: SocketAddr = "127.0.0.1:9".parse().unwrap();

        assert!(!server.handle_datagram(b"joystick1 no separator", peer));
        assert!(!server.handle_datagram(&encode("joystick9", 1.0, 1.0).unwrap(), peer));
        assert_eq!(joystick.read(), (0.0, 0.0));

        assert!(server.handle_datagram(&encode("joystick1", 0.5, -0.5).unwrap(), peer));
        assert_eq!(joystick.read(), (0.5, -0.5));
    }

    #[tokio::test]
    async fn stop_ends_a_blocked_receive_loop() {
        let devices = Arc::new(DeviceRegistry::new());
        let mut handle = spawn_server(devices).await;

        let accepted = tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .expect("shutdown timed out");
        assert_eq!(accepted, Some(0));
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let devices = Arc::new(DeviceRegistry::new());
        let mut handle = spawn_server(devices).await;

        handle.stop();
        handle.stop();
        assert!(handle.shutdown().await.is_some());
        assert_eq!(handle.shutdown().await, None);
        handle.stop();
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let devices = Arc::new(DeviceRegistry::new());
        let first = InputServer::bind("127.0.0.1:0".parse().unwrap(), devices.clone())
            .await
            .unwrap();
        let taken = first.local_addr().unwrap();

        let err = InputServer::bind(taken, devices).await.err().unwrap();
        assert!(matches!(err, ServerError::Bind { addr, .. } if addr == taken));
    }
}

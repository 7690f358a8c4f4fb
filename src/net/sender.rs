//! Control datagram sender used by the capture side

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::trace;

use crate::tracking::ControlVector;

use super::protocol::{encode, ProtocolError};

/// Sends one device's control vector to a fixed destination
pub struct ControlSender {
    socket: UdpSocket,
    target: SocketAddr,
    device: String,
}

impl ControlSender {
    /// Bind an ephemeral local socket for sending to `target`
    pub async fn connect(target: SocketAddr, device: impl Into<String>) -> Result<Self, SendError> {
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;

        Ok(Self {
            socket,
            target,
            device: device.into(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send a tracker output, scaled down to controller range
    pub async fn send(&self, vector: ControlVector) -> Result<(), SendError> {
        let (x, y) = vector.to_controller_scale();
        self.send_raw(x, y).await
    }

    /// Send an already-scaled `(x, y)` pair
    pub async fn send_raw(&self, x: f32, y: f32) -> Result<(), SendError> {
        let datagram = encode(&self.device, x, y)?;
        let sent = self.socket.send_to(&datagram, self.target).await?;
        trace!(device = %self.device, x, y, bytes = sent, "Sent control update");
        Ok(())
    }
}

/// Sender errors
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("control socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::decode;
    use glam::Vec2;

    #[tokio::test]
    async fn send_scales_and_encodes() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let sender = ControlSender::connect(target, "joystick1").await.unwrap();

        sender.send(ControlVector(Vec2::new(30.0, -15.0))).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        let packet = decode(&buf[..len]).unwrap();
        assert_eq!(packet.name, "joystick1");
        assert_eq!((packet.x, packet.y), (1.0, -0.5));
    }

    #[tokio::test]
    async fn invalid_device_name_fails_before_sending() {
        let sender = ControlSender::connect("127.0.0.1:9".parse().unwrap(), "bad\r\n")
            .await
            .unwrap();
        let err = sender.send_raw(0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, SendError::Protocol(ProtocolError::SeparatorInName)));
    }
}

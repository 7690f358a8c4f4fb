//! Control channel: wire format, sender, and the receiving input server

pub mod protocol;
pub mod sender;
pub mod server;

pub use protocol::{ControlPacket, ProtocolError, CONTROL_PORT};
pub use sender::{ControlSender, SendError};
pub use server::{InputServer, InputServerHandle, ServerError};

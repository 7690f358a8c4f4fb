//! Gesture Arena - camera-driven controls for a small fixed-tick shooter
//!
//! The capture side turns camera motion into control vectors and sends them
//! over UDP. The game side receives them into named joysticks and runs the
//! arena simulation:
//! - `tracking`: corner detection, optical flow, motion filtering
//! - `net`: the control datagram format, sender and input server
//! - `game`: entities and the tick loop
//! - `render`: headless boundary and sinks

pub mod app;
pub mod capture;
pub mod config;
pub mod game;
pub mod input;
pub mod net;
pub mod render;
pub mod tracking;
pub mod util;

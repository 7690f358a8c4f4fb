//! Named controller devices shared between the input server and the simulation

pub mod joystick;

pub use joystick::{DeviceRegistry, Joystick};

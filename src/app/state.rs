//! Application state shared by the input server and the simulation

use std::sync::Arc;

use crate::config::Config;
use crate::input::{DeviceRegistry, Joystick};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub devices: Arc<DeviceRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            devices: Arc::new(DeviceRegistry::new()),
        }
    }

    /// Register the configured left and right devices
    ///
    /// Must happen before the input server starts so that updates for them
    /// are not dropped as unknown.
    pub fn register_controllers(&self) -> (Joystick, Joystick) {
        let left = self.devices.register(&self.config.left_device);
        let right = self.devices.register(&self.config.right_device);
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controllers_are_shared_with_the_registry() {
        let state = AppState::new(Config::from_lookup(|_| None).unwrap());
        let (left, right) = state.register_controllers();
        assert_eq!(state.devices.len(), 2);

        assert!(state.devices.apply(left.name(), 0.5, -0.5));
        assert_eq!(left.read(), (0.5, -0.5));
        assert!(right.is_idle());
    }
}

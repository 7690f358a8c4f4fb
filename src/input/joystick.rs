//! Joystick slots and the device registry
//!
//! A joystick holds only the most recent `(x, y)` pair. The input server
//! overwrites it; the simulation reads it once per tick. Nothing queues.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

/// Latest reported position of one named device
#[derive(Clone)]
pub struct Joystick {
    name: Arc<str>,
    slot: Arc<RwLock<(f32, f32)>>,
}

impl Joystick {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            slot: Arc::new(RwLock::new((0.0, 0.0))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overwrite the slot, discarding whatever was there
    pub fn update(&self, x: f32, y: f32) {
        *self.slot.write() = (x, y);
    }

    /// Current `(x, y)`
    pub fn read(&self) -> (f32, f32) {
        *self.slot.read()
    }

    /// True when the device reports no intended input
    pub fn is_idle(&self) -> bool {
        self.read() == (0.0, 0.0)
    }
}

impl fmt::Debug for Joystick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.read();
        write!(f, "{}: ({}, {})", self.name, x, y)
    }
}

/// Devices the input server routes datagrams to
#[derive(Default)]
pub struct DeviceRegistry {
    devices: DashMap<String, Joystick>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device, returning its joystick handle
    ///
    /// Registering a name twice returns the existing handle.
    pub fn register(&self, name: &str) -> Joystick {
        self.devices
            .entry(name.to_string())
            .or_insert_with(|| Joystick::new(name))
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Joystick> {
        self.devices.get(name).map(|j| j.value().clone())
    }

    /// Apply an update to a registered device; returns false for unknown names
    pub fn apply(&self, name: &str, x: f32, y: f32) -> bool {
        match self.devices.get(name) {
            Some(joystick) => {
                joystick.update(x, y);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

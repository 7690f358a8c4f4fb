//! Sink that reports each tick through `tracing`

use tracing::trace;

use crate::game::{EntitySnapshot, EntityTag};

use super::{RenderError, RenderSink};

/// Logs entity counts per tick at `trace`; used when no snapshot file is set
#[derive(Debug, Default)]
pub struct TracingSink {
    frames: u64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSink for TracingSink {
    fn render(&mut self, entities: &[EntitySnapshot]) -> Result<(), RenderError> {
        let count = |tag: EntityTag| entities.iter().filter(|e| e.tag == tag).count();
        trace!(
            frame = self.frames,
            enemies = count(EntityTag::Enemy),
            bullets = count(EntityTag::Bullet),
            "Frame"
        );
        self.frames += 1;
        Ok(())
    }
}

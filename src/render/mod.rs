//! Headless render collaborators
//!
//! The simulation only needs two things from a display: the size of the play
//! area and somewhere to put each tick's entities. Sinks dispatch per entity
//! through a [`DrawTable`] keyed by [`EntityTag`]; tags without an entry are
//! simply not drawn.

pub mod json;
pub mod log;

pub use json::JsonLinesSink;
pub use log::TracingSink;

use std::collections::HashMap;

use crate::game::{EntitySnapshot, EntityTag, ScreenSize};

/// Supplies the play-area size, queried once per tick
pub trait RenderBoundary {
    fn screen_size(&self) -> ScreenSize;
}

/// Receives the live entities once per tick
pub trait RenderSink {
    fn render(&mut self, entities: &[EntitySnapshot]) -> Result<(), RenderError>;
}

/// Render errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{tag:?} at ({x}, {y}) is outside the screen")]
    OffScreen { tag: EntityTag, x: f32, y: f32 },
}

/// A screen whose size never changes
#[derive(Debug, Clone, Copy)]
pub struct FixedScreen {
    size: ScreenSize,
}

impl FixedScreen {
    pub fn new(size: ScreenSize) -> Self {
        Self { size }
    }

    pub fn from_cells(width: u32, height: u32) -> Self {
        Self::new(ScreenSize::new(width as f32, height as f32))
    }
}

impl RenderBoundary for FixedScreen {
    fn screen_size(&self) -> ScreenSize {
        self.size
    }
}

/// Draw routine for one entity variant onto canvas `C`
pub type DrawFn<C> = fn(&mut C, &EntitySnapshot) -> Result<(), RenderError>;

/// Per-variant draw dispatch
pub struct DrawTable<C> {
    draws: HashMap<EntityTag, DrawFn<C>>,
}

impl<C> DrawTable<C> {
    pub fn new() -> Self {
        Self {
            draws: HashMap::new(),
        }
    }

    pub fn with(mut self, tag: EntityTag, draw: DrawFn<C>) -> Self {
        self.draws.insert(tag, draw);
        self
    }

    /// Draw one entity; `Ok(false)` when the tag has no draw routine
    pub fn draw(&self, canvas: &mut C, entity: &EntitySnapshot) -> Result<bool, RenderError> {
        match self.draws.get(&entity.tag) {
            Some(draw) => draw(canvas, entity).map(|()| true),
            None => Ok(false),
        }
    }
}

impl<C> Default for DrawTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(tag: EntityTag) -> EntitySnapshot {
        EntitySnapshot {
            id: 1,
            tag,
            x: 3.0,
            y: 4.0,
        }
    }

    fn count(canvas: &mut Vec<EntityTag>, e: &EntitySnapshot) -> Result<(), RenderError> {
        canvas.push(e.tag);
        Ok(())
    }

    fn refuse(_: &mut Vec<EntityTag>, e: &EntitySnapshot) -> Result<(), RenderError> {
        Err(RenderError::OffScreen {
            tag: e.tag,
            x: e.x,
            y: e.y,
        })
    }

    #[test]
    fn table_dispatches_by_tag() {
        let table: DrawTable<Vec<EntityTag>> = DrawTable::new()
            .with(EntityTag::Player, count)
            .with(EntityTag::Bullet, refuse);
        let mut canvas = Vec::new();

        assert!(table.draw(&mut canvas, &entity(EntityTag::Player)).unwrap());
        assert!(!table.draw(&mut canvas, &entity(EntityTag::Gun)).unwrap());
        assert!(table.draw(&mut canvas, &entity(EntityTag::Bullet)).is_err());
        assert_eq!(canvas, vec![EntityTag::Player]);
    }

    #[test]
    fn fixed_screen_reports_its_size() {
        let screen = FixedScreen::from_cells(80, 24);
        assert_eq!(screen.screen_size(), ScreenSize::new(80.0, 24.0));
    }
}

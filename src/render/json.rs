//! JSON-lines frame writer: one line per tick, one cell per drawn entity

use std::io::Write;

use serde::Serialize;
use tracing::warn;

use crate::game::{EntitySnapshot, EntityTag, ScreenSize};

use super::{DrawTable, RenderError, RenderSink};

/// A drawn character cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
    pub glyph: char,
}

/// Cells collected for the frame being written
#[derive(Debug)]
pub struct Canvas {
    size: ScreenSize,
    cells: Vec<Cell>,
}

impl Canvas {
    fn put(&mut self, x: f32, y: f32, glyph: char) {
        self.cells.push(Cell {
            col: x as i32,
            row: y as i32,
            glyph,
        });
    }
}

#[derive(Serialize)]
struct FrameLine<'a> {
    frame: u64,
    cells: &'a [Cell],
}

fn draw_player(canvas: &mut Canvas, e: &EntitySnapshot) -> Result<(), RenderError> {
    canvas.put(e.x, e.y, '@');
    Ok(())
}

fn draw_enemy(canvas: &mut Canvas, e: &EntitySnapshot) -> Result<(), RenderError> {
    canvas.put(e.x, e.y, '#');
    Ok(())
}

fn draw_bullet(canvas: &mut Canvas, e: &EntitySnapshot) -> Result<(), RenderError> {
    let (w, h) = (canvas.size.width, canvas.size.height);
    if e.x < 0.0 || e.y < 0.0 || e.x >= w || e.y >= h {
        return Err(RenderError::OffScreen {
            tag: e.tag,
            x: e.x,
            y: e.y,
        });
    }
    canvas.put(e.x, e.y, '*');
    Ok(())
}

/// Writes each tick as a JSON object on its own line
///
/// Guns have no draw routine. An entity that fails to draw is logged and
/// skipped; only write failures are returned.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    table: DrawTable<Canvas>,
    size: ScreenSize,
    frame: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W, size: ScreenSize) -> Self {
        let table = DrawTable::new()
            .with(EntityTag::Player, draw_player)
            .with(EntityTag::Enemy, draw_enemy)
            .with(EntityTag::Bullet, draw_bullet);

        Self {
            writer,
            table,
            size,
            frame: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frame
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn render(&mut self, entities: &[EntitySnapshot]) -> Result<(), RenderError> {
        let mut canvas = Canvas {
            size: self.size,
            cells: Vec::with_capacity(entities.len()),
        };

        for entity in entities {
            if let Err(e) = self.table.draw(&mut canvas, entity) {
                warn!(id = entity.id, error = %e, "Skipping entity");
            }
        }

        let line = FrameLine {
            frame: self.frame,
            cells: &canvas.cells,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.frame += 1;
        Ok(())
    }
}

//! Binary PGM (P5) frames read from a directory

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::tracking::{FrameError, GrayFrame};

use super::{CaptureError, FrameSource};

/// Plays back every `*.pgm` file in a directory, in file-name order
#[derive(Debug)]
pub struct PgmDirectorySource {
    pending: VecDeque<PathBuf>,
}

impl PgmDirectorySource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_pgm = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pgm"));
            if is_pgm && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        info!(dir = %dir.display(), frames = files.len(), "Opened frame directory");
        Ok(Self { pending: files.into() })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for PgmDirectorySource {
    fn next_frame(&mut self) -> Result<Option<GrayFrame>, CaptureError> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let bytes = fs::read(&path)?;
        let frame = match parse_pgm(&bytes) {
            Ok(frame) => frame,
            Err(source) => return Err(CaptureError::Pgm { path, source }),
        };
        debug!(path = %path.display(), width = frame.width(), height = frame.height(), "Read frame");
        Ok(Some(frame))
    }
}

/// PGM decoding errors
#[derive(Debug, thiserror::Error)]
pub enum PgmError {
    #[error("not a binary PGM (expected P5)")]
    NotP5,

    #[error("header truncated")]
    HeaderTruncated,

    #[error("invalid {field}: {token:?}")]
    InvalidField { field: &'static str, token: String },

    #[error("max value {0} out of range")]
    MaxValue(usize),

    #[error("{width}x{height} raster is too large")]
    TooLarge { width: usize, height: usize },

    #[error("raster truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Decode a binary PGM image
///
/// 16-bit samples are scaled down to 8 bits.
pub fn parse_pgm(bytes: &[u8]) -> Result<GrayFrame, PgmError> {
    let mut header = Header { bytes, pos: 0 };

    if header.token()? != b"P5" {
        return Err(PgmError::NotP5);
    }
    let width = header.number("width")?;
    let height = header.number("height")?;
    let max_value = header.number("max value")?;
    if max_value == 0 || max_value > u16::MAX as usize {
        return Err(PgmError::MaxValue(max_value));
    }

    let sample_bytes = if max_value < 256 { 1 } else { 2 };
    let need = width
        .checked_mul(height)
        .and_then(|count| count.checked_mul(sample_bytes))
        .ok_or(PgmError::TooLarge { width, height })?;

    // Exactly one whitespace byte separates the header from the raster.
    let data = bytes.get(header.pos + 1..).unwrap_or(&[]);
    let raster = data.get(..need).ok_or(PgmError::Truncated {
        need,
        have: data.len(),
    })?;

    let scale = |v: usize| (v.min(max_value) * 255 / max_value) as u8;
    let pixels: Vec<u8> = if sample_bytes == 1 {
        raster.iter().map(|&v| scale(v as usize)).collect()
    } else {
        raster
            .chunks_exact(2)
            .map(|pair| scale(u16::from_be_bytes([pair[0], pair[1]]) as usize))
            .collect()
    };

    Ok(GrayFrame::new(width, height, pixels)?)
}

struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    /// Next whitespace-delimited token, skipping `#` comments
    fn token(&mut self) -> Result<&'a [u8], PgmError> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'#') => {
                    while self.bytes.get(self.pos).is_some_and(|&b| b != b'\n') {
                        self.pos += 1;
                    }
                }
                Some(_) => break,
                None => return Err(PgmError::HeaderTruncated),
            }
        }

        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|b| !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        Ok(&self.bytes[start..self.pos])
    }

    fn number(&mut self, field: &'static str) -> Result<usize, PgmError> {
        let token = self.token()?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| PgmError::InvalidField {
                field,
                token: String::from_utf8_lossy(token).into_owned(),
            })
    }
}

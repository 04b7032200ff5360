//! Data specification writer used by the demo generation pass
//!
//! Each placement gets `dataSpec_{x}_{y}_{p}.dat`, a little-endian header of
//! five words: magic, format version, x, y, p.

use gfe_foundation::Placement;
use gfe_task::WorkError;
use std::fs;
use std::path::{Path, PathBuf};

/// Magic number at the start of every generated file
pub const DSG_MAGIC: u32 = 0xAD13_0AD6;

/// Header format version
pub const DSG_VERSION: u32 = 1;

const HEADER_WORDS: usize = 5;

/// Number of placements in a grid, `None` if it does not fit in a `u32`
pub fn placement_count(width: u32, height: u32, cores: u32) -> Option<u32> {
    width.checked_mul(height)?.checked_mul(cores)
}

/// Every processor `1..=cores` of a `width` x `height` chip grid.
///
/// Returns `None` when the grid is too large to address.
pub fn grid(width: u32, height: u32, cores: u32) -> Option<Vec<Placement>> {
    let count = placement_count(width, height, cores)?;
    let mut placements = Vec::with_capacity(count as usize);
    for x in 0..width {
        for y in 0..height {
            for p in 1..=cores {
                placements.push(Placement::new(x, y, p));
            }
        }
    }
    Some(placements)
}

pub fn spec_path(output: &Path, placement: &Placement) -> PathBuf {
    output.join(format!("dataSpec_{}.dat", placement.file_stem()))
}

/// Encode the header for one placement
pub fn encode_header(placement: &Placement) -> Vec<u8> {
    let words = [DSG_MAGIC, DSG_VERSION, placement.x, placement.y, placement.p];
    let mut bytes = Vec::with_capacity(HEADER_WORDS * 4);
    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes
}

/// Work item body: write the file for `placement`
pub fn write_data_spec(output: &Path, placement: &Placement) -> Result<(), WorkError> {
    let path = spec_path(output, placement);
    fs::write(&path, encode_header(placement))?;
    Ok(())
}

//! Placement identity

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where a vertex was placed: chip coordinates plus processor id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Placement {
    /// Chip x coordinate
    pub x: u32,

    /// Chip y coordinate
    pub y: u32,

    /// Processor on the chip
    pub p: u32,
}

impl Placement {
    pub fn new(x: u32, y: u32, p: u32) -> Self {
        Self { x, y, p }
    }

    /// File-name friendly form, `x_y_p`
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.x, self.y, self.p)
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "placement {}.{}.{}", self.x, self.y, self.p)
    }
}

impl FromStr for Placement {
    type Err = Error;

    /// Parses `x.y.p`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidInput(format!(
                "expected placement as x.y.p, got '{}'",
                s
            )));
        }

        let coord = |part: &str| {
            part.parse::<u32>().map_err(|e| {
                Error::InvalidInput(format!("bad coordinate '{}' in '{}': {}", part, s, e))
            })
        };

        Ok(Self {
            x: coord(parts[0])?,
            y: coord(parts[1])?,
            p: coord(parts[2])?,
        })
    }
}

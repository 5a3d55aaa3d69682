//! Material sheet naming convention.
//!
//! A sheet resource name ends in its tile size in pixels (`terrain_16`).
//! `<base>_normal` and `<base>_emission` are companion maps read alongside
//! `<base>` rather than materials of their own.

use crate::types::MaterialKey;

/// Tile size assumed when a sheet name carries no trailing integer.
pub const DEFAULT_TILE_PX: u32 = 16;

const NORMAL_SUFFIX: &str = "_normal";
const EMISSION_SUFFIX: &str = "_emission";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetRole {
    Albedo,
    /// Normal map for the albedo sheet named by the payload.
    Normal(String),
    /// Emission map for the albedo sheet named by the payload.
    Emission(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetName {
    pub name: String,
    pub tile_px: u32,
    pub role: SheetRole,
}

impl SheetName {
    pub fn parse(name: &str) -> SheetName {
        let role = if let Some(base) = name.strip_suffix(NORMAL_SUFFIX) {
            SheetRole::Normal(base.to_owned())
        } else if let Some(base) = name.strip_suffix(EMISSION_SUFFIX) {
            SheetRole::Emission(base.to_owned())
        } else {
            SheetRole::Albedo
        };
        let sized = match &role {
            SheetRole::Albedo => name,
            SheetRole::Normal(base) | SheetRole::Emission(base) => base.as_str(),
        };
        let tile_px = sized
            .rsplit('_')
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|px| *px > 0)
            .unwrap_or(DEFAULT_TILE_PX);
        SheetName {
            name: name.to_owned(),
            tile_px,
            role,
        }
    }

    #[inline]
    pub fn is_companion(&self) -> bool {
        !matches!(self.role, SheetRole::Albedo)
    }

    /// Key of the tile at column `i`, row `j` of this sheet.
    pub fn tile_key(&self, i: u32, j: u32) -> MaterialKey {
        MaterialKey(format!("{}_{}_{}", self.name, i, j))
    }

    pub fn normal_name(&self) -> String {
        format!("{}{}", self.name, NORMAL_SUFFIX)
    }

    pub fn emission_name(&self) -> String {
        format!("{}{}", self.name, EMISSION_SUFFIX)
    }
}

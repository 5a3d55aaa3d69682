//! Tile-grid texture atlas.
//!
//! The atlas is an `N×N` grid of tiles, each `tile_px` pixels square. A
//! sprite of `k·tile_px` pixels claims a free `k×k` block of tiles; blocks
//! are found by a row-major scan starting at the first free tile.

use std::collections::HashMap;
use std::path::Path;

use image::{RgbaImage, imageops};
use thiserror::Error;
use voxedit_blocks::MaterialKey;
use voxedit_geom::Vec2;

use crate::library::MaterialLibrary;

/// Largest sprite edge, in tiles, the packer accepts.
pub const MAX_SIZE_CLASS: u32 = 3;

pub const ATLAS_NAME: &str = "tex_atlas";

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("atlas is full: no free {size}x{size} block left for `{key}` in a {grid}x{grid} grid")]
    Capacity {
        key: MaterialKey,
        size: u32,
        grid: u32,
    },
    #[error(
        "sprite `{key}` is {width}x{height}px; expected a square of 1 to {max} tiles of {tile_px}px",
        max = MAX_SIZE_CLASS
    )]
    UnsupportedSpriteSize {
        key: MaterialKey,
        width: u32,
        height: u32,
        tile_px: u32,
    },
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Placement of one sprite, in tile units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl AtlasRect {
    /// Maps a sprite-local UV in `[0,1]²` into atlas space for a grid of
    /// `grid` tiles per side.
    #[inline]
    pub fn remap_uv(&self, uv: Vec2, grid: u32) -> Vec2 {
        let n = grid as f32;
        Vec2::new(
            uv.x / n * self.w as f32 + self.x as f32 / n,
            uv.y / n * self.h as f32 + self.y as f32 / n,
        )
    }

    #[inline]
    pub fn contains_tile(&self, tx: u32, ty: u32) -> bool {
        tx >= self.x && tx < self.x + self.w && ty >= self.y && ty < self.y + self.h
    }
}

/// Finished atlas: the composed image and every packed rect.
#[derive(Clone, Debug)]
pub struct AtlasTexture {
    pub name: String,
    pub image: RgbaImage,
    pub grid_tiles: u32,
    pub tile_px: u32,
    pub rects: HashMap<MaterialKey, AtlasRect>,
}

impl AtlasTexture {
    #[inline]
    pub fn rect(&self, key: &MaterialKey) -> Option<AtlasRect> {
        self.rects.get(key).copied()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), AtlasError> {
        self.image.save(path.as_ref())?;
        log::info!(
            "wrote {} ({}x{}px, {} rect(s)) to {:?}",
            self.name,
            self.image.width(),
            self.image.height(),
            self.rects.len(),
            path.as_ref()
        );
        Ok(())
    }
}

pub struct TextureAtlasBuilder {
    grid_tiles: u32,
    tile_px: u32,
    // Row-major occupancy, index y*N + x
    occupied: Vec<bool>,
    first_free: Option<usize>,
    image: RgbaImage,
    rects: HashMap<MaterialKey, AtlasRect>,
}

impl TextureAtlasBuilder {
    pub fn new(grid_tiles: u32, tile_px: u32) -> Self {
        let grid_tiles = grid_tiles.max(1);
        let tile_px = tile_px.max(1);
        let cells = (grid_tiles * grid_tiles) as usize;
        Self {
            grid_tiles,
            tile_px,
            occupied: vec![false; cells],
            first_free: Some(0),
            image: RgbaImage::new(grid_tiles * tile_px, grid_tiles * tile_px),
            rects: HashMap::new(),
        }
    }

    #[inline]
    pub fn grid_tiles(&self) -> u32 {
        self.grid_tiles
    }

    #[inline]
    pub fn tile_px(&self) -> u32 {
        self.tile_px
    }

    #[inline]
    pub fn rect(&self, key: &MaterialKey) -> Option<AtlasRect> {
        self.rects.get(key).copied()
    }

    /// Number of free tiles left.
    pub fn free_tiles(&self) -> usize {
        self.occupied.iter().filter(|o| !**o).count()
    }

    /// Packs `key`'s sprite, or returns its rect if already packed. Keys the
    /// library does not know fall back to the default material.
    pub fn add_sprite(
        &mut self,
        library: &MaterialLibrary,
        key: &MaterialKey,
    ) -> Result<AtlasRect, AtlasError> {
        if let Some(rect) = self.rects.get(key) {
            return Ok(*rect);
        }
        let default_key = MaterialKey::default();
        let rect = match library.get(key) {
            Some(sprite) => {
                let size = self.size_class(key, &sprite.albedo)?;
                let rect = self.claim(key, size)?;
                self.blit(&sprite.albedo, rect);
                rect
            }
            None => {
                if !key.is_default() {
                    log::warn!("unknown material `{}`; using the default material", key);
                }
                match self.rects.get(&default_key) {
                    Some(rect) => *rect,
                    None => {
                        let rect = self.claim(&default_key, 1)?;
                        let tile = library.default_sprite(self.tile_px);
                        self.blit(&tile, rect);
                        self.rects.insert(default_key.clone(), rect);
                        rect
                    }
                }
            }
        };
        self.rects.insert(key.clone(), rect);
        Ok(rect)
    }

    fn size_class(&self, key: &MaterialKey, img: &RgbaImage) -> Result<u32, AtlasError> {
        let (w, h) = img.dimensions();
        let k = w / self.tile_px;
        if w != h || w % self.tile_px != 0 || !(1..=MAX_SIZE_CLASS).contains(&k) {
            return Err(AtlasError::UnsupportedSpriteSize {
                key: key.clone(),
                width: w,
                height: h,
                tile_px: self.tile_px,
            });
        }
        Ok(k)
    }

    /// Finds and marks the first free `k×k` block at or after the cursor.
    fn claim(&mut self, key: &MaterialKey, k: u32) -> Result<AtlasRect, AtlasError> {
        let n = self.grid_tiles;
        let full = || AtlasError::Capacity {
            key: key.clone(),
            size: k,
            grid: n,
        };
        let start = self.first_free.ok_or_else(full)?;
        let origin = (start..self.occupied.len()).find(|&i| {
            let (x, y) = (i as u32 % n, i as u32 / n);
            x + k <= n && y + k <= n && self.block_free(x, y, k)
        });
        let Some(i) = origin else {
            return Err(full());
        };
        let (x, y) = (i as u32 % n, i as u32 / n);
        for ty in y..y + k {
            for tx in x..x + k {
                self.occupied[(ty * n + tx) as usize] = true;
            }
        }
        self.first_free = (start..self.occupied.len()).find(|&j| !self.occupied[j]);
        log::trace!("packed `{}` at ({}, {}) size {}", key, x, y, k);
        Ok(AtlasRect { x, y, w: k, h: k })
    }

    fn block_free(&self, x: u32, y: u32, k: u32) -> bool {
        let n = self.grid_tiles;
        (y..y + k).all(|ty| (x..x + k).all(|tx| !self.occupied[(ty * n + tx) as usize]))
    }

    fn blit(&mut self, sprite: &RgbaImage, rect: AtlasRect) {
        let px = self.tile_px as i64;
        imageops::replace(&mut self.image, sprite, rect.x as i64 * px, rect.y as i64 * px);
    }

    pub fn finish(self) -> AtlasTexture {
        log::debug!(
            "atlas finished with {} rect(s), {} free tile(s)",
            self.rects.len(),
            self.occupied.iter().filter(|o| !**o).count()
        );
        AtlasTexture {
            name: ATLAS_NAME.to_owned(),
            image: self.image,
            grid_tiles: self.grid_tiles,
            tile_px: self.tile_px,
            rects: self.rects,
        }
    }
}

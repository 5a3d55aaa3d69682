use std::collections::HashMap;
use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage, imageops};
use voxedit_blocks::sheet::{SheetName, SheetRole};
use voxedit_blocks::MaterialKey;

use crate::atlas::AtlasError;

/// Pixels of one material: the albedo tile plus optional companion maps.
#[derive(Clone, Debug)]
pub struct Sprite {
    pub albedo: RgbaImage,
    pub normal: Option<RgbaImage>,
    pub emission: Option<RgbaImage>,
}

impl Sprite {
    pub fn new(albedo: RgbaImage) -> Self {
        Self {
            albedo,
            normal: None,
            emission: None,
        }
    }

    /// Edge length in pixels (sprites are square).
    #[inline]
    pub fn size_px(&self) -> u32 {
        self.albedo.width()
    }
}

/// Every material sprite the editor knows, sliced out of material sheets.
///
/// Owned explicitly by the caller and passed to whatever needs textures;
/// call [`MaterialLibrary::rebuild`] after the sheets change.
#[derive(Clone, Debug)]
pub struct MaterialLibrary {
    sprites: HashMap<MaterialKey, Sprite>,
    default_color: Rgba<u8>,
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialLibrary {
    pub const DEFAULT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

    pub fn new() -> Self {
        Self {
            sprites: HashMap::new(),
            default_color: Self::DEFAULT_COLOR,
        }
    }

    pub fn with_default_color(mut self, color: Rgba<u8>) -> Self {
        self.default_color = color;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: &MaterialKey) -> bool {
        self.sprites.contains_key(key)
    }

    #[inline]
    pub fn get(&self, key: &MaterialKey) -> Option<&Sprite> {
        self.sprites.get(key)
    }

    /// Sorted material keys.
    pub fn keys(&self) -> Vec<&MaterialKey> {
        let mut keys: Vec<_> = self.sprites.keys().collect();
        keys.sort();
        keys
    }

    pub fn insert(&mut self, key: MaterialKey, sprite: Sprite) {
        self.sprites.insert(key, sprite);
    }

    /// Solid tile standing in for the default material.
    pub fn default_sprite(&self, size_px: u32) -> RgbaImage {
        RgbaImage::from_pixel(size_px, size_px, self.default_color)
    }

    /// Builds a library from named sheets.
    pub fn from_sheets<'a>(sheets: impl IntoIterator<Item = (&'a str, &'a RgbaImage)>) -> Self {
        let mut lib = Self::new();
        lib.rebuild(sheets);
        lib
    }

    /// Drops every sprite and slices `sheets` again. Companion sheets
    /// (`_normal`, `_emission`) attach to the tiles of their base sheet.
    pub fn rebuild<'a>(&mut self, sheets: impl IntoIterator<Item = (&'a str, &'a RgbaImage)>) {
        self.sprites.clear();
        let sheets: HashMap<&str, &RgbaImage> = sheets.into_iter().collect();
        let mut names: Vec<&str> = sheets.keys().copied().collect();
        names.sort();
        for name in names {
            let parsed = SheetName::parse(name);
            if parsed.role != SheetRole::Albedo {
                continue;
            }
            let normal = sheets.get(parsed.normal_name().as_str()).copied();
            let emission = sheets.get(parsed.emission_name().as_str()).copied();
            self.slice_sheet(&parsed, sheets[name], normal, emission);
        }
        log::info!("material library holds {} sprite(s)", self.sprites.len());
    }

    fn slice_sheet(
        &mut self,
        sheet: &SheetName,
        albedo: &RgbaImage,
        normal: Option<&RgbaImage>,
        emission: Option<&RgbaImage>,
    ) {
        let s = sheet.tile_px;
        let (cols, rows) = (albedo.width() / s, albedo.height() / s);
        if cols == 0 || rows == 0 {
            log::warn!(
                "sheet {} ({}x{}) is smaller than its {}px tile",
                sheet.name,
                albedo.width(),
                albedo.height(),
                s
            );
        }
        for i in 0..cols {
            for j in 0..rows {
                let (x, y) = (i * s, j * s);
                let mut sprite = Sprite::new(imageops::crop_imm(albedo, x, y, s, s).to_image());
                sprite.normal = normal
                    .filter(|n| covers(n, x, y, s))
                    .map(|n| height_normal_tile(n, x, y, s));
                sprite.emission = emission
                    .filter(|e| covers(e, x, y, s) && e.get_pixel(x, y)[3] != 0)
                    .map(|e| imageops::crop_imm(e, x, y, s, s).to_image());
                self.sprites.insert(sheet.tile_key(i, j), sprite);
            }
        }
    }

    /// Loads every `.png` in `dir` as a sheet named after its file stem.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, AtlasError> {
        let mut loaded: Vec<(String, RgbaImage)> = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_png = path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("png"));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_png {
                continue;
            }
            log::debug!("loading sheet {:?}", path);
            loaded.push((stem.to_owned(), image::open(&path)?.to_rgba8()));
        }
        Ok(Self::from_sheets(loaded.iter().map(|(n, img)| (n.as_str(), img))))
    }
}

#[inline]
fn covers(img: &RgbaImage, x: u32, y: u32, s: u32) -> bool {
    x + s <= img.width() && y + s <= img.height()
}

/// Normal sheets store height in green and a mask in red; the material wants
/// grey height with the mask as alpha.
fn height_normal_tile(src: &RgbaImage, x0: u32, y0: u32, s: u32) -> RgbaImage {
    RgbaImage::from_fn(s, s, |x, y| {
        let p = src.get_pixel(x0 + x, y0 + y);
        Rgba([p[1], p[1], p[1], p[0]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32, tile: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            let v = ((x / tile) * 40 + (y / tile) * 7) as u8;
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn slices_sheet_into_keyed_tiles() {
        let sheet = checker(32, 16, 8);
        let lib = MaterialLibrary::from_sheets([("walls_8", &sheet)]);
        assert_eq!(lib.len(), 8);
        let s = lib.get(&MaterialKey::from("walls_8_3_1")).unwrap();
        assert_eq!(s.size_px(), 8);
        assert_eq!(s.albedo.get_pixel(0, 0)[0], 3 * 40 + 7);
        assert!(s.normal.is_none() && s.emission.is_none());
    }

    #[test]
    fn companions_attach_and_are_not_materials() {
        let sheet = checker(16, 8, 8);
        let normal = RgbaImage::from_pixel(16, 8, Rgba([9, 200, 0, 255]));
        let mut emission = RgbaImage::new(16, 8);
        emission.put_pixel(8, 0, Rgba([255, 0, 0, 255]));
        let lib = MaterialLibrary::from_sheets([
            ("lamp_8", &sheet),
            ("lamp_8_normal", &normal),
            ("lamp_8_emission", &emission),
        ]);
        assert_eq!(lib.len(), 2);
        let lit = lib.get(&MaterialKey::from("lamp_8_1_0")).unwrap();
        let dark = lib.get(&MaterialKey::from("lamp_8_0_0")).unwrap();
        assert!(lit.emission.is_some());
        assert!(dark.emission.is_none());
        let n = dark.normal.as_ref().unwrap();
        assert_eq!(*n.get_pixel(2, 2), Rgba([200, 200, 200, 9]));
    }

    #[test]
    fn rebuild_replaces_contents() {
        let a = checker(8, 8, 8);
        let mut lib = MaterialLibrary::from_sheets([("a_8", &a)]);
        assert!(lib.contains(&MaterialKey::from("a_8_0_0")));
        lib.rebuild([("b_8", &a)]);
        assert!(!lib.contains(&MaterialKey::from("a_8_0_0")));
        assert!(lib.contains(&MaterialKey::from("b_8_0_0")));
    }
}

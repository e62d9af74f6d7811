//! Tiled raster backing store of drawing layers.
//!
//! A surface has a large square logical extent but only allocates the tiles
//! that have actually been painted on, so an untouched drawing layer costs
//! nothing and a few strokes cost a handful of tiles.

use std::collections::HashMap;
use std::sync::Arc;

use egui::{Pos2, Rect};
use parking_lot::RwLock;
use tiny_skia::{Pixmap, PremultipliedColorU8, Transform};

/// Shared handle to a drawing surface. Layer records are re-wrapped after every
/// paint but keep pointing at the same surface.
pub type SurfaceRef = Arc<RwLock<Surface>>;

type TileKey = (u32, u32);

pub struct Surface {
    extent: u32,
    tile_size: u32,
    tiles: HashMap<TileKey, Pixmap>,
    /// Bounding box of painted pixels, in surface pixels
    ink: Option<Rect>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("extent", &self.extent)
            .field("tile_size", &self.tile_size)
            .field("tiles", &self.tiles.len())
            .field("ink", &self.ink)
            .finish()
    }
}

impl Surface {
    /// An empty, fully transparent surface of `extent`×`extent` pixels
    pub fn new(extent: u32, tile_size: u32) -> Self {
        Self {
            extent: extent.max(1),
            tile_size: tile_size.max(1),
            tiles: HashMap::new(),
            ink: None,
        }
    }

    pub fn into_shared(self) -> SurfaceRef {
        Arc::new(RwLock::new(self))
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ink.is_none()
    }

    /// Bounding box of everything painted so far, in surface pixels
    pub fn ink_bounds(&self) -> Option<Rect> {
        self.ink
    }

    /// Allocated tiles with their top-left corner in surface pixels
    pub fn tiles(&self) -> impl Iterator<Item = (Pos2, &Pixmap)> + '_ {
        let tile_size = self.tile_size as f32;
        self.tiles.iter().map(move |((tx, ty), pixmap)| {
            (Pos2::new(*tx as f32 * tile_size, *ty as f32 * tile_size), pixmap)
        })
    }

    /// Draw into every tile overlapping `area`, allocating tiles as needed.
    ///
    /// `area` is in surface pixels and must cover everything `draw` touches.
    /// `draw` receives the tile and a transform that maps surface pixels into it.
    pub fn draw(&mut self, area: Rect, mut draw: impl FnMut(&mut Pixmap, Transform)) {
        let Some(area) = self.clip(area) else {
            return;
        };

        let tile_size = self.tile_size;
        for key in self.tile_keys(area) {
            let Some(tile) = self.tile_mut(key) else {
                log::warn!("Failed to allocate surface tile {:?}", key);
                continue;
            };
            draw(tile, Self::tile_transform(key, tile_size));
        }

        self.ink = Some(match self.ink {
            Some(ink) => ink.union(area),
            None => area,
        });
    }

    /// Like [`Surface::draw`] but only visits tiles that already exist.
    ///
    /// Tiles left fully transparent are released and the ink bounds shrink to
    /// what remains.
    pub fn erase(&mut self, area: Rect, mut draw: impl FnMut(&mut Pixmap, Transform)) {
        let Some(area) = self.clip(area) else {
            return;
        };

        let tile_size = self.tile_size;
        for key in self.tile_keys(area) {
            if let Some(tile) = self.tiles.get_mut(&key) {
                draw(tile, Self::tile_transform(key, tile_size));
            }
        }

        self.tiles
            .retain(|_, tile| tile.pixels().iter().any(|pixel| pixel.alpha() != 0));
        self.ink = self.scan_ink();
    }

    /// Premultiplied pixel at surface coordinates, transparent where nothing was painted
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        if x >= self.extent || y >= self.extent {
            return None;
        }
        let key = (x / self.tile_size, y / self.tile_size);
        match self.tiles.get(&key) {
            Some(tile) => tile.pixel(x % self.tile_size, y % self.tile_size),
            None => Some(PremultipliedColorU8::TRANSPARENT),
        }
    }

    fn clip(&self, area: Rect) -> Option<Rect> {
        let bounds = Rect::from_min_max(Pos2::ZERO, Pos2::new(self.extent as f32, self.extent as f32));
        let clipped = area.intersect(bounds);
        clipped.is_positive().then_some(clipped)
    }

    fn tile_keys(&self, area: Rect) -> Vec<TileKey> {
        let size = self.tile_size as f32;
        let last = (self.extent - 1) / self.tile_size;
        let min_x = (area.min.x / size).floor().max(0.0) as u32;
        let min_y = (area.min.y / size).floor().max(0.0) as u32;
        let max_x = ((area.max.x / size).floor() as u32).min(last);
        let max_y = ((area.max.y / size).floor() as u32).min(last);

        (min_y..=max_y)
            .flat_map(|ty| (min_x..=max_x).map(move |tx| (tx, ty)))
            .collect()
    }

    fn tile_mut(&mut self, key: TileKey) -> Option<&mut Pixmap> {
        if !self.tiles.contains_key(&key) {
            let width = self.tile_size.min(self.extent - key.0 * self.tile_size);
            let height = self.tile_size.min(self.extent - key.1 * self.tile_size);
            self.tiles.insert(key, Pixmap::new(width, height)?);
        }
        self.tiles.get_mut(&key)
    }

    fn tile_transform((tx, ty): TileKey, tile_size: u32) -> Transform {
        Transform::from_translate(-((tx * tile_size) as f32), -((ty * tile_size) as f32))
    }

    fn scan_ink(&self) -> Option<Rect> {
        let tile_size = self.tile_size;
        self.tiles
            .iter()
            .filter_map(|((tx, ty), tile)| {
                let mut tile_ink: Option<(u32, u32, u32, u32)> = None;
                let width = tile.width();
                for (i, pixel) in tile.pixels().iter().enumerate() {
                    if pixel.alpha() == 0 {
                        continue;
                    }
                    let (x, y) = (i as u32 % width, i as u32 / width);
                    tile_ink = Some(match tile_ink {
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                        None => (x, y, x, y),
                    });
                }
                let (x0, y0, x1, y1) = tile_ink?;
                let origin = Pos2::new((tx * tile_size) as f32, (ty * tile_size) as f32);
                Some(Rect::from_min_max(
                    origin + egui::vec2(x0 as f32, y0 as f32),
                    origin + egui::vec2(x1 as f32 + 1.0, y1 as f32 + 1.0),
                ))
            })
            .reduce(|a, b| a.union(b))
    }
}

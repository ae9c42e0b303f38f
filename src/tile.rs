use crate::error::{GameError, Result};
use crate::render::{SourceRect, Surface};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tile id meaning "nothing here, do not draw"
pub const EMPTY_TILE: i32 = -1;

/// Rectangular grid of tile ids, stored row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i32>>", into = "Vec<Vec<i32>>")]
pub struct TileGrid {
    tiles: Vec<i32>,
    pub width: usize,
    pub height: usize,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, fill: i32) -> Self {
        TileGrid {
            tiles: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Builds a grid from rows; every row must have the same length
    pub fn from_rows(rows: Vec<Vec<i32>>) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);

        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != width)
        {
            return Err(GameError::RaggedTileGrid {
                row,
                expected: width,
                found,
            });
        }

        let height = rows.len();
        Ok(TileGrid {
            tiles: rows.into_iter().flatten().collect(),
            width,
            height,
        })
    }

    pub fn get(&self, x: i32, y: i32) -> Option<i32> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.tiles[y as usize * self.width + x as usize])
    }

    pub fn set(&mut self, x: usize, y: usize, tile: i32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.tiles[y * self.width + x] = tile;
        true
    }

    /// Iterates `(x, y, tile_id)` over every cell
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, i32)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (i % self.width.max(1), i / self.width.max(1), *tile))
    }

    pub fn rows(&self) -> Vec<Vec<i32>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.tiles.chunks(self.width).map(<[i32]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<i32>>> for TileGrid {
    type Error = GameError;

    fn try_from(rows: Vec<Vec<i32>>) -> Result<Self> {
        TileGrid::from_rows(rows)
    }
}

impl From<TileGrid> for Vec<Vec<i32>> {
    fn from(grid: TileGrid) -> Self {
        grid.rows()
    }
}

/// Maps tile ids to surfaces
#[derive(Debug, Clone, Default)]
pub struct TileAtlas {
    tiles: HashMap<i32, Surface>,
    /// Size of one tile in the source sheet, in pixels
    pub tile_size: u32,
}

impl TileAtlas {
    pub fn new(tile_size: u32) -> Self {
        TileAtlas {
            tiles: HashMap::new(),
            tile_size,
        }
    }

    pub fn insert(&mut self, id: i32, surface: Surface) {
        self.tiles.insert(id, surface);
    }

    /// Slices a tileset sheet into square tiles.
    ///
    /// Ids are assigned left to right, then top to bottom, starting at 0. `margin` is the
    /// border around the whole sheet and `spacing` the gap between neighbouring tiles.
    pub fn from_sheet(sheet: &Surface, tile_size: u32, margin: u32, spacing: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(GameError::InvalidConfig(
                "tile size must be at least 1".to_string(),
            ));
        }

        let stride = tile_size + spacing;
        let columns = (sheet.width.saturating_sub(2 * margin) + spacing) / stride;
        let rows = (sheet.height.saturating_sub(2 * margin) + spacing) / stride;

        let mut atlas = TileAtlas::new(tile_size);
        let mut id = 0;
        for row in 0..rows {
            for column in 0..columns {
                let source = SourceRect {
                    x: margin + column * stride,
                    y: margin + row * stride,
                    width: tile_size,
                    height: tile_size,
                };
                atlas.insert(id, sheet.region(source));
                id += 1;
            }
        }

        Ok(atlas)
    }

    /// The empty sentinel always resolves, to nothing
    pub fn resolves(&self, id: i32) -> bool {
        id == EMPTY_TILE || self.tiles.contains_key(&id)
    }

    pub fn get(&self, id: i32) -> Option<&Surface> {
        self.tiles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Solid/empty occupancy with the same indexing as a `TileGrid`.
///
/// Shared by the visibility cone and the terrain collider builder.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionGrid {
    cells: Vec<bool>,
    pub width: usize,
    pub height: usize,
}

impl CollisionGrid {
    pub fn new(width: usize, height: usize) -> Self {
        CollisionGrid {
            cells: vec![false; width * height],
            width,
            height,
        }
    }

    /// Every non-empty tile is solid
    pub fn from_tiles(grid: &TileGrid) -> Self {
        CollisionGrid {
            cells: grid.tiles.iter().map(|tile| *tile != EMPTY_TILE).collect(),
            width: grid.width,
            height: grid.height,
        }
    }

    /// Parses rows of `#` (solid) and anything else (empty); handy for tests and demos
    pub fn from_ascii(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut grid = CollisionGrid::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                grid.set(x, y, c == '#');
            }
        }
        grid
    }

    pub fn set(&mut self, x: usize, y: usize, solid: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = solid;
        }
    }

    /// `None` outside the grid
    pub fn is_solid(&self, x: i32, y: i32) -> Option<bool> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.cells[y as usize * self.width + x as usize])
    }

    /// Horizontal runs of solid cells in a row, as `(start_x, length)`
    pub fn solid_runs(&self, y: usize) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start = None;

        for x in 0..self.width {
            let solid = self.cells[y * self.width + x];
            match (solid, start) {
                (true, None) => start = Some(x),
                (false, Some(s)) => {
                    runs.push((s, x - s));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push((s, self.width - s));
        }

        runs
    }
}

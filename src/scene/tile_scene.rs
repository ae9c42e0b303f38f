use crate::camera::Camera;
use crate::error::{GameError, Result};
use crate::render::{Blit, RenderTarget};
use crate::scene::Scene;
use crate::tile::{CollisionGrid, EMPTY_TILE, TileAtlas, TileGrid};
use glam::Vec2;
use std::ops::Range;

/// Static terrain drawn from a tile grid.
///
/// Every non-empty cell resolves in the atlas; this is checked once at construction so
/// rendering never has to handle a missing tile.
#[derive(Debug, Clone)]
pub struct TileScene {
    grid: TileGrid,
    atlas: TileAtlas,
    /// Distance between tile origins on screen, in pixels (zoom)
    pitch: u32,
}

impl TileScene {
    pub fn new(grid: TileGrid, atlas: TileAtlas, pitch: u32) -> Result<Self> {
        if let Some((x, y, tile)) = grid.cells().find(|(_, _, tile)| !atlas.resolves(*tile)) {
            return Err(GameError::InvalidTileset { tile, x, y });
        }

        Ok(TileScene {
            grid,
            atlas,
            pitch: pitch.max(1),
        })
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    /// Changes the zoom; never below one pixel per tile
    pub fn set_pitch(&mut self, pitch: u32) {
        self.pitch = pitch.max(1);
    }

    /// Size of the whole terrain in world pixels
    pub fn pixel_size(&self) -> Vec2 {
        let pitch = self.pitch as f32;
        Vec2::new(self.grid.width as f32 * pitch, self.grid.height as f32 * pitch)
    }

    pub fn collision_grid(&self) -> CollisionGrid {
        CollisionGrid::from_tiles(&self.grid)
    }

    /// Column and row ranges of the tiles intersecting the camera's viewport
    pub fn visible_range(&self, camera: &Camera) -> (Range<usize>, Range<usize>) {
        let pitch = self.pitch as f32;
        let span = |start: f32, length: f32, cells: usize| {
            let first = (start / pitch).floor().clamp(0.0, cells as f32) as usize;
            let last = ((start + length) / pitch).ceil().clamp(0.0, cells as f32) as usize;
            first..last.max(first)
        };

        (
            span(camera.position.x, camera.viewport.x, self.grid.width),
            span(camera.position.y, camera.viewport.y, self.grid.height),
        )
    }
}

impl Scene for TileScene {
    fn update(&mut self, _dt: f32) {}

    fn render(&self, camera: &Camera, target: &mut dyn RenderTarget) {
        let (columns, rows) = self.visible_range(camera);
        let pitch = self.pitch as f32;
        let size = Vec2::splat(pitch);

        for y in rows {
            for x in columns.clone() {
                let Some(tile) = self.grid.get(x as i32, y as i32) else {
                    continue;
                };
                if tile == EMPTY_TILE {
                    continue;
                }
                let Some(surface) = self.atlas.get(tile) else {
                    continue;
                };

                let world = Vec2::new(x as f32, y as f32) * pitch + size / 2.0;
                target.blit(&Blit::new(surface, camera.offset(world)).with_size(size));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RecordingTarget, Surface};

    fn atlas() -> TileAtlas {
        TileAtlas::from_sheet(&Surface::new("rocks", 32, 16), 16, 0, 0).unwrap()
    }

    fn filled(width: usize, height: usize) -> TileGrid {
        TileGrid::new(width, height, 0)
    }

    #[test]
    fn test_unresolved_tile_fails_construction() {
        let mut grid = filled(4, 4);
        grid.set(2, 3, 9);

        let err = TileScene::new(grid, atlas(), 16).unwrap_err();
        assert!(matches!(err, GameError::InvalidTileset { tile: 9, x: 2, y: 3 }));
    }

    #[test]
    fn test_resolved_and_empty_tiles_construct() {
        let grid = TileGrid::from_rows(vec![vec![0, 1, -1], vec![-1, -1, 1]]).unwrap();
        assert!(TileScene::new(grid, atlas(), 16).is_ok());
    }

    #[test]
    fn test_render_culls_to_viewport() {
        let scene = TileScene::new(filled(100, 100), atlas(), 16).unwrap();
        let mut camera = Camera::new(Vec2::new(64.0, 48.0));
        camera.position = Vec2::new(160.0, 160.0);

        let mut target = RecordingTarget::new(64.0, 48.0);
        scene.render(&camera, &mut target);

        assert_eq!(target.blit_count(), 4 * 3);
    }

    #[test]
    fn test_partial_tiles_are_drawn() {
        let scene = TileScene::new(filled(100, 100), atlas(), 16).unwrap();
        let mut camera = Camera::new(Vec2::new(64.0, 48.0));
        camera.position = Vec2::new(8.0, 8.0);

        let (columns, rows) = scene.visible_range(&camera);
        assert_eq!(columns, 0..5);
        assert_eq!(rows, 0..4);
    }

    #[test]
    fn test_visible_range_clamped_to_grid() {
        let scene = TileScene::new(filled(10, 10), atlas(), 16).unwrap();
        let mut camera = Camera::new(Vec2::new(400.0, 300.0));
        camera.position = Vec2::new(-100.0, 1000.0);

        let (columns, rows) = scene.visible_range(&camera);
        assert_eq!(columns, 0..10);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_empty_cells_skipped() {
        let grid = TileGrid::from_rows(vec![vec![0, -1], vec![-1, 1]]).unwrap();
        let scene = TileScene::new(grid, atlas(), 16).unwrap();

        let mut target = RecordingTarget::new(400.0, 300.0);
        scene.render(&Camera::new(Vec2::new(400.0, 300.0)), &mut target);

        assert_eq!(target.blit_count(), 2);
    }

    #[test]
    fn test_pitch_clamped_to_one() {
        let mut scene = TileScene::new(filled(4, 2), atlas(), 0).unwrap();
        assert_eq!(scene.pitch(), 1);

        scene.set_pitch(8);
        assert_eq!(scene.pixel_size(), Vec2::new(32.0, 16.0));
        scene.set_pitch(0);
        assert_eq!(scene.pitch(), 1);
    }

    #[test]
    fn test_pixel_size_at_extreme_zoom() {
        let mut scene = TileScene::new(filled(100, 100), atlas(), 16).unwrap();
        scene.set_pitch(u32::MAX / 10);

        let size = scene.pixel_size();
        let expected = 100.0 * (u32::MAX / 10) as f32;
        assert!(size.x.is_finite());
        assert_eq!(size, Vec2::splat(expected));
    }
}

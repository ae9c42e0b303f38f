/// Render target abstraction and surface handles
///
/// The core never talks to a window directly. Scenes, sprites and overlays describe what
/// they want drawn as `Blit`s and light fans and hand them to a `RenderTarget`.
///
/// # Architecture
///
/// - `Surface`: a handle to an image owned by the backend (key + size), optionally a
///   sub-rectangle of a sheet and optionally carrying precomputed rotation variants
/// - `RenderTarget`: implemented by the SDL2 canvas backend and by `RecordingTarget`
/// - `RecordingTarget`: headless target that records every call, used by tests and tools
use crate::collision::Rect;
use glam::Vec2;

/// Source rectangle inside a sheet image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Handle to an image the backend knows how to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub source: Option<SourceRect>,
    rotation_variants: Option<u16>,
}

impl Surface {
    pub fn new(key: impl Into<String>, width: u32, height: u32) -> Self {
        Surface {
            key: key.into(),
            width,
            height,
            source: None,
            rotation_variants: None,
        }
    }

    /// Sub-image of a sheet surface (tileset slicing)
    pub fn region(&self, source: SourceRect) -> Self {
        Surface {
            key: self.key.clone(),
            width: source.width,
            height: source.height,
            source: Some(source),
            rotation_variants: None,
        }
    }

    /// Marks the surface as having `variants` precomputed rotations evenly spread over
    /// 360 degrees. The backend is expected to have baked them.
    pub fn with_rotation_cache(mut self, variants: u16) -> Self {
        self.rotation_variants = Some(variants.max(1));
        self
    }

    pub fn rotation_variants(&self) -> Option<u16> {
        self.rotation_variants
    }

    pub fn is_cached(&self) -> bool {
        self.rotation_variants.is_some()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Picks the precomputed variant closest to `angle_degrees`
    pub fn variant_for(&self, angle_degrees: f32) -> Option<usize> {
        let variants = self.rotation_variants? as usize;
        let step = 360.0 / variants as f32;
        let index = (angle_degrees.rem_euclid(360.0) / step).round() as usize;
        Some(index % variants)
    }
}

/// How a blit is composited onto the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blend {
    #[default]
    Normal,
    Add,
    Multiply,
}

/// A single draw request
#[derive(Debug, Clone, PartialEq)]
pub struct Blit<'a> {
    pub surface: &'a Surface,
    /// Screen-space center of the drawn image
    pub center: Vec2,
    /// Destination size; the surface is scaled to it
    pub size: Vec2,
    /// Rotation in degrees, applied by the target
    pub angle: f32,
    /// Precomputed rotation variant to draw instead of rotating
    pub variant: Option<usize>,
    pub flip_vertical: bool,
    pub blend: Blend,
    /// Brightness shift in [-255, 255] applied before blending
    pub brightness: i16,
}

impl<'a> Blit<'a> {
    pub fn new(surface: &'a Surface, center: Vec2) -> Self {
        Blit {
            surface,
            center,
            size: surface.size(),
            angle: 0.0,
            variant: None,
            flip_vertical: false,
            blend: Blend::Normal,
            brightness: 0,
        }
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    /// Destination rectangle of the unrotated image
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.center, self.size)
    }
}

/// Anything the core can draw onto.
///
/// Drawing is assumed never to fail; backends log and drop failed draws.
pub trait RenderTarget {
    /// Visible area in screen coordinates
    fn clip(&self) -> Rect;

    fn blit(&mut self, blit: &Blit);

    /// Draws a triangle fan around `vertices[0]`; `intensities` is parallel to `vertices`.
    fn draw_light_fan(&mut self, vertices: &[Vec2], intensities: &[f32]);
}

/// Owned record of one call made on a `RecordingTarget`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Blit {
        key: String,
        source: Option<SourceRect>,
        center: Vec2,
        size: Vec2,
        angle: f32,
        variant: Option<usize>,
        flip_vertical: bool,
        blend: Blend,
        brightness: i16,
    },
    LightFan {
        vertices: Vec<Vec2>,
        intensities: Vec<f32>,
    },
}

/// Headless render target that records what would have been drawn.
#[derive(Debug, Clone)]
pub struct RecordingTarget {
    pub width: f32,
    pub height: f32,
    pub calls: Vec<DrawCall>,
}

impl RecordingTarget {
    pub fn new(width: f32, height: f32) -> Self {
        RecordingTarget {
            width,
            height,
            calls: Vec::new(),
        }
    }

    /// Keys of every blitted surface, in draw order
    pub fn blitted_keys(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Blit { key, .. } => Some(key.as_str()),
                DrawCall::LightFan { .. } => None,
            })
            .collect()
    }

    pub fn blit_count(&self) -> usize {
        self.blitted_keys().len()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderTarget for RecordingTarget {
    fn clip(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    fn blit(&mut self, blit: &Blit) {
        self.calls.push(DrawCall::Blit {
            key: blit.surface.key.clone(),
            source: blit.surface.source,
            center: blit.center,
            size: blit.size,
            angle: blit.angle,
            variant: blit.variant,
            flip_vertical: blit.flip_vertical,
            blend: blit.blend,
            brightness: blit.brightness,
        });
    }

    fn draw_light_fan(&mut self, vertices: &[Vec2], intensities: &[f32]) {
        self.calls.push(DrawCall::LightFan {
            vertices: vertices.to_vec(),
            intensities: intensities.to_vec(),
        });
    }
}

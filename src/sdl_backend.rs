/// SDL2 backend
///
/// Implements `RenderTarget` on an SDL canvas and turns SDL events into `InputEvent`s.
/// Textures are looked up by the surface key the core hands over.
use crate::collision::Rect;
use crate::input_system::InputEvent;
use crate::render::{Blend, Blit, RenderTarget};
use glam::Vec2;
use log::warn;
use sdl2::event::Event;
use sdl2::image::LoadTexture;
use sdl2::pixels::Color;
use sdl2::render::{BlendMode, Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use std::collections::HashMap;

/// Loads an image file as a texture
pub fn load_texture<'a>(
    texture_creator: &'a TextureCreator<WindowContext>,
    path: &str,
) -> Result<Texture<'a>, String> {
    texture_creator
        .load_texture(path)
        .map_err(|e| format!("Failed to load {}: {}", path, e))
}

/// Single-colour texture, for placeholder art
pub fn solid_texture<'a>(
    canvas: &mut Canvas<Window>,
    texture_creator: &'a TextureCreator<WindowContext>,
    width: u32,
    height: u32,
    color: Color,
) -> Result<Texture<'a>, String> {
    let mut texture = texture_creator
        .create_texture_target(None, width, height)
        .map_err(|e| e.to_string())?;
    canvas
        .with_texture_canvas(&mut texture, |texture_canvas| {
            texture_canvas.set_draw_color(color);
            texture_canvas.clear();
        })
        .map_err(|e| e.to_string())?;
    Ok(texture)
}

/// Translates an SDL event, dropping the ones the game does not use
pub fn translate_event(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Quit { .. } => Some(InputEvent::Quit),
        Event::KeyDown {
            keycode: Some(keycode),
            repeat: false,
            ..
        } => Some(InputEvent::KeyDown(keycode.name())),
        Event::KeyUp {
            keycode: Some(keycode),
            ..
        } => Some(InputEvent::KeyUp(keycode.name())),
        Event::MouseMotion { x, y, .. } => Some(InputEvent::MouseMotion(Vec2::new(*x as f32, *y as f32))),
        _ => None,
    }
}

pub struct CanvasTarget<'tc> {
    canvas: Canvas<Window>,
    textures: HashMap<String, Texture<'tc>>,
    width: u32,
    height: u32,
}

impl<'tc> CanvasTarget<'tc> {
    /// `width` x `height` is the logical resolution the game draws at
    pub fn new(mut canvas: Canvas<Window>, width: u32, height: u32) -> Result<Self, String> {
        canvas.set_logical_size(width, height).map_err(|e| e.to_string())?;
        Ok(CanvasTarget {
            canvas,
            textures: HashMap::new(),
            width,
            height,
        })
    }

    pub fn insert_texture(&mut self, key: impl Into<String>, texture: Texture<'tc>) {
        self.textures.insert(key.into(), texture);
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas<Window> {
        &mut self.canvas
    }

    pub fn clear(&mut self) {
        self.canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas.clear();
    }

    pub fn present(&mut self) {
        self.canvas.present();
    }

    fn fill_triangle(&mut self, points: [Vec2; 3]) {
        let mut sorted = points;
        sorted.sort_by(|a, b| a.y.total_cmp(&b.y));
        let [top, mid, bottom] = sorted;
        if bottom.y - top.y < 0.5 {
            return;
        }

        let edge_x = |from: Vec2, to: Vec2, y: f32| {
            if (to.y - from.y).abs() < f32::EPSILON {
                from.x
            } else {
                from.x + (to.x - from.x) * (y - from.y) / (to.y - from.y)
            }
        };

        let first = top.y.ceil() as i32;
        let last = bottom.y.floor() as i32;
        for y in first..=last {
            let yf = y as f32;
            let long = edge_x(top, bottom, yf);
            let short = if yf < mid.y {
                edge_x(top, mid, yf)
            } else {
                edge_x(mid, bottom, yf)
            };
            let (left, right) = (long.min(short), long.max(short));
            let result = self.canvas.draw_line(
                sdl2::rect::Point::new(left.round() as i32, y),
                sdl2::rect::Point::new(right.round() as i32, y),
            );
            if let Err(e) = result {
                warn!("Light fan scanline failed: {}", e);
                return;
            }
        }
    }
}

fn sdl_blend(blend: Blend) -> BlendMode {
    match blend {
        Blend::Normal => BlendMode::Blend,
        Blend::Add => BlendMode::Add,
        Blend::Multiply => BlendMode::Mod,
    }
}

fn sdl_rect(rect: Rect) -> sdl2::rect::Rect {
    sdl2::rect::Rect::new(
        rect.x.round() as i32,
        rect.y.round() as i32,
        rect.width.round().max(1.0) as u32,
        rect.height.round().max(1.0) as u32,
    )
}

impl RenderTarget for CanvasTarget<'_> {
    fn clip(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    fn blit(&mut self, blit: &Blit) {
        let Some(texture) = self.textures.get_mut(&blit.surface.key) else {
            warn!("No texture for surface '{}'", blit.surface.key);
            return;
        };

        let source = blit
            .surface
            .source
            .map(|s| sdl2::rect::Rect::new(s.x as i32, s.y as i32, s.width, s.height));
        let destination = sdl_rect(blit.bounds());
        let angle = match (blit.variant, blit.surface.rotation_variants()) {
            (Some(variant), Some(count)) => variant as f64 * 360.0 / count as f64,
            _ => blit.angle as f64,
        };

        let darken = (255 + blit.brightness.min(0)) as u8;
        texture.set_color_mod(darken, darken, darken);
        texture.set_blend_mode(sdl_blend(blit.blend));
        let mut result = self
            .canvas
            .copy_ex(texture, source, destination, angle, None, false, blit.flip_vertical);

        // Positive brightness: a second additive pass scaled by the amount
        if result.is_ok() && blit.brightness > 0 {
            let lighten = blit.brightness.min(255) as u8;
            texture.set_color_mod(lighten, lighten, lighten);
            texture.set_blend_mode(BlendMode::Add);
            result = self
                .canvas
                .copy_ex(texture, source, destination, angle, None, false, blit.flip_vertical);
        }
        texture.set_color_mod(255, 255, 255);

        if let Err(e) = result {
            warn!("Blit of '{}' failed: {}", blit.surface.key, e);
        }
    }

    fn draw_light_fan(&mut self, vertices: &[Vec2], intensities: &[f32]) {
        let Some((&origin, rim)) = vertices.split_first() else {
            return;
        };

        self.canvas.set_blend_mode(BlendMode::Add);
        for (i, pair) in rim.windows(2).enumerate() {
            // Origin plus the two rim points, averaged
            let intensity = (intensities.first().copied().unwrap_or(1.0)
                + intensities.get(i + 1).copied().unwrap_or(0.0)
                + intensities.get(i + 2).copied().unwrap_or(0.0))
                / 3.0;
            let level = (intensity.clamp(0.0, 1.0) * 160.0) as u8;
            self.canvas.set_draw_color(Color::RGB(level, level, level));
            self.fill_triangle([origin, pair[0], pair[1]]);
        }
        self.canvas.set_blend_mode(BlendMode::None);
    }
}

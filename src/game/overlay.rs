use crate::game::level::OverlayDescriptor;
use crate::render::{Blend, Blit, RenderTarget, Surface};
use crate::visibility::LightFan;
use glam::Vec2;

/// Brightness value meaning "no filter"
pub const FILTER_DISABLED: i16 = 255;

/// Darkness filter centered on the player, with the visibility cone lit on top of it.
///
/// The shadow surface is multiplied onto the frame; the cone is an additive light fan.
#[derive(Debug, Clone)]
pub struct ScreenFilter {
    surface: Surface,
    enabled: bool,
    brightness: i16,
    /// Screen-space center of the shadow
    position: Vec2,
}

impl ScreenFilter {
    pub fn new(surface: Surface, descriptor: &OverlayDescriptor) -> Self {
        let mut filter = ScreenFilter {
            surface,
            enabled: descriptor.enabled,
            brightness: FILTER_DISABLED,
            position: Vec2::ZERO,
        };
        filter.set_brightness(descriptor.brightness);
        filter
    }

    pub fn brightness(&self) -> i16 {
        self.brightness
    }

    /// Clamped to [-255, 255]
    pub fn set_brightness(&mut self, brightness: i16) {
        self.brightness = brightness.clamp(-255, 255);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_visible(&self) -> bool {
        self.enabled && self.brightness != FILTER_DISABLED
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn reposition(&mut self, screen_position: Vec2) {
        self.position = screen_position;
    }

    /// Draws the shadow, then the light fan (screen-space vertices) if there is one
    pub fn render(&self, fan: Option<&LightFan>, target: &mut dyn RenderTarget) {
        if !self.is_visible() {
            return;
        }

        let mut blit = Blit::new(&self.surface, self.position);
        blit.blend = Blend::Multiply;
        blit.brightness = self.brightness;
        target.blit(&blit);

        if let Some(fan) = fan.filter(|fan| !fan.is_empty()) {
            target.draw_light_fan(&fan.vertices, &fan.intensities);
        }
    }
}

//! Screen transition between two level loads
//!
//! A full-screen frame slides in from a random edge. When it covers the screen
//! (`reached_center`) the world loads the next level behind it; the frame then keeps going
//! off the opposite edge and the transition completes.

use crate::render::{Blit, RenderTarget, Surface};
use glam::Vec2;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..4) {
            0 => Edge::Left,
            1 => Edge::Right,
            2 => Edge::Top,
            _ => Edge::Bottom,
        }
    }

    /// Direction of travel when entering from this edge
    fn direction(self) -> Vec2 {
        match self {
            Edge::Left => Vec2::X,
            Edge::Right => Vec2::NEG_X,
            Edge::Top => Vec2::Y,
            Edge::Bottom => Vec2::NEG_Y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Sliding towards the center
    Entering,
    /// Center reached; leaving through the far edge
    Leaving,
    Completed,
}

#[derive(Debug, Clone)]
pub struct Transition {
    surface: Surface,
    edge: Edge,
    /// Screen-space center of the frame
    position: Vec2,
    viewport: Vec2,
    speed: f32,
    phase: TransitionPhase,
    load_issued: bool,
}

impl Transition {
    pub fn new(surface: Surface, viewport: Vec2, speed: f32, edge: Edge) -> Self {
        let center = viewport / 2.0;
        Transition {
            surface,
            edge,
            position: center - edge.direction() * viewport,
            viewport,
            speed: speed.max(1.0),
            phase: TransitionPhase::Entering,
            load_issued: false,
        }
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    pub fn reached_center(&self) -> bool {
        self.phase != TransitionPhase::Entering
    }

    pub fn is_completed(&self) -> bool {
        self.phase == TransitionPhase::Completed
    }

    /// True exactly once, on the first poll after the frame covers the screen
    pub fn take_load_request(&mut self) -> bool {
        if self.reached_center() && !self.load_issued {
            self.load_issued = true;
            true
        } else {
            false
        }
    }

    pub fn update(&mut self, dt: f32) {
        let center = self.viewport / 2.0;
        let direction = self.edge.direction();

        match self.phase {
            TransitionPhase::Entering => {
                self.position += direction * self.speed * dt;
                if (self.position - center).dot(direction) >= 0.0 {
                    self.position = center;
                    self.phase = TransitionPhase::Leaving;
                }
            }
            TransitionPhase::Leaving => {
                self.position += direction * self.speed * dt;
                let exit = center + direction * self.viewport;
                if (self.position - exit).dot(direction) >= 0.0 {
                    self.position = exit;
                    self.phase = TransitionPhase::Completed;
                }
            }
            TransitionPhase::Completed => {}
        }
    }

    pub fn render(&self, target: &mut dyn RenderTarget) {
        if self.is_completed() {
            return;
        }
        target.blit(&Blit::new(&self.surface, self.position).with_size(self.viewport));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingTarget;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn transition(edge: Edge) -> Transition {
        Transition::new(Surface::new("frame", 8, 8), Vec2::new(400.0, 300.0), 800.0, edge)
    }

    #[test]
    fn test_full_lifecycle_from_left() {
        let mut t = transition(Edge::Left);
        assert_eq!(t.position(), Vec2::new(-200.0, 150.0));
        assert!(!t.take_load_request());

        t.update(0.25);
        assert!(!t.reached_center());

        t.update(0.3);
        assert!(t.reached_center());
        assert_eq!(t.position(), Vec2::new(200.0, 150.0));
        assert!(t.take_load_request());
        assert!(!t.take_load_request());

        t.update(0.3);
        assert!(!t.is_completed());
        t.update(0.3);
        assert!(t.is_completed());
        assert!(!t.take_load_request());
    }

    #[test]
    fn test_every_edge_ends_on_the_opposite_side() {
        for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
            let mut t = transition(edge);
            let start = t.position();
            while !t.is_completed() {
                t.update(0.1);
            }
            let center = Vec2::new(200.0, 150.0);
            assert_eq!(t.position() - center, center - start);
        }
    }

    #[test]
    fn test_random_edge_is_deterministic_per_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(Edge::random(&mut a), Edge::random(&mut b));
        }
    }

    #[test]
    fn test_render_covers_viewport_until_completed() {
        let mut t = transition(Edge::Top);
        let mut target = RecordingTarget::new(400.0, 300.0);

        t.render(&mut target);
        assert_eq!(target.blit_count(), 1);

        while !t.is_completed() {
            t.update(0.5);
        }
        target.clear();
        t.render(&mut target);
        assert_eq!(target.blit_count(), 0);
    }
}

//! Pointer-driven particle field drawn behind the chat.
//!
//! Particles are plain records kept in one `Vec`; the engine advances them,
//! compacts out the dead ones and hands the survivors to a [`Surface`].
//! Coordinates are viewport pixels with `y` growing downward. Time is in
//! milliseconds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Age over which a particle shrinks from twice its target radius to the target.
pub const GROWTH_WINDOW_MS: f64 = 2000.0;
/// Opacity lost on every update.
pub const OPACITY_STEP: f64 = 0.005;
/// Horizontal velocity multiplier applied on every update.
pub const DRAG: f64 = 0.97;
/// Vertical velocity gained on every update.
pub const GRAVITY: f64 = 0.02;
/// Share of the pointer velocity handed to a new particle.
pub const POINTER_VELOCITY_SCALE: f64 = 0.05;
/// Half-width of the random offset added to the pointer velocity.
pub const SPAWN_JITTER: f64 = 50.0;
/// Half-width of the per-update positional noise.
pub const TURBULENCE: f64 = 0.25;
/// Upper bound (exclusive) of a particle's target radius.
pub const MAX_TARGET_RADIUS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub target_radius: f64,
    pub radius: f64,
    pub opacity: f64,
    pub age: f64,
}

impl Particle {
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, target_radius: f64) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            target_radius,
            radius: radius_at(target_radius, 0.0),
            opacity: 1.0,
            age: 0.0,
        }
    }
}

/// Visible drawing area used for culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Last pointer position seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
}

/// Anything particles can be drawn onto.
pub trait Surface {
    fn clear(&mut self);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, alpha: f64);
}

/// Radius of a particle of the given target size at the given age.
pub fn radius_at(target_radius: f64, age: f64) -> f64 {
    if age < GROWTH_WINDOW_MS {
        target_radius * 2.0 - target_radius * age.max(0.0) / GROWTH_WINDOW_MS
    } else {
        target_radius
    }
}

/// Move one particle forward by one update.
pub fn advance(particle: &mut Particle, turbulence: (f64, f64), delta_time: f64) {
    particle.x += particle.vx + turbulence.0;
    particle.y += particle.vy + turbulence.1;
    particle.vx *= DRAG;
    particle.vy += GRAVITY;
    particle.opacity = (particle.opacity - OPACITY_STEP).max(0.0);
    particle.age += delta_time.max(0.0);
    particle.radius = radius_at(particle.target_radius, particle.age);
}

/// A particle stays until it fades out or leaves across the top, left or right edge.
/// The bottom edge is not a boundary: falling particles fade instead.
pub fn is_alive(particle: &Particle, viewport: Viewport) -> bool {
    particle.opacity > 0.0
        && particle.y >= 0.0
        && particle.x >= 0.0
        && particle.x <= viewport.width
}

pub fn render<S: Surface>(particles: &[Particle], surface: &mut S) {
    surface.clear();
    for p in particles {
        surface.fill_circle(p.x, p.y, p.radius, p.opacity);
    }
}

pub struct ParticleEngine {
    particles: Vec<Particle>,
    viewport: Viewport,
    last_pointer: PointerSample,
    last_frame: Option<f64>,
    rng: StdRng,
}

impl ParticleEngine {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    /// Deterministic engine for tests and replays.
    pub fn with_seed(width: f64, height: f64, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: f64, height: f64, rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            viewport: Viewport::new(width, height),
            last_pointer: PointerSample::default(),
            last_frame: None,
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn last_pointer(&self) -> PointerSample {
        self.last_pointer
    }

    /// Spawn one particle at the pointer, flung along the pointer's motion.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        let pointer_vx = x - self.last_pointer.x;
        let pointer_vy = y - self.last_pointer.y;
        self.last_pointer = PointerSample { x, y };

        let jitter_x = self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);
        let jitter_y = self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);
        let lift: f64 = self.rng.gen();
        let target_radius = self.rng.gen_range(0.0..MAX_TARGET_RADIUS);

        let vx = POINTER_VELOCITY_SCALE * (pointer_vx + jitter_x);
        let vy = 1.0 + lift + POINTER_VELOCITY_SCALE * (pointer_vy + jitter_y);

        self.particles.push(Particle::new(x, y, vx, vy, target_radius));
    }

    /// Existing particles keep their coordinates; only culling uses the new bounds.
    pub fn on_resize(&mut self, width: f64, height: f64) {
        tracing::debug!(width, height, "particle viewport resized");
        self.viewport = Viewport::new(width, height);
    }

    pub fn tick(&mut self, delta_time: f64) {
        for particle in &mut self.particles {
            let turbulence = (
                self.rng.gen_range(-TURBULENCE..=TURBULENCE),
                self.rng.gen_range(-TURBULENCE..=TURBULENCE),
            );
            advance(particle, turbulence, delta_time);
        }

        let viewport = self.viewport;
        self.particles.retain(|p| is_alive(p, viewport));
    }

    /// Per-refresh entry point. Returns the delta used, which is 0 on the first frame.
    pub fn frame(&mut self, now: f64) -> f64 {
        let delta_time = match self.last_frame {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last_frame = Some(now);
        self.tick(delta_time);
        delta_time
    }

    pub fn render<S: Surface>(&self, surface: &mut S) {
        render(&self.particles, surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        clears: usize,
        circles: Vec<(f64, f64, f64, f64)>,
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.clears += 1;
            self.circles.clear();
        }

        fn fill_circle(&mut self, x: f64, y: f64, radius: f64, alpha: f64) {
            self.circles.push((x, y, radius, alpha));
        }
    }

    fn engine_with(particle: Particle) -> ParticleEngine {
        let mut engine = ParticleEngine::with_seed(1000.0, 1000.0, 7);
        engine.particles.push(particle);
        engine
    }

    #[test]
    fn test_pointer_move_spawns_scaled_velocity() {
        let mut engine = ParticleEngine::with_seed(800.0, 600.0, 42);
        engine.on_pointer_move(10.0, 5.0);

        assert_eq!(engine.len(), 1);
        let p = engine.particles()[0];
        assert_eq!((p.x, p.y), (10.0, 5.0));

        let jitter = POINTER_VELOCITY_SCALE * SPAWN_JITTER;
        assert!((p.vx - 0.5).abs() <= jitter + 1e-9);
        assert!(p.vy >= 1.0 + 0.25 - jitter - 1e-9);
        assert!(p.vy < 2.0 + 0.25 + jitter + 1e-9);
        assert_eq!(p.radius, p.target_radius * 2.0);
        assert_eq!(engine.last_pointer(), PointerSample { x: 10.0, y: 5.0 });
    }

    #[test]
    fn test_single_tick_advances_by_velocity_and_turbulence() {
        let mut engine = ParticleEngine::with_seed(800.0, 600.0, 3);
        engine.on_pointer_move(10.0, 5.0);
        let before = engine.particles()[0];

        engine.tick(16.0);

        assert_eq!(engine.len(), 1);
        let after = engine.particles()[0];
        assert!((after.x - (before.x + before.vx)).abs() <= TURBULENCE + 1e-9);
        assert!((after.y - (before.y + before.vy)).abs() <= TURBULENCE + 1e-9);
        assert!((after.vx - before.vx * DRAG).abs() < 1e-12);
        assert!((after.vy - (before.vy + GRAVITY)).abs() < 1e-12);
        assert_eq!(after.age, 16.0);
        let expected = before.target_radius * 2.0 - before.target_radius * 16.0 / GROWTH_WINDOW_MS;
        assert!((after.radius - expected).abs() < 1e-12);
    }

    #[test]
    fn test_pointer_velocity_uses_previous_position() {
        let mut engine = ParticleEngine::with_seed(800.0, 600.0, 9);
        engine.on_pointer_move(100.0, 100.0);
        engine.on_pointer_move(140.0, 100.0);

        let second = engine.particles()[1];
        let jitter = POINTER_VELOCITY_SCALE * SPAWN_JITTER;
        assert!((second.vx - 2.0).abs() <= jitter + 1e-9);
    }

    #[test]
    fn test_radius_settles_on_target_after_growth_window() {
        let mut engine = engine_with(Particle::new(500.0, 10.0, 0.0, 0.0, 1.5));
        let mut previous = engine.particles()[0].radius;

        for _ in 0..150 {
            engine.tick(20.0);
            let p = engine.particles()[0];
            assert!(p.radius <= previous);
            if p.age >= GROWTH_WINDOW_MS {
                assert_eq!(p.radius, p.target_radius);
            }
            previous = p.radius;
        }
        assert_eq!(engine.particles()[0].radius, 1.5);
    }

    #[test]
    fn test_zero_delta_keeps_initial_radius() {
        let mut engine = engine_with(Particle::new(500.0, 10.0, 0.0, 0.0, 1.0));
        let delta = engine.frame(1234.0);

        assert_eq!(delta, 0.0);
        let p = engine.particles()[0];
        assert_eq!(p.radius, 2.0);
        assert!(p.radius.is_finite());
    }

    #[test]
    fn test_frame_measures_delta_between_calls() {
        let mut engine = ParticleEngine::with_seed(800.0, 600.0, 1);
        assert_eq!(engine.frame(100.0), 0.0);
        assert_eq!(engine.frame(116.0), 16.0);
        assert_eq!(engine.frame(150.0), 34.0);
    }

    #[test]
    fn test_opacity_decreases_each_tick_until_removed() {
        let mut engine = engine_with(Particle::new(500.0, 10.0, 0.0, 1.0, 1.0));
        let mut previous = 1.0;
        let mut ticks = 0;

        while !engine.is_empty() {
            engine.tick(16.0);
            ticks += 1;
            if let Some(p) = engine.particles().first() {
                assert!(p.opacity < previous);
                assert!((previous - p.opacity - OPACITY_STEP).abs() < 1e-9);
                assert!(p.opacity > 0.0);
                previous = p.opacity;
            }
            assert!(ticks <= 202, "particle never faded out");
        }

        let mut surface = RecordingSurface::default();
        engine.render(&mut surface);
        assert!(surface.circles.is_empty());
    }

    #[test]
    fn test_culled_across_top_left_and_right_but_not_bottom() {
        let viewport = Viewport::new(100.0, 100.0);
        let inside = Particle::new(50.0, 50.0, 0.0, 0.0, 1.0);
        assert!(is_alive(&inside, viewport));

        let above = Particle { y: -1.0, ..inside };
        let left = Particle { x: -1.0, ..inside };
        let right = Particle { x: 101.0, ..inside };
        let below = Particle { y: 150.0, ..inside };
        let faded = Particle { opacity: 0.0, ..inside };

        assert!(!is_alive(&above, viewport));
        assert!(!is_alive(&left, viewport));
        assert!(!is_alive(&right, viewport));
        assert!(is_alive(&below, viewport));
        assert!(!is_alive(&faded, viewport));
    }

    #[test]
    fn test_resize_does_not_move_particles() {
        let mut engine = engine_with(Particle::new(500.0, 10.0, 0.0, 0.0, 1.0));
        engine.on_resize(200.0, 200.0);

        assert_eq!(engine.viewport(), Viewport::new(200.0, 200.0));
        assert_eq!(engine.particles()[0].x, 500.0);

        engine.tick(16.0);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_render_uses_opacity_as_alpha() {
        let mut engine = ParticleEngine::with_seed(800.0, 600.0, 5);
        engine.on_pointer_move(200.0, 200.0);
        engine.on_pointer_move(210.0, 200.0);
        engine.tick(16.0);

        let mut surface = RecordingSurface::default();
        engine.render(&mut surface);

        assert_eq!(surface.clears, 1);
        assert_eq!(surface.circles.len(), engine.len());
        for (circle, p) in surface.circles.iter().zip(engine.particles()) {
            assert_eq!(*circle, (p.x, p.y, p.radius, p.opacity));
            assert!((circle.3 - (1.0 - OPACITY_STEP)).abs() < 1e-12);
        }
    }
}

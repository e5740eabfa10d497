//! Pan/zoom camera over a 2D simulation texture
//!
//! Positions are kept in viewport-domain units where the whole simulation spans half the
//! viewport in each axis at neutral zoom. `transform()` turns the state into the four
//! normalized values the display shader samples with.

use cgmath::Vector2;

/// Smallest zoom factor (most zoomed in)
pub const ZOOM_MIN: f32 = 0.05;
/// Largest zoom factor (whole simulation visible)
pub const ZOOM_MAX: f32 = 1.0;
/// Neutral zoom restored on resize
pub const ZOOM_NEUTRAL: f32 = 1.0;
/// Exponential zoom rate per scroll unit
pub const ZOOM_SPEED: f32 = 0.1;
/// Pan distance per unit of mouse motion at neutral zoom
pub const MOVE_SPEED: f32 = 1.0;

/// Normalized sampling transform for the display shader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub position: [f32; 2],
    pub scale: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct ViewportCamera {
    /// Top-left of the visible region in domain units
    pub position: Vector2<f32>,
    zoom: f32,
    /// Domain extent at neutral zoom (half the viewport)
    domain: Vector2<f32>,
    /// Currently visible extent, `domain * zoom`
    visible: Vector2<f32>,
    /// Per-axis fraction of the viewport the simulation covers at neutral zoom
    normalization: Vector2<f32>,
    simulation_size: (u32, u32),
    /// Toroidal pan when set, free pan otherwise
    pub wrap: bool,
}

impl ViewportCamera {
    pub fn new(viewport_width: u32, viewport_height: u32, simulation_size: (u32, u32)) -> Self {
        let mut camera = Self {
            position: Vector2::new(0.0, 0.0),
            zoom: ZOOM_NEUTRAL,
            domain: Vector2::new(1.0, 1.0),
            visible: Vector2::new(1.0, 1.0),
            normalization: Vector2::new(1.0, 1.0),
            simulation_size,
            wrap: true,
        };
        camera.resize(viewport_width, viewport_height);
        camera
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Move the view by a gesture delta, scaled so panning feels the same at any zoom
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.position += Vector2::new(dx, dy) * self.zoom * MOVE_SPEED;
        self.reposition();
    }

    /// Zoom by a scroll delta around the centre of the view. Positive deltas zoom in.
    pub fn zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom * (-delta * ZOOM_SPEED).exp()).clamp(ZOOM_MIN, ZOOM_MAX);

        let previous = self.visible;
        self.visible = self.domain * self.zoom;
        self.position += (previous - self.visible) * 0.5;
        self.reposition();
    }

    /// Recompute aspect correction for a new viewport and return to neutral zoom
    pub fn resize(&mut self, viewport_width: u32, viewport_height: u32) {
        let width = viewport_width.max(1) as f32;
        let height = viewport_height.max(1) as f32;

        self.domain = Vector2::new(width * 0.5, height * 0.5);
        self.zoom = ZOOM_NEUTRAL;
        self.visible = self.domain;

        let (sim_width, sim_height) = self.simulation_size;
        let simulation_aspect = sim_width.max(1) as f32 / sim_height.max(1) as f32;
        let viewport_aspect = width / height;

        self.normalization = if viewport_aspect >= simulation_aspect {
            // window wider than the simulation: bars left and right
            Vector2::new(simulation_aspect / viewport_aspect, 1.0)
        } else {
            Vector2::new(1.0, viewport_aspect / simulation_aspect)
        };

        self.reposition();
    }

    /// Return to the origin at neutral zoom without changing the viewport
    pub fn reset(&mut self) {
        self.position = Vector2::new(0.0, 0.0);
        self.zoom = ZOOM_NEUTRAL;
        self.visible = self.domain;
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            position: [
                self.position.x / self.domain.x,
                self.position.y / self.domain.y,
            ],
            scale: [
                self.zoom / self.normalization.x,
                self.zoom / self.normalization.y,
            ],
        }
    }

    pub fn zoom_factor(&self) -> f32 {
        self.zoom
    }

    pub fn visible_size(&self) -> (f32, f32) {
        (self.visible.x, self.visible.y)
    }

    pub fn normalization(&self) -> (f32, f32) {
        (self.normalization.x, self.normalization.y)
    }

    fn reposition(&mut self) {
        if !self.wrap {
            return;
        }
        self.position.x = self.position.x.rem_euclid(self.domain.x);
        self.position.y = self.position.y.rem_euclid(self.domain.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_zoom_stays_in_bounds() {
        let mut camera = ViewportCamera::new(800, 600, (256, 256));
        let deltas = [3.0, 50.0, -7.5, -100.0, 0.25, 12.0, -0.5, 80.0, -3.0];
        for delta in deltas.iter().cycle().take(200) {
            camera.zoom(*delta);
            assert!((ZOOM_MIN..=ZOOM_MAX).contains(&camera.zoom_factor()));
        }
    }

    #[test]
    fn test_zoom_zero_keeps_factor() {
        let mut camera = ViewportCamera::new(800, 800, (64, 64));
        camera.zoom(5.0);
        let before = camera.zoom_factor();

        camera.zoom(0.0);
        assert_eq!(camera.zoom_factor(), before);
        let (w, h) = camera.visible_size();
        assert!(approx(w, 400.0 * before));
        assert!(approx(h, 400.0 * before));
    }

    #[test]
    fn test_resize_resets_zoom() {
        let mut camera = ViewportCamera::new(800, 800, (64, 64));
        camera.zoom(10.0);
        assert!(camera.zoom_factor() < ZOOM_NEUTRAL);

        camera.resize(1024, 512);
        assert_eq!(camera.zoom_factor(), ZOOM_NEUTRAL);
        assert_eq!(camera.visible_size(), (512.0, 256.0));
    }

    #[test]
    fn test_aspect_follows_simulation_not_window() {
        // square simulation in a 2:1 window: pillarbox
        let camera = ViewportCamera::new(1000, 500, (100, 100));
        let (nx, ny) = camera.normalization();
        assert!(approx(nx, 0.5));
        assert!(approx(ny, 1.0));

        let transform = camera.transform();
        // texels per screen pixel equal on both axes
        let texels_x = transform.scale[0] * 100.0 / 1000.0;
        let texels_y = transform.scale[1] * 100.0 / 500.0;
        assert!(approx(texels_x, texels_y));

        // wide simulation in a square window: letterbox
        let camera = ViewportCamera::new(600, 600, (300, 100));
        let (nx, ny) = camera.normalization();
        assert!(approx(nx, 1.0));
        assert!(approx(ny, 1.0 / 3.0));
    }

    #[test]
    fn test_pan_scales_with_zoom() {
        let mut camera = ViewportCamera::new(800, 800, (64, 64)).with_wrap(false);
        camera.pan(10.0, -4.0);
        assert!(approx(camera.position.x, 10.0));
        assert!(approx(camera.position.y, -4.0));

        camera.reset();
        camera.zoom(ZOOM_MIN.ln() / -ZOOM_SPEED);
        let zoom = camera.zoom_factor();
        let start = camera.position;
        camera.pan(10.0, 0.0);
        assert!(approx(camera.position.x - start.x, 10.0 * zoom));
    }

    #[test]
    fn test_wrap_keeps_position_in_domain() {
        let mut camera = ViewportCamera::new(800, 600, (64, 64));
        camera.pan(-1000.0, 5000.0);
        assert!((0.0..400.0).contains(&camera.position.x));
        assert!((0.0..300.0).contains(&camera.position.y));
    }

    #[test]
    fn test_zoom_keeps_view_centre() {
        let mut camera = ViewportCamera::new(800, 800, (64, 64)).with_wrap(false);
        let centre = |c: &ViewportCamera| {
            let (w, h) = c.visible_size();
            (c.position.x + w * 0.5, c.position.y + h * 0.5)
        };
        let before = centre(&camera);
        camera.zoom(4.0);
        let after = centre(&camera);
        assert!(approx(before.0, after.0));
        assert!(approx(before.1, after.1));
    }

    #[test]
    fn test_transform_normalizes_by_half_viewport() {
        let mut camera = ViewportCamera::new(800, 400, (200, 100)).with_wrap(false);
        camera.pan(100.0, 50.0);
        let transform = camera.transform();
        assert!(approx(transform.position[0], 0.25));
        assert!(approx(transform.position[1], 0.25));
        assert!(approx(transform.scale[0], 1.0));
        assert!(approx(transform.scale[1], 1.0));
    }
}

//! Viewport transform between screen and page coordinates.

use crate::config::{ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Per-page pan and zoom.
///
/// A page point `p` appears on screen at `p * zoom + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub translate_x: f64,
    pub translate_y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            zoom: ZOOM_DEFAULT,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&self) -> Vec2 {
        Vec2::new(self.translate_x, self.translate_y)
    }

    /// Page-to-screen transform, for renderer collaborators.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.translate()) * Affine::scale(self.zoom)
    }

    /// Screen-to-page transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.translate())
    }

    pub fn screen_to_page(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn page_to_screen(&self, page_point: Point) -> Point {
        self.transform() * page_point
    }

    /// Convert a screen-space distance to page units.
    pub fn screen_to_page_distance(&self, distance: f64) -> f64 {
        distance / self.zoom
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.translate_x += delta.x;
        self.translate_y += delta.y;
    }

    /// Set the zoom, keeping the given screen point fixed. The zoom is clamped.
    pub fn zoom_at(&mut self, screen_point: Point, zoom: f64) {
        let new_zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let page_point = self.screen_to_page(screen_point);
        self.zoom = new_zoom;

        // Adjust the translation so page_point stays under screen_point
        let new_screen = self.page_to_screen(page_point);
        self.pan(screen_point - new_screen);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Page rectangle visible in a viewport of the given screen size.
    pub fn visible_rect(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_page(Point::ZERO),
            self.screen_to_page(Point::new(viewport.width, viewport.height)),
        )
    }

    /// Zoom and pan so `bounds` fills the viewport with `padding` screen pixels around it.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        let viewport_center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        if bounds.width() < f64::EPSILON && bounds.height() < f64::EPSILON {
            // A single point: just center it at the current zoom.
            let screen = self.page_to_screen(bounds.center());
            self.pan(viewport_center - screen);
            return;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width().max(f64::EPSILON);
        let scale_y = padded.height / bounds.height().max(f64::EPSILON);
        self.zoom = scale_x.min(scale_y).clamp(ZOOM_MIN, ZOOM_MAX);

        let center = bounds.center();
        self.translate_x = viewport_center.x - center.x * self.zoom;
        self.translate_y = viewport_center.y - center.y * self.zoom;
    }
}

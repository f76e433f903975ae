//! The viewBox engine: owns the visible SVG viewport rectangle and all
//! zoom/pan arithmetic for one active template.
//!
//! The rect lives in template coordinate space. Zoom is derived, never
//! stored: `zoom = container_width / rect.width` (screen pixels per template
//! unit), which avoids drift between a stored zoom number and the rect.
//! All mutating operations end by reapplying the boundary constraints, and
//! any calculation that would produce a non-finite rect aborts instead.

use crate::error::{EditorError, EditorResult};
use crate::geometry;
use crate::template::ViewBox;

/// Tunable parameters for the viewBox engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Screen pixels reserved on each side of the template during auto-fit
    /// (space for floating UI controls).
    pub fit_padding: f64,
    /// Template-space margin the rect may roam beyond the template edges.
    pub pan_margin: f64,
    /// Multiplicative step for [`ViewBoxEngine::zoom_in`] /
    /// [`ViewBoxEngine::zoom_out`].
    pub zoom_step: f64,
    /// Lower bound for explicit zoom levels (screen px per template unit).
    pub min_scale: f64,
    /// Upper bound for explicit zoom levels.
    pub max_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fit_padding: 40.0,
            pan_margin: 24.0,
            zoom_step: 1.25,
            min_scale: 0.1,
            max_scale: 8.0,
        }
    }
}

/// Normalized wheel event input.
#[derive(Debug, Clone, Copy)]
pub struct WheelInput {
    /// Vertical wheel delta as reported by the platform.
    pub delta_y: f64,
    /// Whether the ctrl modifier was held (trackpad pinch signal).
    pub ctrl_key: bool,
    /// Cursor X in container pixels.
    pub cursor_x: f64,
    /// Cursor Y in container pixels.
    pub cursor_y: f64,
}

/// Owns the viewport rect for one template and recomputes it under hard
/// boundary constraints.
///
/// Other components request deltas through the operations here; nothing else
/// writes the rect.
#[derive(Debug, Clone)]
pub struct ViewBoxEngine {
    rect: ViewBox,
    template: ViewBox,
    container_width: f64,
    container_height: f64,
    config: EngineConfig,
}

impl ViewBoxEngine {
    /// Engine for a template's coordinate space. The rect starts as the full
    /// template; call [`ViewBoxEngine::set_container_size`] and
    /// [`ViewBoxEngine::auto_fit`] once the container is measurable.
    #[must_use]
    pub fn new(template: ViewBox, config: EngineConfig) -> Self {
        Self {
            rect: template,
            template,
            container_width: 0.0,
            container_height: 0.0,
            config,
        }
    }

    /// The current viewport rect.
    #[must_use]
    pub fn rect(&self) -> ViewBox {
        self.rect
    }

    /// The template bounds this engine constrains to.
    #[must_use]
    pub fn template(&self) -> ViewBox {
        self.template
    }

    /// Whether the container has a usable size.
    #[must_use]
    pub fn is_sized(&self) -> bool {
        geometry::all_finite(&[self.container_width, self.container_height])
            && self.container_width > 0.0
            && self.container_height > 0.0
    }

    /// Derived zoom level: screen pixels per template unit. Zero while the
    /// container is unsized.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        if self.rect.width > 0.0 {
            self.container_width / self.rect.width
        } else {
            0.0
        }
    }

    /// Smallest permitted zoom: the level at which the template plus pan
    /// margin is fully visible along its tighter axis. Zooming out further
    /// would only reveal empty canvas.
    #[must_use]
    pub fn min_zoom(&self) -> f64 {
        let m = self.config.pan_margin;
        let zx = self.container_width / (self.template.width + 2.0 * m);
        let zy = self.container_height / (self.template.height + 2.0 * m);
        zx.min(zy).max(self.config.min_scale)
    }

    /// Largest permitted zoom.
    #[must_use]
    pub fn max_zoom(&self) -> f64 {
        self.config.max_scale.max(self.min_zoom())
    }

    fn clamp_zoom(&self, level: f64) -> f64 {
        level.clamp(self.min_zoom(), self.max_zoom())
    }

    /// Update the container size, preserving the current zoom ratio so a
    /// window resize does not jump the view around.
    pub fn set_container_size(&mut self, width: f64, height: f64) -> EditorResult<()> {
        if !geometry::all_finite(&[width, height]) || width <= 0.0 || height <= 0.0 {
            return Err(EditorError::Geometry(format!(
                "container size not measurable: {width}x{height}"
            )));
        }
        let zoom = self.zoom();
        self.container_width = width;
        self.container_height = height;
        if zoom > 0.0 && zoom.is_finite() {
            self.resize_rect_about_center(width / zoom, height / zoom);
        }
        self.constrain();
        Ok(())
    }

    /// Step zoom in by the configured increment, pivoting on the viewport
    /// center.
    pub fn zoom_in(&mut self) -> EditorResult<()> {
        self.set_zoom(self.zoom() * self.config.zoom_step)
    }

    /// Step zoom out by the configured increment, pivoting on the viewport
    /// center.
    pub fn zoom_out(&mut self) -> EditorResult<()> {
        self.set_zoom(self.zoom() / self.config.zoom_step)
    }

    /// Set the zoom level, clamped to `[min_zoom, max_zoom]`, preserving the
    /// viewport's visual center.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Geometry`] if the container is unsized or the
    /// computation degenerates; the rect is left unchanged.
    pub fn set_zoom(&mut self, level: f64) -> EditorResult<()> {
        self.require_sized()?;
        let level = self.clamp_zoom(level);
        if !level.is_finite() || level <= 0.0 {
            return Err(EditorError::Geometry(format!("unusable zoom level: {level}")));
        }
        self.resize_rect_about_center(self.container_width / level, self.container_height / level);
        self.constrain();
        Ok(())
    }

    /// Pointer-anchored zoom: the template-space point under the cursor keeps
    /// its screen position across the zoom change.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Geometry`] if the container is unsized or the
    /// computation degenerates; the rect is left unchanged.
    pub fn handle_wheel(&mut self, input: WheelInput) -> EditorResult<()> {
        self.require_sized()?;
        let factor = geometry::wheel_zoom_factor(input.delta_y, input.ctrl_key);
        let target = self.clamp_zoom(self.zoom() * factor);
        if !target.is_finite() || target <= 0.0 {
            return Err(EditorError::Geometry(format!("unusable zoom level: {target}")));
        }

        // Cursor position as a fraction of the viewport, then the template
        // point currently under it.
        let fx = (input.cursor_x / self.container_width).clamp(0.0, 1.0);
        let fy = (input.cursor_y / self.container_height).clamp(0.0, 1.0);
        let anchor_x = self.rect.x + fx * self.rect.width;
        let anchor_y = self.rect.y + fy * self.rect.height;

        let width = self.container_width / target;
        let height = self.container_height / target;
        let x = anchor_x - fx * width;
        let y = anchor_y - fy * height;
        if !geometry::all_finite(&[x, y, width, height]) {
            return Err(EditorError::Geometry("wheel zoom produced non-finite rect".to_string()));
        }

        self.rect = ViewBox::new(x, y, width, height);
        self.constrain();
        Ok(())
    }

    /// Pan by a template-space delta, clipping each axis independently to the
    /// constraint bounds: a diagonal drag that overshoots on one axis still
    /// slides along the boundary on the other.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Geometry`] on non-finite input; the rect is
    /// left unchanged.
    pub fn pan(&mut self, delta_x: f64, delta_y: f64) -> EditorResult<()> {
        if !geometry::all_finite(&[delta_x, delta_y]) {
            return Err(EditorError::Geometry("non-finite pan delta".to_string()));
        }
        self.rect.x += delta_x;
        self.rect.y += delta_y;
        self.constrain();
        Ok(())
    }

    /// Frame the template: zoom to the largest level at which it fits inside
    /// the container minus fit padding (clamped to the configured bounds),
    /// centered on the template's geometric center.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Geometry`] until the container has a measurable
    /// size with room left after padding. Callers retry after layout settles.
    pub fn auto_fit(&mut self) -> EditorResult<()> {
        self.require_sized()?;
        let avail_w = self.container_width - 2.0 * self.config.fit_padding;
        let avail_h = self.container_height - 2.0 * self.config.fit_padding;
        let fit = geometry::scale_to_fit(self.template.width, self.template.height, avail_w, avail_h);
        if fit <= 0.0 {
            return Err(EditorError::Geometry(format!(
                "no room to fit template in {}x{} container",
                self.container_width, self.container_height
            )));
        }
        let zoom = self.clamp_zoom(fit);
        let width = self.container_width / zoom;
        let height = self.container_height / zoom;
        let (cx, cy) = self.template.center();
        self.rect = ViewBox::new(cx - width / 2.0, cy - height / 2.0, width, height);
        self.constrain();
        Ok(())
    }

    /// Reapply the boundary constraints once, without other changes. Used at
    /// gesture end to settle any transient overshoot.
    pub fn settle(&mut self) {
        self.constrain();
    }

    fn require_sized(&self) -> EditorResult<()> {
        if self.is_sized() {
            Ok(())
        } else {
            Err(EditorError::Geometry("container not sized yet".to_string()))
        }
    }

    fn resize_rect_about_center(&mut self, width: f64, height: f64) {
        if !geometry::all_finite(&[width, height]) || width <= 0.0 || height <= 0.0 {
            return;
        }
        let (cx, cy) = self.rect.center();
        self.rect = ViewBox::new(cx - width / 2.0, cy - height / 2.0, width, height);
    }

    /// Axis-independent constraint policy: where the rect is at least as
    /// large as the inflated template extent, it is centered and locked on
    /// that axis; otherwise its edges stay within the inflated extent.
    fn constrain(&mut self) {
        let m = self.config.pan_margin;
        let min_x = self.template.x - m;
        let max_x = self.template.x + self.template.width + m;
        let min_y = self.template.y - m;
        let max_y = self.template.y + self.template.height + m;
        let (tcx, tcy) = self.template.center();

        if self.rect.width >= max_x - min_x {
            self.rect.x = tcx - self.rect.width / 2.0;
        } else {
            self.rect.x = geometry::clamp_axis(self.rect.x, min_x, max_x - self.rect.width);
        }
        if self.rect.height >= max_y - min_y {
            self.rect.y = tcy - self.rect.height / 2.0;
        } else {
            self.rect.y = geometry::clamp_axis(self.rect.y, min_y, max_y - self.rect.height);
        }
    }
}

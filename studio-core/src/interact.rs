//! Input normalization: raw pointer/touch/gesture events become viewBox
//! engine calls.
//!
//! The embedder reports events in container pixels; this layer tracks gesture
//! state, converts pixel deltas to template-space deltas, and tells the
//! embedder whether the event was captured (so native browser zoom/scroll is
//! suppressed only for recognized gestures).

use crate::geometry;
use crate::viewbox::{ViewBoxEngine, WheelInput};

/// Whether an event was captured by the editor.
///
/// `Ignored` events must pass through untouched: no `preventDefault`, no
/// `stopPropagation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// The event drove the viewport; suppress the native handling.
    Consumed,
    /// Not our gesture; let the platform handle it.
    Ignored,
}

impl InputOutcome {
    /// Convenience for embedders bridging to `preventDefault`.
    #[must_use]
    pub fn is_consumed(self) -> bool {
        self == Self::Consumed
    }
}

/// A touch position in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPos {
    /// X in container pixels.
    pub x: f64,
    /// Y in container pixels.
    pub y: f64,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    last_x: f64,
    last_y: f64,
}

/// Pinch baseline captured at gesture start.
///
/// Scaling is always computed against this baseline rather than the live
/// zoom, so error cannot compound across a multi-step pinch.
#[derive(Debug, Clone, Copy)]
struct PinchState {
    start_spread: f64,
    start_zoom: f64,
}

/// Tracks in-flight gestures and dispatches them to a [`ViewBoxEngine`].
#[derive(Debug, Default)]
pub struct InteractionState {
    drag: Option<DragState>,
    pinch: Option<PinchState>,
    preview_mode: bool,
}

impl InteractionState {
    /// Fresh tracker with no gesture in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle preview mode. While active, every event is ignored and any
    /// in-flight gesture is dropped.
    pub fn set_preview_mode(&mut self, preview: bool) {
        self.preview_mode = preview;
        if preview {
            self.drag = None;
            self.pinch = None;
        }
    }

    /// Whether preview mode is active.
    #[must_use]
    pub fn preview_mode(&self) -> bool {
        self.preview_mode
    }

    /// Mouse button press: begin a drag.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> InputOutcome {
        if self.preview_mode {
            return InputOutcome::Ignored;
        }
        self.drag = Some(DragState { last_x: x, last_y: y });
        InputOutcome::Consumed
    }

    /// Mouse move: pan by the pixel delta converted to template units.
    pub fn pointer_move(&mut self, x: f64, y: f64, engine: &mut ViewBoxEngine) -> InputOutcome {
        let Some(drag) = self.drag.as_mut() else {
            return InputOutcome::Ignored;
        };
        let dx = x - drag.last_x;
        let dy = y - drag.last_y;
        drag.last_x = x;
        drag.last_y = y;
        let zoom = engine.zoom();
        if zoom > 0.0 {
            // Dragging right moves the content right, so the viewport slides
            // the other way.
            if let Err(e) = engine.pan(-dx / zoom, -dy / zoom) {
                tracing::debug!("drag pan aborted: {e}");
            }
        }
        InputOutcome::Consumed
    }

    /// Mouse release or pointer leaving the container: end the drag and
    /// settle constraints once.
    pub fn pointer_up(&mut self, engine: &mut ViewBoxEngine) -> InputOutcome {
        if self.drag.take().is_none() {
            return InputOutcome::Ignored;
        }
        engine.settle();
        InputOutcome::Consumed
    }

    /// Wheel input over the container: pointer-anchored zoom. An event the
    /// engine cannot act on (container not yet sized) is ignored so native
    /// scrolling is not suppressed for nothing.
    pub fn wheel(&mut self, input: WheelInput, engine: &mut ViewBoxEngine) -> InputOutcome {
        if self.preview_mode {
            return InputOutcome::Ignored;
        }
        match engine.handle_wheel(input) {
            Ok(()) => InputOutcome::Consumed,
            Err(e) => {
                tracing::debug!("wheel zoom aborted: {e}");
                InputOutcome::Ignored
            }
        }
    }

    /// Touch start. Two or more fingers begin a pinch; a single touch passes
    /// through for native scrolling/tapping.
    pub fn touch_start(&mut self, touches: &[TouchPos], engine: &ViewBoxEngine) -> InputOutcome {
        if self.preview_mode || touches.len() < 2 {
            return InputOutcome::Ignored;
        }
        self.drag = None;
        self.pinch = Some(PinchState {
            start_spread: geometry::distance(touches[0].x, touches[0].y, touches[1].x, touches[1].y),
            start_zoom: engine.zoom(),
        });
        InputOutcome::Consumed
    }

    /// Touch move during a pinch: scale zoom by the spread ratio against the
    /// gesture-start baseline.
    pub fn touch_move(&mut self, touches: &[TouchPos], engine: &mut ViewBoxEngine) -> InputOutcome {
        let Some(pinch) = self.pinch else {
            return InputOutcome::Ignored;
        };
        if touches.len() < 2 {
            return InputOutcome::Ignored;
        }
        let spread = geometry::distance(touches[0].x, touches[0].y, touches[1].x, touches[1].y);
        if pinch.start_spread > 0.0 {
            let scale = spread / pinch.start_spread;
            if let Err(e) = engine.set_zoom(pinch.start_zoom * scale) {
                tracing::debug!("pinch zoom aborted: {e}");
            }
        }
        InputOutcome::Consumed
    }

    /// Touch end: once fewer than two fingers remain, the pinch is over.
    pub fn touch_end(&mut self, remaining: &[TouchPos], engine: &mut ViewBoxEngine) -> InputOutcome {
        if self.pinch.is_none() {
            return InputOutcome::Ignored;
        }
        if remaining.len() < 2 {
            self.pinch = None;
            engine.settle();
        }
        InputOutcome::Consumed
    }

    /// Safari `gesturestart`: capture the zoom baseline.
    pub fn gesture_start(&mut self, engine: &ViewBoxEngine) -> InputOutcome {
        if self.preview_mode {
            return InputOutcome::Ignored;
        }
        self.drag = None;
        self.pinch = Some(PinchState {
            start_spread: 1.0,
            start_zoom: engine.zoom(),
        });
        InputOutcome::Consumed
    }

    /// Safari `gesturechange`: the platform supplies the scale factor
    /// directly.
    pub fn gesture_change(&mut self, scale: f64, engine: &mut ViewBoxEngine) -> InputOutcome {
        let Some(pinch) = self.pinch else {
            return InputOutcome::Ignored;
        };
        if scale.is_finite() && scale > 0.0 {
            if let Err(e) = engine.set_zoom(pinch.start_zoom * scale) {
                tracing::debug!("gesture zoom aborted: {e}");
            }
        }
        InputOutcome::Consumed
    }

    /// Safari `gestureend`.
    pub fn gesture_end(&mut self, engine: &mut ViewBoxEngine) -> InputOutcome {
        if self.pinch.take().is_none() {
            return InputOutcome::Ignored;
        }
        engine.settle();
        InputOutcome::Consumed
    }
}

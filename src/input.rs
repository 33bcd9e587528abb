//! Pointer gestures: hit-testing, drag state, and long-press arbitration.
//!
//! Mouse and touch feed the same [`PointerEvent`] stream, so the state
//! machine has exactly one code path for both. Transitions are pure with
//! respect to time: every event carries its own timestamp, and long-press
//! promotion compares event timestamps rather than reading a clock, which
//! keeps the whole machine deterministic under test.

use std::time::{Duration, Instant};

use crate::geom::Point;
use crate::layout::TextBlockMetrics;
use crate::scene::SceneModel;
use crate::viewport::Viewport;

/// How close to an overlay's bottom-right corner a press counts as a resize
/// grab, in logical units.
pub const RESIZE_EDGE_THRESHOLD: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A single pointer sample in physical surface pixels.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub position: Point,
    pub phase: PointerPhase,
    pub timestamp: Instant,
}

impl PointerEvent {
    pub fn new(position: Point, phase: PointerPhase, timestamp: Instant) -> Self {
        Self {
            position,
            phase,
            timestamp,
        }
    }

    pub fn down(x: f32, y: f32, timestamp: Instant) -> Self {
        Self::new(Point::new(x, y), PointerPhase::Down, timestamp)
    }

    pub fn moved(x: f32, y: f32, timestamp: Instant) -> Self {
        Self::new(Point::new(x, y), PointerPhase::Move, timestamp)
    }

    pub fn up(x: f32, y: f32, timestamp: Instant) -> Self {
        Self::new(Point::new(x, y), PointerPhase::Up, timestamp)
    }
}

/// Which handle a resize drag grabbed. Only the bottom-right corner is a
/// handle today; more corners slot in as variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    BottomRight,
}

/// What a pending press will become if it survives the long-press delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingTarget {
    MoveOverlay(usize),
    MoveText,
}

/// Gesture state. `Pending` only occurs when a long-press delay is
/// configured; without one a press commits to its drag immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Pending {
        target: PendingTarget,
        pressed_at: Instant,
    },
    MovingOverlay {
        index: usize,
    },
    ResizingOverlay {
        index: usize,
        handle: ResizeHandle,
    },
    MovingText,
}

/// What the caller should do after feeding an event through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed; no repaint needed.
    Ignored,
    /// The scene changed; repaint.
    Repaint,
    /// The press ended without ever becoming a drag.
    Tap,
}

/// Drives scene mutations from pointer events.
pub struct InteractionController {
    gesture: Gesture,
    /// Last pointer position in logical units; deltas are relative to it.
    anchor: Point,
    /// Drags start only after the pointer has been held this long. `None`
    /// commits immediately on press.
    long_press: Option<Duration>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
            anchor: Point::new(0.0, 0.0),
            long_press: None,
        }
    }

    pub fn with_long_press(delay: Duration) -> Self {
        Self {
            long_press: Some(delay),
            ..Self::new()
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Feed one pointer event through the state machine, mutating the scene
    /// as the active gesture dictates.
    pub fn on_pointer(
        &mut self,
        event: PointerEvent,
        scene: &mut SceneModel,
        metrics: &TextBlockMetrics,
        viewport: &Viewport,
    ) -> Outcome {
        let logical = viewport.to_logical(event.position);
        match event.phase {
            PointerPhase::Down => self.on_down(logical, event.timestamp, scene, metrics),
            PointerPhase::Move => self.on_move(logical, event.timestamp, scene, metrics, viewport),
            PointerPhase::Up => self.on_up(),
        }
    }

    fn on_down(
        &mut self,
        logical: Point,
        timestamp: Instant,
        scene: &mut SceneModel,
        metrics: &TextBlockMetrics,
    ) -> Outcome {
        self.anchor = logical;

        // Overlays first, topmost first, so the element painted on top wins
        // the hit.
        let hit = scene
            .overlays()
            .iter()
            .enumerate()
            .rev()
            .find(|(_, overlay)| overlay.bounds().contains(logical))
            .map(|(index, overlay)| (index, overlay.bounds().bottom_right()));
        if let Some((index, corner)) = hit {
            let selection_changed = scene.selected() != Some(index);
            scene.select(index);

            let near_corner = logical.x >= corner.x - RESIZE_EDGE_THRESHOLD
                && logical.y >= corner.y - RESIZE_EDGE_THRESHOLD;
            if near_corner {
                // Resizes never wait out the long-press delay; grabbing the
                // handle is already an unambiguous intent.
                self.gesture = Gesture::ResizingOverlay {
                    index,
                    handle: ResizeHandle::BottomRight,
                };
            } else if self.long_press.is_some() {
                self.gesture = Gesture::Pending {
                    target: PendingTarget::MoveOverlay(index),
                    pressed_at: timestamp,
                };
            } else {
                self.gesture = Gesture::MovingOverlay { index };
            }
            return if selection_changed {
                Outcome::Repaint
            } else {
                Outcome::Ignored
            };
        }

        // The text block is hit-tested against the same wrapped bounds the
        // renderer paints.
        if metrics.bounds(scene.text.origin).contains(logical) {
            self.gesture = match self.long_press {
                Some(_) => Gesture::Pending {
                    target: PendingTarget::MoveText,
                    pressed_at: timestamp,
                },
                None => Gesture::MovingText,
            };
            return Outcome::Ignored;
        }

        // Empty canvas press: drop the selection.
        let had_selection = scene.selected().is_some();
        scene.clear_selection();
        self.gesture = Gesture::Idle;
        if had_selection {
            Outcome::Repaint
        } else {
            Outcome::Ignored
        }
    }

    fn on_move(
        &mut self,
        logical: Point,
        timestamp: Instant,
        scene: &mut SceneModel,
        metrics: &TextBlockMetrics,
        viewport: &Viewport,
    ) -> Outcome {
        // Promote a pending press once the delay has elapsed. The anchor
        // resets to the current position so the committed drag starts from
        // here rather than jumping by the distance travelled while pending.
        if let Gesture::Pending { target, pressed_at } = self.gesture {
            let held = timestamp.saturating_duration_since(pressed_at);
            match self.long_press {
                Some(delay) if held >= delay => {
                    self.gesture = match target {
                        PendingTarget::MoveOverlay(index) => Gesture::MovingOverlay { index },
                        PendingTarget::MoveText => Gesture::MovingText,
                    };
                    self.anchor = logical;
                    return Outcome::Ignored;
                }
                _ => return Outcome::Ignored,
            }
        }

        let delta = logical.delta_from(self.anchor);
        let outcome = match self.gesture {
            Gesture::MovingOverlay { index } => {
                scene.move_overlay(index, delta);
                Outcome::Repaint
            }
            Gesture::ResizingOverlay { index, .. } => {
                scene.resize_overlay(index, logical);
                Outcome::Repaint
            }
            Gesture::MovingText => {
                scene.move_text(delta, metrics.block_size(), viewport.logical_size());
                Outcome::Repaint
            }
            Gesture::Idle | Gesture::Pending { .. } => Outcome::Ignored,
        };
        self.anchor = logical;
        outcome
    }

    fn on_up(&mut self) -> Outcome {
        let outcome = match self.gesture {
            // Released before the long-press delay: a tap, and the scene was
            // never touched.
            Gesture::Pending { .. } => Outcome::Tap,
            Gesture::Idle => Outcome::Ignored,
            _ => Outcome::Ignored,
        };
        self.gesture = Gesture::Idle;
        outcome
    }
}

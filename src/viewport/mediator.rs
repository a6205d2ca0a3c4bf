//! LIFO input interception in front of scene hit-testing.

use crate::foundation::core::{NodeId, Point};
use crate::transform::affine::Transform;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// Wheel step; positive is away from the user.
    Wheel { delta: f64 },
}

/// Pointer input in viewport pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self { kind, x, y }
    }
}

/// Whether a mediator consumed an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Consumed,
    Declined,
}

/// Result of offering an event to a viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// A mediator consumed the event.
    Mediated,
    /// No mediator consumed it and it hit a shape in the main scene.
    Hit(NodeId),
    Missed,
}

/// What a mediator may see and change while handling one event.
#[derive(Debug)]
pub struct MediatorContext {
    transform: Transform,
    changed: bool,
    width: u32,
    height: u32,
}

impl MediatorContext {
    pub(crate) fn new(transform: Transform, width: u32, height: u32) -> Self {
        Self {
            transform,
            changed: false,
            width,
            height,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Replace the viewport transform once dispatch completes.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.changed = true;
    }

    /// Map a pixel-space point into scene space; pixel space is assumed when
    /// the transform cannot be inverted.
    pub fn to_scene(&self, p: Point) -> Point {
        match self.transform.invert() {
            Ok(inv) => inv.apply(p),
            Err(_) => p,
        }
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn take_change(&self) -> Option<Transform> {
        self.changed.then_some(self.transform)
    }
}

pub trait Mediator {
    fn handle(&mut self, event: &PointerEvent, ctx: &mut MediatorContext) -> Dispatch;

    /// Disabled mediators are skipped during dispatch.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Mediator stack; the most recently pushed mediator sees events first.
#[derive(Default)]
pub struct Mediators {
    stack: Vec<Box<dyn Mediator>>,
}

impl std::fmt::Debug for Mediators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediators")
            .field("len", &self.stack.len())
            .finish()
    }
}

impl Mediators {
    pub fn push(&mut self, mediator: impl Mediator + 'static) {
        self.stack.push(Box::new(mediator));
    }

    pub fn pop(&mut self) -> Option<Box<dyn Mediator>> {
        self.stack.pop()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Offer `event` top-down until one mediator consumes it.
    pub fn dispatch(&mut self, event: &PointerEvent, ctx: &mut MediatorContext) -> Dispatch {
        for mediator in self.stack.iter_mut().rev() {
            if !mediator.is_enabled() {
                continue;
            }
            if mediator.handle(event, ctx) == Dispatch::Consumed {
                return Dispatch::Consumed;
            }
        }
        Dispatch::Declined
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/mediator.rs"]
mod tests;

use crate::transform::affine::Transform;

/// Notifications emitted by a [`crate::Viewport`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportEvent {
    /// Pixel size changed; every scene already has the new size.
    Resized { width: u32, height: u32 },
    /// The current transform was replaced.
    TransformChanged(Transform),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum EventKind {
    Resize,
    TransformChanged,
}

impl ViewportEvent {
    pub(crate) fn kind(&self) -> EventKind {
        match self {
            Self::Resized { .. } => EventKind::Resize,
            Self::TransformChanged(_) => EventKind::TransformChanged,
        }
    }
}

/// Token returned when a handler is registered; pass it back to remove the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerRegistration(u64);

type Handler = Box<dyn FnMut(&ViewportEvent)>;

/// Handler registry, fired synchronously in registration order.
#[derive(Default)]
pub(crate) struct EventHandlers {
    next: u64,
    entries: Vec<(HandlerRegistration, EventKind, Handler)>,
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl EventHandlers {
    pub(crate) fn add(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&ViewportEvent) + 'static,
    ) -> HandlerRegistration {
        self.next += 1;
        let reg = HandlerRegistration(self.next);
        self.entries.push((reg, kind, Box::new(handler)));
        reg
    }

    pub(crate) fn remove(&mut self, reg: HandlerRegistration) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(r, _, _)| *r != reg);
        self.entries.len() != before
    }

    pub(crate) fn fire(&mut self, event: &ViewportEvent) {
        let kind = event.kind();
        for (_, k, handler) in &mut self.entries {
            if *k == kind {
                handler(event);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

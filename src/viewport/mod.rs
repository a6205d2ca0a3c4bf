pub(crate) mod events;
pub(crate) mod mediator;
pub(crate) mod scratch;
pub(crate) mod viewport;

pub(crate) mod node;
pub(crate) mod scene;
pub(crate) mod shape;
pub(crate) mod surface;

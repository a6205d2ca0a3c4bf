//! Easel is a retained-mode 2D scene graph for raster canvases.
//!
//! A [`Viewport`] owns three role-fixed [`Scene`]s (background, main, drag).
//! Scenes hold ordered [`Surface`]s, and surfaces hold [`Shape`]s painted into
//! a premultiplied RGBA8 pixel buffer by the `vello_cpu` rasterizer.
//!
//! # Pieces
//!
//! - **Transform**: [`Transform`] is the affine value type used for coordinate
//!   mapping, viewport fitting and hit-testing.
//! - **Compositing**: [`Paint::draw`] repaints at once, [`Paint::batch`] coalesces
//!   repaints until the next [`Paint::flush`] or pixel read.
//! - **Input**: [`Viewport::dispatch`] offers pointer events to a LIFO [`Mediators`]
//!   stack before hit-testing the main scene.
//! - **Persistence**: [`NodeRecord`] is the `{type, meta, attributes, children, storage}`
//!   record; rebuilding collects problems in a [`ValidationContext`].
//! - **Filters**: [`TableImageFilter`] remaps channels through a cached 256-entry
//!   [`LookupTable`] produced by a [`TableFilter`].
//!
//! `unsafe` is forbidden in this crate.
#![forbid(unsafe_code)]

mod filter;
mod foundation;
mod record;
mod render;
mod scene;
mod transform;
mod viewport;

pub use filter::presets::{Invert, Posterize, Solarize};
pub use filter::table::{FilterChain, ImageFilter, LookupTable, TableFilter, TableImageFilter};
pub use foundation::core::{Affine, BezPath, NodeId, Point, Rect, Rgba8, Vec2};
pub use foundation::error::{EaselError, EaselResult};
pub use record::node::{NodeKind, NodeRecord};
pub use record::validate::{RecordPathElem, ValidationContext, ValidationIssue};
pub use render::composite::{PremulRgba8, over, over_in_place};
pub use render::encode::{ExportFormat, encode_premul_rgba8};
pub use scene::node::{Container, Node, Paint};
pub use scene::scene::Scene;
pub use scene::shape::{Geometry, Shape};
pub use scene::surface::{RenderSettings, Surface, SurfaceRole};
pub use transform::affine::Transform;
pub use viewport::events::{HandlerRegistration, ViewportEvent};
pub use viewport::mediator::{
    Dispatch, InputOutcome, Mediator, MediatorContext, Mediators, PointerEvent, PointerKind,
};
pub use viewport::scratch::ScratchPad;
pub use viewport::viewport::Viewport;

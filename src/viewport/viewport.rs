use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::{Map, Value};

use crate::foundation::core::{NodeId, Point};
use crate::foundation::error::{EaselError, EaselResult};
use crate::record::node::{NodeKind, NodeRecord, bool_attr, each_child, expect_kind, typed_attr};
use crate::record::validate::{RecordPathElem, ValidationContext};
use crate::render::encode::{ExportFormat, encode_premul_rgba8};
use crate::scene::node::{Container, Node, Paint};
use crate::scene::scene::Scene;
use crate::scene::shape::Shape;
use crate::scene::surface::{Surface, SurfaceRole};
use crate::transform::affine::Transform;
use crate::viewport::events::{EventHandlers, EventKind, HandlerRegistration, ViewportEvent};
use crate::viewport::mediator::{Dispatch, InputOutcome, Mediator, MediatorContext, Mediators, PointerEvent};
use crate::viewport::scratch::ScratchPad;

const DRAG_LAYER: usize = 0;
const OVER_LAYER: usize = 1;

fn check_pixel_size(width: u32, height: u32) -> EaselResult<()> {
    let max = u32::from(u16::MAX);
    if width > max || height > max {
        return Err(EaselError::validation(format!(
            "viewport size {width}x{height} exceeds {max}x{max}"
        )));
    }
    Ok(())
}

/// Compositing root: three role-fixed scenes, the current transform, a
/// mediator stack and an event registry.
///
/// Paint order, and the order `draw`/`batch` fan out in, is background, main,
/// drag. The drag scene always holds the drag layer and the overlay layer and
/// is never exported or persisted.
#[derive(Debug)]
pub struct Viewport {
    id: NodeId,
    width: u32,
    height: u32,
    visible: bool,
    transform: Transform,
    back: Scene,
    main: Scene,
    drag: Scene,
    mediators: Mediators,
    handlers: EventHandlers,
    scratch: ScratchPad,
    meta: Map<String, Value>,
}

impl Viewport {
    /// Viewport with an empty main scene and the identity transform.
    pub fn new(width: u32, height: u32) -> EaselResult<Self> {
        Self::with_scene(Scene::new(), width, height)
    }

    /// Viewport around an existing, unowned main scene.
    pub fn with_scene(main: Scene, width: u32, height: u32) -> EaselResult<Self> {
        if let Some(owner) = main.owner() {
            return Err(EaselError::already_owned(format!(
                "scene {} is owned by {owner}",
                main.id()
            )));
        }
        check_pixel_size(width, height)?;

        let mut vp = Self {
            id: NodeId::next(),
            width,
            height,
            visible: true,
            transform: Transform::IDENTITY,
            back: Scene::new(),
            main,
            drag: Scene::new(),
            mediators: Mediators::default(),
            handlers: EventHandlers::default(),
            scratch: ScratchPad::new(width, height),
            meta: Map::new(),
        };
        vp.drag.add(Surface::with_role(SurfaceRole::Drag))?;
        vp.drag.add(Surface::with_role(SurfaceRole::Overlay))?;
        let id = vp.id;
        for scene in vp.scenes_mut() {
            scene.adopt(id);
            scene.resize(width, height)?;
            scene.set_view_transform(Transform::IDENTITY);
        }
        Ok(vp)
    }

    fn scenes_mut(&mut self) -> [&mut Scene; 3] {
        [&mut self.back, &mut self.main, &mut self.drag]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Background, main and drag scenes, in paint order.
    pub fn scenes(&self) -> [&Scene; 3] {
        [&self.back, &self.main, &self.drag]
    }

    /// Resize every scene and the scratch buffer, then notify resize handlers.
    #[tracing::instrument(level = "debug", skip(self), fields(viewport = self.id.get()))]
    pub fn set_pixel_size(&mut self, width: u32, height: u32) -> EaselResult<()> {
        check_pixel_size(width, height)?;
        self.width = width;
        self.height = height;
        for scene in self.scenes_mut() {
            scene.resize(width, height)?;
        }
        self.scratch.set_pixel_size(width, height);
        self.handlers
            .fire(&ViewportEvent::Resized { width, height });
        Ok(())
    }

    /// Always rejected: the viewport holds exactly three scenes.
    ///
    /// An owned scene fails with `AlreadyOwned`, any other with `TooManyScenes`.
    /// Rebuilding from a record is the way to install a different main scene.
    pub fn add(&mut self, scene: Scene) -> EaselResult<()> {
        if let Some(owner) = scene.owner() {
            return Err(EaselError::already_owned(format!(
                "scene {} is owned by {owner}",
                scene.id()
            )));
        }
        Err(EaselError::too_many_scenes(format!(
            "viewport {} already holds background, main and drag scenes",
            self.id
        )))
    }

    /// Replace the background scene's content with exactly `layer`.
    pub fn set_background_layer(&mut self, mut layer: Surface) -> EaselResult<()> {
        if let Some(owner) = layer.owner() {
            return Err(EaselError::already_owned(format!(
                "surface {} is owned by {owner}",
                layer.id()
            )));
        }
        layer.set_role(SurfaceRole::Background);
        self.back.remove_all();
        self.back.add(layer)
    }

    pub fn background_layer(&self) -> Option<&Surface> {
        self.back.children().first()
    }

    pub fn background_layer_mut(&mut self) -> Option<&mut Surface> {
        self.back.surfaces_mut().first_mut()
    }

    pub fn drag_layer(&self) -> &Surface {
        &self.drag.children()[DRAG_LAYER]
    }

    pub fn drag_layer_mut(&mut self) -> &mut Surface {
        &mut self.drag.surfaces_mut()[DRAG_LAYER]
    }

    pub fn over_layer(&self) -> &Surface {
        &self.drag.children()[OVER_LAYER]
    }

    pub fn over_layer_mut(&mut self) -> &mut Surface {
        &mut self.drag.surfaces_mut()[OVER_LAYER]
    }

    /// The main scene.
    pub fn scene(&self) -> &Scene {
        &self.main
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.main
    }

    /// Detach every surface of the main scene; the scene itself stays.
    pub fn remove_all(&mut self) -> Vec<Surface> {
        self.main.remove_all()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Install `transform` on every scene and notify transform handlers.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        for scene in self.scenes_mut() {
            scene.set_view_transform(transform);
        }
        self.handlers
            .fire(&ViewportEvent::TransformChanged(transform));
    }

    /// Fit the scene-space rectangle into the viewport; a degenerate rectangle is ignored.
    pub fn view_local_area(&mut self, x: f64, y: f64, width: f64, height: f64) -> bool {
        match Transform::viewport_fit(
            x,
            y,
            width,
            height,
            f64::from(self.width),
            f64::from(self.height),
        ) {
            Some(t) => {
                self.set_transform(t);
                true
            }
            None => false,
        }
    }

    /// Like [`Viewport::view_local_area`], but `(x, y, width, height)` is in pixel space.
    ///
    /// When the current transform is singular pixel space is taken as scene space.
    pub fn view_global_area(&mut self, x: f64, y: f64, width: f64, height: f64) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }
        let (x, y, width, height) = match self.transform.invert() {
            Ok(inv) => {
                let a = inv.apply(Point::new(x, y));
                let b = inv.apply(Point::new(x + width, y + height));
                (a.x, a.y, b.x - a.x, b.y - a.y)
            }
            Err(e) => {
                tracing::warn!(error = %e, "view_global_area: using pixel space as scene space");
                (x, y, width, height)
            }
        };
        self.view_local_area(x, y, width, height)
    }

    /// Front-most shape of the main scene under a pixel-space point.
    pub fn find_shape_at_point(&self, x: f64, y: f64) -> Option<&Shape> {
        if !self.visible {
            return None;
        }
        self.main.hit_test(x, y)
    }

    /// Every shape in the main scene matching `pred`, in paint order.
    pub fn find_shapes(&self, pred: impl FnMut(&Shape) -> bool) -> Vec<&Shape> {
        self.main.find(pred)
    }

    pub fn push_mediator(&mut self, mediator: impl Mediator + 'static) {
        self.mediators.push(mediator);
    }

    pub fn mediators(&self) -> &Mediators {
        &self.mediators
    }

    pub fn mediators_mut(&mut self) -> &mut Mediators {
        &mut self.mediators
    }

    /// Offer `event` to the mediator stack, then hit-test the main scene.
    pub fn dispatch(&mut self, event: PointerEvent) -> InputOutcome {
        let mut ctx = MediatorContext::new(self.transform, self.width, self.height);
        let res = self.mediators.dispatch(&event, &mut ctx);
        if let Some(t) = ctx.take_change() {
            self.set_transform(t);
        }
        if res == Dispatch::Consumed {
            return InputOutcome::Mediated;
        }
        match self.find_shape_at_point(event.x, event.y) {
            Some(shape) => InputOutcome::Hit(shape.id()),
            None => InputOutcome::Missed,
        }
    }

    pub fn add_resize_handler(
        &mut self,
        handler: impl FnMut(&ViewportEvent) + 'static,
    ) -> HandlerRegistration {
        self.handlers.add(EventKind::Resize, handler)
    }

    pub fn add_transform_changed_handler(
        &mut self,
        handler: impl FnMut(&ViewportEvent) + 'static,
    ) -> HandlerRegistration {
        self.handlers.add(EventKind::TransformChanged, handler)
    }

    /// Returns false if the registration was already removed.
    pub fn remove_handler(&mut self, reg: HandlerRegistration) -> bool {
        self.handlers.remove(reg)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.meta
    }

    /// Composite the main scene, optionally over the background, and encode it.
    ///
    /// The drag scene is never included.
    #[tracing::instrument(level = "debug", skip(self), fields(viewport = self.id.get()))]
    pub fn export_image(
        &mut self,
        format: ExportFormat,
        include_background: bool,
    ) -> EaselResult<Vec<u8>> {
        if self.scratch.width() != self.width || self.scratch.height() != self.height {
            self.scratch.set_pixel_size(self.width, self.height);
        }
        let buf = self.scratch.clear();
        if include_background {
            self.back.composite_into(buf)?;
        }
        self.main.composite_into(buf)?;
        encode_premul_rgba8(self.scratch.data(), self.width, self.height, format)
    }

    /// Snapshot with the main scene as the single child.
    pub fn to_record(&self) -> NodeRecord {
        let mut rec = NodeRecord::new(NodeKind::Viewport).with_storage("viewport");
        rec.meta = self.meta.clone();
        rec.set_attr("transform", Value::from(self.transform.coeffs().to_vec()));
        rec.set_attr("width", self.width);
        rec.set_attr("height", self.height);
        rec.set_attr("visible", self.visible);
        rec.children = vec![self.main.to_record()];
        rec
    }

    /// Rebuild a viewport, collecting every structural issue into `ctx`.
    ///
    /// Returns `None` only when no viewport can be built at all (wrong root
    /// kind or invalid size); otherwise the result may still carry issues.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn from_record(rec: &NodeRecord, ctx: &mut ValidationContext) -> Option<Viewport> {
        if !expect_kind(rec, NodeKind::Viewport, ctx) {
            return None;
        }

        let transform = if rec.attributes.contains_key("transform") {
            typed_attr::<Transform>(rec, "transform", ctx)
        } else {
            ctx.push(RecordPathElem::Field("attributes"));
            ctx.add_error(EaselError::validation("viewport record has no transform"));
            ctx.pop();
            None
        };
        let width = typed_attr::<u32>(rec, "width", ctx).unwrap_or(0);
        let height = typed_attr::<u32>(rec, "height", ctx).unwrap_or(0);
        let visible = bool_attr(rec, "visible", true, ctx);

        if rec.children.is_empty() {
            ctx.add_error(EaselError::validation("viewport record has no scene child"));
        }
        let mut main: Option<Scene> = None;
        let mut scene_children = 0usize;
        each_child(rec, ctx, |child, ctx| {
            if child.kind != NodeKind::Scene {
                ctx.add_error(EaselError::type_mismatch(format!(
                    "viewport children must be scenes, found a {} record",
                    child.kind
                )));
                return;
            }
            scene_children += 1;
            if scene_children > 1 {
                ctx.add_error(EaselError::too_many_scenes(
                    "a viewport record holds a single main scene",
                ));
                return;
            }
            main = Scene::from_record(child, ctx);
        });

        let mut vp = match Viewport::with_scene(main.unwrap_or_default(), width, height) {
            Ok(vp) => vp,
            Err(e) => {
                ctx.add_error(e);
                return None;
            }
        };
        vp.set_transform(transform.unwrap_or_default());
        vp.visible = visible;
        vp.meta = rec.meta.clone();
        tracing::debug!(issues = ctx.issues().len(), "viewport rebuilt from record");
        Some(vp)
    }

    /// [`Viewport::from_record`] that fails on any recorded issue.
    pub fn try_from_record(rec: &NodeRecord) -> EaselResult<Viewport> {
        let mut ctx = ValidationContext::new();
        let vp = Self::from_record(rec, &mut ctx);
        ctx.into_result()?;
        vp.ok_or_else(|| EaselError::validation("viewport record could not be rebuilt"))
    }

    pub fn to_json(&self) -> EaselResult<String> {
        serde_json::to_string_pretty(&self.to_record()).map_err(|e| EaselError::serde(e.to_string()))
    }

    pub fn from_json(s: &str) -> EaselResult<Viewport> {
        let rec: NodeRecord =
            serde_json::from_str(s).map_err(|e| EaselError::serde(e.to_string()))?;
        Self::try_from_record(&rec)
    }

    pub fn from_reader<R: Read>(r: R) -> EaselResult<Viewport> {
        let rec: NodeRecord =
            serde_json::from_reader(r).map_err(|e| EaselError::serde(e.to_string()))?;
        Self::try_from_record(&rec)
    }

    /// Parse a viewport record from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> EaselResult<Viewport> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            EaselError::validation(format!("open viewport JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

impl Node for Viewport {
    fn id(&self) -> NodeId {
        self.id
    }
}

impl Paint for Viewport {
    fn draw(&mut self) {
        for scene in self.scenes_mut() {
            scene.draw();
        }
    }

    fn batch(&mut self) {
        for scene in self.scenes_mut() {
            scene.batch();
        }
    }

    fn flush(&mut self) -> usize {
        self.scenes_mut().into_iter().map(|s| s.flush()).sum()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/viewport.rs"]
mod tests;

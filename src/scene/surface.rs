use crate::filter::table::ImageFilter;
use crate::foundation::core::{NodeId, Point, Rgba8};
use crate::foundation::error::{EaselError, EaselResult};
use crate::foundation::math::{premultiply_in_place, unpremultiply_in_place};
use crate::render::composite::{fill_in_place, underlay_in_place};
use crate::render::encode::{ExportFormat, encode_premul_rgba8};
use crate::render::raster::paint_shapes;
use crate::scene::node::{Container, Node, Paint, Reorder, reorder};
use crate::scene::shape::Shape;
use crate::transform::affine::Transform;

/// What a surface is used for inside a viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceRole {
    /// A regular content layer.
    #[default]
    Ordinary,
    /// The viewport's background layer.
    Background,
    /// Transient drag feedback; never hit-tested.
    Drag,
    /// General-purpose overlay above the content.
    Overlay,
}

fn default_tolerance() -> f64 {
    0.1
}

/// Per-surface rendering configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderSettings {
    /// Solid color painted beneath the content on every repaint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_rgba: Option<Rgba8>,
    /// Curve flattening accuracy in local units.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_rgba: None,
            tolerance: default_tolerance(),
        }
    }
}

/// An addressable premultiplied RGBA8 pixel buffer plus the shapes painted into it.
///
/// A surface is the unit of rasterization: [`Paint::draw`] repaints immediately,
/// [`Paint::batch`] defers the repaint to the next [`Paint::flush`]. Every read of
/// the pixels (`pixels`, `export_pixels`, `apply_filter`, scene compositing)
/// flushes first, so a batched request is never observed as lost.
pub struct Surface {
    id: NodeId,
    owner: Option<NodeId>,
    role: SurfaceRole,
    settings: RenderSettings,
    width: u32,
    height: u32,
    pixmap: vello_cpu::Pixmap,
    view: Transform,
    visible: bool,
    listening: bool,
    shapes: Vec<Shape>,
    batch_pending: bool,
    batch_requests: u64,
    redraws: u64,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("role", &self.role)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("visible", &self.visible)
            .field("listening", &self.listening)
            .field("shapes", &self.shapes.len())
            .field("batch_pending", &self.batch_pending)
            .field("redraws", &self.redraws)
            .finish_non_exhaustive()
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// Empty, visible, listening surface of size 0x0.
    pub fn new() -> Self {
        Self::with_role(SurfaceRole::Ordinary)
    }

    /// Empty surface with the given role. Drag surfaces do not listen.
    pub fn with_role(role: SurfaceRole) -> Self {
        Self {
            id: NodeId::next(),
            owner: None,
            role,
            settings: RenderSettings::default(),
            width: 0,
            height: 0,
            pixmap: vello_cpu::Pixmap::new(0, 0),
            view: Transform::IDENTITY,
            visible: true,
            listening: role != SurfaceRole::Drag,
            shapes: Vec::new(),
            batch_pending: false,
            batch_requests: 0,
            redraws: 0,
        }
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    pub(crate) fn set_role(&mut self, role: SurfaceRole) {
        self.role = role;
    }

    /// Container this surface is attached to, if any.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Claim the surface for `owner`. Returns false when it is already owned.
    pub fn adopt(&mut self, owner: NodeId) -> bool {
        if self.owner.is_some() {
            return false;
        }
        self.owner = Some(owner);
        true
    }

    pub(crate) fn release(&mut self) {
        self.owner = None;
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resize the backing buffer. Content is not preserved across a size change.
    ///
    /// Surfaces take their size from the scene they are added to.
    pub(crate) fn set_pixel_size(&mut self, width: u32, height: u32) -> EaselResult<()> {
        if width == self.width && height == self.height {
            return Ok(());
        }
        let w: u16 = width
            .try_into()
            .map_err(|_| EaselError::validation("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| EaselError::validation("surface height exceeds u16"))?;
        self.pixmap = vello_cpu::Pixmap::new(w, h);
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Scene-to-pixel transform used when painting and hit-testing.
    pub fn view_transform(&self) -> Transform {
        self.view
    }

    pub(crate) fn set_view_transform(&mut self, view: Transform) {
        self.view = view;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    /// Mutable access to shapes without changing their order.
    pub fn shapes_mut(&mut self) -> &mut [Shape] {
        &mut self.shapes
    }

    pub fn shape(&self, id: NodeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    /// Number of repaints performed so far.
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    pub fn is_batch_pending(&self) -> bool {
        self.batch_pending
    }

    /// Current premultiplied RGBA8 pixels, after any pending batched repaint.
    pub fn pixels(&mut self) -> &[u8] {
        self.flush();
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn flushed_pixels(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Front-most visible, listening shape under the pixel-space point `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Shape> {
        if !self.visible || !self.listening {
            return None;
        }
        let inv = self.view.invert().ok()?;
        let p = inv.apply(Point::new(x, y));
        self.shapes
            .iter()
            .rev()
            .find(|s| s.is_visible() && s.is_listening() && s.contains(p))
    }

    /// Encode the current buffer contents.
    pub fn export_pixels(&mut self, format: ExportFormat) -> EaselResult<Vec<u8>> {
        self.flush();
        encode_premul_rgba8(
            self.pixmap.data_as_u8_slice(),
            self.width,
            self.height,
            format,
        )
    }

    /// Run a pixel filter over the rendered buffer (in straight alpha).
    pub fn apply_filter(&mut self, filter: &mut dyn ImageFilter) -> EaselResult<()> {
        self.flush();
        let data = self.pixmap.data_as_u8_slice_mut();
        unpremultiply_in_place(data);
        let res = filter.filter(data);
        premultiply_in_place(data);
        res
    }

    fn repaint(&mut self) {
        fill_in_place(self.pixmap.data_as_u8_slice_mut(), [0, 0, 0, 0]);
        paint_shapes(
            &mut self.pixmap,
            u16::try_from(self.width).unwrap_or(u16::MAX),
            u16::try_from(self.height).unwrap_or(u16::MAX),
            self.view,
            &self.shapes,
            self.settings.tolerance,
        );
        if let Some(clear) = self.settings.clear_rgba {
            underlay_in_place(self.pixmap.data_as_u8_slice_mut(), clear.to_premul());
        }
        self.redraws += 1;
    }
}

impl Node for Surface {
    fn id(&self) -> NodeId {
        self.id
    }
}

impl Paint for Surface {
    fn draw(&mut self) {
        self.batch_pending = false;
        self.batch_requests = 0;
        self.repaint();
    }

    fn batch(&mut self) {
        self.batch_pending = true;
        self.batch_requests += 1;
    }

    fn flush(&mut self) -> usize {
        if !self.batch_pending {
            return 0;
        }
        tracing::debug!(
            surface = self.id.get(),
            coalesced = self.batch_requests,
            "flush batched repaint"
        );
        self.batch_pending = false;
        self.batch_requests = 0;
        self.repaint();
        1
    }
}

impl Container for Surface {
    type Child = Shape;

    fn add(&mut self, child: Shape) -> EaselResult<()> {
        self.shapes.push(child);
        Ok(())
    }

    fn remove(&mut self, id: NodeId) -> Option<Shape> {
        let idx = self.shapes.iter().position(|s| s.id() == id)?;
        Some(self.shapes.remove(idx))
    }

    fn remove_all(&mut self) -> Vec<Shape> {
        std::mem::take(&mut self.shapes)
    }

    fn children(&self) -> &[Shape] {
        &self.shapes
    }

    fn move_up(&mut self, id: NodeId) -> bool {
        reorder(&mut self.shapes, id, Reorder::Up)
    }

    fn move_down(&mut self, id: NodeId) -> bool {
        reorder(&mut self.shapes, id, Reorder::Down)
    }

    fn move_to_top(&mut self, id: NodeId) -> bool {
        reorder(&mut self.shapes, id, Reorder::Top)
    }

    fn move_to_bottom(&mut self, id: NodeId) -> bool {
        reorder(&mut self.shapes, id, Reorder::Bottom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/surface.rs"]
mod tests;

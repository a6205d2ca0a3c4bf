use crate::foundation::core::NodeId;
use crate::foundation::error::{EaselError, EaselResult};
use crate::render::composite::over_in_place;
use crate::scene::node::{Container, Node, Paint, Reorder, reorder};
use crate::scene::shape::Shape;
use crate::scene::surface::Surface;
use crate::transform::affine::Transform;

/// Ordered surfaces sharing one coordinate space and one pixel size.
///
/// Index 0 is the back-most surface. A scene may be owned by at most one
/// container at a time; ownership is a plain id, never a counted pointer.
#[derive(Debug)]
pub struct Scene {
    id: NodeId,
    owner: Option<NodeId>,
    width: u32,
    height: u32,
    visible: bool,
    view: Transform,
    surfaces: Vec<Surface>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            owner: None,
            width: 0,
            height: 0,
            visible: true,
            view: Transform::IDENTITY,
            surfaces: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Claim the scene for `owner`. Returns false when it is already owned.
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

    /// Store the size and propagate it to every surface.
    ///
    /// On an empty scene this only records the size for surfaces added later.
    /// An owned scene is sized by its owner and rejects the call.
    pub fn set_pixel_size(&mut self, width: u32, height: u32) -> EaselResult<()> {
        if let Some(owner) = self.owner {
            return Err(EaselError::validation(format!(
                "scene {} is sized by its owner {owner}",
                self.id
            )));
        }
        self.resize(width, height)
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> EaselResult<()> {
        for surface in &mut self.surfaces {
            surface.set_pixel_size(width, height)?;
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub(crate) fn set_view_transform(&mut self, view: Transform) {
        self.view = view;
        for surface in &mut self.surfaces {
            surface.set_view_transform(view);
        }
    }

    pub fn surface(&self, id: NodeId) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.id() == id)
    }

    pub fn surface_mut(&mut self, id: NodeId) -> Option<&mut Surface> {
        self.surfaces.iter_mut().find(|s| s.id() == id)
    }

    pub fn surfaces_mut(&mut self) -> &mut [Surface] {
        &mut self.surfaces
    }

    /// Front-to-back hit test across surfaces; `(x, y)` is in pixel space.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Shape> {
        if !self.visible {
            return None;
        }
        self.surfaces.iter().rev().find_map(|s| s.hit_test(x, y))
    }

    /// Shapes matching `pred` across all surfaces, in paint order.
    pub fn find<'a>(&'a self, mut pred: impl FnMut(&Shape) -> bool) -> Vec<&'a Shape> {
        self.surfaces
            .iter()
            .flat_map(|s| s.children().iter())
            .filter(|shape| pred(shape))
            .collect()
    }

    /// Source-over every visible surface onto `dst` in paint order.
    pub(crate) fn composite_into(&mut self, dst: &mut [u8]) -> EaselResult<()> {
        if !self.visible {
            return Ok(());
        }
        for surface in &mut self.surfaces {
            surface.flush();
            if !surface.is_visible() {
                continue;
            }
            over_in_place(dst, surface.flushed_pixels(), 1.0)?;
        }
        Ok(())
    }
}

impl Node for Scene {
    fn id(&self) -> NodeId {
        self.id
    }
}

impl Paint for Scene {
    fn draw(&mut self) {
        for surface in &mut self.surfaces {
            surface.draw();
        }
    }

    fn batch(&mut self) {
        for surface in &mut self.surfaces {
            surface.batch();
        }
    }

    fn flush(&mut self) -> usize {
        self.surfaces.iter_mut().map(|s| s.flush()).sum()
    }
}

impl Container for Scene {
    type Child = Surface;

    /// Append a surface on top; it takes the scene's size and view transform.
    fn add(&mut self, mut child: Surface) -> EaselResult<()> {
        if let Some(owner) = child.owner() {
            return Err(EaselError::already_owned(format!(
                "surface {} is owned by {owner}",
                child.id()
            )));
        }
        child.set_pixel_size(self.width, self.height)?;
        child.set_view_transform(self.view);
        child.adopt(self.id);
        self.surfaces.push(child);
        Ok(())
    }

    fn remove(&mut self, id: NodeId) -> Option<Surface> {
        let idx = self.surfaces.iter().position(|s| s.id() == id)?;
        let mut surface = self.surfaces.remove(idx);
        surface.release();
        Some(surface)
    }

    fn remove_all(&mut self) -> Vec<Surface> {
        let mut out = std::mem::take(&mut self.surfaces);
        for surface in &mut out {
            surface.release();
        }
        out
    }

    fn children(&self) -> &[Surface] {
        &self.surfaces
    }

    fn move_up(&mut self, id: NodeId) -> bool {
        reorder(&mut self.surfaces, id, Reorder::Up)
    }

    fn move_down(&mut self, id: NodeId) -> bool {
        reorder(&mut self.surfaces, id, Reorder::Down)
    }

    fn move_to_top(&mut self, id: NodeId) -> bool {
        reorder(&mut self.surfaces, id, Reorder::Top)
    }

    fn move_to_bottom(&mut self, id: NodeId) -> bool {
        reorder(&mut self.surfaces, id, Reorder::Bottom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/scene.rs"]
mod tests;

use kurbo::Shape as _;

use crate::foundation::core::{BezPath, NodeId, Point, Rect, Rgba8};
use crate::foundation::error::{EaselError, EaselResult};
use crate::scene::node::Node;
use crate::transform::affine::Transform;

/// Outline of a [`Shape`] in its local coordinate space.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    /// Axis-aligned rectangle `(0, 0, width, height)`.
    Rect {
        /// Width in local units.
        width: f64,
        /// Height in local units.
        height: f64,
    },
    /// Ellipse inscribed in `(0, 0, 2*rx, 2*ry)`.
    Ellipse {
        /// Horizontal radius.
        rx: f64,
        /// Vertical radius.
        ry: f64,
    },
    /// Arbitrary path, persisted as SVG path data.
    Path {
        /// Outline, filled with the non-zero rule.
        #[serde(with = "svg_path")]
        path: BezPath,
    },
}

mod svg_path {
    use crate::foundation::core::BezPath;

    pub(super) fn serialize<S: serde::Serializer>(path: &BezPath, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&path.to_svg())
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<BezPath, D::Error> {
        let raw = <String as serde::Deserialize>::deserialize(d)?;
        BezPath::from_svg(raw.trim()).map_err(serde::de::Error::custom)
    }
}

fn default_opacity() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

/// A filled drawable that lives on a [`crate::Surface`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    #[serde(skip, default = "NodeId::next")]
    id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    geometry: Geometry,
    fill: Rgba8,
    #[serde(default = "default_opacity")]
    opacity: f32,
    #[serde(default)]
    transform: Transform,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "default_true")]
    listening: bool,
}

impl Shape {
    /// New visible, listening shape with identity transform.
    pub fn new(geometry: Geometry, fill: Rgba8) -> Self {
        Self {
            id: NodeId::next(),
            name: None,
            geometry,
            fill,
            opacity: 1.0,
            transform: Transform::IDENTITY,
            visible: true,
            listening: true,
        }
    }

    /// Rectangle with its top-left corner at `(x, y)`.
    pub fn rect(x: f64, y: f64, width: f64, height: f64, fill: Rgba8) -> Self {
        Self::new(Geometry::Rect { width, height }, fill)
            .with_transform(Transform::translation(x, y))
    }

    /// Circle centered on `(cx, cy)`.
    pub fn circle(cx: f64, cy: f64, radius: f64, fill: Rgba8) -> Self {
        Self::new(
            Geometry::Ellipse {
                rx: radius,
                ry: radius,
            },
            fill,
        )
        .with_transform(Transform::translation(cx - radius, cy - radius))
    }

    /// Path shape from SVG path data.
    pub fn svg_path(d: &str, fill: Rgba8) -> EaselResult<Self> {
        let path = BezPath::from_svg(d.trim())
            .map_err(|e| EaselError::validation(format!("invalid svg path data: {e}")))?;
        Ok(Self::new(Geometry::Path { path }, fill))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_listening(mut self, listening: bool) -> Self {
        self.listening = listening;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn fill(&self) -> Rgba8 {
        self.fill
    }

    pub fn set_fill(&mut self, fill: Rgba8) {
        self.fill = fill;
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
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

    /// Outline as a path in local space; ellipses are flattened to `tolerance`.
    pub fn outline(&self, tolerance: f64) -> BezPath {
        match &self.geometry {
            Geometry::Rect { width, height } => Rect::new(0.0, 0.0, *width, *height).to_path(tolerance),
            Geometry::Ellipse { rx, ry } => {
                kurbo::Ellipse::new((*rx, *ry), (*rx, *ry), 0.0).to_path(tolerance)
            }
            Geometry::Path { path } => path.clone(),
        }
    }

    /// Whether `p`, given in the shape's parent (scene) space, falls inside the outline.
    ///
    /// A shape whose transform cannot be inverted contains nothing.
    pub fn contains(&self, p: Point) -> bool {
        let Ok(inv) = self.transform.invert() else {
            return false;
        };
        let local = inv.apply(p);
        match &self.geometry {
            Geometry::Rect { width, height } => {
                Rect::new(0.0, 0.0, *width, *height).contains(local)
            }
            Geometry::Ellipse { rx, ry } => {
                if *rx <= 0.0 || *ry <= 0.0 {
                    return false;
                }
                let dx = (local.x - rx) / rx;
                let dy = (local.y - ry) / ry;
                dx * dx + dy * dy <= 1.0
            }
            Geometry::Path { path } => path.contains(local),
        }
    }
}

impl Node for Shape {
    fn id(&self) -> NodeId {
        self.id
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/shape.rs"]
mod tests;

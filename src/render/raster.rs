use crate::foundation::core::{Affine, BezPath, Point};
use crate::scene::shape::Shape;
use crate::transform::affine::Transform;

/// Paint `shapes` in order under `view` into `pixmap`, replacing its contents.
pub(crate) fn paint_shapes(
    pixmap: &mut vello_cpu::Pixmap,
    width: u16,
    height: u16,
    view: Transform,
    shapes: &[Shape],
    tolerance: f64,
) {
    if width == 0 || height == 0 {
        return;
    }
    let mut ctx = vello_cpu::RenderContext::new(width, height);

    for shape in shapes.iter().filter(|s| s.is_visible()) {
        let opacity = shape.opacity().clamp(0.0, 1.0);
        if opacity <= 0.0 || shape.fill().a == 0 {
            continue;
        }
        let c = shape.fill();

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(shape.transform().compose(view).as_affine()));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_path(&bezpath_to_cpu(&shape.outline(tolerance)));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
    }

    ctx.flush();
    ctx.render_to_pixmap(pixmap);
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

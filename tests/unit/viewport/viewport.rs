use super::*;
use crate::foundation::core::Rgba8;
use crate::scene::surface::RenderSettings;
use crate::viewport::mediator::PointerKind;
use std::cell::RefCell;
use std::rc::Rc;

fn layer_with(shape: Shape) -> Surface {
    let mut s = Surface::new();
    s.add(shape).unwrap();
    s
}

#[test]
fn construction_fixes_three_owned_scenes() {
    let vp = Viewport::new(20, 10).unwrap();
    let scenes = vp.scenes();
    assert_eq!(scenes.len(), 3);
    for scene in scenes {
        assert_eq!(scene.owner(), Some(vp.id()));
        assert_eq!((scene.width(), scene.height()), (20, 10));
    }
    assert_eq!(vp.transform(), Transform::IDENTITY);
    assert_eq!(vp.drag_layer().role(), SurfaceRole::Drag);
    assert_eq!(vp.over_layer().role(), SurfaceRole::Overlay);
    assert!(vp.background_layer().is_none());
}

#[test]
fn add_is_always_rejected() {
    let mut vp = Viewport::new(4, 4).unwrap();
    let err = vp.add(Scene::new()).unwrap_err();
    assert!(matches!(err, EaselError::TooManyScenes(_)));

    let mut owned = Scene::new();
    owned.adopt(NodeId::next());
    let err = vp.add(owned).unwrap_err();
    assert!(matches!(err, EaselError::AlreadyOwned(_)));

    assert_eq!(vp.scenes().len(), 3);
    assert!(vp.scene().is_empty());
}

#[test]
fn with_scene_rejects_owned_scene() {
    let mut main = Scene::new();
    main.adopt(NodeId::next());
    let err = Viewport::with_scene(main, 4, 4).unwrap_err();
    assert!(matches!(err, EaselError::AlreadyOwned(_)));
}

#[test]
fn with_scene_installs_main() {
    let mut main = Scene::new();
    main.add(Surface::new()).unwrap();
    let id = main.id();
    let vp = Viewport::with_scene(main, 8, 8).unwrap();
    assert_eq!(vp.scene().id(), id);
    assert_eq!(vp.scene().children()[0].width(), 8);
}

#[test]
fn set_pixel_size_propagates_and_notifies() {
    let mut vp = Viewport::new(4, 4).unwrap();
    vp.scene_mut().add(Surface::new()).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    vp.add_resize_handler(move |e| sink.borrow_mut().push(*e));

    vp.set_pixel_size(30, 20).unwrap();
    assert_eq!((vp.width(), vp.height()), (30, 20));
    assert_eq!(vp.scene().children()[0].width(), 30);
    assert_eq!(vp.drag_layer().height(), 20);
    assert_eq!(
        *seen.borrow(),
        vec![ViewportEvent::Resized {
            width: 30,
            height: 20
        }]
    );

    let err = vp.set_pixel_size(100_000, 1).unwrap_err();
    assert!(matches!(err, EaselError::Validation(_)));
    assert_eq!(vp.width(), 30);
}

#[test]
fn set_transform_propagates_and_notifies_until_removed() {
    let mut vp = Viewport::new(4, 4).unwrap();
    vp.scene_mut().add(Surface::new()).unwrap();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let reg = vp.add_transform_changed_handler(move |e| {
        assert!(matches!(e, ViewportEvent::TransformChanged(_)));
        *sink.borrow_mut() += 1;
    });

    let t = Transform::scaling(2.0, 2.0);
    vp.set_transform(t);
    assert_eq!(vp.scene().children()[0].view_transform(), t);
    assert_eq!(vp.over_layer().view_transform(), t);
    assert_eq!(*count.borrow(), 1);

    assert!(vp.remove_handler(reg));
    assert!(!vp.remove_handler(reg));
    vp.set_transform(Transform::IDENTITY);
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn view_local_area_fits_and_ignores_degenerate() {
    let mut vp = Viewport::new(200, 100).unwrap();
    assert!(vp.view_local_area(0.0, 0.0, 50.0, 50.0));
    let t = vp.transform();
    let (x0, y0) = t.apply_xy(0.0, 0.0);
    let (x1, y1) = t.apply_xy(50.0, 50.0);
    assert!((y1 - y0 - 100.0).abs() < 1e-9);
    assert!((x0 - 50.0).abs() < 1e-9);
    assert!((x1 - 150.0).abs() < 1e-9);

    assert!(!vp.view_local_area(0.0, 0.0, 0.0, 10.0));
    assert_eq!(vp.transform(), t);
}

#[test]
fn view_global_area_matches_local_under_identity() {
    let mut a = Viewport::new(100, 100).unwrap();
    let mut b = Viewport::new(100, 100).unwrap();
    a.view_global_area(10.0, 20.0, 40.0, 40.0);
    b.view_local_area(10.0, 20.0, 40.0, 40.0);
    assert!(a.transform().approx_eq(b.transform(), 1e-12));
}

#[test]
fn view_global_area_maps_pixels_through_inverse() {
    let mut vp = Viewport::new(100, 100).unwrap();
    vp.set_transform(Transform::scaling(2.0, 2.0));
    // pixel rect (0,0,100,100) is scene rect (0,0,50,50)
    assert!(vp.view_global_area(0.0, 0.0, 100.0, 100.0));
    assert!(vp.transform().approx_eq(Transform::scaling(2.0, 2.0), 1e-12));
}

#[test]
fn view_global_area_singular_falls_back_to_pixel_space() {
    let mut vp = Viewport::new(100, 100).unwrap();
    vp.set_transform(Transform::scaling(0.0, 0.0));
    assert!(vp.view_global_area(0.0, 0.0, 50.0, 50.0));
    assert!(vp.transform().approx_eq(Transform::scaling(2.0, 2.0), 1e-12));
}

#[test]
fn find_shape_at_point_respects_visibility_and_transform() {
    let mut vp = Viewport::new(100, 100).unwrap();
    let shape = Shape::rect(0.0, 0.0, 10.0, 10.0, Rgba8::WHITE);
    let id = shape.id();
    vp.scene_mut().add(layer_with(shape)).unwrap();

    assert_eq!(vp.find_shape_at_point(5.0, 5.0).map(Shape::id), Some(id));
    assert!(vp.find_shape_at_point(50.0, 50.0).is_none());

    vp.set_transform(Transform::scaling(10.0, 10.0));
    assert_eq!(vp.find_shape_at_point(50.0, 50.0).map(Shape::id), Some(id));

    vp.set_visible(false);
    assert!(vp.find_shape_at_point(50.0, 50.0).is_none());
}

#[test]
fn drag_layer_content_is_never_hit() {
    let mut vp = Viewport::new(10, 10).unwrap();
    vp.drag_layer_mut()
        .add(Shape::rect(0.0, 0.0, 10.0, 10.0, Rgba8::WHITE))
        .unwrap();
    assert!(vp.find_shape_at_point(5.0, 5.0).is_none());
}

struct Zoom;

impl Mediator for Zoom {
    fn handle(&mut self, event: &PointerEvent, ctx: &mut MediatorContext) -> Dispatch {
        match event.kind {
            PointerKind::Wheel { delta } => {
                let factor = if delta > 0.0 { 2.0 } else { 0.5 };
                let t = ctx.transform().then_scale_about(factor, event.x, event.y);
                ctx.set_transform(t);
                Dispatch::Consumed
            }
            _ => Dispatch::Declined,
        }
    }
}

#[test]
fn dispatch_goes_through_mediators_then_hit_test() {
    let mut vp = Viewport::new(100, 100).unwrap();
    let shape = Shape::rect(0.0, 0.0, 10.0, 10.0, Rgba8::WHITE);
    let id = shape.id();
    vp.scene_mut().add(layer_with(shape)).unwrap();
    vp.push_mediator(Zoom);
    let changes = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&changes);
    vp.add_transform_changed_handler(move |_| *sink.borrow_mut() += 1);

    let down = PointerEvent::new(PointerKind::Down, 5.0, 5.0);
    assert_eq!(vp.dispatch(down), InputOutcome::Hit(id));

    let miss = PointerEvent::new(PointerKind::Down, 15.0, 15.0);
    assert_eq!(vp.dispatch(miss), InputOutcome::Missed);

    let wheel = PointerEvent::new(PointerKind::Wheel { delta: 1.0 }, 0.0, 0.0);
    assert_eq!(vp.dispatch(wheel), InputOutcome::Mediated);
    assert!(vp.transform().approx_eq(Transform::scaling(2.0, 2.0), 1e-12));
    assert_eq!(*changes.borrow(), 1);

    assert_eq!(vp.dispatch(miss), InputOutcome::Hit(id));
}

#[test]
fn batch_five_times_repaints_each_surface_once() {
    let mut vp = Viewport::new(4, 4).unwrap();
    vp.scene_mut().add(Surface::new()).unwrap();
    vp.set_background_layer(Surface::new()).unwrap();
    for _ in 0..5 {
        vp.batch();
    }
    // background, main layer, drag layer, overlay
    assert_eq!(vp.flush(), 4);
    assert_eq!(vp.flush(), 0);
    assert_eq!(vp.scene().children()[0].redraw_count(), 1);
    assert_eq!(vp.drag_layer().redraw_count(), 1);
}

#[test]
fn set_background_layer_replaces_previous() {
    let mut vp = Viewport::new(4, 4).unwrap();
    vp.set_background_layer(Surface::new()).unwrap();
    let second = Surface::new();
    let id = second.id();
    vp.set_background_layer(second).unwrap();
    assert_eq!(vp.scenes()[0].len(), 1);
    assert_eq!(vp.background_layer().map(Surface::id), Some(id));
    assert_eq!(vp.background_layer().unwrap().width(), 4);
    assert_eq!(
        vp.background_layer().map(Surface::role),
        Some(SurfaceRole::Background)
    );
}

#[test]
fn main_scene_size_follows_the_viewport() {
    let mut vp = Viewport::new(8, 8).unwrap();
    vp.scene_mut()
        .add(layer_with(Shape::rect(0.0, 0.0, 8.0, 8.0, Rgba8::WHITE)))
        .unwrap();

    let err = vp.scene_mut().set_pixel_size(4, 4).unwrap_err();
    assert!(matches!(err, EaselError::Validation(_)));
    assert_eq!((vp.scene().width(), vp.scene().height()), (8, 8));
    let layer = &vp.scene().children()[0];
    assert_eq!((layer.width(), layer.height()), (8, 8));

    vp.draw();
    let png = vp.export_image(ExportFormat::Png, false).unwrap();
    assert!(!png.is_empty());

    vp.set_pixel_size(4, 4).unwrap();
    for scene in vp.scenes() {
        assert_eq!((scene.width(), scene.height()), (4, 4));
    }
    assert!(vp.export_image(ExportFormat::Png, true).is_ok());
}

#[test]
fn remove_all_clears_main_scene_only() {
    let mut vp = Viewport::new(4, 4).unwrap();
    vp.scene_mut().add(Surface::new()).unwrap();
    vp.scene_mut().add(Surface::new()).unwrap();
    let removed = vp.remove_all();
    assert_eq!(removed.len(), 2);
    assert!(vp.scene().is_empty());
    assert_eq!(vp.scenes()[2].len(), 2);
}

fn decode(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

#[test]
fn export_excludes_drag_and_optionally_background() {
    let mut vp = Viewport::new(4, 2).unwrap();
    vp.scene_mut()
        .add(layer_with(Shape::rect(0.0, 0.0, 2.0, 2.0, Rgba8::new(255, 0, 0, 255))))
        .unwrap();
    vp.set_background_layer(Surface::new().with_settings(RenderSettings {
        clear_rgba: Some(Rgba8::new(0, 0, 255, 255)),
        ..RenderSettings::default()
    }))
    .unwrap();
    vp.drag_layer_mut()
        .add(Shape::rect(0.0, 0.0, 4.0, 2.0, Rgba8::WHITE))
        .unwrap();
    vp.batch();

    let plain = decode(&vp.export_image(ExportFormat::Png, false).unwrap());
    assert_eq!(plain.dimensions(), (4, 2));
    assert_eq!(plain.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(plain.get_pixel(3, 1).0[3], 0);

    let with_bg = decode(&vp.export_image(ExportFormat::Png, true).unwrap());
    assert_eq!(with_bg.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(with_bg.get_pixel(3, 1).0, [0, 0, 255, 255]);
}

#[test]
fn record_holds_main_scene_only() {
    let mut vp = Viewport::new(10, 5).unwrap();
    vp.scene_mut().add(Surface::new()).unwrap();
    vp.set_background_layer(Surface::new()).unwrap();
    vp.set_transform(Transform::translation(3.0, 4.0));
    vp.meta_mut().insert("title".into(), Value::from("demo"));

    let rec = vp.to_record();
    assert_eq!(rec.kind, NodeKind::Viewport);
    assert_eq!(rec.children.len(), 1);
    assert_eq!(rec.children[0].kind, NodeKind::Scene);
    assert_eq!(rec.storage, Some(serde_json::json!({"type": "viewport"})));
    assert_eq!(
        rec.attributes["transform"],
        serde_json::json!([1.0, 0.0, 0.0, 1.0, 3.0, 4.0])
    );

    let back = Viewport::try_from_record(&rec).unwrap();
    assert_eq!(back.transform(), Transform::translation(3.0, 4.0));
    assert_eq!((back.width(), back.height()), (10, 5));
    assert_eq!(back.scene().len(), 1);
    assert!(back.background_layer().is_none());
    assert_eq!(back.meta()["title"], "demo");
    assert_eq!(back.drag_layer().role(), SurfaceRole::Drag);
}

#[test]
fn from_record_collects_structural_issues() {
    let mut rec = Viewport::new(4, 4).unwrap().to_record();
    rec.attributes.remove("transform");
    rec.children.push(Scene::new().to_record());
    rec.children.push(NodeRecord::new(NodeKind::Layer));

    let mut ctx = ValidationContext::new();
    let vp = Viewport::from_record(&rec, &mut ctx).unwrap();
    assert_eq!(vp.transform(), Transform::IDENTITY);

    let kinds: Vec<_> = ctx
        .issues()
        .iter()
        .map(|i| match i.error {
            EaselError::Validation(_) => "validation",
            EaselError::TooManyScenes(_) => "too_many",
            EaselError::TypeMismatch(_) => "mismatch",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["validation", "too_many", "mismatch"]);

    let Err(EaselError::InvalidRecord(issues)) = ctx.into_result() else {
        panic!("several issues should stay typed");
    };
    assert_eq!(issues.len(), 3);
    assert!(
        issues
            .iter()
            .any(|i| matches!(i.error, EaselError::TooManyScenes(_)))
    );
}

#[test]
fn from_record_rejects_wrong_root() {
    let rec = Scene::new().to_record();
    let mut ctx = ValidationContext::new();
    assert!(Viewport::from_record(&rec, &mut ctx).is_none());
    assert!(matches!(
        Viewport::try_from_record(&rec),
        Err(EaselError::TypeMismatch(_))
    ));
}

#[test]
fn json_round_trip() {
    let mut vp = Viewport::new(6, 6).unwrap();
    vp.scene_mut()
        .add(layer_with(Shape::circle(3.0, 3.0, 2.0, Rgba8::BLACK)))
        .unwrap();
    let json = vp.to_json().unwrap();
    let back = Viewport::from_json(&json).unwrap();
    assert_eq!(back.find_shapes(|_| true).len(), 1);
    assert!(matches!(
        Viewport::from_json("{"),
        Err(EaselError::Serde(_))
    ));
}

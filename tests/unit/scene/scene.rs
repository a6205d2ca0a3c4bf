use super::*;
use crate::foundation::core::Rgba8;

fn surface_with(shape: Shape) -> Surface {
    let mut s = Surface::new();
    s.add(shape).unwrap();
    s
}

#[test]
fn add_propagates_size_and_claims_surface() {
    let mut scene = Scene::new();
    scene.set_pixel_size(8, 6).unwrap();

    scene.add(Surface::new()).unwrap();
    let s = &scene.children()[0];
    assert_eq!((s.width(), s.height()), (8, 6));
    assert_eq!(s.owner(), Some(scene.id()));
}

#[test]
fn add_rejects_owned_surface() {
    let mut scene = Scene::new();
    let mut surface = Surface::new();
    assert!(surface.adopt(NodeId::next()));

    let err = scene.add(surface).unwrap_err();
    assert!(matches!(err, EaselError::AlreadyOwned(_)));
    assert!(scene.is_empty());
}

#[test]
fn set_pixel_size_on_empty_scene_applies_to_later_surfaces() {
    let mut scene = Scene::new();
    scene.set_pixel_size(4, 4).unwrap();
    scene.set_pixel_size(4, 4).unwrap();
    scene.add(Surface::new()).unwrap();
    scene.add(Surface::new()).unwrap();
    scene.set_pixel_size(2, 3).unwrap();
    for s in scene.children() {
        assert_eq!((s.width(), s.height()), (2, 3));
    }
}

#[test]
fn owned_scene_rejects_direct_resize() {
    let mut scene = Scene::new();
    scene.set_pixel_size(8, 8).unwrap();
    scene.add(Surface::new()).unwrap();
    assert!(scene.adopt(NodeId::next()));

    let err = scene.set_pixel_size(3, 3).unwrap_err();
    assert!(matches!(err, EaselError::Validation(_)));
    assert_eq!((scene.width(), scene.height()), (8, 8));
    let s = &scene.surfaces_mut()[0];
    assert_eq!((s.width(), s.height()), (8, 8));

    scene.resize(3, 3).unwrap();
    assert_eq!((scene.children()[0].width(), scene.children()[0].height()), (3, 3));
}

#[test]
fn remove_all_releases_every_surface() {
    let mut scene = Scene::new();
    scene.add(Surface::new()).unwrap();
    scene.add(Surface::new()).unwrap();

    let detached = scene.remove_all();
    assert_eq!(detached.len(), 2);
    assert!(detached.iter().all(|s| s.owner().is_none()));
    assert!(scene.is_empty());

    // detached surfaces can be attached again
    let mut other = Scene::new();
    for s in detached {
        other.add(s).unwrap();
    }
    assert_eq!(other.len(), 2);
}

#[test]
fn hit_test_walks_surfaces_front_to_back() {
    let mut scene = Scene::new();
    scene.set_pixel_size(10, 10).unwrap();
    let back = Shape::rect(0.0, 0.0, 10.0, 10.0, Rgba8::WHITE);
    let front = Shape::rect(0.0, 0.0, 5.0, 5.0, Rgba8::BLACK);
    let (back_id, front_id) = (back.id(), front.id());
    scene.add(surface_with(back)).unwrap();
    scene.add(surface_with(front)).unwrap();

    assert_eq!(scene.hit_test(1.0, 1.0).map(Shape::id), Some(front_id));
    assert_eq!(scene.hit_test(7.0, 7.0).map(Shape::id), Some(back_id));

    scene.set_visible(false);
    assert!(scene.hit_test(1.0, 1.0).is_none());
}

#[test]
fn draw_and_batch_fan_out() {
    let mut scene = Scene::new();
    scene.set_pixel_size(2, 2).unwrap();
    scene.add(Surface::new()).unwrap();
    scene.add(Surface::new()).unwrap();

    scene.draw();
    assert!(scene.children().iter().all(|s| s.redraw_count() == 1));

    for _ in 0..3 {
        scene.batch();
    }
    assert_eq!(scene.flush(), 2);
    assert!(scene.children().iter().all(|s| s.redraw_count() == 2));
}

#[test]
fn composite_stacks_visible_surfaces() {
    let mut scene = Scene::new();
    scene.set_pixel_size(2, 1).unwrap();
    scene
        .add(surface_with(Shape::rect(0.0, 0.0, 2.0, 1.0, Rgba8::new(255, 0, 0, 255))))
        .unwrap();
    let mut hidden = surface_with(Shape::rect(0.0, 0.0, 2.0, 1.0, Rgba8::WHITE));
    hidden.set_visible(false);
    scene.add(hidden).unwrap();
    scene
        .add(surface_with(Shape::rect(1.0, 0.0, 1.0, 1.0, Rgba8::new(0, 0, 255, 255))))
        .unwrap();

    scene.batch();
    let mut dst = vec![0u8; 8];
    scene.composite_into(&mut dst).unwrap();
    assert_eq!(dst, vec![255, 0, 0, 255, 0, 0, 255, 255]);
}

#[test]
fn find_collects_matching_shapes_in_paint_order() {
    let mut scene = Scene::new();
    scene
        .add(surface_with(
            Shape::rect(0.0, 0.0, 1.0, 1.0, Rgba8::WHITE).with_name("a"),
        ))
        .unwrap();
    scene
        .add(surface_with(
            Shape::rect(0.0, 0.0, 1.0, 1.0, Rgba8::BLACK).with_name("b"),
        ))
        .unwrap();

    let all = scene.find(|_| true);
    let names: Vec<_> = all.iter().filter_map(|s| s.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(scene.find(|s| s.fill() == Rgba8::BLACK).len(), 1);
}

#[test]
fn reorder_surfaces() {
    let mut scene = Scene::new();
    let a = Surface::new();
    let b = Surface::new();
    let (ida, idb) = (a.id(), b.id());
    scene.add(a).unwrap();
    scene.add(b).unwrap();

    assert!(scene.move_down(idb));
    let order: Vec<_> = scene.children().iter().map(Surface::id).collect();
    assert_eq!(order, vec![idb, ida]);
    assert!(!scene.move_to_bottom(idb));

    let removed = scene.remove(ida).unwrap();
    assert!(removed.owner().is_none());
}

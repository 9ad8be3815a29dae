use super::*;
use std::sync::Mutex;

const RED: [u8; 4] = [255, 0, 0, 255];

fn placement(mode: ResizeMode, base: Point, ox: OriginX, oy: OriginY) -> LayerPlacement {
    let plan = ResizePlan::compute(16, 9, 32, 32, mode).unwrap();
    LayerPlacement::new(plan, base, ox, oy, None)
}

fn frame(p: &LayerPlacement, px: [u8; 4]) -> Vec<u8> {
    let plan = p.plan();
    px.repeat((plan.target_width * plan.target_height) as usize)
}

fn painted_rows(canvas: &Canvas) -> Vec<u32> {
    (0..canvas.height())
        .filter(|&y| (0..canvas.width()).any(|x| canvas.pixel(x, y).unwrap()[3] != 0))
        .collect()
}

#[test]
fn contain_frame_is_centered_in_its_box() {
    let p = placement(ResizeMode::Contain, Point::ZERO, OriginX::Left, OriginY::Top);
    assert_eq!((p.plan().target_width, p.plan().target_height), (32, 18));

    let mut canvas = Canvas::new(32, 32).unwrap();
    p.place(frame(&p, RED), &mut canvas, 0.0, 0.0).unwrap();
    assert_eq!(painted_rows(&canvas), (7..25).collect::<Vec<_>>());
    assert_eq!(canvas.pixel(0, 7), Some(RED));
}

#[test]
fn bottom_right_anchor_flips_the_offset() {
    let p = placement(
        ResizeMode::Contain,
        Point::new(32.0, 32.0),
        OriginX::Right,
        OriginY::Bottom,
    );
    let mut canvas = Canvas::new(32, 32).unwrap();
    p.place(frame(&p, RED), &mut canvas, 0.0, 0.0).unwrap();
    assert_eq!(painted_rows(&canvas), (7..25).collect::<Vec<_>>());
}

#[test]
fn contain_blur_fills_the_whole_box_underneath() {
    let p = placement(ResizeMode::ContainBlur, Point::ZERO, OriginX::Left, OriginY::Top);
    let mut canvas = Canvas::new(32, 32).unwrap();
    p.place(frame(&p, RED), &mut canvas, 0.0, 0.0).unwrap();
    assert_eq!(painted_rows(&canvas).len(), 32);
    assert_eq!(canvas.pixel(16, 16), Some(RED));
    assert_eq!(canvas.pixel(0, 0), Some(RED));
}

#[test]
fn cover_and_stretch_fill_the_box_without_offset() {
    for mode in [ResizeMode::Cover, ResizeMode::Stretch] {
        let p = placement(mode, Point::ZERO, OriginX::Left, OriginY::Top);
        let mut canvas = Canvas::new(40, 40).unwrap();
        p.place(frame(&p, RED), &mut canvas, 0.0, 0.0).unwrap();
        assert_eq!(painted_rows(&canvas), (0..32).collect::<Vec<_>>());
    }
}

#[test]
fn wrong_frame_length_is_an_integrity_violation() {
    let p = placement(ResizeMode::Contain, Point::ZERO, OriginX::Left, OriginY::Top);
    let mut canvas = Canvas::new(32, 32).unwrap();
    let err = p.place(vec![0u8; 100], &mut canvas, 0.0, 0.0).unwrap_err();
    assert!(matches!(err, WavyteError::Integrity(_)), "{err}");
    assert!(canvas.is_blank());
}

#[test]
fn hook_sees_progress_and_can_change_drawing_parameters() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_hook = seen.clone();
    let hook = ImageHook::new(move |img, canvas, progress, time| {
        seen_in_hook
            .lock()
            .unwrap()
            .push((progress, time, canvas.is_blank()));
        img.left += 100.0;
    });
    let plan = ResizePlan::compute(16, 9, 32, 32, ResizeMode::ContainBlur).unwrap();
    let p = LayerPlacement::new(plan, Point::ZERO, OriginX::Left, OriginY::Top, Some(hook));

    let mut canvas = Canvas::new(32, 32).unwrap();
    p.place(frame(&p, [0, 255, 0, 255]), &mut canvas, 0.25, 1.5).unwrap();

    // The background was already painted when the hook ran; the moved image is off-canvas.
    assert_eq!(*seen.lock().unwrap(), vec![(0.25, 1.5, false)]);
    assert_eq!(painted_rows(&canvas).len(), 32);
}

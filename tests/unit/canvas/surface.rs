use super::*;

fn solid(width: u32, height: u32, px: [u8; 4]) -> PlacedImage {
    PlacedImage::from_rgba(width, height, px.repeat((width * height) as usize)).unwrap()
}

fn painted(canvas: &Canvas) -> usize {
    (0..canvas.height())
        .flat_map(|y| (0..canvas.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| canvas.pixel(x, y).unwrap()[3] != 0)
        .count()
}

#[test]
fn new_canvas_is_blank_and_serializes_to_zeroes() {
    let canvas = Canvas::new(3, 2).unwrap();
    assert!(canvas.is_blank());
    let frame = canvas.into_raw_frame();
    assert_eq!((frame.width, frame.height), (3, 2));
    assert_eq!(frame.data, vec![0u8; 24]);
    assert!(Canvas::new(0, 2).is_err());
}

#[test]
fn image_is_placed_at_its_top_left_anchor() {
    let mut canvas = Canvas::new(8, 8).unwrap();
    let mut img = solid(2, 3, [255, 0, 0, 255]);
    img.left = 4.0;
    img.top = 1.0;
    canvas.add(&img).unwrap();
    assert_eq!(painted(&canvas), 6);
    assert_eq!(canvas.pixel(4, 1), Some([255, 0, 0, 255]));
    assert_eq!(canvas.pixel(5, 3), Some([255, 0, 0, 255]));
    assert_eq!(canvas.pixel(6, 1), Some([0, 0, 0, 0]));
    assert_eq!(canvas.pixel(4, 4), Some([0, 0, 0, 0]));
}

#[test]
fn right_bottom_anchor_places_image_before_the_point() {
    let mut canvas = Canvas::new(8, 8).unwrap();
    let mut img = solid(2, 2, [0, 255, 0, 255]);
    img.left = 8.0;
    img.top = 8.0;
    img.origin_x = OriginX::Right;
    img.origin_y = OriginY::Bottom;
    canvas.add(&img).unwrap();
    assert_eq!(painted(&canvas), 4);
    assert_eq!(canvas.pixel(7, 7), Some([0, 255, 0, 255]));
    assert_eq!(canvas.pixel(6, 6), Some([0, 255, 0, 255]));
}

#[test]
fn scaled_image_covers_scaled_area_and_is_clipped() {
    let mut canvas = Canvas::new(10, 10).unwrap();
    let mut img = solid(2, 2, [0, 0, 255, 255]);
    img.left = 6.0;
    img.scale_x = 3.0;
    img.scale_y = 2.0;
    canvas.add(&img).unwrap();
    // 6 columns requested, 4 inside the canvas; 4 rows.
    assert_eq!(painted(&canvas), 4 * 4);
}

#[test]
fn later_images_paint_over_earlier_ones() {
    let mut canvas = Canvas::new(2, 1).unwrap();
    canvas.add(&solid(2, 1, [255, 0, 0, 255])).unwrap();
    let mut top = solid(1, 1, [0, 0, 255, 255]);
    top.left = 1.0;
    canvas.add(&top).unwrap();
    let frame = canvas.into_raw_frame();
    assert_eq!(frame.data, vec![255, 0, 0, 255, 0, 0, 255, 255]);
}

#[test]
fn zero_opacity_draws_nothing() {
    let mut canvas = Canvas::new(4, 4).unwrap();
    let mut img = solid(4, 4, [1, 2, 3, 255]);
    img.opacity = 0.0;
    canvas.add(&img).unwrap();
    assert!(canvas.is_blank());
}

#[test]
fn translucent_pixels_round_trip_through_serialization() {
    let mut canvas = Canvas::new(1, 1).unwrap();
    canvas.add(&solid(1, 1, [200, 100, 50, 128])).unwrap();
    let frame = canvas.into_raw_frame();
    assert!((i32::from(frame.data[3]) - 128).abs() <= 1);
    for (got, want) in frame.data[..3].iter().zip([200u8, 100, 50]) {
        assert!((i32::from(*got) - i32::from(want)).abs() <= 3);
    }
}

#[test]
fn fill_rect_paints_only_covered_pixels() {
    let mut canvas = Canvas::new(4, 4).unwrap();
    canvas.fill_rect(Rect::new(1.0, 1.0, 3.0, 2.0), [10, 20, 30, 255]).unwrap();
    assert_eq!(painted(&canvas), 2);
    canvas.fill([0, 0, 0, 255]).unwrap();
    assert_eq!(painted(&canvas), 16);
}

#[test]
fn wrong_length_image_is_an_integrity_violation() {
    let err = PlacedImage::from_rgba(2, 2, vec![0; 15]).unwrap_err();
    assert!(matches!(err, WavyteError::Integrity(_)));
}

#[test]
fn half_opacity_image_blends_with_what_is_below() {
    let mut canvas = Canvas::new(2, 2).unwrap();
    canvas.fill([0, 0, 0, 255]).unwrap();
    let mut img = solid(2, 2, [255, 255, 255, 255]);
    img.opacity = 0.5;
    canvas.add(&img).unwrap();
    let [r, g, b, a] = canvas.pixel(1, 1).unwrap();
    assert_eq!(a, 255);
    for c in [r, g, b] {
        assert!((i32::from(c) - 128).abs() <= 2, "{c}");
    }
}

#[test]
fn fractional_edges_are_antialiased() {
    let mut canvas = Canvas::new(4, 1).unwrap();
    canvas.fill_rect(Rect::new(0.0, 0.0, 1.5, 1.0), [255, 255, 255, 255]).unwrap();
    assert_eq!(canvas.pixel(0, 0).unwrap()[3], 255);
    let edge = canvas.pixel(1, 0).unwrap()[3];
    assert!((100..156).contains(&edge), "{edge}");
    assert_eq!(canvas.pixel(2, 0).unwrap()[3], 0);
}

#[test]
fn oversized_canvas_is_rejected() {
    let err = Canvas::new(70_000, 2).unwrap_err();
    assert!(matches!(err, WavyteError::Validation(_)));
}

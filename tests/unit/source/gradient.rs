use super::*;

#[test]
fn returns_a_full_canvas_raw_frame() {
    let mut source = LinearGradientSource::new(4, 3, [Color::BLACK, Color::WHITE]).unwrap();
    let mut canvas = Canvas::new(4, 3).unwrap();
    let FrameOutput::Raw(frame) = source.read_next_frame(0.0, &mut canvas, 0.0).unwrap() else {
        panic!("expected a raw frame");
    };
    assert!(canvas.is_blank());
    assert_eq!((frame.width, frame.height), (4, 3));
    assert_eq!(frame.data.len(), 4 * 3 * 4);
    assert_eq!(&frame.data[..4], &[0, 0, 0, 255]);
    assert_eq!(&frame.data[frame.data.len() - 4..], &[255, 255, 255, 255]);
}

#[test]
fn single_pixel_uses_the_start_color() {
    let red = Color([255, 0, 0, 255]);
    let source = LinearGradientSource::new(1, 1, [red, Color::WHITE]).unwrap();
    assert_eq!(source.frame.data, vec![255, 0, 0, 255]);
}

#[test]
fn zero_size_is_rejected() {
    assert!(LinearGradientSource::new(0, 3, [Color::BLACK, Color::WHITE]).is_err());
}

#[test]
fn colors_param_accepts_hex_pairs() {
    let p: GradientParams = serde_json::from_str(r##"{"colors":["#000","#fff"]}"##).unwrap();
    assert_eq!(p.colors, [Color::BLACK, Color::WHITE]);
    let p: GradientParams = serde_json::from_str("{}").unwrap();
    assert_eq!(p.colors, [Color::BLACK, Color::WHITE]);
}

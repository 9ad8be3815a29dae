use super::*;

#[test]
fn paints_every_pixel() {
    let mut source = FillColorSource::new(Color([0, 128, 0, 255]));
    let mut canvas = Canvas::new(3, 2).unwrap();
    let out = source.read_next_frame(0.0, &mut canvas, 0.0).unwrap();
    assert_eq!(out, FrameOutput::DrawnToCanvas);
    for y in 0..2 {
        for x in 0..3 {
            assert_eq!(canvas.pixel(x, y), Some([0, 128, 0, 255]));
        }
    }
}

#[test]
fn translucent_fill_blends_over_existing_pixels() {
    let mut source = FillColorSource::new(Color([255, 255, 255, 0]));
    let mut canvas = Canvas::new(1, 1).unwrap();
    canvas.fill([10, 20, 30, 255]).unwrap();
    source.read_next_frame(0.0, &mut canvas, 0.0).unwrap();
    assert_eq!(canvas.pixel(0, 0), Some([10, 20, 30, 255]));
}

#[test]
fn color_param_defaults_to_black() {
    let p: FillParams = serde_json::from_str("{}").unwrap();
    assert_eq!(p.color, Color::BLACK);
    let p: FillParams = serde_json::from_str(r##"{"color":"#ff0000"}"##).unwrap();
    assert_eq!(p.color, Color([255, 0, 0, 255]));
}

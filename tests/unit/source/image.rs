use super::*;
use std::time::Duration;

use crate::foundation::core::Fps;
use crate::foundation::error::WavyteError;
use crate::media::decoder::DecoderOpts;
use crate::scene::clip::Layer;

fn write_png(dir: &Path, name: &str, w: u32, h: u32, px: [u8; 4]) -> PathBuf {
    let img = RgbaImage::from_pixel(w, h, image::Rgba(px));
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

fn build(layer: &Layer) -> WavyteResult<Box<dyn FrameSource>> {
    let decoder = DecoderOpts::default();
    create(&SourceContext {
        width: 32,
        height: 32,
        duration: 1.0,
        channels: 4,
        fps: Fps::new(10, 1).unwrap(),
        layer,
        decoder: &decoder,
        frame_timeout: Duration::from_secs(1),
        log_times: false,
    })
}

#[test]
fn cover_image_fills_its_box() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "wide.png", 4, 2, [10, 20, 30, 255]);
    let layer = Layer::new("image")
        .with_param("path", path.to_string_lossy().as_ref())
        .with_param("resizeMode", "cover");
    let mut source = build(&layer).unwrap();

    let mut canvas = Canvas::new(32, 32).unwrap();
    assert_eq!(
        source.read_next_frame(0.0, &mut canvas, 0.0).unwrap(),
        FrameOutput::DrawnToCanvas
    );
    assert_eq!(canvas.pixel(0, 0), Some([10, 20, 30, 255]));
    assert_eq!(canvas.pixel(31, 31), Some([10, 20, 30, 255]));
}

#[test]
fn contain_image_is_drawn_on_every_pull() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "wide.png", 4, 2, [200, 0, 0, 255]);
    let layer = Layer::new("image")
        .with_param("path", path.to_string_lossy().as_ref())
        .with_param("resizeMode", "contain")
        .with_param("originY", "center")
        .with_param("top", 0.5);
    let mut source = build(&layer).unwrap();

    for _ in 0..3 {
        let mut canvas = Canvas::new(32, 32).unwrap();
        source.read_next_frame(0.5, &mut canvas, 0.5).unwrap();
        // 32x16 image, center anchor at y = 16 shifted up by half the 16px margin.
        assert_eq!(canvas.pixel(5, 0), Some([200, 0, 0, 255]));
        assert_eq!(canvas.pixel(5, 15), Some([200, 0, 0, 255]));
        assert_eq!(canvas.pixel(5, 16), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(5, 31), Some([0, 0, 0, 0]));
    }
    source.close().unwrap();
}

#[test]
fn unreadable_image_fails_setup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not an image").unwrap();
    let layer = Layer::new("image").with_param("path", path.to_string_lossy().as_ref());
    assert!(matches!(build(&layer), Err(WavyteError::Other(_))));

    let layer = Layer::new("image").with_param("path", "/nonexistent/x.png");
    assert!(build(&layer).is_err());
}

#[test]
fn fit_matches_the_plan_target() {
    let src = RgbaImage::from_pixel(30, 10, image::Rgba([1, 2, 3, 255]));
    for mode in [
        ResizeMode::Contain,
        ResizeMode::ContainBlur,
        ResizeMode::Cover,
        ResizeMode::Stretch,
    ] {
        let plan = ResizePlan::compute(30, 10, 20, 20, mode).unwrap();
        let out = fit(&src, &plan);
        assert_eq!(out.dimensions(), (plan.target_width, plan.target_height));
    }
}

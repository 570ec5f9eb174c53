use gamevision::capture::{StubCapture, StubWindow};
use gamevision::input::{RecordedClick, RecordingInput};
use gamevision::lowlevel::resize_u8_bilinear;
use gamevision::{
    Automator, ClickMethod, ClickOptions, ClickTarget, MouseButton, MultiScaleConfig, OwnedImage,
    PixelBuffer, ScreenPoint, Stage, Template, VisionError, WindowHandle, WindowRect,
};
use std::sync::Arc;
use std::time::Duration;

const PID: u32 = 777;

fn make_template(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push((((x * 11) ^ (y * 3) ^ (x * y)) & 0xFF) as u8);
        }
    }
    data
}

/// Window content: dark ramp with the template enlarged 1.2x at (70, 80).
fn window_pixels(template: &Template) -> PixelBuffer {
    let (width, height) = (200, 200);
    let mut gray: Vec<u8> = (0..width * height)
        .map(|i| ((i % width) / 4 + (i / width) / 8) as u8)
        .collect();
    let enlarged = resize_u8_bilinear(template.view(), 60, 60).unwrap();
    for (row, chunk) in enlarged.data().chunks_exact(60).enumerate() {
        let start = (80 + row) * width + 70;
        gray[start..start + 60].copy_from_slice(chunk);
    }
    PixelBuffer::from_luma(&OwnedImage::new(gray, width, height).unwrap())
}

fn setup(x: i32, y: i32) -> (Automator, Arc<RecordingInput>, Template) {
    let template = Template::new(make_template(50, 50), 50, 50).unwrap();
    let rect = WindowRect::from_origin_size(x, y, 200, 200).unwrap();
    let capture = StubCapture::new().with_window(StubWindow::new(PID, rect, window_pixels(&template)));
    let input = Arc::new(RecordingInput::default());
    let automator = Automator::new(Box::new(capture), Box::new(Arc::clone(&input)));
    (automator, input, template)
}

fn quick_click() -> ClickOptions {
    ClickOptions {
        delay: Duration::ZERO,
        ..ClickOptions::default()
    }
}

fn config() -> MultiScaleConfig {
    MultiScaleConfig::new(0.8, 1.3, 0.05, 0.9, 3).unwrap()
}

#[test]
fn locate_maps_match_into_screen_space() {
    let (automator, input, template) = setup(100, 50);
    let located = automator.locate(PID, &template, &config()).unwrap().unwrap();
    assert!(located.found.similarity > 0.99);
    assert_eq!(located.screen_rect.min, ScreenPoint::new(170, 130));
    assert_eq!(located.screen_rect.max, ScreenPoint::new(230, 190));
    assert!(input.clicks().is_empty());
}

#[test]
fn click_template_hits_the_center() {
    let (automator, input, template) = setup(100, 50);
    let at = automator
        .click_template(
            PID,
            &template,
            &config(),
            MouseButton::Left,
            &quick_click(),
            ClickTarget::Center,
        )
        .unwrap();
    assert_eq!(at, Some(ScreenPoint::new(200, 160)));
    assert_eq!(
        input.clicks(),
        vec![RecordedClick {
            at: ScreenPoint::new(200, 160),
            button: MouseButton::Left,
            window: None,
        }]
    );
}

#[test]
fn window_message_clicks_target_the_captured_window() {
    let (automator, input, template) = setup(0, 0);
    let options = ClickOptions {
        method: ClickMethod::WindowMessage,
        ..quick_click()
    };
    automator
        .click_template(
            PID,
            &template,
            &config(),
            MouseButton::Right,
            &options,
            ClickTarget::TopLeft,
        )
        .unwrap();
    let clicks = input.clicks();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].at, ScreenPoint::new(70, 80));
    assert_eq!(clicks[0].button, MouseButton::Right);
    assert_eq!(clicks[0].window, WindowHandle::new(1));
}

#[test]
fn missing_template_clicks_nothing() {
    let (automator, input, _) = setup(0, 0);
    let mut state = 0x9e37_79b9u32;
    let noise = (0..40 * 40)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    let other = Template::new(noise, 40, 40).unwrap();
    let at = automator
        .click_template(
            PID,
            &other,
            &MultiScaleConfig::new(0.9, 1.1, 0.1, 0.95, 1).unwrap(),
            MouseButton::Left,
            &quick_click(),
            ClickTarget::Center,
        )
        .unwrap();
    assert_eq!(at, None);
    assert!(input.clicks().is_empty());
}

#[test]
fn off_screen_targets_are_rejected() {
    let (automator, input, template) = setup(1800, 1000);
    let err = automator
        .click_template(
            PID,
            &template,
            &config(),
            MouseButton::Left,
            &quick_click(),
            ClickTarget::Center,
        )
        .unwrap_err();
    assert!(matches!(err, VisionError::InvalidCoordinate { .. }));
    assert_eq!(err.stage(), Stage::Click);
    assert!(input.clicks().is_empty());
}

#[test]
fn capture_errors_surface_with_their_stage() {
    let (automator, _, template) = setup(0, 0);
    let err = automator.locate(PID + 1, &template, &config()).unwrap_err();
    assert_eq!(err, VisionError::WindowNotFound { pid: PID + 1 });
    assert_eq!(err.stage(), Stage::Capture);
}

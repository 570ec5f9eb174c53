use gamevision::{
    to_image_point, to_screen_point, to_screen_rect, MatchResult, Point, Rect, ScreenPoint,
    WindowRect,
};

#[test]
fn image_points_offset_by_window_origin() {
    let window = WindowRect::new(100, 50, 900, 650).unwrap();
    assert_eq!(
        to_screen_point(Point::new(10, 20), &window),
        ScreenPoint::new(110, 70)
    );
}

#[test]
fn negative_window_origins_are_supported() {
    // A window on a monitor left of the primary display.
    let window = WindowRect::new(-1600, -200, -800, 400).unwrap();
    let screen = to_screen_point(Point::new(30, 40), &window);
    assert_eq!(screen, ScreenPoint::new(-1570, -160));
    assert_eq!(to_image_point(screen, &window), Point::new(30, 40));
}

#[test]
fn screen_and_image_points_round_trip() {
    let window = WindowRect::from_origin_size(-37, 412, 640, 480).unwrap();
    for &(x, y) in &[(0, 0), (639, 479), (320, 17), (5, 400)] {
        let p = Point::new(x, y);
        assert_eq!(to_image_point(to_screen_point(p, &window), &window), p);
    }
}

#[test]
fn rect_mapping_preserves_size() {
    let window = WindowRect::new(200, 300, 1000, 900).unwrap();
    let rect = Rect::from_origin_size(Point::new(70, 80), 60, 60);
    let screen = to_screen_rect(rect, &window);
    assert_eq!(screen.min, ScreenPoint::new(270, 380));
    assert_eq!(screen.max, ScreenPoint::new(330, 440));
    assert_eq!((screen.width(), screen.height()), (60, 60));
    assert_eq!(screen.center(), ScreenPoint::new(300, 410));
}

#[test]
fn match_result_maps_to_screen() {
    let window = WindowRect::new(10, 20, 500, 400).unwrap();
    let found = MatchResult {
        similarity: 0.95,
        location: Point::new(5, 6),
        bounding_box: Rect::from_origin_size(Point::new(5, 6), 10, 8),
        scale: 1.0,
        confidence: 0.95,
    };
    let screen = found.screen_rect(&window);
    assert_eq!(screen.min, ScreenPoint::new(15, 26));
    assert_eq!(screen.max, ScreenPoint::new(25, 34));
    assert_eq!(found.center(), Point::new(10, 10));
}

use replaycast::seek::{SEEK_MARGIN_PX, seek_fraction, seek_x};

#[test]
fn known_seek_fraction() {
    // 1000-frame round, start at frame 100.
    assert_eq!(seek_fraction(100, 1000).unwrap(), 0.1005);
}

#[test]
fn known_pixel_mapping() {
    // Width 1920 leaves 1888 usable px; 16 + 0.1005 * 1888 = 205.744.
    let x = seek_x(seek_fraction(100, 1000).unwrap(), 1920.0);
    assert!((x - 205.744).abs() < 1e-9, "got {x}");
}

#[test]
fn start_of_round_stays_inside_the_bar() {
    let x = seek_x(seek_fraction(0, 1).unwrap(), 1920.0);
    assert!(x > SEEK_MARGIN_PX);
    assert!(x < 1920.0 - SEEK_MARGIN_PX);
}

#[test]
fn fraction_grows_monotonically_with_start() {
    let total = 5000;
    let mut last = 0.0;
    for start in [0, 1, 100, 2500, 4999] {
        let f = seek_fraction(start, total).unwrap();
        assert!(f > last);
        last = f;
    }
    assert!(last < 1.0);
}

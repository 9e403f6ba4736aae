use focusline_core::timecode::format_timestamp;

#[test]
fn test_zero() {
    assert_eq!(format_timestamp(0), "00:00.000000");
}

#[test]
fn test_one_minute_five_and_a_half_seconds() {
    assert_eq!(format_timestamp(65_500_000), "01:05.500000");
}

#[test]
fn test_minutes_exceed_59() {
    assert_eq!(format_timestamp(3_661_000_001), "61:01.000001");
}

#[test]
fn test_microseconds_are_always_six_digits() {
    assert_eq!(format_timestamp(1), "00:00.000001");
    assert_eq!(format_timestamp(999_999), "00:00.999999");
    assert_eq!(format_timestamp(60_000_000), "01:00.000000");
}

#[test]
fn test_negative_clamps_to_zero() {
    assert_eq!(format_timestamp(-1), "00:00.000000");
    assert_eq!(format_timestamp(i64::MIN), "00:00.000000");
}

#[test]
fn test_shape_holds_for_assorted_values() {
    for ts in [0i64, 1, 59_999_999, 60_000_000, 3_599_999_999, 7_200_000_000] {
        let label = format_timestamp(ts);
        let (mm, rest) = label.split_once(':').expect("minute separator");
        let (ss, micros) = rest.split_once('.').expect("fraction separator");
        assert!(mm.len() >= 2 && mm.chars().all(|c| c.is_ascii_digit()));
        assert!(ss.len() == 2 && ss.chars().all(|c| c.is_ascii_digit()));
        assert!(micros.len() == 6 && micros.chars().all(|c| c.is_ascii_digit()));
    }
}

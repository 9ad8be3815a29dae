use super::*;

#[test]
fn hex_forms_parse() {
    assert_eq!(Color::parse_hex("#ff8000").unwrap(), Color([255, 128, 0, 255]));
    assert_eq!(Color::parse_hex("FF800080").unwrap(), Color([255, 128, 0, 128]));
    assert_eq!(Color::parse_hex("#fff").unwrap(), Color::WHITE);
    assert!(Color::parse_hex("#12345").is_err());
    assert!(Color::parse_hex("#gg0000").is_err());
}

#[test]
fn deserializes_from_string_or_array() {
    let c: Color = serde_json::from_str("\"#000000\"").unwrap();
    assert_eq!(c, Color::BLACK);
    let c: Color = serde_json::from_str("[1, 2, 3]").unwrap();
    assert_eq!(c, Color([1, 2, 3, 255]));
    let c: Color = serde_json::from_str("[1, 2, 3, 4]").unwrap();
    assert_eq!(c, Color([1, 2, 3, 4]));
    assert!(serde_json::from_str::<Color>("[1, 2]").is_err());
}

#[test]
fn lerp_hits_endpoints_and_midpoint() {
    assert_eq!(Color::BLACK.lerp(Color::WHITE, 0.0), Color::BLACK);
    assert_eq!(Color::BLACK.lerp(Color::WHITE, 1.0), Color::WHITE);
    assert_eq!(Color::BLACK.lerp(Color::WHITE, 0.5), Color([128, 128, 128, 255]));
}

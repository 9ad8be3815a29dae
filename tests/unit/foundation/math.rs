use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn premultiply_opaque_and_transparent() {
    assert_eq!(premultiply([10, 20, 30, 255]), [10, 20, 30, 255]);
    assert_eq!(premultiply([10, 20, 30, 0]), [0, 0, 0, 0]);
    assert_eq!(premultiply([255, 0, 255, 128]), [128, 0, 128, 128]);
}

#[test]
fn unpremultiply_inverts_within_rounding() {
    for a in [1u8, 17, 128, 200, 254] {
        let straight = [200u8, 100, 50, a];
        let back = unpremultiply(premultiply(straight));
        assert_eq!(back[3], a);
        if a >= 128 {
            for c in 0..3 {
                assert!((i32::from(back[c]) - i32::from(straight[c])).abs() <= 2);
            }
        }
    }
    assert_eq!(unpremultiply([9, 9, 9, 0]), [0, 0, 0, 0]);
}

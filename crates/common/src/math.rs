//! Integer division primitives used to fold level coordinates into rooms.
//!
//! Rust's `/` and `%` truncate toward zero, which is wrong for negative
//! coordinates (a cursor left of the canvas must land in room -1, not 0).

use glam::IVec2;

/// Arithmetic floor division. `divisor` must be non-zero.
pub fn floor_div(value: i32, divisor: i32) -> i32 {
    value.div_euclid(divisor) - if divisor < 0 && value.rem_euclid(divisor) != 0 { 1 } else { 0 }
}

/// Ceiling division. `divisor` must be non-zero.
pub fn ceil_div(value: i32, divisor: i32) -> i32 {
    -floor_div(-value, divisor)
}

/// Remainder complementary to [`floor_div`]; non-negative for a positive modulus.
pub fn wrap(value: i32, modulus: i32) -> i32 {
    value - floor_div(value, modulus) * modulus
}

pub fn floor_div_vec(value: IVec2, divisor: IVec2) -> IVec2 {
    IVec2::new(floor_div(value.x, divisor.x), floor_div(value.y, divisor.y))
}

pub fn ceil_div_vec(value: IVec2, divisor: IVec2) -> IVec2 {
    IVec2::new(ceil_div(value.x, divisor.x), ceil_div(value.y, divisor.y))
}

pub fn wrap_vec(value: IVec2, modulus: IVec2) -> IVec2 {
    IVec2::new(wrap(value.x, modulus.x), wrap(value.y, modulus.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_div_rounds_toward_negative_infinity() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(-8, 2), -4);
        assert_eq!(floor_div(-1, 10), -1);
        assert_eq!(floor_div(0, 10), 0);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_div(-7, -2), 3);
    }

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(8, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(0, 5), 0);
    }

    #[test]
    fn wrap_is_non_negative() {
        assert_eq!(wrap(-1, 10), 9);
        assert_eq!(wrap(-10, 10), 0);
        assert_eq!(wrap(13, 10), 3);
        for v in -50..50 {
            let w = wrap(v, 7);
            assert!((0..7).contains(&w), "wrap({v}, 7) = {w}");
        }
    }

    #[test]
    fn floor_div_and_wrap_reconstruct_value() {
        for s in 1..12 {
            for c in -100..100 {
                assert_eq!(c, floor_div(c, s) * s + wrap(c, s), "c={c} s={s}");
            }
        }
    }

    #[test]
    fn vector_forms_apply_per_axis() {
        let v = IVec2::new(-3, 17);
        let d = IVec2::new(10, 8);
        assert_eq!(floor_div_vec(v, d), IVec2::new(-1, 2));
        assert_eq!(wrap_vec(v, d), IVec2::new(7, 1));
        assert_eq!(ceil_div_vec(v, d), IVec2::new(0, 3));
    }
}

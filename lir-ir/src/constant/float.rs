//! Text forms of floating-point constants
//!
//! Values are held as `f64`. `half` and `float` constants must be exactly
//! representable in their own format; the wider formats hold every `f64`
//! exactly, so only the bit layout changes.

use crate::types::FloatKind;

const FRAC_BITS: u32 = 52;
const FRAC_MASK: u64 = (1 << FRAC_BITS) - 1;

/// Whether `value` converts to `kind` without rounding
pub(crate) fn is_exact(kind: FloatKind, value: f64) -> bool {
    match kind {
        FloatKind::Half if value.is_nan() => nan_payload_fits(value, 10),
        FloatKind::Half => half_to_f64(half_bits(value)) == value,
        FloatKind::Float if value.is_nan() => nan_payload_fits(value, 23),
        FloatKind::Float => value as f32 as f64 == value,
        FloatKind::Double | FloatKind::X86Fp80 | FloatKind::Fp128 | FloatKind::PpcFp128 => true,
    }
}

/// `half` is always written in hex, as are the formats wider than `double`.
/// `float` and `double` are decimal when finite; a `float` is widened to
/// `double` first.
pub(crate) fn format(kind: FloatKind, value: f64) -> String {
    match kind {
        FloatKind::Half => format!("0xH{:04X}", half_bits(value)),
        FloatKind::Float if value.is_finite() => decimal(value as f32 as f64),
        FloatKind::Float | FloatKind::Double if !value.is_finite() => {
            format!("0x{:016X}", value.to_bits())
        }
        FloatKind::Float | FloatKind::Double => decimal(value),
        FloatKind::X86Fp80 => {
            let (sign_exp, sig) = x86_fp80_bits(value);
            format!("0xK{:04X}{:016X}", sign_exp, sig)
        }
        FloatKind::Fp128 => {
            let bits = fp128_bits(value);
            format!("0xL{:016X}{:016X}", bits as u64, (bits >> 64) as u64)
        }
        // High double first; the low double of an exact `f64` is zero.
        FloatKind::PpcFp128 => format!("0xM{:016X}{:016X}", value.to_bits(), 0u64),
    }
}

fn decimal(value: f64) -> String {
    let s = format!("{:?}", value);
    match s.find('e') {
        Some(pos) if !s[..pos].contains('.') => format!("{}.0{}", &s[..pos], &s[pos..]),
        _ => s,
    }
}

/// NaN payload bits below the target's `frac_bits` must be zero
fn nan_payload_fits(value: f64, frac_bits: u32) -> bool {
    value.to_bits() & ((1 << (FRAC_BITS - frac_bits)) - 1) == 0
}

/// Nearest `half`, ties to even
fn half_bits(value: f64) -> u16 {
    let sign: u16 = if value.is_sign_negative() { 0x8000 } else { 0 };
    if value.is_nan() {
        let payload = ((value.to_bits() >> (FRAC_BITS - 10)) & 0x3FF) as u16;
        return sign | 0x7C00 | if payload == 0 { 0x200 } else { payload };
    }
    let abs = value.abs();
    let exp = ((abs.to_bits() >> FRAC_BITS) as i32) - 1023;
    if exp > 15 {
        return sign | 0x7C00;
    }
    // Below the normal range the unit in the last place stays at 2^-24.
    let ulp = exp.max(-14) - 10;
    let units = (abs * 2f64.powi(-ulp)).round_ties_even() as u32;
    let bits = if exp < -14 {
        units
    } else {
        (((exp + 15) as u32) << 10) + units - 1024
    };
    sign | bits.min(0x7C00) as u16
}

fn half_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = i32::from((bits >> 10) & 0x1F);
    let frac = f64::from(bits & 0x3FF);
    let magnitude = match exp {
        0 => frac * 2f64.powi(-24),
        0x1F if frac == 0.0 => f64::INFINITY,
        0x1F => f64::NAN,
        _ => (frac + 1024.0) * 2f64.powi(exp - 25),
    };
    sign * magnitude
}

/// Unbiased exponent and significand (leading one at bit 63) of a finite,
/// non-zero value
fn normalize(value: f64) -> (i32, u64) {
    let bits = value.to_bits();
    let biased = ((bits >> FRAC_BITS) & 0x7FF) as i32;
    let frac = bits & FRAC_MASK;
    let (exp, sig) = if biased == 0 {
        (-1074, frac)
    } else {
        (biased - 1075, frac | 1 << FRAC_BITS)
    };
    let shift = sig.leading_zeros();
    (exp - shift as i32 + 63, sig << shift)
}

/// Sign and exponent word, then the 64-bit significand with its explicit
/// integer bit
fn x86_fp80_bits(value: f64) -> (u16, u64) {
    let sign: u16 = if value.is_sign_negative() { 0x8000 } else { 0 };
    if !value.is_finite() {
        let frac = value.to_bits() & FRAC_MASK;
        return (sign | 0x7FFF, 1 << 63 | frac << 11);
    }
    if value == 0.0 {
        return (sign, 0);
    }
    let (exp, sig) = normalize(value);
    (sign | (exp + 16383) as u16, sig)
}

fn fp128_bits(value: f64) -> u128 {
    let sign = u128::from(value.is_sign_negative()) << 127;
    if !value.is_finite() {
        let frac = u128::from(value.to_bits() & FRAC_MASK);
        return sign | 0x7FFF_u128 << 112 | frac << 60;
    }
    if value == 0.0 {
        return sign;
    }
    let (exp, sig) = normalize(value);
    sign | ((exp + 16383) as u128) << 112 | u128::from(sig << 1) << 48
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half() {
        assert_eq!(format(FloatKind::Half, 1.0), "0xH3C00");
        assert_eq!(format(FloatKind::Half, -2.0), "0xHC000");
        assert_eq!(format(FloatKind::Half, 65504.0), "0xH7BFF");
        // Smallest subnormal
        assert_eq!(format(FloatKind::Half, 2f64.powi(-24)), "0xH0001");
        assert_eq!(format(FloatKind::Half, f64::INFINITY), "0xH7C00");
        assert!(is_exact(FloatKind::Half, 0.5));
        assert!(is_exact(FloatKind::Half, 2f64.powi(-24)));
        assert!(!is_exact(FloatKind::Half, 0.1));
        assert!(!is_exact(FloatKind::Half, 65520.0));
        assert!(!is_exact(FloatKind::Half, 2f64.powi(-25)));
    }

    #[test]
    fn test_float_and_double() {
        assert!(is_exact(FloatKind::Float, 0.5));
        assert!(!is_exact(FloatKind::Float, 0.1));
        assert!(!is_exact(FloatKind::Float, 1e300));
        assert!(is_exact(FloatKind::Float, f64::NEG_INFINITY));
        assert_eq!(format(FloatKind::Float, 0.25), "0.25");
        assert_eq!(format(FloatKind::Double, 0.1), "0.1");
        assert_eq!(format(FloatKind::Double, 1e100), "1.0e100");
        assert_eq!(format(FloatKind::Double, f64::INFINITY), "0x7FF0000000000000");
    }

    #[test]
    fn test_wide_formats() {
        assert_eq!(format(FloatKind::X86Fp80, 1.0), "0xK3FFF8000000000000000");
        assert_eq!(format(FloatKind::X86Fp80, -0.0), "0xK80000000000000000000");
        assert_eq!(format(FloatKind::Fp128, 1.0), "0xL00000000000000003FFF000000000000");
        assert_eq!(format(FloatKind::Fp128, 0.5), "0xL00000000000000003FFE000000000000");
        assert_eq!(format(FloatKind::PpcFp128, 1.0), "0xM3FF00000000000000000000000000000");
        // f64 subnormals are normal in the wider formats.
        assert_eq!(format(FloatKind::X86Fp80, f64::from_bits(1)), "0xK3BCD8000000000000000");
        assert!(is_exact(FloatKind::X86Fp80, 0.1));
    }
}

/*
   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Frequency planning.
//!
//! Given a target output frequency, [`plan`] and [`plan_quadrature`] derive a
//! rational PLL feedback multiplier and a rational multisynth divider such
//! that
//!
//! ```text
//! Fclk = Fxtal * (mult + num/denom) / ((div + num/denom) * rdiv)
//! ```
//!
//! holds to within a few Hz. The fractional terms are constrained to the
//! device's 20-bit numerator/denominator fields, so the remainders are
//! reduced before they are returned rather than used exactly.

use crate::registers::RDiv;

/// Reference crystal frequency the planners assume, in Hz.
pub const XTAL_FREQ: u32 = 25_000_000;

/// Rational feedback multiplier for one PLL:
/// `Fpll = Fxtal * (mult + num/denom)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PllConfig {
    pub mult: u8,
    pub num: u32,
    pub denom: u32,
    /// Permit the feedback integer-mode fast path when `num` is zero and
    /// `mult` is even. Quadrature plans clear this: the phase relationship
    /// relies on the fractional feedback encoding.
    pub allow_integer_mode: bool,
}

/// Rational divider from a PLL down to one output channel:
/// `Fclk = Fpll / ((div + num/denom) * rdiv)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub div: u32,
    pub num: u32,
    pub denom: u32,
    /// Auxiliary divide-by-2^k stage after the multisynth.
    pub rdiv: RDiv,
    /// Permit multisynth integer mode when the fraction is zero. Also gates
    /// the `div` values 4 and 6, which only exist as integer modes.
    pub allow_integer_mode: bool,
    /// Drive the output inverted.
    pub inverted: bool,
}

/// Plans PLL, multisynth and R-divider settings for `fclk` in the
/// `[8_000, 160_000_000]` Hz range; values outside are clamped, not rejected.
///
/// `correction` is the measured frequency error at 100 MHz, scaled linearly
/// (a reading of 10_000_097 Hz instead of 10 MHz means a correction of 970).
///
/// For any `fclk` of at least 500 kHz the produced settings reproduce the
/// corrected target to within roughly 6 Hz (about 7 Hz just below the
/// 81 MHz strategy switchover); verified empirically by the sweep tests.
pub fn plan(fclk: u32, correction: i32) -> (PllConfig, OutputConfig) {
    let mut fclk = fclk.max(8_000).min(160_000_000) as i32;

    let rdiv = if fclk < 1_000_000 {
        // Plan at 64x the target and divide back down afterwards: the synth
        // stages run in a band where the fractional terms carry more weight.
        // Must happen before the correction, which is defined relative to
        // the band the synths actually run in.
        fclk *= 64;
        RDiv::Div64
    } else {
        RDiv::Div1
    };

    let fclk = apply_correction(fclk, correction);

    let fxtal = XTAL_FREQ as i32;
    if fclk < 81_000_000 {
        // Park the PLL at exactly 900 MHz and do all the tuning in the
        // output divider. Reducing the remainder by t approximates a GCD
        // reduction cheaply while keeping num/denom inside 20 bits.
        let fpll = 900_000_000;
        let mut div = fpll / fclk;
        let t = (fclk >> 20) + 1;
        let mut num = (fpll % fclk) / t;
        let denom = fclk / t;
        // A remainder just under fclk can truncate to the same quotient as
        // the denominator; carry the unit fraction into the integer part to
        // keep num < denom.
        if num == denom {
            num = 0;
            div += 1;
        }

        (
            PllConfig {
                mult: 36,
                num: 0,
                denom: 1,
                allow_integer_mode: true,
            },
            OutputConfig {
                div: div as u32,
                num: num as u32,
                denom: denom as u32,
                rdiv,
                allow_integer_mode: true,
                inverted: false,
            },
        )
    } else {
        // Above 81 MHz the divider error grows past a few Hz, so flip the
        // strategy: fix the output divider from a small ladder and tune the
        // PLL fractionally instead.
        let div = if fclk >= 150_000_000 {
            4
        } else if fclk >= 100_000_000 {
            6
        } else {
            8
        };

        let numerator = div * fclk;
        let mut mult = numerator / fxtal;
        let t = (fxtal >> 20) + 1;
        let mut num = (numerator % fxtal) / t;
        let denom = fxtal / t;
        // Same carry as Case A, on the PLL side.
        if num == denom {
            num = 0;
            mult += 1;
        }

        (
            PllConfig {
                mult: mult as u8,
                num: num as u32,
                denom: denom as u32,
                allow_integer_mode: true,
            },
            OutputConfig {
                div: div as u32,
                num: 0,
                denom: 1,
                rdiv,
                allow_integer_mode: true,
                inverted: false,
            },
        )
    }
}

/// Plans settings for a quadrature output pair sharing one PLL, for `fclk`
/// in the `[1_400_000, 100_000_000]` Hz range (clamped at the boundaries).
///
/// Both channels must be programmed with the same PLL and the returned
/// divider; writing `0` and `div` to their phase-offset registers then
/// yields exactly a quarter-cycle offset between them. The output divider
/// is a plain integer and all tuning happens in the PLL fraction, which is
/// the opposite split from [`plan`] and the reason integer mode is disabled
/// here. The R divider stays at divide-by-1: other values shift the phase
/// relationship in ways the datasheet leaves unspecified.
///
/// The produced settings reproduce the corrected target to within 4 Hz.
pub fn plan_quadrature(fclk: u32, correction: i32) -> (PllConfig, OutputConfig) {
    let fclk = fclk.max(1_400_000).min(100_000_000) as i32;
    let fclk = apply_correction(fclk, correction);

    let div = if fclk < 4_900_000 {
        // Runs the PLL below the datasheet's 600 MHz floor. Experimentally
        // it stays usable down to about 177 MHz, which is what bounds the
        // low end of the range at 177 / 127 ~ 1.4 MHz.
        127
    } else if fclk < 8_000_000 {
        625_000_000 / fclk
    } else {
        900_000_000 / fclk
    };

    let fxtal = XTAL_FREQ as i32;
    let fpll = fclk * div;
    // Fixed reduction by 24: 25 MHz / 24 just fits the 20-bit denominator.
    let mut mult = fpll / fxtal;
    let mut num = (fpll % fxtal) / 24;
    let denom = fxtal / 24;
    // A PLL remainder within 24 of the crystal frequency truncates to the
    // denominator itself; carry it into the multiplier to keep num < denom.
    if num == denom {
        num = 0;
        mult += 1;
    }

    (
        PllConfig {
            mult: mult as u8,
            num: num as u32,
            denom: denom as u32,
            allow_integer_mode: false,
        },
        OutputConfig {
            div: div as u32,
            num: 0,
            denom: 1,
            rdiv: RDiv::Div1,
            allow_integer_mode: false,
            inverted: false,
        },
    )
}

fn apply_correction(fclk: i32, correction: i32) -> i32 {
    fclk - ((fclk / 1_000_000) * correction) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Output frequency the device would actually produce for a plan.
    fn reconstructed(pll: &PllConfig, out: &OutputConfig) -> f64 {
        let n = pll.mult as f64 + pll.num as f64 / pll.denom as f64;
        let m = out.div as f64 + out.num as f64 / out.denom as f64;
        XTAL_FREQ as f64 * n / (m * out.rdiv.divisor() as f64)
    }

    fn check_fields(pll: &PllConfig, out: &OutputConfig) {
        assert_ne!(pll.denom, 0);
        assert_ne!(out.denom, 0);
        assert!(pll.denom <= 0xFFFFF, "pll denom {}", pll.denom);
        assert!(out.denom <= 0xFFFFF, "out denom {}", out.denom);
        assert!(pll.num < pll.denom, "pll {}/{}", pll.num, pll.denom);
        assert!(out.num < out.denom, "out {}/{}", out.num, out.denom);
        assert!(out.div == 4 || out.div == 6 || (out.div >= 8 && out.div <= 1800));
    }

    #[test]
    fn sweep_within_error_bound() {
        let mut fclk = 500_000u32;
        while fclk <= 160_000_000 {
            let (pll, out) = plan(fclk, 0);
            check_fields(&pll, &out);

            let err = (reconstructed(&pll, &out) - fclk as f64).abs();
            // The worst case sits just below the 81 MHz switchover, where
            // the truncation error of the t-reduction peaks at ~6.9 Hz.
            let bound = if fclk < 75_000_000 { 6.0 } else { 7.0 };
            assert!(err <= bound, "{} Hz off by {}", fclk, err);

            fclk += 9_973;
        }
    }

    #[test]
    fn case_a_28_mhz() {
        let (pll, out) = plan(28_000_000, 0);
        assert_eq!((pll.mult, pll.num, pll.denom), (36, 0, 1));
        assert_eq!(out.div, 900_000_000 / 28_000_000);
        assert_eq!(out.rdiv, RDiv::Div1);
        assert!(out.allow_integer_mode);

        let err = (reconstructed(&pll, &out) - 28_000_000.0).abs();
        assert!(err <= 6.0, "off by {}", err);
    }

    #[test]
    fn case_b_144_mhz() {
        let (pll, out) = plan(144_000_000, 0);
        assert_eq!(out.div, 6);
        assert_eq!((out.num, out.denom), (0, 1));

        let err = (reconstructed(&pll, &out) - 144_000_000.0).abs();
        assert!(err <= 6.0, "off by {}", err);
    }

    #[test]
    fn output_divider_ladder() {
        assert_eq!(plan(150_000_000, 0).1.div, 4);
        assert_eq!(plan(149_999_999, 0).1.div, 6);
        assert_eq!(plan(100_000_000, 0).1.div, 6);
        assert_eq!(plan(99_999_999, 0).1.div, 8);
        assert_eq!(plan(81_000_000, 0).1.div, 8);
    }

    #[test]
    fn low_band_uses_r_divider() {
        let (_, out) = plan(500_000, 0);
        assert_eq!(out.rdiv, RDiv::Div64);

        let (_, out) = plan(1_000_000, 0);
        assert_eq!(out.rdiv, RDiv::Div1);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(plan(1_000, 0), plan(8_000, 0));
        assert_eq!(plan(999_999_999, 0), plan(160_000_000, 0));
        assert_eq!(plan_quadrature(1, 0), plan_quadrature(1_400_000, 0));
        assert_eq!(
            plan_quadrature(999_999_999, 0),
            plan_quadrature(100_000_000, 0)
        );
    }

    #[test]
    fn correction_shifts_the_target() {
        // +97 Hz measured at 10 MHz -> correction 970; the plan should aim
        // 97 Hz below the nominal target.
        let (pll, out) = plan(10_000_000, 970);
        let err = (reconstructed(&pll, &out) - 9_999_903.0).abs();
        assert!(err <= 6.0, "off by {}", err);

        let (pll, out) = plan_quadrature(10_000_000, 970);
        let err = (reconstructed(&pll, &out) - 9_999_903.0).abs();
        assert!(err <= 4.0, "off by {}", err);
    }

    #[test]
    fn remainder_collapse_carries_into_integer_part() {
        // At these frequencies the truncated remainder equals the truncated
        // denominator, so without the carry num == denom slips out.

        // Case A: 900 MHz % 2200489 is 2200488, one below the divisor.
        let (pll, out) = plan(2_200_489, 0);
        check_fields(&pll, &out);
        assert_eq!((out.div, out.num), (409, 0));
        let err = (reconstructed(&pll, &out) - 2_200_489.0).abs();
        assert!(err <= 6.0, "off by {}", err);

        // Case B: 8 * 81249998 lands within 24 of a crystal multiple.
        let (pll, out) = plan(81_249_998, 0);
        check_fields(&pll, &out);
        assert_eq!((pll.mult, pll.num), (26, 0));
        let err = (reconstructed(&pll, &out) - 81_249_998.0).abs();
        assert!(err <= 7.0, "off by {}", err);

        // Quadrature: 2559055 * 127 is 24999985 past a crystal multiple.
        let (pll, out) = plan_quadrature(2_559_055, 0);
        check_fields(&pll, &out);
        assert_eq!((pll.mult, pll.num), (13, 0));
        let err = (reconstructed(&pll, &out) - 2_559_055.0).abs();
        assert!(err <= 4.0, "off by {}", err);
    }

    #[test]
    fn quadrature_sweep_within_error_bound() {
        let mut fclk = 1_400_000u32;
        while fclk <= 100_000_000 {
            let (pll, out) = plan_quadrature(fclk, 0);
            check_fields(&pll, &out);
            assert_eq!(out.rdiv, RDiv::Div1, "{} Hz", fclk);
            assert_eq!((out.num, out.denom), (0, 1));
            assert!(!pll.allow_integer_mode);
            assert!(!out.allow_integer_mode);
            // The divider doubles as the quarter-cycle phase offset, which
            // has to fit the 7-bit phase register.
            assert!(out.div <= 127, "{} Hz div {}", fclk, out.div);

            let err = (reconstructed(&pll, &out) - fclk as f64).abs();
            assert!(err <= 4.0, "{} Hz off by {}", fclk, err);

            fclk += 4_999;
        }
    }

    #[test]
    fn quadrature_divider_ladder() {
        assert_eq!(plan_quadrature(1_400_000, 0).1.div, 127);
        assert_eq!(plan_quadrature(4_899_999, 0).1.div, 127);
        assert_eq!(plan_quadrature(7_000_000, 0).1.div, 625_000_000 / 7_000_000);
        assert_eq!(plan_quadrature(8_000_000, 0).1.div, 900_000_000 / 8_000_000);
        assert_eq!(plan_quadrature(100_000_000, 0).1.div, 9);
    }
}

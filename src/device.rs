/*
   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Device programming.
//!
//! [`Si5351`] turns plans from [`crate::frequency`] into the ordered register
//! writes the chip expects: clock control byte, the 8 synth parameter bytes,
//! then the phase offset. Configuration is write-only; the driver never reads
//! registers back. A failed write aborts the rest of the sequence, which can
//! leave the device in an intermediate state; the caller re-runs the full
//! channel setup to recover.

use embedded_hal::blocking::i2c::Write;

use crate::errors::Error;
use crate::frequency::{plan, plan_quadrature, OutputConfig, PllConfig};
use crate::registers::{
    ClockControlBits, CrystalLoadBits, PllResetBits, Register, SynthParams, CHANNEL_REGS,
};

const ADDRESS: u8 = 0b0110_0000;

#[derive(Debug, Copy, Clone)]
pub enum Pll {
    A,
    B,
}

/// Output driver strength in mA, roughly 2 dBm per step into 50 ohms.
#[derive(Debug, Copy, Clone)]
pub enum DriveStrength {
    _2,
    _4,
    _6,
    _8,
}

/// Crystal load capacitance, in pF.
#[derive(Debug, Copy, Clone)]
pub enum CrystalLoad {
    _6,
    _8,
    _10,
}

/// Si5351A driver over an `embedded-hal` blocking I²C bus.
///
/// The correction scalar is supplied once at construction and applied to
/// every planning call; runtime recalibration is out of scope.
pub struct Si5351<I2C> {
    i2c: I2C,
    address: u8,
    correction: i32,
}

impl<I2C, E> Si5351<I2C>
where
    I2C: Write<Error = E>,
{
    /// Creates the driver. `address_bit` selects the secondary bus address
    /// some modules strap. `correction` is the measured frequency error at
    /// 100 MHz, scaled linearly (see [`plan`]).
    pub fn new(i2c: I2C, address_bit: bool, correction: i32) -> Self {
        Si5351 {
            i2c,
            address: ADDRESS | if address_bit { 1 } else { 0 },
            correction,
        }
    }

    /// Releases the underlying bus.
    pub fn free(self) -> I2C {
        self.i2c
    }

    /// Brings the chip to a known state: all outputs disabled, all drivers
    /// powered down, crystal load programmed. Call before anything else.
    pub fn init(&mut self, xtal_load: CrystalLoad) -> Result<(), Error> {
        self.enable_outputs(0)?;

        const CLK_CONTROL_REGS: [Register; 8] = [
            Register::Clk0Control,
            Register::Clk1Control,
            Register::Clk2Control,
            Register::Clk3Control,
            Register::Clk4Control,
            Register::Clk5Control,
            Register::Clk6Control,
            Register::Clk7Control,
        ];
        for &reg in CLK_CONTROL_REGS.iter() {
            self.write_register(reg.addr(), ClockControlBits::CLK_PDN.bits())?;
        }

        self.write_register(
            Register::CrystalLoad.addr(),
            (CrystalLoadBits::RESERVED
                | match xtal_load {
                    CrystalLoad::_6 => CrystalLoadBits::CL_6,
                    CrystalLoad::_8 => CrystalLoadBits::CL_8,
                    CrystalLoad::_10 => CrystalLoadBits::CL_10,
                })
            .bits(),
        )
    }

    /// Programs a PLL's feedback divider and pulses the PLL reset.
    ///
    /// The reset register has no per-PLL addressing, so this resets both
    /// PLLs: an already-running channel on the other PLL will glitch.
    pub fn setup_pll(&mut self, pll: Pll, conf: &PllConfig) -> Result<(), Error> {
        let params = SynthParams::for_pll(conf)?;

        // CLK6/CLK7 control registers double as the feedback integer-mode
        // switches for PLL A/B. Assumes those outputs stay unused; they are
        // kept powered down here. The feedback divider must be an even
        // integer for the fast path.
        if conf.allow_integer_mode && conf.num == 0 && conf.mult % 2 == 0 {
            let int_ctl = match pll {
                Pll::A => Register::Clk6Control,
                Pll::B => Register::Clk7Control,
            };
            self.write_register(
                int_ctl.addr(),
                (ClockControlBits::CLK_PDN | ClockControlBits::MS_INT).bits(),
            )?;
        }

        let base = match pll {
            Pll::A => Register::PllABase,
            Pll::B => Register::PllBBase,
        };
        self.write_synth_params(base.addr(), &params)?;

        self.write_register(
            Register::PllReset.addr(),
            (PllResetBits::PLLA_RST | PllResetBits::PLLB_RST).bits(),
        )
    }

    /// Configures output `channel` (0..=2): PLL source, drive strength,
    /// multisynth divider, R divider and phase offset.
    ///
    /// Validation happens before any register write, so a rejected call
    /// leaves the device untouched.
    pub fn setup_output(
        &mut self,
        channel: u8,
        pll: Pll,
        drive: DriveStrength,
        conf: &OutputConfig,
        phase_offset: u8,
    ) -> Result<(), Error> {
        let regs = match CHANNEL_REGS.get(channel as usize) {
            Some(regs) => regs,
            None => return Err(Error::InvalidChannel),
        };

        // div in {4, 6, 8} exists only as an integer mode.
        if !conf.allow_integer_mode && (conf.div < 8 || (conf.div == 8 && conf.num == 0)) {
            return Err(Error::InvalidDivider);
        }

        let params = SynthParams::for_output(conf)?;

        let mut control = ClockControlBits::CLK_SRC_MS
            | match drive {
                DriveStrength::_2 => ClockControlBits::CLK_DRV_2,
                DriveStrength::_4 => ClockControlBits::CLK_DRV_4,
                DriveStrength::_6 => ClockControlBits::CLK_DRV_6,
                DriveStrength::_8 => ClockControlBits::CLK_DRV_8,
            };
        if conf.inverted {
            control |= ClockControlBits::CLK_INV;
        }
        if let Pll::B = pll {
            control |= ClockControlBits::MS_SRC;
        }
        if conf.allow_integer_mode && (conf.num == 0 || conf.div == 4) {
            control |= ClockControlBits::MS_INT;
        }

        self.write_register(regs.control.addr(), control.bits())?;
        self.write_synth_params(regs.synth_base.addr(), &params)?;
        self.write_register(regs.phase.addr(), phase_offset & 0x7F)
    }

    /// Plans and programs CLK0 from PLL A, phase offset 0.
    pub fn setup_clk0(&mut self, fclk: u32, drive: DriveStrength) -> Result<(), Error> {
        let (pll_conf, out_conf) = plan(fclk, self.correction);
        self.setup_pll(Pll::A, &pll_conf)?;
        self.setup_output(0, Pll::A, drive, &out_conf, 0)
    }

    /// Plans and programs CLK2 from PLL B, phase offset 0.
    pub fn setup_clk2(&mut self, fclk: u32, drive: DriveStrength) -> Result<(), Error> {
        let (pll_conf, out_conf) = plan(fclk, self.correction);
        self.setup_pll(Pll::B, &pll_conf)?;
        self.setup_output(2, Pll::B, drive, &out_conf, 0)
    }

    /// Programs CLK0 and CLK2 as a quadrature pair on PLL A: same divider,
    /// phase offsets 0 and `div`, CLK2 lagging CLK0 by a quarter cycle.
    pub fn setup_quadrature(&mut self, fclk: u32, drive: DriveStrength) -> Result<(), Error> {
        let (pll_conf, out_conf) = plan_quadrature(fclk, self.correction);
        self.setup_pll(Pll::A, &pll_conf)?;
        self.setup_output(0, Pll::A, drive, &out_conf, 0)?;
        self.setup_output(2, Pll::A, drive, &out_conf, out_conf.div as u8)
    }

    /// Enables exactly the channels whose bits are set in `mask`, in one
    /// register write. The hardware register holds disable bits, hence the
    /// inversion.
    pub fn enable_outputs(&mut self, mask: u8) -> Result<(), Error> {
        self.write_register(Register::OutputEnable.addr(), !mask)
    }

    fn write_register(&mut self, reg: u8, byte: u8) -> Result<(), Error> {
        self.i2c
            .write(self.address, &[reg, byte])
            .map_err(|_| Error::CommunicationError)
    }

    fn write_synth_params(&mut self, base: u8, params: &SynthParams) -> Result<(), Error> {
        let bytes = params.to_bytes();
        for (i, byte) in bytes.iter().enumerate() {
            self.write_register(base + i as u8, *byte)?;
        }
        Ok(())
    }
}

/*
   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
/*!
A platform agnostic Rust driver for the [Si5351A] dual-PLL clock generator,
based on the [`embedded-hal`] traits.

## The Device

The Silicon Labs [Si5351A] synthesizes up to three output clocks from a
25 MHz crystal through two fractional PLLs and per-channel fractional
multisynth dividers. This driver models CLK0 (from PLL A) and CLK2
(from PLL B) as independent outputs, or CLK0/CLK2 as a quadrature pair
on PLL A.

Configuration is write-only over I²C: the driver plans divider settings
host-side and issues the register writes, it never reads the chip back.

## Usage

Instantiate the driver over any `embedded_hal` blocking I²C implementation,
passing the frequency correction for your particular crystal (the measured
error at 100 MHz, scaled linearly: measure 10 000 097 Hz instead of 10 MHz
and the correction is 970):

```ignore
use si5351a::{CrystalLoad, DriveStrength, Si5351};

let mut clock = Si5351::new(i2c, false, 0);
clock.init(CrystalLoad::_10)?;

// 28 MHz on CLK0, 144 MHz on CLK2
clock.setup_clk0(28_000_000, DriveStrength::_4)?;
clock.setup_clk2(144_000_000, DriveStrength::_4)?;
clock.enable_outputs((1 << 0) | (1 << 2))?;
```

Or drive CLK0/CLK2 as an I/Q pair, 90° apart, for an image-reject mixer:

```ignore
clock.setup_quadrature(7_040_000, DriveStrength::_4)?;
clock.enable_outputs((1 << 0) | (1 << 2))?;
```

[Si5351A]: https://www.silabs.com/documents/public/data-sheets/Si5351-B.pdf
[`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
*/
#![deny(warnings)]
#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
extern crate bitflags;

pub mod device;
pub mod errors;
pub mod frequency;
pub mod registers;

pub use crate::device::{CrystalLoad, DriveStrength, Pll, Si5351};
pub use crate::errors::Error;
pub use crate::frequency::{plan, plan_quadrature, OutputConfig, PllConfig, XTAL_FREQ};
pub use crate::registers::{RDiv, Register, SynthParams, MAX_PARAM};

/*
   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Driver errors.

/// Everything fallible in this crate reports one of these. Errors are
/// surfaced to the caller as values; nothing is retried or logged internally.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// A register write failed on the bus. The remaining writes of the
    /// sequence are skipped, so the device may be left partially configured;
    /// re-run the full channel setup once the bus recovers.
    CommunicationError,
    /// Channel index outside the supported CLK0..CLK2 range.
    InvalidChannel,
    /// Divider/integer-mode combination the hardware cannot express.
    InvalidDivider,
    /// A synth parameter does not fit its 20-bit register field.
    InvalidParameter,
}

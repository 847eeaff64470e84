//! System clock switch

use log::debug;

use super::regs::CFGR;
use super::Rcc;
use crate::family::Family;
use crate::mmio::RegisterBlock;

/// SYSCLK source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sysclk {
    /// HSI
    Hsi = 0b00,
    /// HSE
    Hse = 0b01,
    /// PLL output
    Pll = 0b10,
}

impl Sysclk {
    fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0b00 => Some(Sysclk::Hsi),
            0b01 => Some(Sysclk::Hse),
            0b10 => Some(Sysclk::Pll),
            _ => None,
        }
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Request a SYSCLK source
    ///
    /// The switch completes once the source is stable. Check with
    /// [`system_clock_source`](Self::system_clock_source) or wait with
    /// [`wait_for_sysclk_status`](Self::wait_for_sysclk_status).
    pub fn set_sysclk_source(&mut self, source: Sysclk) {
        debug!("SYSCLK source {:?}", source);
        self.rb.modify_fields(CFGR, CFGR::SW.val(source as u32));
    }

    /// Source SYSCLK currently runs from, as reported by the switch
    /// status. `None` for the encoding the hardware never reports.
    pub fn system_clock_source(&self) -> Option<Sysclk> {
        Sysclk::from_bits(self.rb.fetch::<CFGR::Register>(CFGR).read(CFGR::SWS))
    }

    /// Spin until the switch status reports `source`
    pub fn wait_for_sysclk_status(&self, source: Sysclk) {
        while self.system_clock_source() != Some(source) {}
    }
}

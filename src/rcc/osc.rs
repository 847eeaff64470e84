//! Oscillator control
//!
//! Start, stop and poll the clock sources, acknowledge their ready
//! interrupts, and drive the clock security system.

use embedded_hal::blocking::delay::DelayUs;
use log::{trace, warn};
use void::{ResultVoidExt, Void};

use super::regs::{mask, BDCR, CIR, CR, CSR};
use super::{Error, Osc, Rcc};
use crate::family::Family;
use crate::mmio::RegisterBlock;
use crate::time::MicroSeconds;

/// How long a bounded wait may spin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitBudget {
    /// Give up after this many polls that found the oscillator not ready
    Polls(u32),
    /// Never give up
    Unbounded,
}

impl Osc {
    /// Register and bit that switch the oscillator on
    const fn enable_bit(self) -> (usize, u32) {
        match self {
            Osc::Hsi => (CR, mask(CR::HSION)),
            Osc::Hse => (CR, mask(CR::HSEON)),
            Osc::Pll => (CR, mask(CR::PLLON)),
            Osc::Pll2 => (CR, mask(CR::PLL2ON)),
            Osc::Pll3 => (CR, mask(CR::PLL3ON)),
            Osc::Lse => (BDCR, mask(BDCR::LSEON)),
            Osc::Lsi => (CSR, mask(CSR::LSION)),
        }
    }

    /// Register and bit reporting a stable oscillator
    const fn ready_bit(self) -> (usize, u32) {
        match self {
            Osc::Hsi => (CR, mask(CR::HSIRDY)),
            Osc::Hse => (CR, mask(CR::HSERDY)),
            Osc::Pll => (CR, mask(CR::PLLRDY)),
            Osc::Pll2 => (CR, mask(CR::PLL2RDY)),
            Osc::Pll3 => (CR, mask(CR::PLL3RDY)),
            Osc::Lse => (BDCR, mask(BDCR::LSERDY)),
            Osc::Lsi => (CSR, mask(CSR::LSIRDY)),
        }
    }

    /// Bit of the ready flag in CIR.FLAGS, CIR.IE and CIR.CLEAR
    const fn cir_flag(self) -> u32 {
        1 << match self {
            Osc::Lsi => 0,
            Osc::Lse => 1,
            Osc::Hsi => 2,
            Osc::Hse => 3,
            Osc::Pll => 4,
            Osc::Pll2 => 5,
            Osc::Pll3 => 6,
        }
    }

    /// Register and bit bypassing the crystal amplifier, external
    /// oscillators only
    const fn bypass_bit(self) -> Option<(usize, u32)> {
        match self {
            Osc::Hse => Some((CR, mask(CR::HSEBYP))),
            Osc::Lse => Some((BDCR, mask(BDCR::LSEBYP))),
            _ => None,
        }
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Oscillators missing on this family are a programming error
    fn implemented(osc: Osc) -> bool {
        let implemented = F::has_osc(osc);
        debug_assert!(
            implemented,
            "{:?} is not implemented on {}",
            osc,
            F::NAME
        );
        implemented
    }

    /// Switch an oscillator on. Does not wait for it to become stable
    pub fn osc_on(&mut self, osc: Osc) {
        if Self::implemented(osc) {
            let (offset, bit) = osc.enable_bit();
            trace!("{:?} on", osc);
            self.rb.set_bits(offset, bit);
        }
    }

    /// Switch an oscillator off
    ///
    /// Switching off the oscillator that feeds SYSCLK or the PLL input is
    /// ignored by the hardware.
    pub fn osc_off(&mut self, osc: Osc) {
        if Self::implemented(osc) {
            let (offset, bit) = osc.enable_bit();
            trace!("{:?} off", osc);
            self.rb.clear_bits(offset, bit);
        }
    }

    /// Returns `true` if the oscillator reports stable
    pub fn is_osc_ready(&self, osc: Osc) -> bool {
        let (offset, bit) = osc.ready_bit();
        self.rb.is_set(offset, bit)
    }

    /// Non-blocking poll of the ready bit
    pub fn osc_ready(&self, osc: Osc) -> nb::Result<(), Void> {
        if self.is_osc_ready(osc) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Spin until the oscillator reports stable
    ///
    /// There is no timeout. An oscillator that never starts, such as a
    /// missing crystal, hangs here. See
    /// [`wait_for_osc_ready_bounded`](Self::wait_for_osc_ready_bounded).
    pub fn wait_for_osc_ready(&self, osc: Osc) {
        if Self::implemented(osc) {
            nb::block!(self.osc_ready(osc)).void_unwrap();
        }
    }

    /// Spin until the oscillator reports stopped
    pub fn wait_for_osc_not_ready(&self, osc: Osc) {
        if Self::implemented(osc) {
            let (offset, bit) = osc.ready_bit();
            while self.rb.is_set(offset, bit) {}
        }
    }

    /// Spin until the oscillator reports stable or the budget runs out
    pub fn wait_for_osc_ready_bounded(
        &self,
        osc: Osc,
        budget: WaitBudget,
    ) -> Result<(), Error> {
        if !F::has_osc(osc) {
            return Err(Error::Unsupported(osc));
        }

        let mut polls = 0u32;
        loop {
            if self.is_osc_ready(osc) {
                trace!("{:?} ready after {} polls", osc, polls);
                return Ok(());
            }
            polls = polls.saturating_add(1);
            if let WaitBudget::Polls(max) = budget {
                if polls >= max {
                    warn!("{:?} not ready after {} polls", osc, polls);
                    return Err(Error::Timeout { osc, polls });
                }
            }
        }
    }

    /// Spin until the oscillator reports stable, giving up after
    /// `timeout`. `delay` paces the polls one microsecond apart.
    pub fn wait_for_osc_ready_within<D, T>(
        &self,
        osc: Osc,
        delay: &mut D,
        timeout: T,
    ) -> Result<(), Error>
    where
        D: DelayUs<u32>,
        T: Into<MicroSeconds>,
    {
        if !F::has_osc(osc) {
            return Err(Error::Unsupported(osc));
        }

        let timeout = timeout.into().0;
        let mut polls = 0u32;
        while !self.is_osc_ready(osc) {
            if polls >= timeout {
                warn!("{:?} not ready after {} us", osc, timeout);
                return Err(Error::Timeout { osc, polls });
            }
            delay.delay_us(1);
            polls += 1;
        }
        Ok(())
    }

    /// Enable the ready interrupt of an oscillator
    pub fn osc_ready_int_enable(&mut self, osc: Osc) {
        if Self::implemented(osc) {
            self.rb.set_bits(CIR, osc.cir_flag() << CIR::IE.shift);
        }
    }

    /// Disable the ready interrupt of an oscillator
    pub fn osc_ready_int_disable(&mut self, osc: Osc) {
        if Self::implemented(osc) {
            self.rb.clear_bits(CIR, osc.cir_flag() << CIR::IE.shift);
        }
    }

    /// Acknowledge the ready interrupt of an oscillator
    pub fn osc_ready_int_clear(&mut self, osc: Osc) {
        if Self::implemented(osc) {
            self.rb.set_bits(CIR, osc.cir_flag() << CIR::CLEAR.shift);
        }
    }

    /// Returns `true` if the ready interrupt flag of an oscillator is set
    pub fn osc_ready_int_flag(&self, osc: Osc) -> bool {
        self.rb.fetch::<CIR::Register>(CIR).read(CIR::FLAGS) & osc.cir_flag()
            != 0
    }

    /// Feed an external clock signal in place of the crystal. HSE and
    /// LSE only, and only while the oscillator is off.
    pub fn osc_bypass_enable(&mut self, osc: Osc) {
        if let Some((offset, bit)) = osc.bypass_bit() {
            self.rb.set_bits(offset, bit);
        }
    }

    /// Use the crystal amplifier again. HSE and LSE only
    pub fn osc_bypass_disable(&mut self, osc: Osc) {
        if let Some((offset, bit)) = osc.bypass_bit() {
            self.rb.clear_bits(offset, bit);
        }
    }

    /// Enable the clock security system on HSE
    pub fn css_enable(&mut self) {
        self.rb.modify_fields(CR, CR::CSSON::SET);
    }

    /// Disable the clock security system
    pub fn css_disable(&mut self) {
        self.rb.modify_fields(CR, CR::CSSON::CLEAR);
    }

    /// Acknowledge the clock security system interrupt
    pub fn css_int_clear(&mut self) {
        self.rb.modify_fields(CIR, CIR::CSSC::SET);
    }

    /// Returns `true` if the clock security system detected an HSE failure
    pub fn css_int_flag(&self) -> bool {
        self.rb.fetch::<CIR::Register>(CIR).is_set(CIR::CSSF)
    }
}

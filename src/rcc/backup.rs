//! Backup domain and RTC clock
//!
//! BDCR lives in the backup domain. Writes to it are ignored unless the
//! DBP bit in the power controller has been set beforehand, and RTCSEL
//! can only be changed again after a backup domain reset.

use log::debug;

use super::regs::BDCR;
use super::{Osc, Rcc};
use crate::family::Family;
use crate::mmio::RegisterBlock;

/// RTC clock source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtcClock {
    /// No clock, the RTC is stopped
    NoClock = 0b00,
    /// LSE
    Lse = 0b01,
    /// LSI
    Lsi = 0b10,
    /// HSE divided by 128 (F1) or 32 (F3)
    HseDiv = 0b11,
}

impl RtcClock {
    fn osc(self) -> Option<Osc> {
        match self {
            RtcClock::NoClock => None,
            RtcClock::Lse => Some(Osc::Lse),
            RtcClock::Lsi => Some(Osc::Lsi),
            RtcClock::HseDiv => Some(Osc::Hse),
        }
    }

    fn from_bits(bits: u32) -> Self {
        match bits {
            0b01 => RtcClock::Lse,
            0b10 => RtcClock::Lsi,
            0b11 => RtcClock::HseDiv,
            _ => RtcClock::NoClock,
        }
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Reset the backup domain: RTC, backup registers and BDCR itself
    pub fn backup_domain_reset(&mut self) {
        debug!("backup domain reset");
        self.rb.modify_fields(BDCR, BDCR::BDRST::SET);
        self.rb.modify_fields(BDCR, BDCR::BDRST::CLEAR);
    }

    /// Start the oscillator behind `source`, wait for it and route it to
    /// the RTC
    ///
    /// The wait is unbounded. Does not enable the RTC clock.
    pub fn set_rtc_clock_source(&mut self, source: RtcClock) {
        if let Some(osc) = source.osc() {
            self.osc_on(osc);
            self.wait_for_osc_ready(osc);
        }
        debug!("RTC clock {:?}", source);
        self.rb.modify_fields(BDCR, BDCR::RTCSEL.val(source as u32));
    }

    /// Current RTC clock source
    pub fn rtc_clock_source(&self) -> RtcClock {
        RtcClock::from_bits(
            self.rb.fetch::<BDCR::Register>(BDCR).read(BDCR::RTCSEL),
        )
    }

    /// Enable the RTC clock
    pub fn enable_rtc_clock(&mut self) {
        self.rb.modify_fields(BDCR, BDCR::RTCEN::SET);
    }

    /// Disable the RTC clock
    pub fn disable_rtc_clock(&mut self) {
        self.rb.modify_fields(BDCR, BDCR::RTCEN::CLEAR);
    }

    /// Returns `true` if the RTC clock is enabled
    pub fn rtc_clock_enabled(&self) -> bool {
        self.rb.fetch::<BDCR::Register>(BDCR).is_set(BDCR::RTCEN)
    }
}

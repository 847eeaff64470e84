//! Reset source identification from the CSR flags

use core::fmt;

use super::regs::{mask, CSR};
use super::Rcc;
use crate::family::Family;
use crate::mmio::RegisterBlock;

/// Gives the reason why the mcu was reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetReason {
    /// The mcu went from not having power to having power and resetting
    PowerOn,
    /// The reset pin was asserted
    Pin,
    /// The software requested a reset through the SCB
    Software,
    /// The independent watchdog triggered
    IndependentWatchdog,
    /// The window watchdog triggered
    WindowWatchdog,
    /// Either of the two watchdogs triggered
    GenericWatchdog,
    /// Entering Standby or Stop with the low power reset option byte set
    LowPower,
    /// Option bytes were reloaded (F3)
    OptionByteLoader,
    /// The reason could not be determined
    Unknown {
        /// The raw register value
        csr: u32,
    },
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResetReason::PowerOn => write!(f, "Power-on reset"),
            ResetReason::Pin => write!(f, "Pin reset (NRST)"),
            ResetReason::Software => write!(f, "Software reset (SYSRESETREQ)"),
            ResetReason::IndependentWatchdog => write!(f, "IWDG reset"),
            ResetReason::WindowWatchdog => write!(f, "WWDG reset"),
            ResetReason::GenericWatchdog => write!(f, "IWDG or WWDG reset"),
            ResetReason::LowPower => write!(f, "Low-power reset"),
            ResetReason::OptionByteLoader => {
                write!(f, "Option byte loader reset")
            }
            ResetReason::Unknown { csr } => write!(
                f,
                "Could not determine the cause. RCC CSR bits were 0x{:X}",
                csr
            ),
        }
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Reason of the last reset
    ///
    /// The flags accumulate across resets until
    /// [`clear_reset_flags`](Rcc::clear_reset_flags) is called. Internal
    /// resets also drive NRST, so the pin flag is ignored next to any
    /// other flag.
    #[rustfmt::skip]
    pub fn reset_reason(&self) -> ResetReason {
        let csr = self.rb.fetch::<CSR::Register>(CSR);

        match (
            csr.is_set(CSR::LPWRRSTF),
            csr.is_set(CSR::WWDGRSTF),
            csr.is_set(CSR::IWDGRSTF),
            csr.is_set(CSR::SFTRSTF),
            csr.is_set(CSR::PORRSTF),
            csr.is_set(CSR::PINRSTF),
            csr.is_set(CSR::OBLRSTF),
        ) {
            (false, false, false, false, true, _, false) => ResetReason::PowerOn,
            (false, false, false, false, false, true, false) => ResetReason::Pin,
            (false, false, false, true, false, _, false) => ResetReason::Software,
            (false, false, true, false, false, _, false) => ResetReason::IndependentWatchdog,
            (false, true, false, false, false, _, false) => ResetReason::WindowWatchdog,
            (false, true, true, false, false, _, false) => ResetReason::GenericWatchdog,
            (true, false, false, false, false, _, false) => ResetReason::LowPower,
            (false, false, false, false, false, _, true) => ResetReason::OptionByteLoader,
            _ => ResetReason::Unknown {
                csr: csr.get() & mask(CSR::RESET_FLAGS),
            },
        }
    }

    /// Clear every reset flag
    pub fn clear_reset_flags(&mut self) {
        self.rb.modify_fields(CSR, CSR::RMVF::SET);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::F1;
    use crate::mock::MockRegisters;

    fn reason(flags: u32) -> ResetReason {
        let regs = MockRegisters::new();
        regs.preload(CSR, flags);
        Rcc::<_, F1>::new(&regs).reset_reason()
    }

    #[test]
    fn decode_flags() {
        let por = mask(CSR::PORRSTF);
        let pin = mask(CSR::PINRSTF);
        let sft = mask(CSR::SFTRSTF);
        let iwdg = mask(CSR::IWDGRSTF);
        let wwdg = mask(CSR::WWDGRSTF);

        assert_eq!(reason(por | pin), ResetReason::PowerOn);
        assert_eq!(reason(pin), ResetReason::Pin);
        assert_eq!(reason(sft | pin), ResetReason::Software);
        assert_eq!(reason(iwdg), ResetReason::IndependentWatchdog);
        assert_eq!(reason(wwdg | iwdg | pin), ResetReason::GenericWatchdog);
        assert_eq!(reason(mask(CSR::LPWRRSTF)), ResetReason::LowPower);
        assert_eq!(
            reason(mask(CSR::OBLRSTF)),
            ResetReason::OptionByteLoader
        );
        assert_eq!(reason(0), ResetReason::Unknown { csr: 0 });
        // Flags from two resets that were never cleared
        assert_eq!(
            reason(sft | iwdg | mask(CSR::LSION)),
            ResetReason::Unknown { csr: sft | iwdg }
        );
    }

    #[test]
    fn clear_flags() {
        let regs = MockRegisters::rcc();
        let mut rcc = Rcc::<_, F1>::new(&regs);
        assert_eq!(rcc.reset_reason(), ResetReason::PowerOn);

        rcc.clear_reset_flags();
        assert_eq!(regs.peek(CSR) & mask(CSR::RESET_FLAGS), 0);
        assert_eq!(regs.peek(CSR) & mask(CSR::RMVF), 0);
        assert_eq!(rcc.reset_reason(), ResetReason::Unknown { csr: 0 });
    }

    #[test]
    fn display() {
        assert_eq!(
            format!("{}", ResetReason::Unknown { csr: 0x0c00_0000 }),
            "Could not determine the cause. RCC CSR bits were 0xC000000"
        );
        assert_eq!(format!("{}", ResetReason::Pin), "Pin reset (NRST)");
    }
}

//! Flash memory interface
//!
//! Only the access control register is driven here: wait states and the
//! prefetch buffer, which must follow the SYSCLK frequency.

use log::debug;

use tock_registers::register_bitfields;

use crate::family::Family;
use crate::mmio::{Mmio, RegisterBlock};
use crate::time::Hertz;

/// Access control register
pub const ACR: usize = 0x00;

register_bitfields![u32,
    ACR [
        /// Prefetch buffer status
        PRFTBS OFFSET(5) NUMBITS(1) [],
        /// Prefetch buffer enable
        PRFTBE OFFSET(4) NUMBITS(1) [],
        /// Flash half cycle access enable
        HLFCYA OFFSET(3) NUMBITS(1) [],
        /// Wait states
        LATENCY OFFSET(0) NUMBITS(3) []
    ]
];

/// Flash wait states
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Latency {
    /// Zero wait states, SYSCLK up to 24 MHz
    Ws0 = 0,
    /// One wait state, SYSCLK up to 48 MHz
    Ws1 = 1,
    /// Two wait states, SYSCLK up to 72 MHz
    Ws2 = 2,
}

impl Latency {
    /// Fewest wait states that allow `sysclk`
    pub fn for_sysclk(sysclk: Hertz) -> Self {
        match sysclk.0 {
            0..=24_000_000 => Latency::Ws0,
            24_000_001..=48_000_000 => Latency::Ws1,
            _ => Latency::Ws2,
        }
    }
}

/// Flash memory interface
pub struct Flash<R> {
    rb: R,
}

impl Flash<Mmio> {
    /// Flash interface at the family's fixed address
    ///
    /// # Safety
    ///
    /// Only one `Flash` may exist for the device.
    pub unsafe fn steal<F: Family>() -> Self {
        Flash::new(Mmio::new(F::FLASH_BASE))
    }
}

impl<R: RegisterBlock> Flash<R> {
    /// Flash interface over `rb`
    pub fn new(rb: R) -> Self {
        Flash { rb }
    }

    /// Release the register block
    pub fn free(self) -> R {
        self.rb
    }

    /// Set the number of wait states
    ///
    /// Raise before increasing SYSCLK, lower only after decreasing it.
    pub fn set_latency(&mut self, latency: Latency) {
        debug!("flash latency {:?}", latency);
        self.rb.modify_fields(ACR, ACR::LATENCY.val(latency as u32));
    }

    /// Current number of wait states
    pub fn latency(&self) -> u32 {
        self.rb.fetch::<ACR::Register>(ACR).read(ACR::LATENCY)
    }

    /// Enable the prefetch buffer
    pub fn enable_prefetch(&mut self) {
        self.rb.modify_fields(ACR, ACR::PRFTBE::SET);
    }

    /// Disable the prefetch buffer
    pub fn disable_prefetch(&mut self) {
        self.rb.modify_fields(ACR, ACR::PRFTBE::CLEAR);
    }

    /// Returns `true` if the prefetch buffer is running
    pub fn prefetch_active(&self) -> bool {
        self.rb.fetch::<ACR::Register>(ACR).is_set(ACR::PRFTBS)
    }

    /// Enable half cycle access. Only allowed with SYSCLK from HSI or
    /// HSE without AHB division, at zero wait states
    pub fn enable_half_cycle(&mut self) {
        self.rb.modify_fields(ACR, ACR::HLFCYA::SET);
    }

    /// Disable half cycle access
    pub fn disable_half_cycle(&mut self) {
        self.rb.modify_fields(ACR, ACR::HLFCYA::CLEAR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRegisters;

    #[test]
    fn latency_for_frequency() {
        assert_eq!(Latency::for_sysclk(Hertz(8_000_000)), Latency::Ws0);
        assert_eq!(Latency::for_sysclk(Hertz(24_000_000)), Latency::Ws0);
        assert_eq!(Latency::for_sysclk(Hertz(48_000_000)), Latency::Ws1);
        assert_eq!(Latency::for_sysclk(Hertz(64_000_000)), Latency::Ws2);
        assert_eq!(Latency::for_sysclk(Hertz(72_000_000)), Latency::Ws2);
    }

    #[test]
    fn acr_fields() {
        let regs = MockRegisters::new();
        // Reset value: prefetch enabled and running
        regs.preload(ACR, 0x30);
        let mut flash = Flash::new(&regs);

        flash.set_latency(Latency::Ws2);
        assert_eq!(regs.peek(ACR), 0x32);
        assert_eq!(flash.latency(), 2);
        assert!(flash.prefetch_active());

        flash.disable_prefetch();
        flash.enable_half_cycle();
        assert_eq!(regs.peek(ACR), 0x2a);
        flash.disable_half_cycle();
        flash.enable_prefetch();
        flash.set_latency(Latency::Ws0);
        assert_eq!(regs.peek(ACR), 0x30);
    }
}

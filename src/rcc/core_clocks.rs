//! Core clock record and peripheral frequency queries

use super::regs::{CFGR, CFGR3};
use super::{Ppre, Rcc};
use crate::family::{Bus, Family, KernelClock};
use crate::mmio::RegisterBlock;
use crate::time::Hertz;

/// Frequencies of the core clocks
///
/// Recorded by the composed clock setups, or handed to
/// [`Rcc::set_frequencies`] by code that programs the tree itself. The
/// record is not read back from hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTree {
    sysclk: Hertz,
    ahb: Hertz,
    apb1: Hertz,
    apb2: Hertz,
}

impl ClockTree {
    /// A record of explicit frequencies
    pub const fn new(sysclk: Hertz, ahb: Hertz, apb1: Hertz, apb2: Hertz) -> Self {
        ClockTree {
            sysclk,
            ahb,
            apb1,
            apb2,
        }
    }

    /// Everything running from HSI undivided, the state after reset
    pub const fn reset(hsi: Hertz) -> Self {
        ClockTree::new(hsi, hsi, hsi, hsi)
    }

    /// Returns the frequency of SYSCLK
    pub fn sysclk(&self) -> Hertz {
        self.sysclk
    }

    /// Returns the frequency of the AHB
    pub fn ahb(&self) -> Hertz {
        self.ahb
    }

    /// Returns the frequency of the AHB, `hclk`
    pub fn hclk(&self) -> Hertz {
        self.ahb
    }

    /// Returns the frequency of the APB1
    pub fn apb1(&self) -> Hertz {
        self.apb1
    }

    /// Returns the frequency of the APB1, `pclk1`
    pub fn pclk1(&self) -> Hertz {
        self.apb1
    }

    /// Returns the frequency of the APB2
    pub fn apb2(&self) -> Hertz {
        self.apb2
    }

    /// Returns the frequency of the APB2, `pclk2`
    pub fn pclk2(&self) -> Hertz {
        self.apb2
    }

    fn bus(&self, bus: Bus) -> Hertz {
        match bus {
            Bus::Ahb => self.ahb,
            Bus::Apb1 => self.apb1,
            Bus::Apb2 => self.apb2,
        }
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Kernel clock of a timer
    ///
    /// Timers run at twice their bus frequency whenever that bus is
    /// divided. The prescaler is read back from hardware, the bus
    /// frequency comes from the clock record.
    pub fn timer_clk_freq(&self, timer: usize) -> Hertz {
        let bus = F::bus_of(timer);
        let cfgr = self.rb.fetch::<CFGR::Register>(CFGR);
        let ppre = match bus {
            Bus::Apb1 => Ppre::from_bits(cfgr.read(CFGR::PPRE1)),
            Bus::Apb2 => Ppre::from_bits(cfgr.read(CFGR::PPRE2)),
            Bus::Ahb => Ppre::Div1,
        };
        Hertz(
            self.clocks
                .bus(bus)
                .0
                .saturating_mul(ppre.timer_multiplier()),
        )
    }

    /// Kernel clock of a USART or UART
    pub fn usart_clk_freq(&self, usart: usize) -> Hertz {
        let kernel = if F::HAS_CFGR3 {
            F::usart_kernel(usart, self.rb.fetch(CFGR3))
        } else {
            KernelClock::Pclk
        };
        self.kernel_freq(kernel, usart)
    }

    /// Kernel clock of an I2C
    pub fn i2c_clk_freq(&self, i2c: usize) -> Hertz {
        let kernel = if F::HAS_CFGR3 {
            F::i2c_kernel(i2c, self.rb.fetch(CFGR3))
        } else {
            KernelClock::Pclk
        };
        self.kernel_freq(kernel, i2c)
    }

    /// Kernel clock of an SPI
    pub fn spi_clk_freq(&self, spi: usize) -> Hertz {
        self.clocks.bus(F::bus_of(spi))
    }

    fn kernel_freq(&self, kernel: KernelClock, base: usize) -> Hertz {
        match kernel {
            KernelClock::Pclk => self.clocks.bus(F::bus_of(base)),
            KernelClock::Sysclk => self.clocks.sysclk,
            KernelClock::Lse => F::LSE,
            KernelClock::Hsi => F::HSI,
        }
    }
}

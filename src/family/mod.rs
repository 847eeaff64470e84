//! Device families
//!
//! Each register generation of the RCC gets one zero sized type
//! implementing [`Family`]. The type decides which oscillators exist,
//! how the PLL multiplier field decodes, where peripherals sit on the
//! busses and which optional fields (ADCPRE, CFGR2, CFGR3) are present.
//!
//! Families also carry their canned [`ClockScale`](crate::rcc::ClockScale)
//! tables and the peripheral clock descriptors used with
//! [`Rcc::peripheral_clock_enable`](crate::rcc::Rcc::peripheral_clock_enable).

use tock_registers::fields::Field;
use tock_registers::LocalRegisterCopy;

use crate::rcc::regs::{CFGR, CFGR3};
use crate::rcc::{Multiplier, Osc};
use crate::time::Hertz;

/// Declare one [`PeripheralClock`](crate::rcc::PeripheralClock) constant
/// per peripheral, grouped by enable register
macro_rules! peripheral_clocks {
    ($($reg:ident: [$($name:ident = $bit:literal),+ $(,)?];)+) => {
        paste::paste! {
            $($(
                #[doc = "`" $name "` clock enable"]
                pub const $name: crate::rcc::PeripheralClock =
                    crate::rcc::PeripheralClock::new(
                        crate::rcc::EnableRegister::$reg, $bit);
            )+)+
        }
    };
}

/// Declare one [`PeripheralReset`](crate::rcc::PeripheralReset) constant
/// per peripheral, grouped by reset register
macro_rules! peripheral_resets {
    ($($reg:ident: [$($name:ident = $bit:literal),+ $(,)?];)+) => {
        paste::paste! {
            $($(
                #[doc = "`" $name "` reset line"]
                pub const $name: crate::rcc::PeripheralReset =
                    crate::rcc::PeripheralReset::new(
                        crate::rcc::ResetRegister::$reg, $bit);
            )+)+
        }
    };
}

pub mod f1;
pub mod f3;

pub use f1::{F1Connectivity, F1};
pub use f3::F3;

/// Bus a peripheral is clocked from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bus {
    /// AHB, `hclk`
    Ahb,
    /// APB1, `pclk1`
    Apb1,
    /// APB2, `pclk2`
    Apb2,
}

/// Kernel clock of a peripheral with its own clock switch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KernelClock {
    /// The clock of the bus the peripheral sits on
    Pclk,
    /// SYSCLK
    Sysclk,
    /// LSE
    Lse,
    /// HSI
    Hsi,
}

/// A register generation of the RCC
pub trait Family {
    /// Human readable family name
    const NAME: &'static str;

    /// RCC register block
    const RCC_BASE: usize = 0x4002_1000;

    /// Flash memory interface register block
    const FLASH_BASE: usize = 0x4002_2000;

    /// Internal high speed oscillator
    const HSI: Hertz = Hertz(8_000_000);

    /// Internal low speed oscillator, typical
    const LSI: Hertz = Hertz(40_000);

    /// Low speed external crystal
    const LSE: Hertz = Hertz(32_768);

    /// Oscillators implemented by this family
    const OSCILLATORS: &'static [Osc];

    /// CFGR has the ADCPRE field
    const HAS_ADCPRE: bool;

    /// The PLL input divider is PREDIV1 in CFGR2 rather than PLLXTPRE
    const HAS_PREDIV1: bool;

    /// CFGR3 kernel clock switches exist
    const HAS_CFGR3: bool = false;

    /// The MCO field
    const MCO: Field<u32, CFGR::Register>;

    /// Returns `true` if `osc` exists on this family
    fn has_osc(osc: Osc) -> bool {
        Self::OSCILLATORS.contains(&osc)
    }

    /// Decode the PLLMUL field. `None` for reserved encodings
    fn pll_multiplier(bits: u32) -> Option<Multiplier>;

    /// Bus a peripheral at `base` sits on
    fn bus_of(base: usize) -> Bus {
        match base {
            0x4000_0000..=0x4000_ffff => Bus::Apb1,
            0x4001_0000..=0x4001_7fff => Bus::Apb2,
            _ => Bus::Ahb,
        }
    }

    /// Kernel clock of the USART at `base`, given the CFGR3 value
    fn usart_kernel(
        _base: usize,
        _cfgr3: LocalRegisterCopy<u32, CFGR3::Register>,
    ) -> KernelClock {
        KernelClock::Pclk
    }

    /// Kernel clock of the I2C at `base`, given the CFGR3 value
    fn i2c_kernel(
        _base: usize,
        _cfgr3: LocalRegisterCopy<u32, CFGR3::Register>,
    ) -> KernelClock {
        KernelClock::Pclk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_map_follows_memory_map() {
        assert_eq!(F1::bus_of(f1::TIM2_BASE), Bus::Apb1);
        assert_eq!(F1::bus_of(f1::TIM1_BASE), Bus::Apb2);
        assert_eq!(F1::bus_of(f1::USART1_BASE), Bus::Apb2);
        assert_eq!(F1::bus_of(f1::SPI2_BASE), Bus::Apb1);
        assert_eq!(F1::bus_of(0x4001_8000), Bus::Ahb); // SDIO
        assert_eq!(F3::bus_of(0x4800_0000), Bus::Ahb); // GPIOA
    }

    #[test]
    fn oscillator_sets() {
        assert!(F1::has_osc(Osc::Hse));
        assert!(!F1::has_osc(Osc::Pll2));
        assert!(F1Connectivity::has_osc(Osc::Pll3));
        assert!(!F3::has_osc(Osc::Pll2));
    }
}

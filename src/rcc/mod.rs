//! Reset and Clock Control
//!
//! This module drives the RCC of the STM32F1 and STM32F3 families: the
//! oscillators (HSI, HSE, LSI, LSE, PLL and on the connectivity line PLL2
//! and PLL3), the PLL input selection and multiplier, the system clock
//! switch, the AHB/APB/ADC/USB prescalers and the peripheral clock
//! enable and reset lines.
//!
//! HSI is 8 MHz on every supported family. After reset SYSCLK runs from
//! HSI and every prescaler divides by one, so AHB, APB1 and APB2 all run
//! at 8 MHz.
//!
//! # Usage
//!
//! [`Rcc`] wraps a [`RegisterBlock`] and remembers the frequencies it
//! configured in a [`ClockTree`]. Low level operations map one to one on
//! register fields; they do not check that the hardware is in a state
//! where the write takes effect. The PLL fields for instance are
//! ignored by the hardware while the PLL runs.
//!
//! The composed routines take care of the ordering. They start the
//! oscillator, program the prescalers and flash wait states, reprogram
//! the PLL while it is stopped, switch SYSCLK over and then record the
//! resulting frequencies.
//!
//! ```ignore
//!     let mut rcc = unsafe { Rcc::<_, F1>::steal() };
//!     let mut flash = unsafe { Flash::steal::<F1>() };
//!
//!     rcc.clock_setup_in_hse_8mhz_out_72mhz(&mut flash);
//!
//!     // Runtime confirmation that hclk really is 72MHz
//!     assert_eq!(rcc.clocks().ahb().0, 72_000_000);
//! ```
//!
//! A canned table entry can be tweaked before use:
//!
//! ```ignore
//!     let mut scale = f1::HSE_CONFIGS[f1::HseClock::In8Out72 as usize];
//!     scale.ppre2 = Ppre::Div2;
//!     scale.apb2_frequency = 36.mhz().into();
//!     rcc.clock_setup_pll(&mut flash, &scale);
//! ```
//!
//! # Peripherals
//!
//! Peripheral clocks are switched with descriptors from the family
//! module, for example `rcc.peripheral_clock_enable(f1::GPIOA)`.

use core::fmt;
use core::marker::PhantomData;

use crate::family::Family;
use crate::mmio::{Mmio, RegisterBlock};

mod backup;
mod core_clocks;
mod osc;
mod pll;
mod prescaler;
mod rec;
pub mod regs;
mod reset_reason;
mod setup;
mod sysclk;

pub use backup::RtcClock;
pub use core_clocks::ClockTree;
pub use osc::WaitBudget;
pub use pll::{
    Multiplier, Pll23Mul, Pll2Config, PllConfig, PllMul, PllSource, PllXtpre,
    Prediv, Prediv1Source,
};
pub use prescaler::{Adcpre, Hpre, Mco, Ppre, Usbpre};
pub use rec::{EnableRegister, PeripheralClock, PeripheralReset, ResetRegister};
pub use reset_reason::ResetReason;
pub use setup::ClockScale;
pub use sysclk::Sysclk;

#[cfg(feature = "stm32f3")]
/// Family used when `Rcc` is named without one
pub type DefaultFamily = crate::family::F3;
#[cfg(all(feature = "stm32f105", not(feature = "stm32f3")))]
/// Family used when `Rcc` is named without one
pub type DefaultFamily = crate::family::F1Connectivity;
#[cfg(not(any(feature = "stm32f3", feature = "stm32f105")))]
/// Family used when `Rcc` is named without one
pub type DefaultFamily = crate::family::F1;

/// Oscillators and PLLs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Osc {
    /// Internal high speed RC oscillator
    Hsi,
    /// High speed external crystal or clock
    Hse,
    /// Internal low speed RC oscillator
    Lsi,
    /// Low speed external crystal or clock
    Lse,
    /// Main PLL
    Pll,
    /// PLL2, connectivity line only
    Pll2,
    /// PLL3, connectivity line only
    Pll3,
}

/// RCC errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An oscillator did not report ready within the wait budget
    Timeout {
        /// The oscillator waited on
        osc: Osc,
        /// Number of failed polls
        polls: u32,
    },
    /// The oscillator does not exist on this family
    Unsupported(Osc),
    /// A computed frequency does not fit 32 bits
    FrequencyOverflow,
    /// A multiplier encoding is reserved on this family
    InvalidMultiplier,
    /// A configuration sources the PLL from HSE without stating its frequency
    HseFrequencyUnknown,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Timeout { osc, polls } => {
                write!(f, "{:?} not ready after {} polls", osc, polls)
            }
            Error::Unsupported(osc) => {
                write!(f, "{:?} is not implemented on this device", osc)
            }
            Error::FrequencyOverflow => write!(f, "frequency overflows u32"),
            Error::InvalidMultiplier => {
                write!(f, "reserved multiplier encoding")
            }
            Error::HseFrequencyUnknown => {
                write!(f, "PLL sourced from HSE of unknown frequency")
            }
        }
    }
}

/// Reset and Clock Control driver
///
/// Owns the register block and the record of the frequencies it has
/// configured. There should be exactly one per device.
pub struct Rcc<R, F = DefaultFamily> {
    pub(crate) rb: R,
    clocks: ClockTree,
    _family: PhantomData<F>,
}

impl<F: Family> Rcc<Mmio, F> {
    /// Driver for the RCC at the family's fixed address
    ///
    /// # Safety
    ///
    /// Only one `Rcc` may exist for the device. The clock record starts
    /// from the reset state, so call this before anything reprograms the
    /// clock tree.
    pub unsafe fn steal() -> Self {
        Self::new(Mmio::new(F::RCC_BASE))
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Driver over `rb`. The clock record starts from the reset state
    pub fn new(rb: R) -> Self {
        Rcc {
            rb,
            clocks: ClockTree::reset(F::HSI),
            _family: PhantomData,
        }
    }

    /// Release the register block
    pub fn free(self) -> R {
        self.rb
    }

    /// Frequencies recorded by the last composed clock setup
    pub fn clocks(&self) -> ClockTree {
        self.clocks
    }

    /// Overwrite the clock record
    ///
    /// For callers that program the tree with the low level operations
    /// and want the frequency queries to stay truthful.
    pub fn set_frequencies(&mut self, clocks: ClockTree) {
        self.clocks = clocks;
    }
}

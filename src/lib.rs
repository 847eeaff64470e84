//! Reset and Clock Control for STM32F1 and STM32F3 microcontrollers
//!
//! The [`rcc`] module drives the clock tree through a
//! [`RegisterBlock`](mmio::RegisterBlock). A [`Family`](family::Family)
//! type parameter selects the register generation; the `stm32f1`,
//! `stm32f105` and `stm32f3` features only choose which family
//! [`rcc::DefaultFamily`] names.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub use embedded_hal as hal;

pub use nb;
pub use nb::block;

pub mod family;
pub mod flash;
pub mod mmio;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod prelude;
pub mod rcc;
pub mod time;

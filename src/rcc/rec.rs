//! Peripheral clock gates and reset lines
//!
//! Every peripheral driver turns its bus clock on through a
//! [`PeripheralClock`] descriptor before touching its own registers. The
//! descriptors are constants in the family modules, for example
//! [`f1::USART1`](crate::family::f1::USART1).

use log::trace;

use super::regs::{
    AHBENR, AHBRSTR, APB1ENR, APB1RSTR, APB2ENR, APB2RSTR,
};
use super::Rcc;
use crate::family::Family;
use crate::mmio::RegisterBlock;

/// Clock enable registers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnableRegister {
    /// AHBENR
    Ahb,
    /// APB1ENR
    Apb1,
    /// APB2ENR
    Apb2,
}

impl EnableRegister {
    /// Register offset
    pub const fn offset(self) -> usize {
        match self {
            EnableRegister::Ahb => AHBENR,
            EnableRegister::Apb1 => APB1ENR,
            EnableRegister::Apb2 => APB2ENR,
        }
    }
}

/// Reset registers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetRegister {
    /// AHBRSTR, connectivity line and F3
    Ahb,
    /// APB1RSTR
    Apb1,
    /// APB2RSTR
    Apb2,
}

impl ResetRegister {
    /// Register offset
    pub const fn offset(self) -> usize {
        match self {
            ResetRegister::Ahb => AHBRSTR,
            ResetRegister::Apb1 => APB1RSTR,
            ResetRegister::Apb2 => APB2RSTR,
        }
    }
}

/// Clock enable bit of one peripheral
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralClock {
    /// Register holding the bit
    pub register: EnableRegister,
    /// Bit position
    pub bit: u8,
}

impl PeripheralClock {
    /// Descriptor for `bit` of `register`
    pub const fn new(register: EnableRegister, bit: u8) -> Self {
        PeripheralClock { register, bit }
    }

    const fn mask(self) -> u32 {
        1 << self.bit
    }
}

/// Reset bit of one peripheral
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralReset {
    /// Register holding the bit
    pub register: ResetRegister,
    /// Bit position
    pub bit: u8,
}

impl PeripheralReset {
    /// Descriptor for `bit` of `register`
    pub const fn new(register: ResetRegister, bit: u8) -> Self {
        PeripheralReset { register, bit }
    }

    const fn mask(self) -> u32 {
        1 << self.bit
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Enable the bus clock of a peripheral
    pub fn peripheral_clock_enable(&mut self, clock: PeripheralClock) {
        trace!("enable {:?} bit {}", clock.register, clock.bit);
        self.rb.set_bits(clock.register.offset(), clock.mask());
    }

    /// Disable the bus clock of a peripheral
    pub fn peripheral_clock_disable(&mut self, clock: PeripheralClock) {
        trace!("disable {:?} bit {}", clock.register, clock.bit);
        self.rb.clear_bits(clock.register.offset(), clock.mask());
    }

    /// Returns `true` if the bus clock of a peripheral is enabled
    pub fn is_peripheral_clock_enabled(&self, clock: PeripheralClock) -> bool {
        self.rb.is_set(clock.register.offset(), clock.mask())
    }

    /// Assert then release the reset line of a peripheral
    pub fn peripheral_reset_pulse(&mut self, reset: PeripheralReset) {
        self.peripheral_reset_hold(reset);
        self.peripheral_reset_release(reset);
    }

    /// Hold a peripheral in reset
    pub fn peripheral_reset_hold(&mut self, reset: PeripheralReset) {
        self.rb.set_bits(reset.register.offset(), reset.mask());
    }

    /// Release a peripheral from reset
    pub fn peripheral_reset_release(&mut self, reset: PeripheralReset) {
        self.rb.clear_bits(reset.register.offset(), reset.mask());
    }
}

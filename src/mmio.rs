//! Memory mapped register access
//!
//! Drivers in this crate never touch an address directly. They talk to a
//! [`RegisterBlock`], addressed by byte offset from the start of the
//! peripheral. On silicon that is [`Mmio`]; on the host it is
//! [`MockRegisters`](crate::mock::MockRegisters). Bitfields are declared
//! with `register_bitfields!` and applied to a [`LocalRegisterCopy`] of
//! the register, so the same field definitions serve both.

use tock_registers::fields::FieldValue;
use tock_registers::{LocalRegisterCopy, RegisterLongName};

/// A block of 32-bit registers addressed by byte offset
pub trait RegisterBlock {
    /// Read the register at `offset`
    fn read(&self, offset: usize) -> u32;

    /// Write `value` to the register at `offset`
    fn write(&self, offset: usize, value: u32);

    /// Read-modify-write the register at `offset`
    fn modify<F>(&self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    /// Set every bit of `mask`, leaving the others
    fn set_bits(&self, offset: usize, mask: u32) {
        self.modify(offset, |r| r | mask);
    }

    /// Clear every bit of `mask`, leaving the others
    fn clear_bits(&self, offset: usize, mask: u32) {
        self.modify(offset, |r| r & !mask);
    }

    /// Returns `true` if any bit of `mask` is set
    fn is_set(&self, offset: usize, mask: u32) -> bool {
        self.read(offset) & mask != 0
    }

    /// Copy of the register at `offset`, decoded with the bitfields of `B`
    fn fetch<B: RegisterLongName>(
        &self,
        offset: usize,
    ) -> LocalRegisterCopy<u32, B> {
        LocalRegisterCopy::new(self.read(offset))
    }

    /// Write the fields named in `fields`, leaving the rest of the
    /// register untouched
    fn modify_fields<B: RegisterLongName>(
        &self,
        offset: usize,
        fields: FieldValue<u32, B>,
    ) {
        self.modify(offset, |bits| {
            let mut copy = LocalRegisterCopy::<u32, B>::new(bits);
            copy.modify(fields);
            copy.get()
        });
    }
}

impl<T: RegisterBlock> RegisterBlock for &T {
    fn read(&self, offset: usize) -> u32 {
        T::read(self, offset)
    }

    fn write(&self, offset: usize, value: u32) {
        T::write(self, offset, value)
    }

    fn modify<F>(&self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        T::modify(self, offset, f)
    }
}

/// Volatile access to a register block at a fixed address
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Register block starting at `base`
    ///
    /// # Safety
    ///
    /// `base` must be the address of a peripheral register block that
    /// stays mapped for the lifetime of the returned value, and no other
    /// code may be programming the same registers concurrently.
    pub const unsafe fn new(base: usize) -> Self {
        Mmio { base }
    }

    /// Start address of the block
    pub fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBlock for Mmio {
    fn read(&self, offset: usize) -> u32 {
        // NOTE(unsafe) address validity is the contract of `Mmio::new`
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // NOTE(unsafe) address validity is the contract of `Mmio::new`
        unsafe {
            core::ptr::write_volatile((self.base + offset) as *mut u32, value)
        }
    }

    fn modify<F>(&self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        // An interrupt handler touching the same register must not land
        // between our read and our write
        #[cfg(all(target_arch = "arm", target_os = "none"))]
        cortex_m::interrupt::free(|_| {
            let value = self.read(offset);
            self.write(offset, f(value));
        });
        #[cfg(not(all(target_arch = "arm", target_os = "none")))]
        {
            let value = self.read(offset);
            self.write(offset, f(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tock_registers::register_bitfields;

    register_bitfields![u32,
        TEST [
            LOW OFFSET(0) NUMBITS(4) [],
            MUL OFFSET(18) NUMBITS(4) []
        ]
    ];

    #[test]
    fn fields_modify_through_a_copy() {
        let mut words = [0xffff_ffffu32; 2];
        let regs = unsafe { Mmio::new(words.as_mut_ptr() as usize) };

        // Neighbouring bits survive, oversized values are clamped
        regs.modify_fields(0x4, TEST::MUL.val(0x7));
        assert_eq!(words[1], 0xffdf_ffff);
        regs.modify_fields(0x4, TEST::MUL.val(0x1f) + TEST::LOW::CLEAR);
        assert_eq!(words[1], 0xffff_fff0);

        let copy = regs.fetch::<TEST::Register>(0x4);
        assert_eq!(copy.read(TEST::MUL), 0xf);
        assert!(!copy.is_set(TEST::LOW));
        assert_eq!(words[0], 0xffff_ffff);
    }

    #[test]
    fn mmio_reads_and_writes_memory() {
        let mut words = [0u32; 4];
        let regs = unsafe { Mmio::new(words.as_mut_ptr() as usize) };

        regs.write(0x4, 0x55);
        regs.set_bits(0x4, 0x100);
        regs.clear_bits(0x4, 0x1);
        assert_eq!(regs.read(0x4), 0x154);
        assert!(regs.is_set(0x4, 0x100));
        assert!(!regs.is_set(0x8, 0xffff_ffff));
        assert_eq!(regs.base(), words.as_ptr() as usize);

        assert_eq!(words[1], 0x154);
    }
}

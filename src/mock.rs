//! Host-side register model
//!
//! [`MockRegisters`] is a plain register file with optional RCC
//! behaviour layered on top:
//!
//! * ready bits in CR, BDCR and CSR follow their enable bits
//! * CFGR.SWS follows CFGR.SW once the selected source is ready
//! * PLL fields in CFGR and CFGR2 ignore writes while their PLL runs
//! * CIR clear bits acknowledge ready flags, CSR.RMVF clears reset flags
//!
//! A ready bit can additionally be held low for a number of polls with
//! [`MockRegisters::hold_ready`] to model a slow oscillator.

use core::cell::Cell;

use tock_registers::fields::Field;
use tock_registers::RegisterLongName;

use crate::mmio::RegisterBlock;
use crate::rcc::regs::{mask, BDCR, CFGR, CFGR2, CIR, CR, CR_ON_MASK, CSR};

const WORDS: usize = 16;

#[derive(Clone, Copy, Debug)]
struct Hold {
    offset: usize,
    mask: u32,
    polls: usize,
}

/// Host-side register file
#[derive(Debug, Default)]
pub struct MockRegisters {
    regs: [Cell<u32>; WORDS],
    reads: [Cell<usize>; WORDS],
    writes: [Cell<usize>; WORDS],
    emulate_rcc: bool,
    hold: Cell<Option<Hold>>,
}

impl MockRegisters {
    /// All registers zero, no behaviour
    pub fn new() -> Self {
        Self::default()
    }

    /// An RCC in its reset state: HSI on and ready, SYSCLK from HSI,
    /// power-on and pin reset flags set
    pub fn rcc() -> Self {
        let mock = MockRegisters {
            emulate_rcc: true,
            ..Self::default()
        };
        mock.regs[CR / 4]
            .set(0x0000_0080 | mask(CR::HSION) | mask(CR::HSIRDY));
        mock.regs[CSR / 4].set(mask(CSR::PORRSTF) | mask(CSR::PINRSTF));
        mock
    }

    /// Overwrite a register without going through the emulation or the
    /// access counters
    pub fn preload(&self, offset: usize, value: u32) {
        self.regs[Self::index(offset)].set(value);
    }

    /// Current register value without counting a read
    pub fn peek(&self, offset: usize) -> u32 {
        self.regs[Self::index(offset)].get()
    }

    /// Reads of `offset` since construction or the last
    /// [`reset_counters`](Self::reset_counters)
    pub fn reads(&self, offset: usize) -> usize {
        self.reads[Self::index(offset)].get()
    }

    /// Writes to `offset` since construction or the last
    /// [`reset_counters`](Self::reset_counters)
    pub fn writes(&self, offset: usize) -> usize {
        self.writes[Self::index(offset)].get()
    }

    /// Zero all access counters
    pub fn reset_counters(&self) {
        for (reads, writes) in self.reads.iter().zip(self.writes.iter()) {
            reads.set(0);
            writes.set(0);
        }
    }

    /// Report the bits of `mask` in `offset` as clear for the next
    /// `polls` reads of that register. Resets its read counter.
    pub fn hold_ready(&self, offset: usize, mask: u32, polls: usize) {
        self.reads[Self::index(offset)].set(0);
        self.hold.set(Some(Hold {
            offset,
            mask,
            polls,
        }));
    }

    fn index(offset: usize) -> usize {
        assert!(offset % 4 == 0, "unaligned register offset {:#x}", offset);
        offset / 4
    }

    fn cr_is_set(&self, field: Field<u32, CR::Register>) -> bool {
        field.is_set(self.regs[CR / 4].get())
    }

    /// Returns `true` if the SYSCLK source encoded as `sw` is ready
    fn sysclk_ready(&self, sw: u32) -> bool {
        match sw {
            0b00 => self.cr_is_set(CR::HSIRDY),
            0b01 => self.cr_is_set(CR::HSERDY),
            0b10 => self.cr_is_set(CR::PLLRDY),
            _ => false,
        }
    }

    /// SWS catches up with SW once the requested source is ready
    fn settle_switch(&self, cfgr: u32) -> u32 {
        let sw = CFGR::SW.read(cfgr);
        if self.sysclk_ready(sw) {
            CFGR::SWS.val(sw).modify(cfgr)
        } else {
            cfgr
        }
    }

    /// Hardware side effects of writing `value` over `old`
    fn emulate(&self, offset: usize, old: u32, value: u32) -> u32 {
        // Fields of `locked` keep their old value
        fn keep<B: RegisterLongName>(
            old: u32,
            value: u32,
            locked: &[Field<u32, B>],
        ) -> u32 {
            let locked = locked.iter().fold(0, |acc, &f| acc | mask(f));
            (value & !locked) | (old & locked)
        }

        match offset {
            CR => {
                let on = value & CR_ON_MASK;
                (value & !(CR_ON_MASK << 1)) | (on << 1)
            }
            CFGR => {
                let value = if self.cr_is_set(CR::PLLON) {
                    keep(
                        old,
                        value,
                        &[CFGR::PLLSRC, CFGR::PLLXTPRE, CFGR::PLLMUL],
                    )
                } else {
                    value
                };
                // SWS is read-only
                let value = CFGR::SWS.val(CFGR::SWS.read(old)).modify(value);
                self.settle_switch(value)
            }
            CFGR2 => {
                let mut value = value;
                if self.cr_is_set(CR::PLLON) {
                    value = keep(
                        old,
                        value,
                        &[CFGR2::PREDIV1, CFGR2::PREDIV1SRC],
                    );
                }
                if self.cr_is_set(CR::PLL2ON) {
                    value = keep(old, value, &[CFGR2::PLL2MUL, CFGR2::PREDIV2]);
                }
                if self.cr_is_set(CR::PLL3ON) {
                    value = keep(old, value, &[CFGR2::PLL3MUL, CFGR2::PREDIV2]);
                }
                value
            }
            CIR => {
                // Clear bits sit 16 above their flag and read as zero
                let flags = mask(CIR::FLAGS) | mask(CIR::CSSF);
                let clears = mask(CIR::CLEAR) | mask(CIR::CSSC);
                let cleared = (value & clears) >> 16;
                (value & !clears & !flags) | (old & flags & !cleared)
            }
            BDCR => {
                let ready = BDCR::LSEON.read(value);
                BDCR::LSERDY.val(ready).modify(value)
            }
            CSR => {
                let ready = CSR::LSION.read(value);
                let value = CSR::LSIRDY.val(ready).modify(value);
                if CSR::RMVF.is_set(value) {
                    (CSR::RMVF::CLEAR + CSR::RESET_FLAGS::CLEAR).modify(value)
                } else {
                    value
                }
            }
            _ => value,
        }
    }

    /// Ready flags raised in CIR for oscillators that just came up with
    /// their interrupt enabled
    fn raise_ready_flags(&self, offset: usize, old: u32, new: u32) {
        let risen = |bit: u32| old & bit == 0 && new & bit != 0;
        let index = match offset {
            CR if risen(mask(CR::HSIRDY)) => Some(2),
            CR if risen(mask(CR::HSERDY)) => Some(3),
            CR if risen(mask(CR::PLLRDY)) => Some(4),
            CR if risen(mask(CR::PLL2RDY)) => Some(5),
            CR if risen(mask(CR::PLL3RDY)) => Some(6),
            CSR if risen(mask(CSR::LSIRDY)) => Some(0),
            BDCR if risen(mask(BDCR::LSERDY)) => Some(1),
            _ => None,
        };
        if let Some(index) = index {
            let cir = &self.regs[CIR / 4];
            let value = cir.get();
            if CIR::IE.read(value) & (1 << index) != 0 {
                cir.set(value | (1 << index));
            }
        }
    }
}

impl RegisterBlock for MockRegisters {
    fn read(&self, offset: usize) -> u32 {
        let index = Self::index(offset);
        let reads = self.reads[index].get() + 1;
        self.reads[index].set(reads);

        let value = self.regs[index].get();
        match self.hold.get() {
            Some(hold) if hold.offset == offset && reads <= hold.polls => {
                value & !hold.mask
            }
            _ => value,
        }
    }

    fn write(&self, offset: usize, value: u32) {
        let index = Self::index(offset);
        self.writes[index].set(self.writes[index].get() + 1);

        if self.emulate_rcc {
            let old = self.regs[index].get();
            let new = self.emulate(offset, old, value);
            self.regs[index].set(new);
            self.raise_ready_flags(offset, old, new);
            if offset == CR {
                let cfgr = &self.regs[CFGR / 4];
                cfgr.set(self.settle_switch(cfgr.get()));
            }
        } else {
            self.regs[index].set(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_follows_enable() {
        let mock = MockRegisters::rcc();
        mock.modify_fields(CR, CR::HSEON::SET + CR::PLLON::SET);
        let cr = mock.fetch::<CR::Register>(CR);
        assert!(cr.is_set(CR::HSERDY));
        assert!(cr.is_set(CR::PLLRDY));

        mock.modify_fields(CR, CR::PLLON::CLEAR);
        assert!(!CR::PLLRDY.is_set(mock.peek(CR)));
        assert!(mock.fetch::<CR::Register>(CR).is_set(CR::HSERDY));
    }

    #[test]
    fn switch_status_follows_ready_source() {
        let mock = MockRegisters::rcc();
        mock.modify_fields(CFGR, CFGR::SW.val(0b10));
        assert_eq!(CFGR::SWS.read(mock.peek(CFGR)), 0b00);

        // The pending request completes once the PLL locks
        mock.modify_fields(CR, CR::PLLON::SET);
        assert_eq!(CFGR::SWS.read(mock.peek(CFGR)), 0b10);

        // Writes cannot forge the status
        mock.write(CFGR, 0b1110);
        assert_eq!(CFGR::SWS.read(mock.peek(CFGR)), 0b10);
    }

    #[test]
    fn pll_fields_locked_while_running() {
        let mock = MockRegisters::rcc();
        mock.modify_fields(CFGR, CFGR::PLLMUL.val(0x7));
        mock.modify_fields(CR, CR::PLLON::SET);
        mock.modify_fields(CFGR, CFGR::PLLMUL.val(0x4) + CFGR::HPRE.val(0x8));
        assert_eq!(mock.peek(CFGR), (0x7 << 18) | 0x80);
    }

    #[test]
    fn pll2_fields_locked_while_running() {
        let mock = MockRegisters::rcc();
        mock.modify_fields(
            CFGR2,
            CFGR2::PLL2MUL.val(0x6) + CFGR2::PREDIV2.val(0x4),
        );
        mock.modify_fields(CR, CR::PLL2ON::SET);
        mock.modify_fields(
            CFGR2,
            CFGR2::PLL2MUL.val(0x7)
                + CFGR2::PREDIV2.val(0x1)
                + CFGR2::PLL3MUL.val(0xf),
        );
        assert_eq!(mock.peek(CFGR2), 0x0000_f640);

        mock.modify_fields(CR, CR::PLL2ON::CLEAR);
        mock.modify_fields(CFGR2, CFGR2::PLL2MUL.val(0x7));
        assert_eq!(CFGR2::PLL2MUL.read(mock.peek(CFGR2)), 0x7);
    }

    #[test]
    fn plain_registers_store_writes() {
        let mock = MockRegisters::new();
        mock.write(CR, mask(CR::HSEON));
        assert_eq!(mock.peek(CR), 0x0001_0000);
        assert_eq!(mock.writes(CR), 1);
    }

    #[test]
    fn held_ready_bit_reads_clear() {
        let mock = MockRegisters::rcc();
        mock.modify_fields(CR, CR::HSEON::SET);
        mock.hold_ready(CR, mask(CR::HSERDY), 2);

        assert!(!mock.is_set(CR, mask(CR::HSERDY)));
        assert!(!mock.is_set(CR, mask(CR::HSERDY)));
        assert!(mock.is_set(CR, mask(CR::HSERDY)));
        assert_eq!(mock.reads(CR), 3);
    }

    #[test]
    fn interrupt_flags_clear_on_acknowledge() {
        let mock = MockRegisters::rcc();
        // HSE ready interrupt enabled
        mock.modify_fields(CIR, CIR::IE.val(1 << 3));
        mock.modify_fields(CR, CR::HSEON::SET);
        assert_eq!(CIR::FLAGS.read(mock.peek(CIR)), 1 << 3);

        mock.modify_fields(CIR, CIR::CLEAR.val(1 << 3));
        assert_eq!(mock.peek(CIR), 1 << 11);
    }
}

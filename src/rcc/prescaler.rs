//! Bus, ADC and USB prescalers and the MCO output

use log::trace;

use super::regs::CFGR;
use super::Rcc;
use crate::family::Family;
use crate::mmio::RegisterBlock;

/// AHB prescaler, SYSCLK to `hclk`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Hpre {
    Div1 = 0x0,
    Div2 = 0x8,
    Div4 = 0x9,
    Div8 = 0xa,
    Div16 = 0xb,
    Div64 = 0xc,
    Div128 = 0xd,
    Div256 = 0xe,
    Div512 = 0xf,
}

impl Hpre {
    /// Division factor
    pub const fn divisor(self) -> u32 {
        match self {
            Hpre::Div1 => 1,
            Hpre::Div2 => 2,
            Hpre::Div4 => 4,
            Hpre::Div8 => 8,
            Hpre::Div16 => 16,
            Hpre::Div64 => 64,
            Hpre::Div128 => 128,
            Hpre::Div256 => 256,
            Hpre::Div512 => 512,
        }
    }

    /// Decode the field. Every encoding below 0b1000 divides by one
    pub const fn from_bits(bits: u32) -> Self {
        match bits {
            0x8 => Hpre::Div2,
            0x9 => Hpre::Div4,
            0xa => Hpre::Div8,
            0xb => Hpre::Div16,
            0xc => Hpre::Div64,
            0xd => Hpre::Div128,
            0xe => Hpre::Div256,
            0xf => Hpre::Div512,
            _ => Hpre::Div1,
        }
    }
}

/// APB1 and APB2 prescaler, `hclk` to `pclkN`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Ppre {
    Div1 = 0b000,
    Div2 = 0b100,
    Div4 = 0b101,
    Div8 = 0b110,
    Div16 = 0b111,
}

impl Ppre {
    /// Division factor
    pub const fn divisor(self) -> u32 {
        match self {
            Ppre::Div1 => 1,
            Ppre::Div2 => 2,
            Ppre::Div4 => 4,
            Ppre::Div8 => 8,
            Ppre::Div16 => 16,
        }
    }

    /// Decode the field. Every encoding below 0b100 divides by one
    pub const fn from_bits(bits: u32) -> Self {
        match bits {
            0b100 => Ppre::Div2,
            0b101 => Ppre::Div4,
            0b110 => Ppre::Div8,
            0b111 => Ppre::Div16,
            _ => Ppre::Div1,
        }
    }

    /// Timers on this bus run at twice `pclk` when the bus divides
    pub const fn timer_multiplier(self) -> u32 {
        match self {
            Ppre::Div1 => 1,
            _ => 2,
        }
    }
}

/// ADC prescaler, `pclk2` to the ADC clock (F1)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Adcpre {
    Div2 = 0b00,
    Div4 = 0b01,
    Div6 = 0b10,
    Div8 = 0b11,
}

impl Adcpre {
    /// Division factor
    pub const fn divisor(self) -> u32 {
        (self as u32 + 1) * 2
    }
}

/// USB prescaler, PLL output to the 48 MHz USB clock
///
/// On the connectivity line the same bit divides the PLL VCO (twice the
/// PLL output) by three or two, which comes to the same ratios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Usbpre {
    /// PLL output divided by 1.5
    Div1_5 = 0,
    /// PLL output undivided
    Div1 = 1,
}

/// Microcontroller clock output source
///
/// Encodings from 0b1000 up exist on the connectivity line only, LSI and
/// LSE on F3 only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mco {
    /// Output disabled
    NoClock = 0x0,
    /// LSI (F3)
    Lsi = 0x2,
    /// LSE (F3)
    Lse = 0x3,
    /// SYSCLK
    Sysclk = 0x4,
    /// HSI
    Hsi = 0x5,
    /// HSE
    Hse = 0x6,
    /// PLL output divided by two
    PllDiv2 = 0x7,
    /// PLL2 output
    Pll2 = 0x8,
    /// PLL3 output divided by two
    Pll3Div2 = 0x9,
    /// External oscillator, XT1
    Xt1 = 0xa,
    /// PLL3 output
    Pll3 = 0xb,
}

macro_rules! prescalers {
    ($($name:ident: $Type:ident, $field:ident, $bus:literal;)+) => {
        paste::paste! {
            impl<R: RegisterBlock, F: Family> Rcc<R, F> {
                $(
                    #[doc = "Set the " $bus " prescaler"]
                    pub fn [<set_ $name>](&mut self, value: $Type) {
                        trace!("{} {:?}", stringify!([<$name:upper>]), value);
                        self.rb.modify_fields(CFGR, CFGR::$field.val(value as u32));
                    }

                    #[doc = "Current " $bus " prescaler, read back from the register"]
                    pub fn $name(&self) -> $Type {
                        $Type::from_bits(
                            self.rb.fetch::<CFGR::Register>(CFGR).read(CFGR::$field),
                        )
                    }
                )+
            }
        }
    };
}

prescalers! {
    hpre: Hpre, HPRE, "AHB";
    ppre1: Ppre, PPRE1, "APB1";
    ppre2: Ppre, PPRE2, "APB2";
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Set the ADC prescaler. Does nothing on families without ADCPRE
    pub fn set_adcpre(&mut self, value: Adcpre) {
        if F::HAS_ADCPRE {
            self.rb.modify_fields(CFGR, CFGR::ADCPRE.val(value as u32));
        }
    }

    /// Set the USB prescaler
    ///
    /// Must not change while the USB clock is enabled.
    pub fn set_usbpre(&mut self, value: Usbpre) {
        self.rb.modify_fields(CFGR, CFGR::USBPRE.val(value as u32));
    }

    /// Select the MCO output source
    pub fn set_mco(&mut self, source: Mco) {
        self.rb.modify_fields(CFGR, F::MCO.val(source as u32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{F1Connectivity, F1, F3};
    use crate::mock::MockRegisters;

    #[test]
    fn prescaler_fields() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F1>::new(&regs);

        rcc.set_hpre(Hpre::Div2);
        rcc.set_ppre1(Ppre::Div2);
        rcc.set_ppre2(Ppre::Div16);
        rcc.set_adcpre(Adcpre::Div6);
        assert_eq!(regs.peek(CFGR), 0x0000_bc80);

        assert_eq!(rcc.hpre(), Hpre::Div2);
        assert_eq!(rcc.ppre1(), Ppre::Div2);
        assert_eq!(rcc.ppre2(), Ppre::Div16);

        rcc.set_hpre(Hpre::Div1);
        assert_eq!(regs.peek(CFGR), 0x0000_bc00);
    }

    #[test]
    fn prescalers_leave_other_bits_alone() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F1>::new(&regs);

        regs.preload(CFGR, 0xffff_ffff);
        rcc.set_hpre(Hpre::Div4);
        assert_eq!(regs.peek(CFGR), 0xffff_ff9f);

        regs.preload(CFGR, 0xffff_ffff);
        rcc.set_ppre1(Ppre::Div2);
        assert_eq!(regs.peek(CFGR), 0xffff_fcff);

        regs.preload(CFGR, 0xffff_ffff);
        rcc.set_ppre2(Ppre::Div4);
        assert_eq!(regs.peek(CFGR), 0xffff_efff);

        regs.preload(CFGR, 0xffff_ffff);
        rcc.set_adcpre(Adcpre::Div4);
        assert_eq!(regs.peek(CFGR), 0xffff_7fff);

        regs.preload(CFGR, 0xffff_ffff);
        rcc.set_usbpre(Usbpre::Div1_5);
        assert_eq!(regs.peek(CFGR), 0xffbf_ffff);

        // Three bits wide on F1, bit 27 is not part of it
        regs.preload(CFGR, 0xffff_ffff);
        rcc.set_mco(Mco::Hsi);
        assert_eq!(regs.peek(CFGR), 0xfdff_ffff);
    }

    #[test]
    fn connectivity_mco_uses_four_bits() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F1Connectivity>::new(&regs);

        regs.preload(CFGR, 0xffff_ffff);
        rcc.set_mco(Mco::Pll2);
        assert_eq!(regs.peek(CFGR), 0xf8ff_ffff);
    }

    #[test]
    fn prescaler_decoding() {
        for bits in 0..8 {
            assert_eq!(Hpre::from_bits(bits), Hpre::Div1);
        }
        assert_eq!(Hpre::from_bits(0xc).divisor(), 64);
        assert_eq!(Hpre::Div512.divisor(), 512);

        for bits in 0..4 {
            assert_eq!(Ppre::from_bits(bits), Ppre::Div1);
        }
        assert_eq!(Ppre::from_bits(0b101).divisor(), 4);
        assert_eq!(Ppre::Div1.timer_multiplier(), 1);
        assert_eq!(Ppre::Div8.timer_multiplier(), 2);

        assert_eq!(Adcpre::Div2.divisor(), 2);
        assert_eq!(Adcpre::Div8.divisor(), 8);
    }

    #[test]
    fn f3_has_no_adcpre() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F3>::new(&regs);

        rcc.set_adcpre(Adcpre::Div8);
        assert_eq!(regs.peek(CFGR), 0);
        assert_eq!(regs.writes(CFGR), 0);
    }

    #[test]
    fn usb_and_mco() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F1>::new(&regs);

        rcc.set_usbpre(Usbpre::Div1);
        assert_eq!(regs.peek(CFGR), 1 << 22);
        rcc.set_mco(Mco::Sysclk);
        assert_eq!(regs.peek(CFGR), (1 << 22) | (0x4 << 24));
        rcc.set_usbpre(Usbpre::Div1_5);
        rcc.set_mco(Mco::NoClock);
        assert_eq!(regs.peek(CFGR), 0);
    }
}

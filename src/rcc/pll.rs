//! Phase Locked Loop Configuration
//!
//! Field setters for the PLL input selection, input dividers and
//! multipliers, plus the arithmetic that predicts the PLL output for a
//! [`PllConfig`].
//!
//! None of the setters check that the PLL is stopped. The hardware
//! ignores writes to these fields while PLLON is set; use
//! [`Rcc::pll_configurable`] or the composed routines.

use log::{debug, trace};

use super::regs::{CFGR, CFGR2, CR};
use super::{Error, Osc, Rcc};
use crate::family::Family;
use crate::mmio::RegisterBlock;
use crate::time::Hertz;

/// PLL input selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllSource {
    /// HSI divided by two
    HsiDiv2 = 0,
    /// HSE, through PLLXTPRE on F1 and PREDIV1/PREDIV otherwise
    Hse = 1,
}

/// HSE divider in front of the PLL (F1 without CFGR2)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllXtpre {
    /// HSE undivided
    Div1 = 0,
    /// HSE divided by two
    Div2 = 1,
}

/// PREDIV1, PREDIV2 (connectivity line) and PREDIV (F3) dividers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Prediv {
    Div1 = 0,
    Div2,
    Div3,
    Div4,
    Div5,
    Div6,
    Div7,
    Div8,
    Div9,
    Div10,
    Div11,
    Div12,
    Div13,
    Div14,
    Div15,
    Div16,
}

impl Prediv {
    /// Division factor
    pub const fn divisor(self) -> u32 {
        self as u32 + 1
    }
}

/// PREDIV1 input on the connectivity line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prediv1Source {
    /// HSE
    Hse = 0,
    /// PLL2 output
    Pll2 = 1,
}

/// A multiplication factor `num / den`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Multiplier {
    /// Numerator
    pub num: u32,
    /// Denominator
    pub den: u32,
}

impl Multiplier {
    /// Whole number factor
    pub const fn whole(num: u32) -> Self {
        Multiplier { num, den: 1 }
    }

    /// Multiply `input`, checking for overflow
    pub fn apply(self, input: Hertz) -> Result<Hertz, Error> {
        let output = u64::from(input.0) * u64::from(self.num)
            / u64::from(self.den);
        cast::u32(output)
            .map(Hertz)
            .map_err(|_| Error::FrequencyOverflow)
    }
}

/// Main PLL multiplier, the raw PLLMUL encoding
///
/// The meaning of an encoding depends on the family: `0b1101` is ×15 on
/// F1 and F3 but ×6.5 on the connectivity line, where several encodings
/// are reserved. See [`Family::pll_multiplier`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllMul(u8);

#[allow(missing_docs)]
impl PllMul {
    pub const MUL2: PllMul = PllMul(0x0);
    pub const MUL3: PllMul = PllMul(0x1);
    pub const MUL4: PllMul = PllMul(0x2);
    pub const MUL5: PllMul = PllMul(0x3);
    pub const MUL6: PllMul = PllMul(0x4);
    pub const MUL7: PllMul = PllMul(0x5);
    pub const MUL8: PllMul = PllMul(0x6);
    pub const MUL9: PllMul = PllMul(0x7);
    pub const MUL10: PllMul = PllMul(0x8);
    pub const MUL11: PllMul = PllMul(0x9);
    pub const MUL12: PllMul = PllMul(0xa);
    pub const MUL13: PllMul = PllMul(0xb);
    pub const MUL14: PllMul = PllMul(0xc);
    pub const MUL15: PllMul = PllMul(0xd);
    pub const MUL16: PllMul = PllMul(0xe);
    /// Connectivity line encoding of ×6.5
    pub const MUL6_5: PllMul = PllMul(0xd);

    /// From a raw four bit encoding
    pub const fn from_bits(bits: u8) -> Self {
        PllMul(bits & 0xf)
    }

    /// Raw encoding
    pub const fn bits(self) -> u32 {
        self.0 as u32
    }
}

/// PLL2 and PLL3 multiplier on the connectivity line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Pll23Mul {
    Mul8 = 0x6,
    Mul9 = 0x7,
    Mul10 = 0x8,
    Mul11 = 0x9,
    Mul12 = 0xa,
    Mul13 = 0xb,
    Mul14 = 0xc,
    Mul16 = 0xe,
    Mul20 = 0xf,
}

impl Pll23Mul {
    /// Multiplication factor
    pub const fn factor(self) -> u32 {
        match self {
            Pll23Mul::Mul16 => 16,
            Pll23Mul::Mul20 => 20,
            other => other as u32 + 2,
        }
    }
}

/// PLL2 settings, connectivity line only
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pll2Config {
    /// HSE divider in front of PLL2
    pub prediv2: Prediv,
    /// PLL2 multiplier
    pub mul: Pll23Mul,
}

impl Pll2Config {
    /// PLL2 output for an HSE of `hse`
    pub fn output(&self, hse: Hertz) -> Result<Hertz, Error> {
        Multiplier::whole(self.mul.factor())
            .apply(hse.div(self.prediv2.divisor()))
    }
}

/// Configuration of a Phase Locked Loop (PLL)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllConfig {
    /// Input selection
    pub source: PllSource,
    /// Multiplier
    pub mul: PllMul,
    /// HSE divider on families without CFGR2
    pub xtpre: PllXtpre,
    /// HSE divider on families with CFGR2
    pub prediv1: Prediv,
    /// PREDIV1 input, connectivity line only
    pub prediv1_source: Prediv1Source,
    /// PLL2, connectivity line only
    pub pll2: Option<Pll2Config>,
}

impl PllConfig {
    /// A PLL fed by HSI/2
    pub const fn hsi(mul: PllMul) -> Self {
        PllConfig {
            source: PllSource::HsiDiv2,
            mul,
            xtpre: PllXtpre::Div1,
            prediv1: Prediv::Div1,
            prediv1_source: Prediv1Source::Hse,
            pll2: None,
        }
    }

    /// A PLL fed by HSE through PLLXTPRE
    pub const fn hse(mul: PllMul, xtpre: PllXtpre) -> Self {
        PllConfig {
            source: PllSource::Hse,
            mul,
            xtpre,
            prediv1: Prediv::Div1,
            prediv1_source: Prediv1Source::Hse,
            pll2: None,
        }
    }

    /// A PLL fed by HSE through PREDIV1
    pub const fn hse_prediv(mul: PllMul, prediv1: Prediv) -> Self {
        PllConfig {
            source: PllSource::Hse,
            mul,
            xtpre: PllXtpre::Div1,
            prediv1,
            prediv1_source: Prediv1Source::Hse,
            pll2: None,
        }
    }

    /// Frequency at the PLL input
    pub fn input<F: Family>(&self, hse: Option<Hertz>) -> Result<Hertz, Error> {
        match self.source {
            PllSource::HsiDiv2 => Ok(F::HSI.div(2)),
            PllSource::Hse => {
                let hse = hse.ok_or(Error::HseFrequencyUnknown)?;
                if !F::HAS_PREDIV1 {
                    return Ok(match self.xtpre {
                        PllXtpre::Div1 => hse,
                        PllXtpre::Div2 => hse.div(2),
                    });
                }
                let prediv1_input = match (self.prediv1_source, self.pll2) {
                    (Prediv1Source::Pll2, Some(pll2)) => pll2.output(hse)?,
                    _ => hse,
                };
                Ok(prediv1_input.div(self.prediv1.divisor()))
            }
        }
    }

    /// Frequency at the PLL output, `f_in / prediv * mul`
    pub fn output<F: Family>(
        &self,
        hse: Option<Hertz>,
    ) -> Result<Hertz, Error> {
        let mul = F::pll_multiplier(self.mul.bits())
            .ok_or(Error::InvalidMultiplier)?;
        mul.apply(self.input::<F>(hse)?)
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Returns `true` if the PLL is stopped and its fields take writes
    pub fn pll_configurable(&self) -> bool {
        !self.rb.fetch::<CR::Register>(CR).is_set(CR::PLLON)
    }

    /// Select the PLL input
    pub fn set_pll_source(&mut self, source: PllSource) {
        trace!("PLLSRC {:?}", source);
        self.rb.modify_fields(CFGR, CFGR::PLLSRC.val(source as u32));
    }

    /// Set the PLL multiplier
    pub fn set_pll_multiplication_factor(&mut self, mul: PllMul) {
        trace!("PLLMUL {:#x}", mul.bits());
        self.rb.modify_fields(CFGR, CFGR::PLLMUL.val(mul.bits()));
    }

    /// Set the HSE divider in front of the PLL
    ///
    /// On families with CFGR2 this bit mirrors the low bit of PREDIV1.
    pub fn set_pllxtpre(&mut self, xtpre: PllXtpre) {
        self.rb.modify_fields(CFGR, CFGR::PLLXTPRE.val(xtpre as u32));
    }

    /// Set PREDIV1 (PREDIV on F3)
    pub fn set_prediv1(&mut self, prediv: Prediv) {
        self.rb.modify_fields(CFGR2, CFGR2::PREDIV1.val(prediv as u32));
    }

    /// Set PREDIV2, connectivity line only
    pub fn set_prediv2(&mut self, prediv: Prediv) {
        self.rb.modify_fields(CFGR2, CFGR2::PREDIV2.val(prediv as u32));
    }

    /// Select the PREDIV1 input, connectivity line only
    pub fn set_prediv1_source(&mut self, source: Prediv1Source) {
        self.rb
            .modify_fields(CFGR2, CFGR2::PREDIV1SRC.val(source as u32));
    }

    /// Set the PLL2 multiplier, connectivity line only
    pub fn set_pll2_multiplication_factor(&mut self, mul: Pll23Mul) {
        self.rb.modify_fields(CFGR2, CFGR2::PLL2MUL.val(mul as u32));
    }

    /// Set the PLL3 multiplier, connectivity line only
    pub fn set_pll3_multiplication_factor(&mut self, mul: Pll23Mul) {
        self.rb.modify_fields(CFGR2, CFGR2::PLL3MUL.val(mul as u32));
    }

    /// Program every PLL field of `pll` that exists on this family
    ///
    /// PLL2 is started and awaited when the configuration feeds PREDIV1
    /// from it. A running PLL2 is stopped first, as PLL2MUL and PREDIV2
    /// ignore writes while it runs. The main PLL must already be stopped.
    pub(super) fn apply_pll_config(&mut self, pll: &PllConfig) {
        if F::HAS_PREDIV1 {
            if let Some(pll2) = pll.pll2 {
                let cr = self.rb.fetch::<CR::Register>(CR);
                if cr.is_set(CR::PLL2ON) || cr.is_set(CR::PLL2RDY) {
                    debug!("stopping PLL2 to reprogram it");
                    self.osc_off(Osc::Pll2);
                    self.wait_for_osc_not_ready(Osc::Pll2);
                }
                self.set_prediv2(pll2.prediv2);
                self.set_pll2_multiplication_factor(pll2.mul);
                self.osc_on(Osc::Pll2);
                self.wait_for_osc_ready(Osc::Pll2);
            }
            if F::has_osc(Osc::Pll2) {
                self.set_prediv1_source(pll.prediv1_source);
            }
            self.set_prediv1(pll.prediv1);
        } else {
            self.set_pllxtpre(pll.xtpre);
        }
        self.set_pll_source(pll.source);
        self.set_pll_multiplication_factor(pll.mul);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{F1Connectivity, F1, F3};
    use crate::mock::MockRegisters;
    use crate::time::U32Ext;

    #[test]
    fn multiplier_field_is_read_modify_write() {
        let regs = MockRegisters::new();
        regs.preload(CFGR, 0xffff_ffff);
        let mut rcc = Rcc::<_, F1>::new(&regs);

        rcc.set_pll_multiplication_factor(PllMul::MUL9);
        assert_eq!(regs.peek(CFGR), 0xffdf_ffff);

        rcc.set_pll_source(PllSource::HsiDiv2);
        assert_eq!(regs.peek(CFGR), 0xffde_ffff);
        rcc.set_pllxtpre(PllXtpre::Div1);
        assert_eq!(regs.peek(CFGR), 0xffdc_ffff);
    }

    #[test]
    fn cfgr2_fields() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F1Connectivity>::new(&regs);

        rcc.set_prediv1(Prediv::Div5);
        rcc.set_prediv2(Prediv::Div5);
        rcc.set_pll2_multiplication_factor(Pll23Mul::Mul8);
        rcc.set_pll3_multiplication_factor(Pll23Mul::Mul20);
        rcc.set_prediv1_source(Prediv1Source::Pll2);
        assert_eq!(regs.peek(CFGR2), 0x0001_f644);
    }

    #[test]
    fn cfgr2_fields_leave_other_bits_alone() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F1Connectivity>::new(&regs);

        regs.preload(CFGR2, 0xffff_ffff);
        rcc.set_prediv1(Prediv::Div5);
        assert_eq!(regs.peek(CFGR2), 0xffff_fff4);

        regs.preload(CFGR2, 0xffff_ffff);
        rcc.set_prediv2(Prediv::Div2);
        assert_eq!(regs.peek(CFGR2), 0xffff_ff1f);

        regs.preload(CFGR2, 0xffff_ffff);
        rcc.set_prediv1_source(Prediv1Source::Hse);
        assert_eq!(regs.peek(CFGR2), 0xfffe_ffff);

        regs.preload(CFGR2, 0xffff_ffff);
        rcc.set_pll2_multiplication_factor(Pll23Mul::Mul8);
        assert_eq!(regs.peek(CFGR2), 0xffff_f6ff);

        regs.preload(CFGR2, 0xffff_ffff);
        rcc.set_pll3_multiplication_factor(Pll23Mul::Mul14);
        assert_eq!(regs.peek(CFGR2), 0xffff_cfff);
    }

    #[test]
    fn running_pll2_is_stopped_before_reprogramming() {
        let regs = MockRegisters::rcc();
        let mut rcc = Rcc::<_, F1Connectivity>::new(&regs);
        let pll2 = |mul| PllConfig {
            prediv1_source: Prediv1Source::Pll2,
            pll2: Some(Pll2Config {
                prediv2: Prediv::Div5,
                mul,
            }),
            ..PllConfig::hse_prediv(PllMul::MUL9, Prediv::Div5)
        };

        rcc.apply_pll_config(&pll2(Pll23Mul::Mul8));
        assert!(rcc.is_osc_ready(Osc::Pll2));
        assert_eq!(CFGR2::PLL2MUL.read(regs.peek(CFGR2)), Pll23Mul::Mul8 as u32);

        rcc.apply_pll_config(&pll2(Pll23Mul::Mul9));
        assert_eq!(CFGR2::PLL2MUL.read(regs.peek(CFGR2)), Pll23Mul::Mul9 as u32);
        assert!(rcc.is_osc_ready(Osc::Pll2));
    }

    #[test]
    fn configurable_only_while_stopped() {
        let regs = MockRegisters::rcc();
        let mut rcc = Rcc::<_, F1>::new(&regs);

        assert!(rcc.pll_configurable());
        rcc.osc_on(crate::rcc::Osc::Pll);
        assert!(!rcc.pll_configurable());
    }

    #[test]
    fn pll_output_arithmetic() {
        let hsi = PllConfig::hsi(PllMul::MUL12);
        assert_eq!(hsi.output::<F1>(None), Ok(Hertz(48_000_000)));
        assert_eq!(hsi.output::<F3>(None), Ok(Hertz(48_000_000)));

        let hse = PllConfig::hse(PllMul::MUL9, PllXtpre::Div2);
        assert_eq!(
            hse.output::<F1>(Some(16.mhz().into())),
            Ok(Hertz(72_000_000))
        );
        assert_eq!(hse.output::<F1>(None), Err(Error::HseFrequencyUnknown));

        // F3 divides through PREDIV and ignores PLLXTPRE
        let prediv = PllConfig::hse_prediv(PllMul::MUL9, Prediv::Div2);
        assert_eq!(
            prediv.output::<F3>(Some(16.mhz().into())),
            Ok(Hertz(72_000_000))
        );
    }

    #[test]
    fn connectivity_pll2_chain() {
        let pll = PllConfig {
            prediv1_source: Prediv1Source::Pll2,
            pll2: Some(Pll2Config {
                prediv2: Prediv::Div5,
                mul: Pll23Mul::Mul8,
            }),
            ..PllConfig::hse_prediv(PllMul::MUL9, Prediv::Div5)
        };
        assert_eq!(
            pll.output::<F1Connectivity>(Some(25.mhz().into())),
            Ok(Hertz(72_000_000))
        );

        // x6.5 from 8 MHz
        let pll = PllConfig::hse_prediv(PllMul::MUL6_5, Prediv::Div1);
        assert_eq!(
            pll.output::<F1Connectivity>(Some(8.mhz().into())),
            Ok(Hertz(52_000_000))
        );
        // Same encoding is x15 on F1
        assert_eq!(
            PllConfig::hse(PllMul::MUL15, PllXtpre::Div1)
                .output::<F1>(Some(8.mhz().into())),
            Ok(Hertz(120_000_000))
        );
        // x16 is reserved on the connectivity line
        assert_eq!(
            PllConfig::hsi(PllMul::MUL16).output::<F1Connectivity>(None),
            Err(Error::InvalidMultiplier)
        );
    }

    #[test]
    fn overflow_is_reported() {
        let mul = Multiplier::whole(16);
        assert_eq!(
            mul.apply(Hertz(300_000_000)),
            Err(Error::FrequencyOverflow)
        );
        assert_eq!(Pll23Mul::Mul14.factor(), 14);
        assert_eq!(Pll23Mul::Mul20.factor(), 20);
        assert_eq!(Prediv::Div16.divisor(), 16);
    }
}

//! Composed clock setup
//!
//! A [`ClockScale`] describes a complete clock tree: PLL input and
//! multiplier, bus prescalers, flash wait states and the frequencies
//! that result. The family modules carry tables of verified entries.

use log::debug;

use super::{
    Adcpre, ClockTree, Hpre, Osc, PllConfig, PllSource, Ppre, Rcc, Sysclk,
    Usbpre,
};
use crate::family::Family;
use crate::flash::{Flash, Latency};
use crate::mmio::RegisterBlock;
use crate::time::Hertz;

/// Declarative clock tree configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockScale {
    /// HSE frequency the entry is computed for, `None` when sourced
    /// from HSI
    pub hse: Option<Hertz>,
    /// PLL input and multiplier
    pub pll: PllConfig,
    /// AHB prescaler
    pub hpre: Hpre,
    /// APB1 prescaler
    pub ppre1: Ppre,
    /// APB2 prescaler
    pub ppre2: Ppre,
    /// ADC prescaler, on families that have one
    pub adcpre: Option<Adcpre>,
    /// USB prescaler, left alone when `None`
    pub usbpre: Option<Usbpre>,
    /// Flash wait states
    pub flash_latency: Latency,
    /// Enable the flash prefetch buffer
    pub prefetch: bool,
    /// Resulting AHB frequency
    pub ahb_frequency: Hertz,
    /// Resulting APB1 frequency
    pub apb1_frequency: Hertz,
    /// Resulting APB2 frequency
    pub apb2_frequency: Hertz,
}

impl ClockScale {
    /// SYSCLK frequency of this configuration
    pub fn sysclk(&self) -> Hertz {
        Hertz(self.ahb_frequency.0.saturating_mul(self.hpre.divisor()))
    }

    /// Clock record of this configuration
    pub fn clock_tree(&self) -> ClockTree {
        ClockTree::new(
            self.sysclk(),
            self.ahb_frequency,
            self.apb1_frequency,
            self.apb2_frequency,
        )
    }
}

impl<R: RegisterBlock, F: Family> Rcc<R, F> {
    /// Bring up the clock tree described by `scale` with SYSCLK from the
    /// PLL
    ///
    /// SYSCLK moves to HSI first so the PLL can be stopped and
    /// reprogrammed. Prescalers and flash wait states are set before the
    /// switch to the PLL. The clock record is updated last.
    ///
    /// Oscillator waits are unbounded: a missing HSE crystal hangs here.
    pub fn clock_setup_pll<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
        scale: &ClockScale,
    ) {
        debug!(
            "clock setup: {} MHz from {:?}",
            scale.sysclk().to_mhz(),
            scale.pll.source
        );

        self.osc_on(Osc::Hsi);
        self.wait_for_osc_ready(Osc::Hsi);
        self.set_sysclk_source(Sysclk::Hsi);
        self.wait_for_sysclk_status(Sysclk::Hsi);

        if scale.pll.source == PllSource::Hse {
            debug!("starting HSE");
            self.osc_on(Osc::Hse);
            self.wait_for_osc_ready(Osc::Hse);
        }

        if !self.pll_configurable() {
            debug!("stopping PLL");
            self.osc_off(Osc::Pll);
            self.wait_for_osc_not_ready(Osc::Pll);
        }

        self.set_hpre(scale.hpre);
        self.set_ppre1(scale.ppre1);
        self.set_ppre2(scale.ppre2);
        if let Some(adcpre) = scale.adcpre {
            self.set_adcpre(adcpre);
        }
        if let Some(usbpre) = scale.usbpre {
            self.set_usbpre(usbpre);
        }

        flash.set_latency(scale.flash_latency);
        if scale.prefetch {
            flash.enable_prefetch();
        }

        self.apply_pll_config(&scale.pll);
        debug!("starting PLL");
        self.osc_on(Osc::Pll);
        self.wait_for_osc_ready(Osc::Pll);

        self.set_sysclk_source(Sysclk::Pll);
        self.wait_for_sysclk_status(Sysclk::Pll);

        self.clocks = scale.clock_tree();
        debug!(
            "clock setup done: ahb {} apb1 {} apb2 {}",
            self.clocks.ahb(),
            self.clocks.apb1(),
            self.clocks.apb2()
        );
    }

    /// Bring up an HSI sourced clock tree
    ///
    /// HSE is left alone. `scale` must take the PLL input from HSI/2.
    pub fn clock_setup_hsi<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
        scale: &ClockScale,
    ) {
        debug_assert_eq!(scale.pll.source, PllSource::HsiDiv2);
        self.clock_setup_pll(flash, scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{f1, F1};
    use crate::mock::MockRegisters;
    use crate::rcc::regs::{CFGR, CR};
    use crate::rcc::PllMul;

    #[test]
    fn hsi_48mhz_end_to_end() {
        let regs = MockRegisters::rcc();
        let flash_regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F1>::new(&regs);
        let mut flash = Flash::new(&flash_regs);

        let scale = f1::HSI_CONFIGS[f1::HsiClock::Out48 as usize];
        rcc.clock_setup_pll(&mut flash, &scale);

        let cfgr_value = regs.peek(CFGR);
        assert_eq!(CFGR::PLLMUL.read(cfgr_value), PllMul::MUL12.bits());
        assert_eq!(CFGR::PLLSRC.read(cfgr_value), 0);
        assert_eq!(CFGR::SW.read(cfgr_value), 0b10);
        assert_eq!(CFGR::SWS.read(cfgr_value), 0b10);
        assert_eq!(CFGR::PPRE1.read(cfgr_value), 0b100);
        assert_eq!(CFGR::USBPRE.read(cfgr_value), 1);
        let cr = regs.fetch::<CR::Register>(CR);
        assert!(cr.is_set(CR::PLLON));
        assert!(cr.is_set(CR::PLLRDY));
        assert!(!cr.is_set(CR::HSEON));

        assert_eq!(rcc.system_clock_source(), Some(Sysclk::Pll));
        assert_eq!(rcc.clocks().ahb(), Hertz(48_000_000));
        assert_eq!(rcc.clocks().apb1(), Hertz(24_000_000));
        assert_eq!(rcc.clocks().apb2(), Hertz(48_000_000));
        assert_eq!(flash.latency(), 1);
    }

    #[test]
    fn running_pll_is_stopped_before_reprogramming() {
        let regs = MockRegisters::rcc();
        let flash_regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F1>::new(&regs);
        let mut flash = Flash::new(&flash_regs);

        rcc.clock_setup_pll(
            &mut flash,
            &f1::HSI_CONFIGS[f1::HsiClock::Out64 as usize],
        );
        assert_eq!(
            CFGR::PLLMUL.read(regs.peek(CFGR)),
            PllMul::MUL16.bits()
        );

        rcc.clock_setup_pll(
            &mut flash,
            &f1::HSI_CONFIGS[f1::HsiClock::Out24 as usize],
        );
        assert_eq!(
            CFGR::PLLMUL.read(regs.peek(CFGR)),
            PllMul::MUL6.bits()
        );
        assert_eq!(rcc.clocks().sysclk(), Hertz(24_000_000));
        assert_eq!(flash.latency(), 0);
    }

    #[test]
    fn scale_derives_sysclk() {
        let mut scale = f1::HSE_CONFIGS[f1::HseClock::In8Out72 as usize];
        assert_eq!(scale.sysclk(), Hertz(72_000_000));

        scale.hpre = Hpre::Div2;
        scale.ahb_frequency = Hertz(36_000_000);
        assert_eq!(scale.clock_tree().sysclk(), Hertz(72_000_000));
        assert_eq!(scale.clock_tree().ahb(), Hertz(36_000_000));
    }
}

//! STM32F1
//!
//! [`F1`] covers the low, medium, high and XL density parts (F101, F102,
//! F103). [`F1Connectivity`] covers the F105/F107 connectivity line,
//! which adds PLL2, PLL3 and the PREDIV1/PREDIV2 dividers in CFGR2 but
//! restricts the main PLL multipliers to ×4 to ×9 and ×6.5.
//!
//! See RM0008 section 7.3 (F101/F102/F103) and 8.3 (F105/F107).

use super::Family;
use crate::flash::{Flash, Latency};
use tock_registers::fields::Field;

use crate::mmio::RegisterBlock;
use crate::rcc::regs::CFGR;
use crate::rcc::{
    Adcpre, ClockScale, Hpre, Multiplier, Osc, Pll23Mul, Pll2Config,
    PllConfig, PllMul, PllXtpre, Ppre, Prediv, Prediv1Source, Rcc, Usbpre,
};
use crate::time::Hertz;

/// STM32F101/F102/F103
#[derive(Clone, Copy, Debug)]
pub struct F1;

/// STM32F105/F107 connectivity line
#[derive(Clone, Copy, Debug)]
pub struct F1Connectivity;

impl Family for F1 {
    const NAME: &'static str = "STM32F1";
    const OSCILLATORS: &'static [Osc] =
        &[Osc::Hsi, Osc::Hse, Osc::Lsi, Osc::Lse, Osc::Pll];
    const HAS_ADCPRE: bool = true;
    const HAS_PREDIV1: bool = false;
    const MCO: Field<u32, CFGR::Register> = CFGR::MCO_NARROW;

    fn pll_multiplier(bits: u32) -> Option<Multiplier> {
        match bits {
            0x0..=0xe => Some(Multiplier::whole(bits + 2)),
            0xf => Some(Multiplier::whole(16)),
            _ => None,
        }
    }
}

impl Family for F1Connectivity {
    const NAME: &'static str = "STM32F105/F107";
    const OSCILLATORS: &'static [Osc] = &[
        Osc::Hsi,
        Osc::Hse,
        Osc::Lsi,
        Osc::Lse,
        Osc::Pll,
        Osc::Pll2,
        Osc::Pll3,
    ];
    const HAS_ADCPRE: bool = true;
    const HAS_PREDIV1: bool = true;
    const MCO: Field<u32, CFGR::Register> = CFGR::MCO;

    fn pll_multiplier(bits: u32) -> Option<Multiplier> {
        match bits {
            0x2..=0x7 => Some(Multiplier::whole(bits + 2)),
            0xd => Some(Multiplier { num: 13, den: 2 }),
            _ => None,
        }
    }
}

/// TIM1 register block
pub const TIM1_BASE: usize = 0x4001_2c00;
/// TIM2 register block
pub const TIM2_BASE: usize = 0x4000_0000;
/// TIM3 register block
pub const TIM3_BASE: usize = 0x4000_0400;
/// TIM8 register block
pub const TIM8_BASE: usize = 0x4001_3400;
/// USART1 register block
pub const USART1_BASE: usize = 0x4001_3800;
/// USART2 register block
pub const USART2_BASE: usize = 0x4000_4400;
/// USART3 register block
pub const USART3_BASE: usize = 0x4000_4800;
/// I2C1 register block
pub const I2C1_BASE: usize = 0x4000_5400;
/// I2C2 register block
pub const I2C2_BASE: usize = 0x4000_5800;
/// SPI1 register block
pub const SPI1_BASE: usize = 0x4001_3000;
/// SPI2 register block
pub const SPI2_BASE: usize = 0x4000_3800;

peripheral_clocks! {
    Ahb: [
        DMA1 = 0, DMA2 = 1, SRAM = 2, FLITF = 4, CRC = 6, FSMC = 8,
        SDIO = 10, OTGFS = 12, ETHMAC = 14, ETHMACTX = 15, ETHMACRX = 16,
    ];
    Apb2: [
        AFIO = 0, GPIOA = 2, GPIOB = 3, GPIOC = 4, GPIOD = 5, GPIOE = 6,
        GPIOF = 7, GPIOG = 8, ADC1 = 9, ADC2 = 10, TIM1 = 11, SPI1 = 12,
        TIM8 = 13, USART1 = 14, ADC3 = 15, TIM9 = 19, TIM10 = 20,
        TIM11 = 21,
    ];
    Apb1: [
        TIM2 = 0, TIM3 = 1, TIM4 = 2, TIM5 = 3, TIM6 = 4, TIM7 = 5,
        TIM12 = 6, TIM13 = 7, TIM14 = 8, WWDG = 11, SPI2 = 14, SPI3 = 15,
        USART2 = 17, USART3 = 18, UART4 = 19, UART5 = 20, I2C1 = 21,
        I2C2 = 22, USB = 23, CAN1 = 25, CAN2 = 26, BKP = 27, PWR = 28,
        DAC = 29, CEC = 30,
    ];
}

/// Peripheral reset lines
pub mod rst {
    peripheral_resets! {
        Ahb: [OTGFS = 12, ETHMAC = 14];
        Apb2: [
            AFIO = 0, GPIOA = 2, GPIOB = 3, GPIOC = 4, GPIOD = 5, GPIOE = 6,
            GPIOF = 7, GPIOG = 8, ADC1 = 9, ADC2 = 10, TIM1 = 11, SPI1 = 12,
            TIM8 = 13, USART1 = 14, ADC3 = 15, TIM9 = 19, TIM10 = 20,
            TIM11 = 21,
        ];
        Apb1: [
            TIM2 = 0, TIM3 = 1, TIM4 = 2, TIM5 = 3, TIM6 = 4, TIM7 = 5,
            TIM12 = 6, TIM13 = 7, TIM14 = 8, WWDG = 11, SPI2 = 14, SPI3 = 15,
            USART2 = 17, USART3 = 18, UART4 = 19, UART5 = 20, I2C1 = 21,
            I2C2 = 22, USB = 23, CAN1 = 25, CAN2 = 26, BKP = 27, PWR = 28,
            DAC = 29, CEC = 30,
        ];
    }
}

/// Entries of [`HSI_CONFIGS`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HsiClock {
    /// 24 MHz SYSCLK
    Out24,
    /// 48 MHz SYSCLK, 48 MHz USB clock
    Out48,
    /// 64 MHz SYSCLK, the most HSI/2 reaches
    Out64,
}

/// Entries of [`HSE_CONFIGS`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HseClock {
    /// 8 MHz crystal, 24 MHz SYSCLK
    In8Out24,
    /// 8 MHz crystal, 72 MHz SYSCLK
    In8Out72,
    /// 12 MHz crystal, 72 MHz SYSCLK
    In12Out72,
    /// 16 MHz crystal, 72 MHz SYSCLK
    In16Out72,
}

/// Entries of [`CONNECTIVITY_CONFIGS`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectivityClock {
    /// 8 MHz crystal, 72 MHz SYSCLK
    In8Out72,
    /// 25 MHz crystal through PLL2, 72 MHz SYSCLK
    In25Out72,
}

#[allow(clippy::too_many_arguments)]
const fn scale(
    hse: Option<Hertz>,
    pll: PllConfig,
    ppre1: Ppre,
    adcpre: Adcpre,
    usbpre: Option<Usbpre>,
    flash_latency: Latency,
    ahb: u32,
    apb1: u32,
) -> ClockScale {
    ClockScale {
        hse,
        pll,
        hpre: Hpre::Div1,
        ppre1,
        ppre2: Ppre::Div1,
        adcpre: Some(adcpre),
        usbpre,
        flash_latency,
        prefetch: true,
        ahb_frequency: Hertz(ahb),
        apb1_frequency: Hertz(apb1),
        apb2_frequency: Hertz(ahb),
    }
}

/// PLL from HSI/2
pub const HSI_CONFIGS: [ClockScale; 3] = [
    // 24 MHz, ADC 12 MHz
    scale(
        None,
        PllConfig::hsi(PllMul::MUL6),
        Ppre::Div1,
        Adcpre::Div2,
        None,
        Latency::Ws0,
        24_000_000,
        24_000_000,
    ),
    // 48 MHz, ADC 6 MHz
    scale(
        None,
        PllConfig::hsi(PllMul::MUL12),
        Ppre::Div2,
        Adcpre::Div8,
        Some(Usbpre::Div1),
        Latency::Ws1,
        48_000_000,
        24_000_000,
    ),
    // 64 MHz, ADC 8 MHz
    scale(
        None,
        PllConfig::hsi(PllMul::MUL16),
        Ppre::Div2,
        Adcpre::Div8,
        None,
        Latency::Ws2,
        64_000_000,
        32_000_000,
    ),
];

/// PLL from HSE through PLLXTPRE
pub const HSE_CONFIGS: [ClockScale; 4] = [
    // 24 MHz, ADC 12 MHz
    scale(
        Some(Hertz(8_000_000)),
        PllConfig::hse(PllMul::MUL3, PllXtpre::Div1),
        Ppre::Div1,
        Adcpre::Div2,
        None,
        Latency::Ws0,
        24_000_000,
        24_000_000,
    ),
    // 72 MHz, ADC 9 MHz
    scale(
        Some(Hertz(8_000_000)),
        PllConfig::hse(PllMul::MUL9, PllXtpre::Div1),
        Ppre::Div2,
        Adcpre::Div8,
        Some(Usbpre::Div1_5),
        Latency::Ws2,
        72_000_000,
        36_000_000,
    ),
    // 72 MHz, ADC 12 MHz
    scale(
        Some(Hertz(12_000_000)),
        PllConfig::hse(PllMul::MUL6, PllXtpre::Div1),
        Ppre::Div2,
        Adcpre::Div6,
        Some(Usbpre::Div1_5),
        Latency::Ws2,
        72_000_000,
        36_000_000,
    ),
    // 72 MHz, ADC 12 MHz
    scale(
        Some(Hertz(16_000_000)),
        PllConfig::hse(PllMul::MUL9, PllXtpre::Div2),
        Ppre::Div2,
        Adcpre::Div6,
        Some(Usbpre::Div1_5),
        Latency::Ws2,
        72_000_000,
        36_000_000,
    ),
];

/// Connectivity line, PLL from HSE through PREDIV1
pub const CONNECTIVITY_CONFIGS: [ClockScale; 2] = [
    // 72 MHz, ADC 12 MHz
    scale(
        Some(Hertz(8_000_000)),
        PllConfig::hse_prediv(PllMul::MUL9, Prediv::Div1),
        Ppre::Div2,
        Adcpre::Div6,
        Some(Usbpre::Div1_5),
        Latency::Ws2,
        72_000_000,
        36_000_000,
    ),
    // 25 MHz / 5 * 8 = 40 MHz on PLL2, 40 MHz / 5 * 9 = 72 MHz
    scale(
        Some(Hertz(25_000_000)),
        PllConfig {
            prediv1_source: Prediv1Source::Pll2,
            pll2: Some(Pll2Config {
                prediv2: Prediv::Div5,
                mul: Pll23Mul::Mul8,
            }),
            ..PllConfig::hse_prediv(PllMul::MUL9, Prediv::Div5)
        },
        Ppre::Div2,
        Adcpre::Div6,
        Some(Usbpre::Div1_5),
        Latency::Ws2,
        72_000_000,
        36_000_000,
    ),
];

impl<R: RegisterBlock> Rcc<R, F1> {
    /// 24 MHz from HSI
    pub fn clock_setup_in_hsi_out_24mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(flash, &HSI_CONFIGS[HsiClock::Out24 as usize]);
    }

    /// 48 MHz from HSI, USB clock at 48 MHz
    pub fn clock_setup_in_hsi_out_48mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(flash, &HSI_CONFIGS[HsiClock::Out48 as usize]);
    }

    /// 64 MHz from HSI
    pub fn clock_setup_in_hsi_out_64mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(flash, &HSI_CONFIGS[HsiClock::Out64 as usize]);
    }

    /// 24 MHz from an 8 MHz crystal
    pub fn clock_setup_in_hse_8mhz_out_24mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(flash, &HSE_CONFIGS[HseClock::In8Out24 as usize]);
    }

    /// 72 MHz from an 8 MHz crystal
    pub fn clock_setup_in_hse_8mhz_out_72mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(flash, &HSE_CONFIGS[HseClock::In8Out72 as usize]);
    }

    /// 72 MHz from a 12 MHz crystal
    pub fn clock_setup_in_hse_12mhz_out_72mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(
            flash,
            &HSE_CONFIGS[HseClock::In12Out72 as usize],
        );
    }

    /// 72 MHz from a 16 MHz crystal
    pub fn clock_setup_in_hse_16mhz_out_72mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(
            flash,
            &HSE_CONFIGS[HseClock::In16Out72 as usize],
        );
    }
}

impl<R: RegisterBlock> Rcc<R, F1Connectivity> {
    /// 72 MHz from an 8 MHz crystal
    pub fn clock_setup_in_hse_8mhz_out_72mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(
            flash,
            &CONNECTIVITY_CONFIGS[ConnectivityClock::In8Out72 as usize],
        );
    }

    /// 72 MHz from a 25 MHz crystal, the usual Ethernet PHY reference
    pub fn clock_setup_in_hse_25mhz_out_72mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(
            flash,
            &CONNECTIVITY_CONFIGS[ConnectivityClock::In25Out72 as usize],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::EnableRegister;

    #[test]
    fn tables_are_consistent() {
        for scale in HSI_CONFIGS.iter().chain(HSE_CONFIGS.iter()) {
            let pll = scale.pll.output::<F1>(scale.hse).unwrap();
            assert_eq!(pll, scale.sysclk());
            assert_eq!(scale.flash_latency, Latency::for_sysclk(pll));
            assert!(scale.apb1_frequency.0 <= 36_000_000);
            assert_eq!(
                scale.apb1_frequency.0 * scale.ppre1.divisor(),
                scale.ahb_frequency.0
            );
            let adc = scale.apb2_frequency.0 / scale.adcpre.unwrap().divisor();
            assert!(adc <= 14_000_000);
        }
        for scale in CONNECTIVITY_CONFIGS.iter() {
            let pll = scale.pll.output::<F1Connectivity>(scale.hse).unwrap();
            assert_eq!(pll, Hertz(72_000_000));
        }
    }

    #[test]
    fn usb_tables_produce_48mhz() {
        let scale = &HSI_CONFIGS[HsiClock::Out48 as usize];
        assert_eq!(scale.usbpre, Some(Usbpre::Div1));

        for scale in &HSE_CONFIGS[1..] {
            assert_eq!(scale.usbpre, Some(Usbpre::Div1_5));
            assert_eq!(scale.sysclk().0 * 2 / 3, 48_000_000);
        }
    }

    #[test]
    fn multiplier_decoding() {
        assert_eq!(F1::pll_multiplier(0x0), Some(Multiplier::whole(2)));
        assert_eq!(F1::pll_multiplier(0xe), Some(Multiplier::whole(16)));
        assert_eq!(F1::pll_multiplier(0xf), Some(Multiplier::whole(16)));

        assert_eq!(F1Connectivity::pll_multiplier(0x1), None);
        assert_eq!(
            F1Connectivity::pll_multiplier(0x7),
            Some(Multiplier::whole(9))
        );
        assert_eq!(
            F1Connectivity::pll_multiplier(0xd),
            Some(Multiplier { num: 13, den: 2 })
        );
        assert_eq!(F1Connectivity::pll_multiplier(0xe), None);
    }

    #[test]
    fn peripheral_descriptors() {
        assert_eq!(GPIOA.register, EnableRegister::Apb2);
        assert_eq!(GPIOA.bit, 2);
        assert_eq!(USART2.register, EnableRegister::Apb1);
        assert_eq!(USART2.bit, 17);
        assert_eq!(DMA1.register, EnableRegister::Ahb);
        assert_eq!(rst::USART1.bit, 14);
    }
}

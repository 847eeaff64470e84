//! STM32F3
//!
//! The PLL input divider is PREDIV in CFGR2 and PLLXTPRE mirrors its low
//! bit. CFGR3 carries kernel clock switches for the USARTs and I2Cs.
//! There is no ADC prescaler in CFGR: the ADCs are clocked from the AHB
//! or from the PLL through CFGR2.
//!
//! See RM0316 section 9.4.

use log::trace;

use super::{Family, KernelClock};
use crate::flash::{Flash, Latency};
use tock_registers::fields::Field;
use tock_registers::LocalRegisterCopy;

use crate::mmio::RegisterBlock;
use crate::rcc::regs::{CFGR, CFGR3};
use crate::rcc::{
    ClockScale, Hpre, Multiplier, Osc, PllConfig, PllMul, Ppre, Prediv, Rcc,
    Usbpre,
};
use crate::time::Hertz;

/// STM32F3
#[derive(Clone, Copy, Debug)]
pub struct F3;

/// TIM1 register block
pub const TIM1_BASE: usize = 0x4001_2c00;
/// TIM2 register block
pub const TIM2_BASE: usize = 0x4000_0000;
/// USART1 register block
pub const USART1_BASE: usize = 0x4001_3800;
/// USART2 register block
pub const USART2_BASE: usize = 0x4000_4400;
/// USART3 register block
pub const USART3_BASE: usize = 0x4000_4800;
/// UART4 register block
pub const UART4_BASE: usize = 0x4000_4c00;
/// UART5 register block
pub const UART5_BASE: usize = 0x4000_5000;
/// I2C1 register block
pub const I2C1_BASE: usize = 0x4000_5400;
/// I2C2 register block
pub const I2C2_BASE: usize = 0x4000_5800;
/// SPI1 register block
pub const SPI1_BASE: usize = 0x4001_3000;

type Switch = Field<u32, CFGR3::Register>;

fn usart_switch(base: usize) -> Option<Switch> {
    match base {
        USART1_BASE => Some(CFGR3::USART1SW),
        USART2_BASE => Some(CFGR3::USART2SW),
        USART3_BASE => Some(CFGR3::USART3SW),
        UART4_BASE => Some(CFGR3::UART4SW),
        UART5_BASE => Some(CFGR3::UART5SW),
        _ => None,
    }
}

fn i2c_switch(base: usize) -> Option<Switch> {
    match base {
        I2C1_BASE => Some(CFGR3::I2C1SW),
        I2C2_BASE => Some(CFGR3::I2C2SW),
        _ => None,
    }
}

impl Family for F3 {
    const NAME: &'static str = "STM32F3";
    const OSCILLATORS: &'static [Osc] =
        &[Osc::Hsi, Osc::Hse, Osc::Lsi, Osc::Lse, Osc::Pll];
    const HAS_ADCPRE: bool = false;
    const HAS_PREDIV1: bool = true;
    const HAS_CFGR3: bool = true;
    const MCO: Field<u32, CFGR::Register> = CFGR::MCO_NARROW;

    fn pll_multiplier(bits: u32) -> Option<Multiplier> {
        match bits {
            0x0..=0xe => Some(Multiplier::whole(bits + 2)),
            0xf => Some(Multiplier::whole(16)),
            _ => None,
        }
    }

    fn usart_kernel(
        base: usize,
        cfgr3: LocalRegisterCopy<u32, CFGR3::Register>,
    ) -> KernelClock {
        match usart_switch(base).map(|sw| cfgr3.read(sw)) {
            Some(0b01) => KernelClock::Sysclk,
            Some(0b10) => KernelClock::Lse,
            Some(0b11) => KernelClock::Hsi,
            _ => KernelClock::Pclk,
        }
    }

    fn i2c_kernel(
        base: usize,
        cfgr3: LocalRegisterCopy<u32, CFGR3::Register>,
    ) -> KernelClock {
        match i2c_switch(base).map(|sw| cfgr3.read(sw)) {
            Some(1) => KernelClock::Sysclk,
            Some(_) => KernelClock::Hsi,
            None => KernelClock::Pclk,
        }
    }
}

peripheral_clocks! {
    Ahb: [
        DMA1 = 0, DMA2 = 1, SRAM = 2, FLITF = 4, FMC = 5, CRC = 6,
        GPIOH = 16, GPIOA = 17, GPIOB = 18, GPIOC = 19, GPIOD = 20,
        GPIOE = 21, GPIOF = 22, GPIOG = 23, TSC = 24, ADC12 = 28,
        ADC34 = 29,
    ];
    Apb2: [
        SYSCFG = 0, TIM1 = 11, SPI1 = 12, TIM8 = 13, USART1 = 14,
        SPI4 = 15, TIM15 = 16, TIM16 = 17, TIM17 = 18, TIM20 = 20,
    ];
    Apb1: [
        TIM2 = 0, TIM3 = 1, TIM4 = 2, TIM6 = 4, TIM7 = 5, WWDG = 11,
        SPI2 = 14, SPI3 = 15, USART2 = 17, USART3 = 18, UART4 = 19,
        UART5 = 20, I2C1 = 21, I2C2 = 22, USB = 23, CAN = 25, DAC2 = 26,
        PWR = 28, DAC1 = 29, I2C3 = 30,
    ];
}

/// Peripheral reset lines
pub mod rst {
    peripheral_resets! {
        Ahb: [
            FMC = 5, GPIOH = 16, GPIOA = 17, GPIOB = 18, GPIOC = 19,
            GPIOD = 20, GPIOE = 21, GPIOF = 22, GPIOG = 23, TSC = 24,
            ADC12 = 28, ADC34 = 29,
        ];
        Apb2: [
            SYSCFG = 0, TIM1 = 11, SPI1 = 12, TIM8 = 13, USART1 = 14,
            SPI4 = 15, TIM15 = 16, TIM16 = 17, TIM17 = 18, TIM20 = 20,
        ];
        Apb1: [
            TIM2 = 0, TIM3 = 1, TIM4 = 2, TIM6 = 4, TIM7 = 5, WWDG = 11,
            SPI2 = 14, SPI3 = 15, USART2 = 17, USART3 = 18, UART4 = 19,
            UART5 = 20, I2C1 = 21, I2C2 = 22, USB = 23, CAN = 25,
            DAC2 = 26, PWR = 28, DAC1 = 29, I2C3 = 30,
        ];
    }
}

/// Entries of [`HSI_CONFIGS`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HsiClock {
    /// 44 MHz SYSCLK
    Out44,
    /// 48 MHz SYSCLK
    Out48,
    /// 64 MHz SYSCLK
    Out64,
}

/// Entries of [`HSE_8MHZ_CONFIGS`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hse8MhzClock {
    /// 72 MHz SYSCLK, 48 MHz USB clock
    Out72,
}

const fn scale(
    hse: Option<Hertz>,
    pll: PllConfig,
    usbpre: Option<Usbpre>,
    flash_latency: Latency,
    ahb: u32,
) -> ClockScale {
    ClockScale {
        hse,
        pll,
        hpre: Hpre::Div1,
        ppre1: Ppre::Div2,
        ppre2: Ppre::Div1,
        adcpre: None,
        usbpre,
        flash_latency,
        prefetch: true,
        ahb_frequency: Hertz(ahb),
        apb1_frequency: Hertz(ahb / 2),
        apb2_frequency: Hertz(ahb),
    }
}

/// PLL from HSI/2
pub const HSI_CONFIGS: [ClockScale; 3] = [
    scale(
        None,
        PllConfig::hsi(PllMul::MUL11),
        None,
        Latency::Ws1,
        44_000_000,
    ),
    scale(
        None,
        PllConfig::hsi(PllMul::MUL12),
        None,
        Latency::Ws1,
        48_000_000,
    ),
    scale(
        None,
        PllConfig::hsi(PllMul::MUL16),
        None,
        Latency::Ws2,
        64_000_000,
    ),
];

/// PLL from an 8 MHz HSE through PREDIV
pub const HSE_8MHZ_CONFIGS: [ClockScale; 1] = [scale(
    Some(Hertz(8_000_000)),
    PllConfig::hse_prediv(PllMul::MUL9, Prediv::Div1),
    Some(Usbpre::Div1_5),
    Latency::Ws2,
    72_000_000,
)];

impl<R: RegisterBlock> Rcc<R, F3> {
    /// 44 MHz from HSI
    pub fn clock_setup_in_hsi_out_44mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_hsi(flash, &HSI_CONFIGS[HsiClock::Out44 as usize]);
    }

    /// 48 MHz from HSI
    pub fn clock_setup_in_hsi_out_48mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_hsi(flash, &HSI_CONFIGS[HsiClock::Out48 as usize]);
    }

    /// 64 MHz from HSI
    pub fn clock_setup_in_hsi_out_64mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_hsi(flash, &HSI_CONFIGS[HsiClock::Out64 as usize]);
    }

    /// 72 MHz from an 8 MHz crystal
    pub fn clock_setup_in_hse_8mhz_out_72mhz<FR: RegisterBlock>(
        &mut self,
        flash: &mut Flash<FR>,
    ) {
        self.clock_setup_pll(
            flash,
            &HSE_8MHZ_CONFIGS[Hse8MhzClock::Out72 as usize],
        );
    }

    /// Clock the I2C at `i2c` from HSI
    pub fn set_i2c_clock_hsi(&mut self, i2c: usize) {
        if let Some(sw) = i2c_switch(i2c) {
            trace!("I2C {:#x} on HSI", i2c);
            self.rb.modify_fields(CFGR3, sw.val(0));
        }
    }

    /// Clock the I2C at `i2c` from SYSCLK
    pub fn set_i2c_clock_sysclk(&mut self, i2c: usize) {
        if let Some(sw) = i2c_switch(i2c) {
            trace!("I2C {:#x} on SYSCLK", i2c);
            self.rb.modify_fields(CFGR3, sw.val(1));
        }
    }

    /// Raw I2C clock switch bits of CFGR3, I2C1 in bit 0
    pub fn i2c_clocks(&self) -> u32 {
        let cfgr3 = self.rb.fetch::<CFGR3::Register>(CFGR3);
        cfgr3.read(CFGR3::I2C1SW) | (cfgr3.read(CFGR3::I2C2SW) << 1)
    }

    /// Select the kernel clock of the USART at `usart`
    pub fn set_usart_clock(&mut self, usart: usize, clock: KernelClock) {
        if let Some(sw) = usart_switch(usart) {
            let bits = match clock {
                KernelClock::Pclk => 0b00,
                KernelClock::Sysclk => 0b01,
                KernelClock::Lse => 0b10,
                KernelClock::Hsi => 0b11,
            };
            trace!("USART {:#x} on {:?}", usart, clock);
            self.rb.modify_fields(CFGR3, sw.val(bits));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRegisters;

    #[test]
    fn tables_are_consistent() {
        for scale in HSI_CONFIGS.iter().chain(HSE_8MHZ_CONFIGS.iter()) {
            let pll = scale.pll.output::<F3>(scale.hse).unwrap();
            assert_eq!(pll, scale.sysclk());
            assert_eq!(scale.flash_latency, Latency::for_sysclk(pll));
            assert!(scale.apb1_frequency.0 <= 36_000_000);
            assert_eq!(scale.adcpre, None);
        }
    }

    #[test]
    fn i2c_clock_switch() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F3>::new(&regs);

        rcc.set_i2c_clock_sysclk(I2C2_BASE);
        assert_eq!(regs.peek(CFGR3), 1 << 5);
        assert_eq!(rcc.i2c_clocks(), 0b10);

        rcc.set_i2c_clock_sysclk(I2C1_BASE);
        rcc.set_i2c_clock_hsi(I2C2_BASE);
        assert_eq!(rcc.i2c_clocks(), 0b01);

        // No switch for other addresses
        rcc.set_i2c_clock_sysclk(0x4000_7800);
        assert_eq!(regs.peek(CFGR3), 1 << 4);
    }

    #[test]
    fn usart_clock_switch() {
        let regs = MockRegisters::new();
        let mut rcc = Rcc::<_, F3>::new(&regs);

        rcc.set_usart_clock(USART1_BASE, KernelClock::Sysclk);
        rcc.set_usart_clock(UART5_BASE, KernelClock::Hsi);
        assert_eq!(regs.peek(CFGR3), 0x00c0_0001);

        let cfgr3 = regs.fetch(CFGR3);
        assert_eq!(F3::usart_kernel(USART1_BASE, cfgr3), KernelClock::Sysclk);
        assert_eq!(F3::usart_kernel(UART5_BASE, cfgr3), KernelClock::Hsi);
        assert_eq!(F3::usart_kernel(USART2_BASE, cfgr3), KernelClock::Pclk);
        assert_eq!(F3::i2c_kernel(I2C1_BASE, cfgr3), KernelClock::Hsi);
        assert_eq!(F3::i2c_kernel(0x4000_7800, cfgr3), KernelClock::Pclk);
    }
}

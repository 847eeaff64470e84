//! RCC register map
//!
//! Offsets and bit positions shared by the STM32F1 and STM32F3 reference
//! manuals (RM0008 section 7.3 and 8.3, RM0316 section 9.4).
//!
//! Each offset shares its name with the bitfield module describing the
//! register, so `CR` addresses the register and `CR::HSEON` names a field
//! in it.

#![allow(missing_docs)]

use tock_registers::fields::Field;
use tock_registers::{register_bitfields, RegisterLongName};

/// Clock control register
pub const CR: usize = 0x00;
/// Clock configuration register
pub const CFGR: usize = 0x04;
/// Clock interrupt register
pub const CIR: usize = 0x08;
/// APB2 peripheral reset register
pub const APB2RSTR: usize = 0x0c;
/// APB1 peripheral reset register
pub const APB1RSTR: usize = 0x10;
/// AHB peripheral clock enable register
pub const AHBENR: usize = 0x14;
/// APB2 peripheral clock enable register
pub const APB2ENR: usize = 0x18;
/// APB1 peripheral clock enable register
pub const APB1ENR: usize = 0x1c;
/// Backup domain control register
pub const BDCR: usize = 0x20;
/// Control/status register
pub const CSR: usize = 0x24;
/// AHB peripheral reset register (connectivity line and F3)
pub const AHBRSTR: usize = 0x28;
/// Clock configuration register 2 (connectivity line and F3)
pub const CFGR2: usize = 0x2c;
/// Clock configuration register 3 (F3)
pub const CFGR3: usize = 0x30;

register_bitfields![u32,
    pub CR [
        PLL3RDY OFFSET(29) NUMBITS(1) [],
        PLL3ON OFFSET(28) NUMBITS(1) [],
        PLL2RDY OFFSET(27) NUMBITS(1) [],
        PLL2ON OFFSET(26) NUMBITS(1) [],
        PLLRDY OFFSET(25) NUMBITS(1) [],
        PLLON OFFSET(24) NUMBITS(1) [],
        CSSON OFFSET(19) NUMBITS(1) [],
        HSEBYP OFFSET(18) NUMBITS(1) [],
        HSERDY OFFSET(17) NUMBITS(1) [],
        HSEON OFFSET(16) NUMBITS(1) [],
        HSICAL OFFSET(8) NUMBITS(8) [],
        HSITRIM OFFSET(3) NUMBITS(5) [],
        HSIRDY OFFSET(1) NUMBITS(1) [],
        HSION OFFSET(0) NUMBITS(1) []
    ],
    pub CFGR [
        /// Four bits on the connectivity line
        MCO OFFSET(24) NUMBITS(4) [],
        /// Three bits on F1 and F3
        MCO_NARROW OFFSET(24) NUMBITS(3) [],
        USBPRE OFFSET(22) NUMBITS(1) [],
        PLLMUL OFFSET(18) NUMBITS(4) [],
        PLLXTPRE OFFSET(17) NUMBITS(1) [],
        PLLSRC OFFSET(16) NUMBITS(1) [],
        ADCPRE OFFSET(14) NUMBITS(2) [],
        PPRE2 OFFSET(11) NUMBITS(3) [],
        PPRE1 OFFSET(8) NUMBITS(3) [],
        HPRE OFFSET(4) NUMBITS(4) [],
        SWS OFFSET(2) NUMBITS(2) [],
        SW OFFSET(0) NUMBITS(2) []
    ],
    // Ready flags are numbered LSI, LSE, HSI, HSE, PLL, PLL2, PLL3 from
    // bit 0. The matching interrupt enable sits 8 bits higher and the
    // matching clear bit 16 bits higher.
    pub CIR [
        CSSC OFFSET(23) NUMBITS(1) [],
        CLEAR OFFSET(16) NUMBITS(7) [],
        IE OFFSET(8) NUMBITS(7) [],
        CSSF OFFSET(7) NUMBITS(1) [],
        FLAGS OFFSET(0) NUMBITS(7) []
    ],
    pub BDCR [
        BDRST OFFSET(16) NUMBITS(1) [],
        RTCEN OFFSET(15) NUMBITS(1) [],
        RTCSEL OFFSET(8) NUMBITS(2) [],
        LSEBYP OFFSET(2) NUMBITS(1) [],
        LSERDY OFFSET(1) NUMBITS(1) [],
        LSEON OFFSET(0) NUMBITS(1) []
    ],
    pub CSR [
        LPWRRSTF OFFSET(31) NUMBITS(1) [],
        WWDGRSTF OFFSET(30) NUMBITS(1) [],
        IWDGRSTF OFFSET(29) NUMBITS(1) [],
        SFTRSTF OFFSET(28) NUMBITS(1) [],
        PORRSTF OFFSET(27) NUMBITS(1) [],
        PINRSTF OFFSET(26) NUMBITS(1) [],
        /// Option byte loader reset, F3 only
        OBLRSTF OFFSET(25) NUMBITS(1) [],
        RMVF OFFSET(24) NUMBITS(1) [],
        /// Every reset flag, OBLRSTF through LPWRRSTF
        RESET_FLAGS OFFSET(25) NUMBITS(7) [],
        LSIRDY OFFSET(1) NUMBITS(1) [],
        LSION OFFSET(0) NUMBITS(1) []
    ],
    pub CFGR2 [
        PREDIV1SRC OFFSET(16) NUMBITS(1) [],
        PLL3MUL OFFSET(12) NUMBITS(4) [],
        PLL2MUL OFFSET(8) NUMBITS(4) [],
        PREDIV2 OFFSET(4) NUMBITS(4) [],
        /// PREDIV1 on the connectivity line, PREDIV on F3
        PREDIV1 OFFSET(0) NUMBITS(4) []
    ],
    pub CFGR3 [
        UART5SW OFFSET(22) NUMBITS(2) [],
        UART4SW OFFSET(20) NUMBITS(2) [],
        USART3SW OFFSET(18) NUMBITS(2) [],
        USART2SW OFFSET(16) NUMBITS(2) [],
        I2C2SW OFFSET(5) NUMBITS(1) [],
        I2C1SW OFFSET(4) NUMBITS(1) [],
        USART1SW OFFSET(0) NUMBITS(2) []
    ]
];

/// Bits `field` covers, in register position
pub const fn mask<B: RegisterLongName>(field: Field<u32, B>) -> u32 {
    field.mask << field.shift
}

/// Every oscillator enable bit in CR; each ready bit sits directly above
pub const CR_ON_MASK: u32 = mask(CR::HSION)
    | mask(CR::HSEON)
    | mask(CR::PLLON)
    | mask(CR::PLL2ON)
    | mask(CR::PLL3ON);

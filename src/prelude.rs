//! Prelude
pub use embedded_hal::prelude::*;

pub use crate::family::Family as _stm32_rcc_family_Family;
pub use crate::mmio::RegisterBlock as _stm32_rcc_mmio_RegisterBlock;
pub use crate::time::U32Ext as _stm32_rcc_time_U32Ext;

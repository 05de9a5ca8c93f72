//! Mini UART (AUX UART1)
//!
//! See the BCM2835 ARM Peripherals datasheet, Chapter 2, for the register
//! descriptions; the blocks sit at the BCM2837 addresses used by the
//! Raspberry Pi 3.
//!
//! ## Usage
//!
//! ```no_run
//! use bcm2837_mini_uart::uart::{self, Gpio14Gpio15, MiniUart, MiniUartPeripheral};
//! use fugit::RateExtU32;
//!
//! // Core clock feeding the mini UART baud generator.
//! const CORE_CLOCK_HZ: u32 = 250_000_000;
//!
//! let device = unsafe { MiniUart::new() };
//! let pins = unsafe { Gpio14Gpio15::new() };
//! let uart = MiniUartPeripheral::new(device, pins)
//!     .enable(uart::common_configs::_115200_8_N_1, CORE_CLOCK_HZ.Hz())
//!     .unwrap();
//!
//! uart.write_full_blocking(b"Hello World!\r\n");
//!
//! // Hand the line over to the interrupt-driven transport. The AUX IRQ
//! // handler must call `handle_rx_interrupt`/`handle_tx_interrupt` on this
//! // same instance, typically through a `Mutex<RefCell<Option<_>>>` static.
//! let uart = uart.into_buffered();
//! uart.enable_interrupts();
//! uart.write_byte(b'!');
//! ```

mod buffered;
mod device;
#[cfg(test)]
pub(crate) mod mock;
mod peripheral;
mod pins;
mod reader;
mod utils;
mod writer;

pub use self::buffered::BufferedMiniUart;
pub use self::device::MiniUart;
pub use self::peripheral::MiniUartPeripheral;
pub use self::pins::{Gpio14Gpio15, UartPinout};
pub use self::utils::*;

/// Common configurations for the mini UART.
pub mod common_configs;

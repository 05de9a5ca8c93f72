//! Driver for the BCM2837 mini UART (AUX UART1)
//!
//! The mini UART is the secondary serial port on the Raspberry Pi 3 family,
//! wired to GPIO 14/15 when those pins are in ALT5. This crate provides two
//! transports over the one physical line:
//!
//! * a polled transport ([`uart::MiniUartPeripheral`]) that busy-waits on the
//!   line status register, for boot-time and debug output
//! * an interrupt-driven transport ([`uart::BufferedMiniUart`]) that decouples
//!   callers from the hardware through a pair of fixed-capacity ring buffers,
//!   drained and filled by the AUX interrupt handlers
//!
//! Register access goes through the [`uart::MiniUartDevice`] trait, so the
//! transport and handler logic is independent of the memory-mapped register
//! block and can be exercised off-target.
//!
//! The crate expects the application to register a `critical-section`
//! implementation that masks interrupts; on a single core that bracket is all
//! the mutual exclusion the ring buffers need.

#![warn(missing_docs)]
#![no_std]

#[cfg(test)]
extern crate std;

pub mod buffer;
pub mod uart;

/// Capacity, in bytes, of each direction's ring buffer and of the scratch
/// buffer used to render formatted output.
///
/// One slot per ring buffer is sacrificed to tell full from empty, so at most
/// `BUFFER_CAPACITY - 1` bytes are ever queued per direction.
pub const BUFFER_CAPACITY: usize = 256;

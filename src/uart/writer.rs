//! Mini UART transmit path
//!
//! Polled transmission into the data register, plus the formatted-output
//! machinery shared with the buffered transport: rendering into a
//! fixed-size scratch buffer and the `\n` to `\r\n` expansion applied on
//! the way out.

use core::convert::Infallible;
use core::fmt;

use nb::Error::WouldBlock;

use super::{Error, MiniUartDevice};
use crate::BUFFER_CAPACITY;

/// Writes one byte to the data register.
///
/// Returns `WouldBlock` while the transmit holding register is occupied.
pub(crate) fn write_raw<D: MiniUartDevice>(device: &D, byte: u8) -> nb::Result<(), Infallible> {
    if !device.is_writable() {
        return Err(WouldBlock);
    }
    device.write_data(byte);
    Ok(())
}

/// Busy-waits until the transmitter accepts `byte`.
pub(crate) fn write_byte_blocking<D: MiniUartDevice>(device: &D, byte: u8) {
    loop {
        match write_raw(device, byte) {
            Ok(()) => return,
            Err(WouldBlock) => core::hint::spin_loop(),
        }
    }
}

/// Busy-waits until every byte of `data` has been accepted, verbatim.
pub(crate) fn write_full_blocking<D: MiniUartDevice>(device: &D, data: &[u8]) {
    for &byte in data {
        write_byte_blocking(device, byte);
    }
}

/// Returns `Ok(())` once the transmitter has drained its shift register, or
/// `WouldBlock` while bytes are still going out on the wire.
pub(crate) fn transmit_flushed<D: MiniUartDevice>(device: &D) -> nb::Result<(), Infallible> {
    if device.is_transmit_idle() {
        Ok(())
    } else {
        Err(WouldBlock)
    }
}

/// Feeds `data` to `emit` with every `\n` preceded by a `\r`.
///
/// The serial console expects CRLF line endings; callers write plain `\n`
/// and the expansion happens once, here, on the physical byte stream.
pub(crate) fn emit_crlf_expanded(data: &[u8], mut emit: impl FnMut(u8)) {
    for &byte in data {
        if byte == b'\n' {
            emit(b'\r');
        }
        emit(byte);
    }
}

/// Render target for formatted output.
///
/// Formatting is done in full before any byte touches the wire, so a
/// rendering error cannot leave a half-written line behind. The scratch is
/// the same size as the transfer buffers; output that does not fit is
/// rejected as [`Error::Overflow`] rather than truncated.
pub(crate) struct FmtBuffer {
    buf: [u8; BUFFER_CAPACITY],
    used: usize,
}

impl FmtBuffer {
    /// Renders `args`, failing if the result exceeds the scratch size.
    pub(crate) fn render(args: fmt::Arguments<'_>) -> Result<Self, Error> {
        let mut buffer = Self {
            buf: [0; BUFFER_CAPACITY],
            used: 0,
        };
        fmt::write(&mut buffer, args).map_err(|_| Error::Overflow)?;
        Ok(buffer)
    }

    /// The rendered bytes, before CRLF expansion.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.used]
    }

    /// Rendered length in bytes. This is what the formatted-write calls
    /// report; the physical byte count is larger when `\r`s get injected.
    pub(crate) fn len(&self) -> usize {
        self.used
    }
}

impl fmt::Write for FmtBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = &mut self.buf[self.used..];
        if bytes.len() > remaining.len() {
            return Err(fmt::Error);
        }
        remaining[..bytes.len()].copy_from_slice(bytes);
        self.used += bytes.len();
        Ok(())
    }
}

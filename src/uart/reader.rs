//! Mini UART receive path
//!
//! Polled reception straight from the data register. The line-ending policy
//! lives here: a console sending `\r` on Enter is normalised to `\n` by the
//! blocking read, so callers never see carriage returns. The raw `nb` read
//! does not translate; the buffered transport stores and returns bytes
//! exactly as they arrived and only the handler's echo is normalised.

use core::convert::Infallible;

use nb::Error::WouldBlock;

use super::MiniUartDevice;

/// Maps the console's carriage return to a newline, leaving every other
/// byte untouched.
pub(crate) fn normalize_line_ending(byte: u8) -> u8 {
    if byte == b'\r' {
        b'\n'
    } else {
        byte
    }
}

/// Reads one byte from the data register, untranslated.
///
/// Returns `WouldBlock` while the receiver has no data.
pub(crate) fn read_raw<D: MiniUartDevice>(device: &D) -> nb::Result<u8, Infallible> {
    if !device.is_readable() {
        return Err(WouldBlock);
    }
    Ok(device.read_data())
}

/// Busy-waits for a byte and normalises `\r` to `\n`.
pub(crate) fn read_byte_blocking<D: MiniUartDevice>(device: &D) -> u8 {
    loop {
        match read_raw(device) {
            Ok(byte) => return normalize_line_ending(byte),
            Err(WouldBlock) => core::hint::spin_loop(),
        }
    }
}

/// Busy-waits until `buffer` has been filled with received bytes.
///
/// Bytes are normalised the same way as [`read_byte_blocking`].
pub(crate) fn read_full_blocking<D: MiniUartDevice>(device: &D, buffer: &mut [u8]) {
    for slot in buffer.iter_mut() {
        *slot = read_byte_blocking(device);
    }
}

//! Mini UART peripheral driver
//!
//! Brings the device abstraction, pins, reader and writer together into a
//! typestated peripheral: construct it disabled, run the one-time
//! configuration sequence with [`MiniUartPeripheral::enable`], then either
//! use the polled transport directly or trade it for the interrupt-driven
//! one with [`MiniUartPeripheral::into_buffered`].

use core::convert::Infallible;
use core::fmt;

use embedded_hal_nb::serial;
use fugit::HertzU32;

use super::{
    reader, writer, BufferedMiniUart, Disabled, Enabled, Error, MiniUartDevice, State, UartConfig,
    UartPinout,
};

/// A mini UART peripheral over an underlying register device.
pub struct MiniUartPeripheral<S: State, D: MiniUartDevice, P: UartPinout> {
    device: D,
    pins: P,
    _state: S,
}

impl<S: State, D: MiniUartDevice, P: UartPinout> MiniUartPeripheral<S, D, P> {
    fn transition<To: State>(self, state: To) -> MiniUartPeripheral<To, D, P> {
        MiniUartPeripheral {
            device: self.device,
            pins: self.pins,
            _state: state,
        }
    }

    /// Releases the underlying device and pins.
    pub fn free(self) -> (D, P) {
        (self.device, self.pins)
    }
}

impl<D: MiniUartDevice, P: UartPinout> MiniUartPeripheral<Disabled, D, P> {
    /// Creates a mini UART peripheral in the disabled state.
    pub fn new(device: D, pins: P) -> Self {
        Self {
            device,
            pins,
            _state: Disabled,
        }
    }

    /// Configures and enables the mini UART.
    ///
    /// Runs the whole bring-up in order: enable the AUX block, hold the
    /// transmitter and receiver off, mask both interrupt sources, program
    /// frame size, flow control and baud counter, clear the FIFOs, route
    /// the pins, and finally turn the transmitter and receiver on.
    ///
    /// `frequency` is the core clock feeding the baud generator. Must run
    /// to completion before any transport call; it is not re-entrant.
    pub fn enable(
        self,
        config: UartConfig,
        frequency: HertzU32,
    ) -> Result<MiniUartPeripheral<Enabled, D, P>, Error> {
        let divisor = baud_divisor(config.baudrate, frequency)?;
        let (device, mut pins) = self.free();

        device.enable_block();
        device.set_tx_rx_enabled(false, false);
        device.set_rx_interrupt(false);
        device.set_tx_interrupt(false);

        device.set_data_bits(config.data_bits);
        device.disable_flow_control();
        device.set_baud_divisor(divisor);
        device.clear_fifos();

        pins.configure();

        device.set_tx_rx_enabled(true, true);

        Ok(MiniUartPeripheral {
            device,
            pins,
            _state: Enabled,
        })
    }
}

impl<D: MiniUartDevice, P: UartPinout> MiniUartPeripheral<Enabled, D, P> {
    /// Disables the mini UART, falling back to the disabled state.
    pub fn disable(self) -> MiniUartPeripheral<Disabled, D, P> {
        self.device.set_rx_interrupt(false);
        self.device.set_tx_interrupt(false);
        self.device.set_tx_rx_enabled(false, false);
        self.transition(Disabled)
    }

    /// Is there space in the transmit holding register?
    pub fn uart_is_writable(&self) -> bool {
        self.device.is_writable()
    }

    /// Is there received data ready to be read?
    pub fn uart_is_readable(&self) -> bool {
        self.device.is_readable()
    }

    /// Writes one byte, busy-waiting until the transmitter accepts it.
    pub fn write_byte_blocking(&self, byte: u8) {
        writer::write_byte_blocking(&self.device, byte);
    }

    /// Writes all of `data` verbatim, busy-waiting as needed.
    ///
    /// No line-ending expansion is applied; use
    /// [`write_formatted`](Self::write_formatted) for console text.
    pub fn write_full_blocking(&self, data: &[u8]) {
        writer::write_full_blocking(&self.device, data);
    }

    /// Reads one byte, busy-waiting until data arrives.
    ///
    /// Carriage returns are normalised to `\n` so line input reads the same
    /// regardless of the terminal's Enter key.
    pub fn read_byte_blocking(&self) -> u8 {
        reader::read_byte_blocking(&self.device)
    }

    /// Fills `buffer` with received bytes, busy-waiting as needed.
    ///
    /// The same `\r` to `\n` normalisation as
    /// [`read_byte_blocking`](Self::read_byte_blocking) applies.
    pub fn read_full_blocking(&self, buffer: &mut [u8]) {
        reader::read_full_blocking(&self.device, buffer);
    }

    /// Renders `args` and sends the result, expanding `\n` to `\r\n`.
    ///
    /// Returns the rendered length, which excludes the injected carriage
    /// returns. Fails with [`Error::Overflow`] if the rendered text exceeds
    /// [`BUFFER_CAPACITY`](crate::BUFFER_CAPACITY).
    pub fn write_formatted(&self, args: fmt::Arguments<'_>) -> Result<usize, Error> {
        let rendered = writer::FmtBuffer::render(args)?;
        writer::emit_crlf_expanded(rendered.as_bytes(), |byte| {
            writer::write_byte_blocking(&self.device, byte)
        });
        Ok(rendered.len())
    }

    /// Trades the polled peripheral for the interrupt-driven, buffered one.
    ///
    /// The pins stay configured and are consumed.
    pub fn into_buffered(self) -> BufferedMiniUart<D> {
        let (device, pins) = self.free();
        drop(pins);
        BufferedMiniUart::new(device)
    }
}

/// Computes the AUX_MU_BAUD counter value for a wanted baud rate.
///
/// The mini UART runs at `clock / (8 * (counter + 1))`, so
/// `counter = clock / (8 * baud) - 1`, rounded down.
fn baud_divisor(wanted_baudrate: HertzU32, frequency: HertzU32) -> Result<u16, Error> {
    let divisor = frequency
        .to_Hz()
        .checked_div(wanted_baudrate.to_Hz().checked_mul(8).ok_or(Error::BadArgument)?)
        .and_then(|d| d.checked_sub(1))
        .ok_or(Error::BadArgument)?;

    u16::try_from(divisor).map_err(|_| Error::BadArgument)
}

impl<D: MiniUartDevice, P: UartPinout> serial::ErrorType for MiniUartPeripheral<Enabled, D, P> {
    type Error = Infallible;
}

impl<D: MiniUartDevice, P: UartPinout> serial::Read<u8> for MiniUartPeripheral<Enabled, D, P> {
    /// Reads the data register without line-ending normalisation.
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        reader::read_raw(&self.device)
    }
}

impl<D: MiniUartDevice, P: UartPinout> serial::Write<u8> for MiniUartPeripheral<Enabled, D, P> {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        writer::write_raw(&self.device, word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        writer::transmit_flushed(&self.device)
    }
}

impl<D: MiniUartDevice, P: UartPinout> fmt::Write for MiniUartPeripheral<Enabled, D, P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        writer::emit_crlf_expanded(s.as_bytes(), |byte| {
            writer::write_byte_blocking(&self.device, byte)
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::common_configs;
    use crate::uart::mock::{MockDevice, NoPins};
    use fugit::RateExtU32;

    fn enabled_uart(device: MockDevice) -> MiniUartPeripheral<Enabled, MockDevice, NoPins> {
        MiniUartPeripheral::new(device, NoPins)
            .enable(common_configs::_115200_8_N_1, 250_000_000.Hz())
            .unwrap()
    }

    #[test]
    fn divisor_matches_the_datasheet_example() {
        // 250 MHz core clock at 115200 baud is the canonical setting.
        assert_eq!(baud_divisor(115_200.Hz(), 250_000_000.Hz()), Ok(270));
    }

    #[test]
    fn divisor_rejects_unreachable_rates() {
        // Faster than the clock can divide down to.
        assert_eq!(
            baud_divisor(250_000_000.Hz(), 1_000_000.Hz()),
            Err(Error::BadArgument)
        );
        // Slow enough to overflow the 16-bit counter.
        assert_eq!(
            baud_divisor(110.Hz(), 250_000_000.Hz()),
            Err(Error::BadArgument)
        );
    }

    #[test]
    fn enable_runs_the_bring_up_sequence() {
        let uart = enabled_uart(MockDevice::new());
        let (device, _pins) = uart.free();
        assert!(device.block_enabled.get());
        assert!(device.tx_enabled.get());
        assert!(device.rx_enabled.get());
        assert!(!device.rx_irq_enabled.get());
        assert!(!device.tx_irq_enabled.get());
        assert_eq!(device.baud_divisor.get(), 270);
        assert!(device.fifos_cleared.get());
        assert!(device.flow_control_disabled.get());
        assert_eq!(device.data_bits.get(), Some(crate::uart::DataBits::Eight));
    }

    #[test]
    fn blocking_read_translates_carriage_return() {
        let device = MockDevice::new();
        device.queue_incoming(b"\rx");
        let uart = enabled_uart(device);
        assert_eq!(uart.read_byte_blocking(), b'\n');
        // Every other byte passes through unchanged.
        assert_eq!(uart.read_byte_blocking(), b'x');
    }

    #[test]
    fn raw_read_does_not_translate() {
        use embedded_hal_nb::serial::Read;

        let device = MockDevice::new();
        device.queue_incoming(b"\r");
        let mut uart = enabled_uart(device);
        assert_eq!(uart.read(), Ok(b'\r'));
        assert_eq!(uart.read(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn formatted_write_expands_newlines_and_reports_rendered_length() {
        let uart = enabled_uart(MockDevice::new());
        let count = uart.write_formatted(format_args!("A\nB")).unwrap();
        assert_eq!(count, 3);
        let (device, _pins) = uart.free();
        assert_eq!(device.transmitted(), b"A\r\nB");
    }

    #[test]
    fn write_full_blocking_is_verbatim() {
        let uart = enabled_uart(MockDevice::new());
        uart.write_full_blocking(b"1\n2");
        let (device, _pins) = uart.free();
        assert_eq!(device.transmitted(), b"1\n2");
    }
}

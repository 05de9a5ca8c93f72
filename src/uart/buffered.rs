//! Interrupt-driven, buffered mini UART transport
//!
//! A pair of ring buffers decouples callers from the line rate: writers
//! queue bytes and the transmit interrupt drains them to the hardware,
//! while the receive interrupt queues incoming bytes for readers. Each
//! handler moves exactly one byte per invocation and parks its interrupt
//! source when its buffer reaches the terminal condition (outbound empty,
//! inbound full), so the source doubles as the "work to do" flag.
//!
//! Buffer mutations from caller context are bracketed by
//! `critical_section::with`, which on a single core masks interrupts. That
//! is the only guard the cursors need: within one direction the caller and
//! the handler each advance their own cursor, never the other's.
//!
//! The driver is shared with the interrupt handlers by reference; every
//! method takes `&self`. The usual shape is a
//! `Mutex<RefCell<Option<BufferedMiniUart<_>>>>` static that the AUX IRQ
//! handler and the main thread both borrow.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;

use super::{reader, writer, Error, MiniUartDevice};
use crate::buffer::RingBuffer;
use crate::BUFFER_CAPACITY;

use embedded_hal_nb::serial;
use nb::Error::WouldBlock;

/// The interrupt-driven transport over a mini UART device.
///
/// Obtained from an enabled peripheral via
/// [`into_buffered`](super::MiniUartPeripheral::into_buffered).
pub struct BufferedMiniUart<D: MiniUartDevice> {
    device: D,
    rx_buffer: Mutex<RefCell<RingBuffer<BUFFER_CAPACITY>>>,
    tx_buffer: Mutex<RefCell<RingBuffer<BUFFER_CAPACITY>>>,
}

impl<D: MiniUartDevice> BufferedMiniUart<D> {
    pub(super) fn new(device: D) -> Self {
        Self {
            device,
            rx_buffer: Mutex::new(RefCell::new(RingBuffer::new())),
            tx_buffer: Mutex::new(RefCell::new(RingBuffer::new())),
        }
    }

    /// Enables both interrupt sources and the AUX IRQ line.
    pub fn enable_interrupts(&self) {
        self.device.set_rx_interrupt(true);
        self.device.set_tx_interrupt(true);
        self.device.set_irq_line(true);
    }

    /// Disables both interrupt sources.
    ///
    /// The AUX IRQ line stays routed; with both sources masked the
    /// peripheral no longer asserts it.
    pub fn disable_interrupts(&self) {
        self.device.set_rx_interrupt(false);
        self.device.set_tx_interrupt(false);
    }

    /// Tries to queue one byte for transmission.
    ///
    /// On `WouldBlock` the outbound buffer was full; the transmit source
    /// has been asserted so the drain handler will make room.
    pub fn try_write(&self, byte: u8) -> nb::Result<(), core::convert::Infallible> {
        let queued =
            critical_section::with(|cs| self.tx_buffer.borrow_ref_mut(cs).push(byte).is_ok());
        if queued {
            // Guarantee a drain even if the handler parked itself before
            // this byte was queued.
            self.device.set_tx_interrupt(true);
            Ok(())
        } else {
            self.device.set_tx_interrupt(true);
            Err(WouldBlock)
        }
    }

    /// Queues one byte for transmission, spinning while the outbound
    /// buffer is full.
    ///
    /// Never drops the byte; slower-than-producer hardware shows up as
    /// time spent spinning here.
    pub fn write_byte(&self, byte: u8) {
        loop {
            match self.try_write(byte) {
                Ok(()) => return,
                Err(WouldBlock) => core::hint::spin_loop(),
            }
        }
    }

    /// Queues all of `data` verbatim, spinning as needed.
    pub fn write_full_blocking(&self, data: &[u8]) {
        for &byte in data {
            self.write_byte(byte);
        }
    }

    /// Tries to take one received byte out of the inbound buffer.
    ///
    /// Asserts the receive source first, so hardware keeps feeding the
    /// buffer; on `WouldBlock` nothing had arrived yet.
    ///
    /// Unlike the polled [`read_byte_blocking`], bytes come back exactly as
    /// they arrived on the wire: no `\r` to `\n` normalisation. The receive
    /// handler normalises only its echo.
    ///
    /// [`read_byte_blocking`]: super::MiniUartPeripheral::read_byte_blocking
    pub fn try_read(&self) -> nb::Result<u8, core::convert::Infallible> {
        // Re-asserted on every attempt in case the source auto-cleared.
        self.device.set_rx_interrupt(true);
        critical_section::with(|cs| self.rx_buffer.borrow_ref_mut(cs).pop()).ok_or(WouldBlock)
    }

    /// Takes one received byte, spinning while the inbound buffer is
    /// empty. See [`try_read`](Self::try_read) for the translation policy.
    pub fn read_byte(&self) -> u8 {
        loop {
            match self.try_read() {
                Ok(byte) => return byte,
                Err(WouldBlock) => core::hint::spin_loop(),
            }
        }
    }

    /// Renders `args` and queues the result, expanding `\n` to `\r\n`.
    ///
    /// Same contract as the polled
    /// [`write_formatted`](super::MiniUartPeripheral::write_formatted):
    /// returns the rendered length, excluding injected carriage returns;
    /// [`Error::Overflow`] if the rendering exceeds the scratch buffer.
    pub fn write_formatted(&self, args: fmt::Arguments<'_>) -> Result<usize, Error> {
        let rendered = writer::FmtBuffer::render(args)?;
        writer::emit_crlf_expanded(rendered.as_bytes(), |byte| self.write_byte(byte));
        Ok(rendered.len())
    }

    /// Receive-side interrupt handler. Call once per AUX IRQ dispatch while
    /// the receive source is asserted.
    ///
    /// Moves at most one byte from the data register into the inbound
    /// buffer and echoes it back on the line (with `\r` shown as `\n`).
    /// When the buffer is full the byte is left in the hardware and the
    /// source is parked: data arriving while software is not draining is
    /// dropped, deliberately, rather than overwriting queued bytes. A later
    /// [`try_read`](Self::try_read) re-arms the source.
    pub fn handle_rx_interrupt(&self) {
        let full = critical_section::with(|cs| self.rx_buffer.borrow_ref(cs).is_full());
        if full {
            self.device.set_rx_interrupt(false);
            return;
        }

        let byte = self.device.read_data();
        critical_section::with(|cs| {
            // Cannot fail: fullness was checked above and this handler is
            // the buffer's only producer.
            let _ = self.rx_buffer.borrow_ref_mut(cs).push(byte);
        });

        writer::write_byte_blocking(&self.device, reader::normalize_line_ending(byte));
        self.device.set_rx_interrupt(true);
    }

    /// Transmit-side interrupt handler. Call once per AUX IRQ dispatch
    /// while the transmit source is asserted.
    ///
    /// Moves at most one byte from the outbound buffer to the data
    /// register; parks the source when the buffer is empty.
    pub fn handle_tx_interrupt(&self) {
        match critical_section::with(|cs| self.tx_buffer.borrow_ref_mut(cs).pop()) {
            None => self.device.set_tx_interrupt(false),
            Some(byte) => {
                writer::write_byte_blocking(&self.device, byte);
                self.device.set_tx_interrupt(true);
            }
        }
    }

    /// Releases the underlying device, dropping any queued bytes.
    pub fn release(self) -> D {
        self.device
    }
}

impl<D: MiniUartDevice> serial::ErrorType for BufferedMiniUart<D> {
    type Error = core::convert::Infallible;
}

impl<D: MiniUartDevice> serial::Read<u8> for BufferedMiniUart<D> {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.try_read()
    }
}

impl<D: MiniUartDevice> serial::Write<u8> for BufferedMiniUart<D> {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.try_write(word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        let empty = critical_section::with(|cs| self.tx_buffer.borrow_ref(cs).is_empty());
        if empty {
            writer::transmit_flushed(&self.device)
        } else {
            Err(WouldBlock)
        }
    }
}

/// Lets `write!` target a shared driver, e.g. one living in a static. The
/// expansion policy matches [`BufferedMiniUart::write_formatted`].
impl<D: MiniUartDevice> fmt::Write for &BufferedMiniUart<D> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        writer::emit_crlf_expanded(s.as_bytes(), |byte| self.write_byte(byte));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::mock::MockDevice;

    fn buffered(device: MockDevice) -> BufferedMiniUart<MockDevice> {
        BufferedMiniUart::new(device)
    }

    /// Occupancy of the inbound buffer.
    fn rx_len(uart: &BufferedMiniUart<MockDevice>) -> usize {
        critical_section::with(|cs| uart.rx_buffer.borrow_ref(cs).len())
    }

    /// Fills the inbound buffer to `target` occupancy, after first cycling
    /// the cursors forward so later pushes exercise wraparound.
    fn prefill_rx(uart: &BufferedMiniUart<MockDevice>, target: usize) {
        critical_section::with(|cs| {
            let mut rx = uart.rx_buffer.borrow_ref_mut(cs);
            for i in 0..100 {
                rx.push(i).unwrap();
            }
            for _ in 0..100 {
                rx.pop().unwrap();
            }
            for i in 0..target {
                rx.push(i as u8).unwrap();
            }
        });
    }

    #[test]
    fn queued_bytes_drain_in_order() {
        let uart = buffered(MockDevice::new());
        uart.write_full_blocking(b"abc");
        for _ in 0..3 {
            uart.handle_tx_interrupt();
        }
        assert_eq!(uart.device.transmitted(), b"abc");
        // Buffer drained; one more dispatch parks the source.
        uart.handle_tx_interrupt();
        assert!(!uart.device.tx_irq_enabled.get());
    }

    #[test]
    fn write_asserts_the_transmit_source() {
        let uart = buffered(MockDevice::new());
        uart.write_byte(b'x');
        assert!(uart.device.tx_irq_enabled.get());
    }

    #[test]
    fn tx_handler_on_empty_buffer_parks_source_and_moves_nothing() {
        let uart = buffered(MockDevice::new());
        uart.device.set_tx_interrupt(true);
        uart.handle_tx_interrupt();
        assert!(!uart.device.tx_irq_enabled.get());
        assert!(uart.device.transmitted().is_empty());
        let cursors = critical_section::with(|cs| {
            let tx = uart.tx_buffer.borrow_ref(cs);
            (tx.len(), tx.is_empty())
        });
        assert_eq!(cursors, (0, true));
    }

    #[test]
    fn rx_handler_moves_one_byte_and_echoes_it() {
        let uart = buffered(MockDevice::new());
        uart.device.queue_incoming(b"hi");
        uart.handle_rx_interrupt();
        assert_eq!(rx_len(&uart), 1);
        // Exactly one byte per invocation.
        assert_eq!(uart.device.pending_incoming(), 1);
        assert_eq!(uart.device.transmitted(), b"h");
        assert!(uart.device.rx_irq_enabled.get());
        assert_eq!(uart.read_byte(), b'h');
    }

    #[test]
    fn rx_handler_accepts_into_the_last_free_slot() {
        let uart = buffered(MockDevice::new());
        let capacity = critical_section::with(|cs| uart.rx_buffer.borrow_ref(cs).capacity());
        prefill_rx(&uart, capacity - 1);
        uart.device.queue_incoming(b"z");

        uart.handle_rx_interrupt();

        assert_eq!(rx_len(&uart), capacity);
        assert!(critical_section::with(|cs| uart.rx_buffer.borrow_ref(cs).is_full()));
        assert_eq!(uart.device.transmitted(), b"z");
        assert!(uart.device.rx_irq_enabled.get());
    }

    #[test]
    fn rx_handler_on_full_buffer_drops_and_parks_source() {
        let uart = buffered(MockDevice::new());
        let capacity = critical_section::with(|cs| uart.rx_buffer.borrow_ref(cs).capacity());
        prefill_rx(&uart, capacity);
        uart.device.queue_incoming(b"q");
        uart.device.set_rx_interrupt(true);

        uart.handle_rx_interrupt();

        // The byte was never taken out of the data register and nothing
        // was echoed.
        assert_eq!(uart.device.pending_incoming(), 1);
        assert!(uart.device.transmitted().is_empty());
        assert!(!uart.device.rx_irq_enabled.get());
        assert_eq!(rx_len(&uart), capacity);
    }

    #[test]
    fn buffered_read_does_not_translate_carriage_returns() {
        let uart = buffered(MockDevice::new());
        uart.device.queue_incoming(b"\r");
        uart.handle_rx_interrupt();
        // Stored and returned as received; only the echo was normalised.
        assert_eq!(uart.read_byte(), b'\r');
        assert_eq!(uart.device.transmitted(), b"\n");
    }

    #[test]
    fn try_read_on_empty_buffer_arms_the_receive_source() {
        let uart = buffered(MockDevice::new());
        assert_eq!(uart.try_read(), Err(WouldBlock));
        assert!(uart.device.rx_irq_enabled.get());
    }

    #[test]
    fn formatted_write_expands_newlines_through_the_queue() {
        let uart = buffered(MockDevice::new());
        let count = uart.write_formatted(format_args!("A\nB")).unwrap();
        assert_eq!(count, 3);
        for _ in 0..4 {
            uart.handle_tx_interrupt();
        }
        assert_eq!(uart.device.transmitted(), b"A\r\nB");
    }

    #[test]
    fn interleaved_send_and_drain_delivers_every_byte_once_in_order() {
        use crate::uart::mock::NoPins;
        use crate::uart::{common_configs, MiniUartPeripheral};
        use fugit::RateExtU32;

        // Full bring-up first, as an application would do it.
        let uart = MiniUartPeripheral::new(MockDevice::new(), NoPins)
            .enable(common_configs::_115200_8_N_1, 250_000_000.Hz())
            .unwrap()
            .into_buffered();
        uart.enable_interrupts();
        let capacity = critical_section::with(|cs| uart.tx_buffer.borrow_ref(cs).capacity());
        // One distinct byte per usable slot, drained as it is produced.
        for i in 0..capacity {
            uart.write_byte(i as u8);
            uart.handle_tx_interrupt();
        }
        let sent = uart.device.transmitted();
        assert_eq!(sent.len(), capacity);
        for (i, &byte) in sent.iter().enumerate() {
            assert_eq!(byte, i as u8);
        }
    }

    #[test]
    fn writeln_through_a_shared_reference() {
        use core::fmt::Write;

        let uart = buffered(MockDevice::new());
        writeln!(&uart, "ok").unwrap();
        for _ in 0..4 {
            uart.handle_tx_interrupt();
        }
        assert_eq!(uart.device.transmitted(), b"ok\r\n");
    }

    #[test]
    fn interrupt_pair_toggles_sources_and_irq_line() {
        let uart = buffered(MockDevice::new());
        uart.enable_interrupts();
        assert!(uart.device.rx_irq_enabled.get());
        assert!(uart.device.tx_irq_enabled.get());
        assert!(uart.device.irq_line_enabled.get());
        uart.disable_interrupts();
        assert!(!uart.device.rx_irq_enabled.get());
        assert!(!uart.device.tx_irq_enabled.get());
    }
}

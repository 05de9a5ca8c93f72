//! In-memory stand-in for the mini UART registers, used by the unit tests.

use core::cell::{Cell, RefCell};

use std::collections::VecDeque;
use std::vec::Vec;

use super::{DataBits, MiniUartDevice, UartPinout};

/// A register double: the receive side is fed by the test, the transmit
/// side records every byte written to the data register. The transmitter
/// always has room, so blocking writes never spin.
pub(crate) struct MockDevice {
    incoming: RefCell<VecDeque<u8>>,
    outgoing: RefCell<Vec<u8>>,
    pub(crate) block_enabled: Cell<bool>,
    pub(crate) tx_enabled: Cell<bool>,
    pub(crate) rx_enabled: Cell<bool>,
    pub(crate) rx_irq_enabled: Cell<bool>,
    pub(crate) tx_irq_enabled: Cell<bool>,
    pub(crate) irq_line_enabled: Cell<bool>,
    pub(crate) baud_divisor: Cell<u16>,
    pub(crate) data_bits: Cell<Option<DataBits>>,
    pub(crate) flow_control_disabled: Cell<bool>,
    pub(crate) fifos_cleared: Cell<bool>,
}

impl MockDevice {
    pub(crate) fn new() -> Self {
        Self {
            incoming: RefCell::new(VecDeque::new()),
            outgoing: RefCell::new(Vec::new()),
            block_enabled: Cell::new(false),
            tx_enabled: Cell::new(false),
            rx_enabled: Cell::new(false),
            rx_irq_enabled: Cell::new(false),
            tx_irq_enabled: Cell::new(false),
            irq_line_enabled: Cell::new(false),
            baud_divisor: Cell::new(0),
            data_bits: Cell::new(None),
            flow_control_disabled: Cell::new(false),
            fifos_cleared: Cell::new(false),
        }
    }

    /// Makes `bytes` available on the receive side, oldest first.
    pub(crate) fn queue_incoming(&self, bytes: &[u8]) {
        self.incoming.borrow_mut().extend(bytes.iter().copied());
    }

    /// Everything written to the data register so far.
    pub(crate) fn transmitted(&self) -> Vec<u8> {
        self.outgoing.borrow().clone()
    }

    /// Bytes queued on the receive side but not yet read by the driver.
    pub(crate) fn pending_incoming(&self) -> usize {
        self.incoming.borrow().len()
    }
}

impl MiniUartDevice for MockDevice {
    fn enable_block(&self) {
        self.block_enabled.set(true);
    }

    fn set_tx_rx_enabled(&self, tx: bool, rx: bool) {
        self.tx_enabled.set(tx);
        self.rx_enabled.set(rx);
    }

    fn set_data_bits(&self, data_bits: DataBits) {
        self.data_bits.set(Some(data_bits));
    }

    fn disable_flow_control(&self) {
        self.flow_control_disabled.set(true);
    }

    fn set_baud_divisor(&self, divisor: u16) {
        self.baud_divisor.set(divisor);
    }

    fn clear_fifos(&self) {
        self.fifos_cleared.set(true);
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn is_readable(&self) -> bool {
        !self.incoming.borrow().is_empty()
    }

    fn is_transmit_idle(&self) -> bool {
        true
    }

    fn write_data(&self, byte: u8) {
        self.outgoing.borrow_mut().push(byte);
    }

    fn read_data(&self) -> u8 {
        self.incoming.borrow_mut().pop_front().unwrap_or(0)
    }

    fn set_rx_interrupt(&self, enabled: bool) {
        self.rx_irq_enabled.set(enabled);
    }

    fn set_tx_interrupt(&self, enabled: bool) {
        self.tx_irq_enabled.set(enabled);
    }

    fn set_irq_line(&self, enabled: bool) {
        self.irq_line_enabled.set(enabled);
    }
}

/// Pinout that configures nothing, for tests with no GPIO block.
pub(crate) struct NoPins;

impl UartPinout for NoPins {
    fn configure(&mut self) {}
}

//! Memory-mapped register access for the mini UART
//!
//! The mini UART lives in the AUX block together with the two SPI masters;
//! its registers start at offset `0x40` of that block. The AUX IRQ (IRQ 29
//! in the first pending bank) is shared by the whole block and is routed
//! through the legacy BCM2837 interrupt controller.

use vcell::VolatileCell;

use super::{DataBits, MiniUartDevice};

/// Physical base of the peripheral window on the BCM2837.
const PERIPHERAL_BASE: usize = 0x3F00_0000;
/// AUX block (AUX_IRQ, AUX_ENABLES, mini UART, SPI1, SPI2).
const AUX_BASE: usize = PERIPHERAL_BASE + 0x21_5000;
/// Legacy interrupt controller, starting at the basic pending register.
const IRQ_BASE: usize = PERIPHERAL_BASE + 0xB200;

/// AUX IRQ number within the first pending/enable bank.
const IRQ_AUX: u32 = 29;

// AUX_MU_LSR bits
const LSR_DATA_READY: u32 = 1 << 0;
const LSR_TX_EMPTY: u32 = 1 << 5;
const LSR_TX_IDLE: u32 = 1 << 6;

// AUX_MU_IER bits
const IER_RX: u32 = 1 << 0;
const IER_TX: u32 = 1 << 1;

// AUX_MU_CNTL bits
const CNTL_RX_ENABLE: u32 = 1 << 0;
const CNTL_TX_ENABLE: u32 = 1 << 1;

/// AUX block registers, mini UART included.
#[repr(C)]
#[allow(dead_code)]
struct AuxRegisterBlock {
    /// AUX_IRQ: pending interrupts of the three AUX devices.
    irq: VolatileCell<u32>,
    /// AUX_ENABLES: bit 0 enables the mini UART.
    enables: VolatileCell<u32>,
    _reserved: [u32; 14],
    /// AUX_MU_IO: data register, read = receive FIFO, write = transmit FIFO.
    mu_io: VolatileCell<u32>,
    /// AUX_MU_IER: interrupt enable, bit 0 = receive, bit 1 = transmit.
    mu_ier: VolatileCell<u32>,
    /// AUX_MU_IIR: interrupt status / FIFO clear.
    mu_iir: VolatileCell<u32>,
    /// AUX_MU_LCR: data size.
    mu_lcr: VolatileCell<u32>,
    /// AUX_MU_MCR: modem signals (RTS).
    mu_mcr: VolatileCell<u32>,
    /// AUX_MU_LSR: data ready / transmitter state.
    mu_lsr: VolatileCell<u32>,
    /// AUX_MU_MSR: modem status (CTS).
    mu_msr: VolatileCell<u32>,
    /// AUX_MU_SCRATCH
    mu_scratch: VolatileCell<u32>,
    /// AUX_MU_CNTL: receiver/transmitter enable, auto flow control.
    mu_cntl: VolatileCell<u32>,
    /// AUX_MU_STAT: FIFO fill levels and line state.
    mu_stat: VolatileCell<u32>,
    /// AUX_MU_BAUD: baud rate counter.
    mu_baud: VolatileCell<u32>,
}

/// Interrupt controller registers, from IRQ basic pending onwards.
#[repr(C)]
#[allow(dead_code)]
struct IrqRegisterBlock {
    basic_pending: VolatileCell<u32>,
    pending: [VolatileCell<u32>; 2],
    fiq_control: VolatileCell<u32>,
    /// ENABLE_IRQS_1/2: write 1 to enable a line, writing 0 is a no-op.
    enable: [VolatileCell<u32>; 2],
    enable_basic: VolatileCell<u32>,
    /// DISABLE_IRQS_1/2: write 1 to disable a line, writing 0 is a no-op.
    disable: [VolatileCell<u32>; 2],
    disable_basic: VolatileCell<u32>,
}

/// Handle to the mini UART registers.
///
/// This is the hardware implementation of [`MiniUartDevice`]. It is a plain
/// handle in the style of a PAC peripheral: zero-sized, with all accesses
/// going through volatile reads and writes of the fixed physical addresses.
pub struct MiniUart {
    _private: (),
}

impl MiniUart {
    /// Creates the register handle.
    ///
    /// # Safety
    ///
    /// The caller must ensure at most one `MiniUart` is live at a time, that
    /// the AUX block is mapped at its physical address (identity mapping or
    /// equivalent), and that nothing else accesses the mini UART registers.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn aux(&self) -> &AuxRegisterBlock {
        unsafe { &*(AUX_BASE as *const AuxRegisterBlock) }
    }

    fn irq(&self) -> &IrqRegisterBlock {
        unsafe { &*(IRQ_BASE as *const IrqRegisterBlock) }
    }

    fn modify_ier(&self, mask: u32, enabled: bool) {
        let ier = self.aux().mu_ier.get();
        let ier = if enabled { ier | mask } else { ier & !mask };
        self.aux().mu_ier.set(ier);
    }
}

// The handle carries no state; sharing it across contexts is exactly the
// single-producer/single-consumer discipline the transports enforce.
unsafe impl Send for MiniUart {}
unsafe impl Sync for MiniUart {}

impl MiniUartDevice for MiniUart {
    fn enable_block(&self) {
        let aux = self.aux();
        aux.enables.set(aux.enables.get() | 1);
    }

    fn set_tx_rx_enabled(&self, tx: bool, rx: bool) {
        let mut cntl = 0;
        if tx {
            cntl |= CNTL_TX_ENABLE;
        }
        if rx {
            cntl |= CNTL_RX_ENABLE;
        }
        self.aux().mu_cntl.set(cntl);
    }

    fn set_data_bits(&self, data_bits: DataBits) {
        // Per the BCM2835 datasheet errata, both low bits must be set for
        // 8-bit frames.
        self.aux().mu_lcr.set(match data_bits {
            DataBits::Seven => 0b00,
            DataBits::Eight => 0b11,
        });
    }

    fn disable_flow_control(&self) {
        self.aux().mu_mcr.set(0);
    }

    fn set_baud_divisor(&self, divisor: u16) {
        self.aux().mu_baud.set(u32::from(divisor));
    }

    fn clear_fifos(&self) {
        self.aux().mu_iir.set(0xC6);
    }

    fn is_writable(&self) -> bool {
        self.aux().mu_lsr.get() & LSR_TX_EMPTY != 0
    }

    fn is_readable(&self) -> bool {
        self.aux().mu_lsr.get() & LSR_DATA_READY != 0
    }

    fn is_transmit_idle(&self) -> bool {
        self.aux().mu_lsr.get() & LSR_TX_IDLE != 0
    }

    fn write_data(&self, byte: u8) {
        self.aux().mu_io.set(u32::from(byte));
    }

    fn read_data(&self) -> u8 {
        (self.aux().mu_io.get() & 0xFF) as u8
    }

    fn set_rx_interrupt(&self, enabled: bool) {
        self.modify_ier(IER_RX, enabled);
    }

    fn set_tx_interrupt(&self, enabled: bool) {
        self.modify_ier(IER_TX, enabled);
    }

    fn set_irq_line(&self, enabled: bool) {
        // Enable and disable have dedicated write-1 registers, so no
        // read-modify-write is needed here.
        if enabled {
            self.irq().enable[0].set(1 << IRQ_AUX);
        } else {
            self.irq().disable[0].set(1 << IRQ_AUX);
        }
    }
}

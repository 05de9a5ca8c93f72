use fugit::HertzU32;

/// Error type for UART operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bad argument: baud rate not reachable from the given clock, ...
    BadArgument,
    /// Formatted output did not fit in the scratch buffer.
    Overflow,
}

mod sealed {
    pub trait Sealed {}
}
pub(crate) use sealed::Sealed;

/// State of the UART peripheral.
pub trait State: Sealed {}

/// UART is enabled.
pub struct Enabled;

/// UART is disabled.
pub struct Disabled;

impl State for Enabled {}
impl Sealed for Enabled {}
impl State for Disabled {}
impl Sealed for Disabled {}

/// Data size of a frame. The mini UART only supports 7 or 8 bit words, with
/// one stop bit and no parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    /// 7 bits per frame
    Seven,
    /// 8 bits per frame
    Eight,
}

/// Line configuration for the mini UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Wanted baud rate.
    pub baudrate: HertzU32,
    /// Frame size.
    pub data_bits: DataBits,
}

impl UartConfig {
    /// Creates a new configuration with the given baud rate and data size.
    pub const fn new(baudrate: HertzU32, data_bits: DataBits) -> Self {
        Self {
            baudrate,
            data_bits,
        }
    }
}

/// Register-level operations of the mini UART.
///
/// The transports and interrupt handlers are generic over this trait so they
/// are independent of the memory-mapped block; [`MiniUart`] implements it
/// against the real registers, tests implement it against an in-memory
/// double.
///
/// All methods take `&self`: an implementation is a handle to hardware (or a
/// mock with interior mutability), not exclusive ownership of state.
///
/// [`MiniUart`]: super::MiniUart
pub trait MiniUartDevice {
    /// Enables the AUX block that hosts the mini UART.
    fn enable_block(&self);

    /// Enables or disables the transmitter and receiver.
    fn set_tx_rx_enabled(&self, tx: bool, rx: bool);

    /// Sets the frame size.
    fn set_data_bits(&self, data_bits: DataBits);

    /// Disables RTS/CTS auto flow control.
    fn disable_flow_control(&self);

    /// Programs the baud rate counter.
    fn set_baud_divisor(&self, divisor: u16);

    /// Clears and disables the hardware FIFOs.
    fn clear_fifos(&self);

    /// Is there space in the transmit holding register?
    fn is_writable(&self) -> bool;

    /// Has at least one received byte arrived?
    fn is_readable(&self) -> bool;

    /// Is the transmitter idle, with the shift register drained?
    fn is_transmit_idle(&self) -> bool;

    /// Writes one byte to the data register.
    fn write_data(&self, byte: u8);

    /// Reads one byte from the data register.
    fn read_data(&self) -> u8;

    /// Enables or disables the receive interrupt source.
    fn set_rx_interrupt(&self, enabled: bool);

    /// Enables or disables the transmit interrupt source.
    fn set_tx_interrupt(&self, enabled: bool);

    /// Enables or disables the AUX IRQ line at the interrupt controller.
    fn set_irq_line(&self, enabled: bool);
}

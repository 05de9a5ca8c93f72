//! GPIO setup for the mini UART pins
//!
//! The mini UART's TXD1/RXD1 signals appear on GPIO 14 and 15 when those
//! pins are switched to alternate function 5. The pins also have to go
//! through the BCM2837 pull-up/down sequence so that neither pull is left
//! active on the serial line.

use vcell::VolatileCell;

const GPIO_BASE: usize = 0x3F20_0000;

/// GPIO registers, function select through pull-up/down control.
#[repr(C)]
struct GpioRegisterBlock {
    /// GPFSEL0-5: three bits of function select per pin.
    gpfsel: [VolatileCell<u32>; 6],
    _reserved: [u32; 31],
    /// GPPUD: pull-up/down mode to apply.
    gppud: VolatileCell<u32>,
    /// GPPUDCLK0-1: pins to clock the GPPUD mode into.
    gppudclk: [VolatileCell<u32>; 2],
}

/// A pinout the mini UART can be routed to.
///
/// Implementations reconfigure their pins for the peripheral when the
/// driver is enabled. The trait exists so the peripheral stays generic over
/// how (and whether) pin setup happens; off-target tests use a no-op
/// pinout.
pub trait UartPinout {
    /// Hands the pins to the mini UART, leaving them without pull-up or
    /// pull-down.
    fn configure(&mut self);
}

/// The standard mini UART pinout: TXD1 on GPIO 14, RXD1 on GPIO 15.
pub struct Gpio14Gpio15 {
    _private: (),
}

impl Gpio14Gpio15 {
    /// Claims GPIO 14 and 15.
    ///
    /// # Safety
    ///
    /// The caller must ensure nothing else owns or reconfigures GPIO 14/15
    /// and that the GPIO block is mapped at its physical address.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn gpio(&self) -> &GpioRegisterBlock {
        unsafe { &*(GPIO_BASE as *const GpioRegisterBlock) }
    }
}

impl UartPinout for Gpio14Gpio15 {
    fn configure(&mut self) {
        let gpio = self.gpio();

        // GPIO 14/15 sit in GPFSEL1, three bits each starting at bit 12.
        // ALT5 is function code 0b010.
        let mut fsel = gpio.gpfsel[1].get();
        fsel &= !(0b111 << 12);
        fsel |= 0b010 << 12;
        fsel &= !(0b111 << 15);
        fsel |= 0b010 << 15;
        gpio.gpfsel[1].set(fsel);

        // Remove the pull on both pins: select "no pull", wait the required
        // setup cycles, clock the setting into pins 14 and 15, wait again,
        // then stop clocking.
        gpio.gppud.set(0);
        settle();
        gpio.gppudclk[0].set((1 << 14) | (1 << 15));
        settle();
        gpio.gppudclk[0].set(0);
    }
}

/// Busy-waits the pull-up/down control setup time.
///
/// The datasheet asks for 150 cycles; this loop counts iterations, not
/// cycles, so it overshoots. It is not time-calibrated.
fn settle() {
    for _ in 0..150 {
        core::hint::spin_loop();
    }
}

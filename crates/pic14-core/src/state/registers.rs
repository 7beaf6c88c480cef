//! Core special-function registers as views over data memory.
//!
//! Registers have no storage of their own: each accessor reads or writes
//! the data-memory cell the register lives at.

use crate::memory::{locate, Cell, DataMemory};

/// Indirect access through FSR0.
pub const INDF0: u16 = 0x00;
/// Indirect access through FSR1.
pub const INDF1: u16 = 0x01;
/// Program counter low byte.
pub const PCL: u16 = 0x02;
/// Arithmetic and power status.
pub const STATUS: u16 = 0x03;
/// FSR0 low byte.
pub const FSR0L: u16 = 0x04;
/// FSR0 high byte.
pub const FSR0H: u16 = 0x05;
/// FSR1 low byte.
pub const FSR1L: u16 = 0x06;
/// FSR1 high byte.
pub const FSR1H: u16 = 0x07;
/// Bank select.
pub const BSR: u16 = 0x08;
/// Working register.
pub const WREG: u16 = 0x09;
/// Program counter latch.
pub const PCLATH: u16 = 0x0A;
/// Interrupt control.
pub const INTCON: u16 = 0x0B;
/// Port A data.
pub const PORTA: u16 = 0x0C;
/// Port B data.
pub const PORTB: u16 = 0x0D;
/// Port A direction.
pub const TRISA: u16 = 0x8C;
/// Port B direction.
pub const TRISB: u16 = 0x8D;
/// Option register written by the legacy `OPTION` instruction.
pub const OPTION_REG: u16 = 0x95;
/// Power control and reset cause.
pub const PCON: u16 = 0x96;
/// STATUS shadow.
pub const STATUS_SHAD: u16 = 0xFE4;
/// WREG shadow.
pub const WREG_SHAD: u16 = 0xFE5;
/// BSR shadow.
pub const BSR_SHAD: u16 = 0xFE6;
/// PCLATH shadow.
pub const PCLATH_SHAD: u16 = 0xFE7;
/// FSR0L shadow.
pub const FSR0L_SHAD: u16 = 0xFE8;
/// FSR0H shadow.
pub const FSR0H_SHAD: u16 = 0xFE9;
/// FSR1L shadow.
pub const FSR1L_SHAD: u16 = 0xFEA;
/// FSR1H shadow.
pub const FSR1H_SHAD: u16 = 0xFEB;
/// Return stack pointer.
pub const STKPTR: u16 = 0xFED;
/// Top of stack, low byte.
pub const TOSL: u16 = 0xFEE;
/// Top of stack, high byte.
pub const TOSH: u16 = 0xFEF;

/// STATUS carry / not-borrow bit.
pub const STATUS_C: u8 = 0;
/// STATUS digit carry / not-digit-borrow bit.
pub const STATUS_DC: u8 = 1;
/// STATUS zero bit.
pub const STATUS_Z: u8 = 2;
/// STATUS not power-down bit.
pub const STATUS_NOT_PD: u8 = 3;
/// STATUS not time-out bit.
pub const STATUS_NOT_TO: u8 = 4;
/// INTCON global interrupt enable bit.
pub const INTCON_GIE: u8 = 7;
/// PCON not brown-out reset bit.
pub const PCON_NOT_BOR: u8 = 0;
/// PCON not power-on reset bit.
pub const PCON_NOT_POR: u8 = 1;
/// PCON not `RESET`-instruction bit.
pub const PCON_NOT_RI: u8 = 2;
/// PCON not MCLR reset bit.
pub const PCON_NOT_RMCLR: u8 = 3;
/// PCON stack underflow bit.
pub const PCON_STKUNF: u8 = 6;
/// PCON stack overflow bit.
pub const PCON_STKOVF: u8 = 7;

/// Names the core knows without an include file.
pub const CORE_REGISTER_NAMES: &[(&str, u16)] = &[
    ("INDF0", INDF0),
    ("INDF1", INDF1),
    ("PCL", PCL),
    ("STATUS", STATUS),
    ("FSR0L", FSR0L),
    ("FSR0H", FSR0H),
    ("FSR1L", FSR1L),
    ("FSR1H", FSR1H),
    ("BSR", BSR),
    ("WREG", WREG),
    ("PCLATH", PCLATH),
    ("INTCON", INTCON),
    ("PORTA", PORTA),
    ("PORTB", PORTB),
    ("TRISA", TRISA),
    ("TRISB", TRISB),
    ("OPTION_REG", OPTION_REG),
    ("PCON", PCON),
    ("STATUS_SHAD", STATUS_SHAD),
    ("WREG_SHAD", WREG_SHAD),
    ("BSR_SHAD", BSR_SHAD),
    ("PCLATH_SHAD", PCLATH_SHAD),
    ("FSR0L_SHAD", FSR0L_SHAD),
    ("FSR0H_SHAD", FSR0H_SHAD),
    ("FSR1L_SHAD", FSR1L_SHAD),
    ("FSR1H_SHAD", FSR1H_SHAD),
    ("STKPTR", STKPTR),
    ("TOSL", TOSL),
    ("TOSH", TOSH),
    ("W", 0),
    ("F", 1),
    ("C", STATUS_C as u16),
    ("DC", STATUS_DC as u16),
    ("Z", STATUS_Z as u16),
    ("NOT_PD", STATUS_NOT_PD as u16),
    ("NOT_TO", STATUS_NOT_TO as u16),
    ("GIE", INTCON_GIE as u16),
    ("NOT_BOR", PCON_NOT_BOR as u16),
    ("NOT_POR", PCON_NOT_POR as u16),
    ("NOT_RI", PCON_NOT_RI as u16),
    ("NOT_RMCLR", PCON_NOT_RMCLR as u16),
    ("STKUNF", PCON_STKUNF as u16),
    ("STKOVF", PCON_STKOVF as u16),
];

const fn slot(address: u16) -> usize {
    match locate(address) {
        Some(location) => match location.cell() {
            Cell::Special(index) => index,
            Cell::General(_) => panic!("register must live in special storage"),
        },
        None => panic!("register address out of range"),
    }
}

const PCL_SLOT: usize = slot(PCL);
const STATUS_SLOT: usize = slot(STATUS);
const FSR0L_SLOT: usize = slot(FSR0L);
const BSR_SLOT: usize = slot(BSR);
const WREG_SLOT: usize = slot(WREG);
const PCLATH_SLOT: usize = slot(PCLATH);
const INTCON_SLOT: usize = slot(INTCON);
const PCON_SLOT: usize = slot(PCON);
const OPTION_SLOT: usize = slot(OPTION_REG);
const STKPTR_SLOT: usize = slot(STKPTR);
const TOSL_SLOT: usize = slot(TOSL);
const TOSH_SLOT: usize = slot(TOSH);

impl DataMemory {
    /// Working register.
    #[must_use]
    pub fn wreg(&self) -> u8 {
        self.special_cell(WREG_SLOT)
    }

    /// Sets the working register.
    pub fn set_wreg(&mut self, value: u8) {
        self.set_special_cell(WREG_SLOT, value);
    }

    /// STATUS register.
    #[must_use]
    pub fn status(&self) -> u8 {
        self.special_cell(STATUS_SLOT)
    }

    /// Sets STATUS.
    pub fn set_status(&mut self, value: u8) {
        self.set_special_cell(STATUS_SLOT, value);
    }

    /// One STATUS bit, e.g. [`STATUS_Z`].
    #[must_use]
    pub fn status_flag(&self, bit: u8) -> bool {
        self.status() & (1 << bit) != 0
    }

    /// Sets or clears one STATUS bit.
    pub fn set_status_flag(&mut self, bit: u8, on: bool) {
        let status = self.status();
        self.set_status(if on {
            status | (1 << bit)
        } else {
            status & !(1 << bit)
        });
    }

    /// Bank select register, 5 bits.
    #[must_use]
    pub fn bsr(&self) -> u8 {
        self.special_cell(BSR_SLOT) & 0x1F
    }

    /// Sets BSR, keeping 5 bits.
    pub fn set_bsr(&mut self, value: u8) {
        self.set_special_cell(BSR_SLOT, value & 0x1F);
    }

    /// Program counter latch, 7 bits.
    #[must_use]
    pub fn pclath(&self) -> u8 {
        self.special_cell(PCLATH_SLOT) & 0x7F
    }

    /// Sets PCLATH, keeping 7 bits.
    pub fn set_pclath(&mut self, value: u8) {
        self.set_special_cell(PCLATH_SLOT, value & 0x7F);
    }

    /// Program counter low byte.
    #[must_use]
    pub fn pcl(&self) -> u8 {
        self.special_cell(PCL_SLOT)
    }

    pub(crate) fn set_pcl(&mut self, value: u8) {
        self.set_special_cell(PCL_SLOT, value);
    }

    /// FSR0 (`n == 0`) or FSR1 as a 16-bit pointer.
    #[must_use]
    pub fn fsr(&self, n: u8) -> u16 {
        let low = FSR0L_SLOT + 2 * usize::from(n & 1);
        u16::from_le_bytes([self.special_cell(low), self.special_cell(low + 1)])
    }

    /// Sets FSR0 or FSR1.
    pub fn set_fsr(&mut self, n: u8, value: u16) {
        let low = FSR0L_SLOT + 2 * usize::from(n & 1);
        let [lo, hi] = value.to_le_bytes();
        self.set_special_cell(low, lo);
        self.set_special_cell(low + 1, hi);
    }

    /// INTCON register.
    #[must_use]
    pub fn intcon(&self) -> u8 {
        self.special_cell(INTCON_SLOT)
    }

    /// Sets INTCON.
    pub fn set_intcon(&mut self, value: u8) {
        self.set_special_cell(INTCON_SLOT, value);
    }

    /// PCON register.
    #[must_use]
    pub fn pcon(&self) -> u8 {
        self.special_cell(PCON_SLOT)
    }

    /// Sets PCON.
    pub fn set_pcon(&mut self, value: u8) {
        self.set_special_cell(PCON_SLOT, value);
    }

    /// OPTION register.
    #[must_use]
    pub fn option_reg(&self) -> u8 {
        self.special_cell(OPTION_SLOT)
    }

    /// Sets OPTION.
    pub fn set_option_reg(&mut self, value: u8) {
        self.set_special_cell(OPTION_SLOT, value);
    }

    /// Stack pointer, 5 bits.
    #[must_use]
    pub fn stkptr(&self) -> u8 {
        self.special_cell(STKPTR_SLOT) & 0x1F
    }

    /// Sets the stack pointer, keeping 5 bits.
    pub fn set_stkptr(&mut self, value: u8) {
        self.set_special_cell(STKPTR_SLOT, value & 0x1F);
    }

    /// Top of stack as mirrored in TOSH:TOSL.
    #[must_use]
    pub fn top_of_stack(&self) -> u16 {
        u16::from_le_bytes([self.special_cell(TOSL_SLOT), self.special_cell(TOSH_SLOT)])
    }

    /// Mirrors a return address into TOSH:TOSL.
    pub fn set_top_of_stack(&mut self, address: u16) {
        let [lo, hi] = address.to_le_bytes();
        self.set_special_cell(TOSL_SLOT, lo);
        self.set_special_cell(TOSH_SLOT, hi & 0x7F);
    }
}

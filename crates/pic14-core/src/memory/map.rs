//! Banked data-memory address map and translation.
//!
//! Two regimes share one backing store. The traditional regime is 32 banks
//! of 128 bytes (`0x0000..=0x0FFF`); the linear regime (`0x2000..=0x29AF`)
//! reaches general-purpose RAM without bank switching.

use crate::fault::Fault;

/// Bytes per traditional bank.
pub const BANK_SIZE: u16 = 0x80;
/// Number of traditional banks.
pub const BANK_COUNT: u16 = 32;
/// Last traditional address.
pub const TRADITIONAL_END: u16 = BANK_SIZE * BANK_COUNT - 1;
/// Last location of the low special registers shared by every bank.
pub const SHARED_SFR_END: u8 = 0x0B;
/// First general-purpose location of a bank; locations below are special.
pub const GPR_START: u8 = 0x20;
/// First location of common RAM, visible from every bank.
pub const COMMON_RAM_START: u8 = 0x70;
/// Bank holding the shadow and stack registers above its GPR range.
pub const SHADOW_BANK: u8 = 31;
/// First bank-31 location remapped onto special-register storage.
pub const SHADOW_START: u8 = 0x60;
/// Distance the shadow locations are moved down into special storage.
pub const SHADOW_OFFSET: u8 = 0x50;
/// General-store index of bank 1 location `0x20`; bank `b` starts `0x50 * (b - 1)` above.
pub const GPR_BANK_BASE: u16 = 0x10;
/// General-purpose bytes per bank reachable through the linear window.
pub const LINEAR_BANK_SIZE: u16 = 0x50;
/// First linear-window address.
pub const LINEAR_START: u16 = 0x2000;
/// Last linear-window address.
pub const LINEAR_END: u16 = 0x29AF;

/// Special-register storage: 32 locations for each of 32 banks.
pub const SFR_STORE_BYTES: usize = 0x20 * BANK_COUNT as usize;
/// General-register storage.
pub const GPR_STORE_BYTES: usize = 0x1000;

/// Result of translating a data address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BankLocation {
    /// Bank the storage belongs to.
    pub bank: u8,
    /// Location within the bank.
    pub location: u8,
    /// Index into the general-register store, for general-purpose cells.
    pub linear: Option<u16>,
}

/// Backing cell an address resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Index into special-register storage (`bank * 32 + location`).
    Special(usize),
    /// Index into general-register storage.
    General(usize),
}

impl BankLocation {
    const fn special(bank: u8, location: u8) -> Self {
        Self {
            bank,
            location,
            linear: None,
        }
    }

    const fn general(bank: u8, location: u8, linear: u16) -> Self {
        Self {
            bank,
            location,
            linear: Some(linear),
        }
    }

    /// Storage cell backing this location.
    #[must_use]
    pub const fn cell(self) -> Cell {
        match self.linear {
            Some(index) if self.location >= GPR_START => Cell::General(index as usize),
            _ => Cell::Special(self.bank as usize * GPR_START as usize + self.location as usize),
        }
    }
}

/// Translates a traditional or linear data address, `None` outside both regimes.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn locate(address: u16) -> Option<BankLocation> {
    if address <= TRADITIONAL_END {
        let bank = (address / BANK_SIZE) as u8;
        let location = (address % BANK_SIZE) as u8;
        return Some(if location <= SHARED_SFR_END {
            BankLocation::special(0, location)
        } else if location < GPR_START {
            BankLocation::special(bank, location)
        } else if bank == 0 || location >= COMMON_RAM_START {
            BankLocation::general(0, location, (location - GPR_START) as u16)
        } else if bank == SHADOW_BANK && location >= SHADOW_START {
            BankLocation::special(bank, location - SHADOW_OFFSET)
        } else {
            let index =
                GPR_BANK_BASE + bank as u16 * LINEAR_BANK_SIZE + (location - GPR_START) as u16;
            BankLocation::general(bank, location, index)
        });
    }
    if address >= LINEAR_START && address <= LINEAR_END {
        let offset = address - LINEAR_START;
        let bank = (offset / LINEAR_BANK_SIZE) as u8;
        let location = (offset % LINEAR_BANK_SIZE) as u8;
        let index = if bank == 0 {
            location as u16
        } else {
            offset + GPR_BANK_BASE
        };
        return Some(BankLocation::general(bank, GPR_START + location, index));
    }
    None
}

/// Translates a traditional or linear data address.
///
/// # Errors
///
/// [`Fault::AddressOutOfRange`] for addresses outside both regimes.
pub fn translate(address: u16) -> Result<BankLocation, Fault> {
    locate(address).ok_or(Fault::AddressOutOfRange(u32::from(address)))
}

const _: () = assert_store_layout();

const fn fits_general_store(address: u16) -> bool {
    match locate(address) {
        Some(location) => matches!(location.cell(), Cell::General(index) if index < GPR_STORE_BYTES),
        None => false,
    }
}

const fn assert_store_layout() {
    let mut bank = 0u16;
    while bank < BANK_COUNT {
        assert!(
            fits_general_store(bank * BANK_SIZE + (BANK_SIZE - 1)),
            "bank top must land in common RAM"
        );
        assert!(
            fits_general_store(bank * BANK_SIZE + GPR_START as u16),
            "general storage must fit the store"
        );
        bank += 1;
    }
    assert!(
        fits_general_store(LINEAR_END),
        "linear window must fit the store"
    );
}

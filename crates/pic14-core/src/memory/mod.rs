//! Banked data memory and program memory.

/// Numeric and named data addresses.
pub mod access;
/// Address map and translation.
pub mod map;
/// Flash program memory.
pub mod program;

pub use access::{Address, RegisterMap};
pub use map::{
    locate, translate, BankLocation, Cell, BANK_COUNT, BANK_SIZE, COMMON_RAM_START, GPR_START,
    GPR_STORE_BYTES, LINEAR_END, LINEAR_START, SFR_STORE_BYTES, TRADITIONAL_END,
};
pub use program::{ProgramMemory, ERASED_WORD, PROGRAM_WORDS};

use crate::fault::Fault;

/// Byte storage behind both addressing regimes.
///
/// The memory applies no register side effects: a write to `PCL` only
/// stores a byte. Behavior attached to particular registers belongs to the
/// core.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataMemory {
    special: Box<[u8]>,
    general: Box<[u8]>,
    names: RegisterMap,
}

impl DataMemory {
    /// Zeroed memory resolving names through the core register map.
    #[must_use]
    pub fn new() -> Self {
        Self::with_names(RegisterMap::core_registers())
    }

    /// Zeroed memory resolving names through `names`.
    #[must_use]
    pub fn with_names(names: RegisterMap) -> Self {
        Self {
            special: vec![0; SFR_STORE_BYTES].into_boxed_slice(),
            general: vec![0; GPR_STORE_BYTES].into_boxed_slice(),
            names,
        }
    }

    /// Name map used by the named accessors.
    #[must_use]
    pub const fn names(&self) -> &RegisterMap {
        &self.names
    }

    /// Replaces the name map.
    pub fn set_names(&mut self, names: RegisterMap) {
        self.names = names;
    }

    /// Zeroes every cell.
    pub fn clear(&mut self) {
        self.special.fill(0);
        self.general.fill(0);
    }

    /// Reads the byte at a traditional or linear address.
    ///
    /// # Errors
    ///
    /// [`Fault::AddressOutOfRange`] outside both regimes.
    pub fn get(&self, address: u16) -> Result<u8, Fault> {
        Ok(match translate(address)?.cell() {
            Cell::Special(index) => self.special[index],
            Cell::General(index) => self.general[index],
        })
    }

    /// Writes the byte at a traditional or linear address.
    ///
    /// # Errors
    ///
    /// [`Fault::AddressOutOfRange`] outside both regimes; nothing is written.
    pub fn set(&mut self, address: u16, value: u8) -> Result<(), Fault> {
        match translate(address)?.cell() {
            Cell::Special(index) => self.special[index] = value,
            Cell::General(index) => self.general[index] = value,
        }
        Ok(())
    }

    /// Reads `address`, or zero when it is unimplemented.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        match locate(address).map(|location| location.cell()) {
            Some(Cell::Special(index)) => self.special[index],
            Some(Cell::General(index)) => self.general[index],
            None => 0,
        }
    }

    /// Writes `address`, discarding the value when it is unimplemented.
    pub fn poke(&mut self, address: u16, value: u8) {
        match locate(address).map(|location| location.cell()) {
            Some(Cell::Special(index)) => self.special[index] = value,
            Some(Cell::General(index)) => self.general[index] = value,
            None => {}
        }
    }

    /// Resolves an [`Address`] through the name map.
    ///
    /// # Errors
    ///
    /// [`Fault::UnknownRegister`] for an undefined name.
    pub fn resolve(&self, address: &Address) -> Result<u16, Fault> {
        address.resolve(&self.names)
    }

    /// Reads a numeric or named address.
    ///
    /// # Errors
    ///
    /// Name resolution or translation failures.
    pub fn read(&self, address: &Address) -> Result<u8, Fault> {
        self.get(self.resolve(address)?)
    }

    /// Writes a numeric or named address.
    ///
    /// # Errors
    ///
    /// Name resolution or translation failures; nothing is written.
    pub fn write(&mut self, address: &Address, value: u8) -> Result<(), Fault> {
        let address = self.resolve(address)?;
        self.set(address, value)
    }

    /// Special-register storage, `bank * 32 + location`.
    #[must_use]
    pub fn special(&self) -> &[u8] {
        &self.special
    }

    /// General-register storage.
    #[must_use]
    pub fn general(&self) -> &[u8] {
        &self.general
    }

    pub(crate) fn special_cell(&self, index: usize) -> u8 {
        self.special[index]
    }

    pub(crate) fn set_special_cell(&mut self, index: usize, value: u8) {
        self.special[index] = value;
    }
}

impl Default for DataMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Address, DataMemory, BANK_SIZE, LINEAR_START};
    use crate::fault::Fault;

    #[test]
    fn shared_low_registers_are_one_cell() {
        let mut memory = DataMemory::new();
        memory.set(0x0F89, 0x5A).expect("bank 31 WREG");
        assert_eq!(memory.get(0x0009), Ok(0x5A));
        assert_eq!(memory.read(&Address::from("WREG")), Ok(0x5A));
    }

    #[test]
    fn per_bank_special_registers_do_not_alias() {
        let mut memory = DataMemory::new();
        memory.set(0x000C, 0x11).expect("PORTA");
        memory.set(0x008C, 0x22).expect("TRISA");
        assert_eq!(memory.get(0x000C), Ok(0x11));
        assert_eq!(memory.get(0x008C), Ok(0x22));
    }

    #[test]
    fn out_of_range_write_changes_nothing() {
        let mut memory = DataMemory::new();
        assert_eq!(
            memory.set(0x1000, 0xFF),
            Err(Fault::AddressOutOfRange(0x1000))
        );
        assert!(memory.special().iter().all(|byte| *byte == 0));
        assert!(memory.general().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn named_write_resolves_before_translation() {
        let mut memory = DataMemory::new();
        memory
            .write(&Address::from("bsr"), 0x03)
            .expect("BSR is named");
        assert_eq!(memory.get(0x0008), Ok(0x03));
        assert_eq!(
            memory.write(&Address::from("NOPE"), 1),
            Err(Fault::UnknownRegister("NOPE".to_owned()))
        );
    }

    #[test]
    fn peek_and_poke_ignore_unimplemented_addresses() {
        let mut memory = DataMemory::new();
        memory.poke(0x1234, 0x77);
        assert_eq!(memory.peek(0x1234), 0);
        memory.poke(0x0070, 0x77);
        assert_eq!(memory.peek(0x0F70), 0x77);
    }

    proptest! {
        #[test]
        fn linear_writes_read_back_through_bank_zero(offset in 0u16..0x50, value in any::<u8>()) {
            let mut memory = DataMemory::new();
            memory.set(LINEAR_START + offset, value).expect("linear");
            prop_assert_eq!(memory.get(0x20 + offset), Ok(value));
        }

        #[test]
        fn banked_writes_read_back_through_linear_window(bank in 1u16..31, offset in 0u16..0x50, value in any::<u8>()) {
            let mut memory = DataMemory::new();
            memory.set(bank * BANK_SIZE + 0x20 + offset, value).expect("banked");
            prop_assert_eq!(memory.get(LINEAR_START + bank * 0x50 + offset), Ok(value));
        }

        #[test]
        fn common_ram_is_bank_independent(bank in 0u16..32, offset in 0u16..0x10, value in any::<u8>()) {
            let mut memory = DataMemory::new();
            memory.set(bank * BANK_SIZE + 0x70 + offset, value).expect("common");
            prop_assert_eq!(memory.get(0x70 + offset), Ok(value));
        }
    }
}

//! Decodes arbitrary words, translates arbitrary addresses and steps a core
//! over an arbitrary program image.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pic14_core::{translate, Core, Decoder, Mnemonic};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let decoder = Decoder::enhanced_midrange();
    let word = u16::from_le_bytes([data[0], data[1]]);
    if let Ok(instruction) = decoder.decode(word) {
        if instruction.mnemonic() != Mnemonic::Clrw {
            assert_eq!(instruction.encode(), word & 0x3FFF);
        }
    }

    let address = u16::from_le_bytes([data[2], data[3]]);
    let _ = translate(address);

    let program: Vec<u16> = data[4..]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take(2048)
        .collect();
    let mut core = Core::default();
    if core.load_program(0, &program).is_ok() {
        let _ = core.run(256);
    }
});

//! Deterministic run fingerprint used for cross-host comparison.
//!
//! Runs a fixed program with tracing enabled and hashes every trace event,
//! the final register snapshot and both data stores. Two hosts that print
//! the same fingerprint executed the program identically.

use pic14_core::{Core, Decoder, FieldValues, TraceEvent};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn encode(decoder: &Decoder, mnemonic: &str, fields: FieldValues) -> u16 {
    decoder.encode(mnemonic, &fields).expect("encodable")
}

fn program(decoder: &Decoder) -> Vec<u16> {
    vec![
        encode(decoder, "MOVLW", FieldValues::new().k(0x20)),
        encode(decoder, "MOVWF", FieldValues::new().f(0x04)),
        encode(decoder, "MOVLW", FieldValues::new().k(0x09)),
        encode(decoder, "MOVWF", FieldValues::new().f(0x70)),
        encode(decoder, "CALL", FieldValues::new().k(0x10)),
        encode(decoder, "MOVWI", FieldValues::new().n(0).m(2)),
        encode(decoder, "DECFSZ", FieldValues::new().f(0x70).d(1)),
        encode(decoder, "BRA", FieldValues::new().k_signed(-4)),
        encode(decoder, "SLEEP", FieldValues::new()),
    ]
}

fn subroutine(decoder: &Decoder) -> Vec<u16> {
    vec![
        encode(decoder, "MOVF", FieldValues::new().f(0x70).d(0)),
        encode(decoder, "LSLF", FieldValues::new().f(0x71).d(1)),
        encode(decoder, "ADDWF", FieldValues::new().f(0x71).d(1)),
        encode(decoder, "SWAPF", FieldValues::new().f(0x71).d(0)),
        encode(decoder, "RETURN", FieldValues::new()),
    ]
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn hash_event(hash: &mut u64, event: &TraceEvent) {
    match event {
        TraceEvent::InstructionStart { pc, word } => {
            hash_bytes(hash, &[0]);
            hash_bytes(hash, &pc.to_le_bytes());
            hash_bytes(hash, &word.to_le_bytes());
        }
        TraceEvent::InstructionRetired {
            pc,
            mnemonic,
            cycles,
            skipped,
        } => {
            hash_bytes(hash, &[1]);
            hash_bytes(hash, &pc.to_le_bytes());
            hash_bytes(hash, mnemonic.as_str().as_bytes());
            hash_bytes(hash, &[*cycles, u8::from(*skipped)]);
        }
        TraceEvent::StackWrapped { overflow } => hash_bytes(hash, &[2, u8::from(*overflow)]),
        TraceEvent::FaultRaised { pc, .. } => {
            hash_bytes(hash, &[3]);
            hash_bytes(hash, &pc.to_le_bytes());
        }
    }
}

fn fingerprint() -> String {
    let decoder = Decoder::enhanced_midrange();
    let mut core = Core::default();
    core.load_program(0, &program(&decoder))
        .expect("program should fit");
    core.load_program(0x10, &subroutine(&decoder))
        .expect("subroutine should fit");

    let mut events = Vec::new();
    let outcome = core
        .run_traced(10_000, &mut events)
        .expect("run should succeed");

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for event in &events {
        hash_event(&mut hash, event);
    }
    let registers = core.registers();
    hash_bytes(&mut hash, &registers.pc.to_le_bytes());
    hash_bytes(
        &mut hash,
        &[registers.wreg, registers.status, registers.bsr, registers.stkptr],
    );
    hash_bytes(&mut hash, &registers.fsr0.to_le_bytes());
    hash_bytes(&mut hash, &registers.cycles.to_le_bytes());
    hash_bytes(&mut hash, core.data().special());
    hash_bytes(&mut hash, core.data().general());

    format!(
        "steps={} cycles={} events={} fingerprint={hash:016x}",
        outcome.steps,
        outcome.cycles,
        events.len()
    )
}

fn main() {
    println!("{}", fingerprint());
}

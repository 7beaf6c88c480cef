//! Return stack wraparound observed through the executing core.

use pic14_core::state::registers::{PCON_STKOVF, PCON_STKUNF};
use pic14_core::{Core, Decoder, FieldValues, StopReason, TraceEvent, STKPTR_IDLE};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn encode(mnemonic: &str, fields: FieldValues) -> u16 {
    Decoder::enhanced_midrange()
        .encode(mnemonic, &fields)
        .expect("encodable")
}

fn wraps(events: &[TraceEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|event| match event {
            TraceEvent::StackWrapped { overflow } => Some(*overflow),
            _ => None,
        })
        .collect()
}

#[test]
fn runaway_recursion_wraps_without_stopping() {
    let mut core = Core::default();
    core.load_program(0, &[encode("CALL", FieldValues::new().k(0))])
        .expect("program fits");

    let mut events = Vec::new();
    let outcome = core.run_traced(16, &mut events).expect("run");
    assert_eq!(outcome.stop, StopReason::StepLimit);
    assert!(wraps(&events).is_empty());
    assert_eq!(core.data().stkptr(), 15);
    assert_eq!(core.data().pcon() & (1 << PCON_STKOVF), 0);

    events.clear();
    core.run_traced(1, &mut events).expect("seventeenth call");
    assert_eq!(wraps(&events), vec![true]);
    assert_eq!(core.data().stkptr(), 0);
    assert_ne!(core.data().pcon() & (1 << PCON_STKOVF), 0);
    assert_eq!(core.stack().slots()[0], 1);

    core.run(8).expect("keeps running");
    assert_ne!(core.data().pcon() & (1 << PCON_STKOVF), 0);
}

#[test]
fn return_on_empty_stack_underflows() {
    let mut core = Core::default();
    core.load_program(0, &[encode("RETURN", FieldValues::new())])
        .expect("program fits");
    assert_eq!(core.data().stkptr(), STKPTR_IDLE);

    let mut events = Vec::new();
    core.step_traced(&mut events).expect("step");
    assert_eq!(wraps(&events), vec![false]);
    assert_eq!(core.data().stkptr(), 14);
    assert_ne!(core.data().pcon() & (1 << PCON_STKUNF), 0);
    assert_eq!(core.pc(), 0);
}

#[test]
fn nested_calls_unwind_in_order() {
    let mut core = Core::default();
    core.load_program(
        0,
        &[
            encode("CALL", FieldValues::new().k(0x10)),
            encode("SLEEP", FieldValues::new()),
        ],
    )
    .expect("program fits");
    core.load_program(
        0x10,
        &[
            encode("CALL", FieldValues::new().k(0x20)),
            encode("RETURN", FieldValues::new()),
        ],
    )
    .expect("program fits");
    core.load_program(0x20, &[encode("RETLW", FieldValues::new().k(0x33))])
        .expect("program fits");

    let outcome = core.run(100).expect("run");
    assert_eq!(outcome.stop, StopReason::Sleeping);
    assert_eq!(outcome.steps, 5);
    assert_eq!(core.data().wreg(), 0x33);
    assert_eq!(core.data().stkptr(), STKPTR_IDLE);
    assert_eq!(core.data().top_of_stack(), 0);
    assert_eq!(core.data().pcon() & 0xC0, 0);
}

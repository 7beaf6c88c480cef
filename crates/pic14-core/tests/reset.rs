//! Power-on and software reset behavior.

use pic14_core::state::registers::{
    OPTION_REG, PCON, STATUS, STKPTR, TRISA, TRISB, TOSH, TOSL,
};
use pic14_core::{Core, Decoder, FieldValues, ResetCause, RunState, STKPTR_IDLE};
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn encode(mnemonic: &str, fields: FieldValues) -> u16 {
    Decoder::enhanced_midrange()
        .encode(mnemonic, &fields)
        .expect("encodable")
}

fn dirty_core() -> Core {
    let mut core = Core::default();
    core.load_program(
        0,
        &[
            encode("MOVLW", FieldValues::new().k(0xA5)),
            encode("MOVWF", FieldValues::new().f(0x7F)),
            encode("CALL", FieldValues::new().k(0x10)),
        ],
    )
    .expect("program fits");
    core.load_program(0x10, &[encode("SLEEP", FieldValues::new())])
        .expect("program fits");
    core.run(10).expect("runs to sleep");
    assert_eq!(core.run_state(), RunState::Sleeping);
    core
}

#[rstest]
#[case(ResetCause::PowerOn)]
#[case(ResetCause::Software)]
fn reset_loads_power_on_values(#[case] cause: ResetCause) {
    let mut core = dirty_core();
    core.reset(cause);

    let data = core.data();
    assert_eq!(core.pc(), 0);
    assert_eq!(data.wreg(), 0);
    assert_eq!(data.get(STATUS), Ok(0x18));
    assert_eq!(data.get(PCON), Ok(0x03));
    assert_eq!(data.get(STKPTR), Ok(STKPTR_IDLE));
    assert_eq!(data.get(TOSL), Ok(0));
    assert_eq!(data.get(TOSH), Ok(0));
    assert_eq!(data.get(OPTION_REG), Ok(0xFF));
    assert_eq!(data.get(TRISA), Ok(0xFF));
    assert_eq!(data.get(TRISB), Ok(0xFF));
    assert_eq!(data.get(0x7F), Ok(0));
    assert_eq!(core.run_state(), RunState::Running);
}

#[test]
fn both_causes_are_indistinguishable() {
    let mut power_on = dirty_core();
    let mut software = dirty_core();
    power_on.reset(ResetCause::PowerOn);
    software.reset(ResetCause::Software);
    assert_eq!(power_on.data(), software.data());
    assert_eq!(power_on.pc(), software.pc());
}

#[test]
fn reset_instruction_restarts_the_program() {
    let mut core = Core::default();
    core.load_program(
        0,
        &[
            encode("INCF", FieldValues::new().f(0x70).d(1)),
            encode("RESET", FieldValues::new()),
        ],
    )
    .expect("program fits");

    core.run(2).expect("run");
    assert_eq!(core.pc(), 0);
    assert_eq!(core.data().get(0x70), Ok(0));
    assert_eq!(core.retired(), 2);
    assert_eq!(
        core.program().fetch(0),
        encode("INCF", FieldValues::new().f(0x70).d(1))
    );
}

#[test]
fn counters_survive_reset() {
    let mut core = dirty_core();
    let cycles = core.cycles();
    core.reset(ResetCause::Software);
    assert_eq!(core.cycles(), cycles);
}

//! Golden-trace parity tests for the Burn decoder
//!
//! Replays the committed 128-step trace through the decoder with the hidden
//! state carried forward, and checks that nothing stays allocated afterwards.
//!
//! Run with:
//! ```bash
//! cargo test -p genie --test parity_tests
//! ```

mod helpers;

use genie::backend::{BurnDecoder, CpuBackend, CpuDevice, HiddenState};
use genie::core::{BufferLedger, DecoderConfig, ParityFailure, ParityHarness, StepDecoder};
use helpers::tolerances::PARITY_TOLERANCE;
use helpers::*;

fn cpu_decoder(ledger: &BufferLedger) -> genie::core::Result<BurnDecoder<CpuBackend>> {
    BurnDecoder::new(
        load_store(),
        DecoderConfig::default(),
        CpuDevice::default(),
        ledger.clone(),
    )
}

#[test]
fn test_golden_trace_shape() {
    let trace = load_trace();
    assert_eq!(trace.len(), GOLDEN_STEPS);
    assert_eq!(trace.input_keys[0], -1);
    assert_eq!(trace.input_dts[0], 0.0);
    assert!(trace.output_logits.iter().all(|l| l.len() == 88));
}

#[test]
fn test_golden_trace_within_tolerance() {
    let ledger = BufferLedger::new();
    let mut decoder = cpu_decoder(&ledger).unwrap();
    decoder.init().unwrap();

    let report = ParityHarness::default()
        .replay(&decoder, &load_trace())
        .unwrap();

    assert_eq!(report.steps, GOLDEN_STEPS);
    assert!(report.cumulative_error.is_finite());
    assert!(
        report.cumulative_error <= f64::from(PARITY_TOLERANCE),
        "cumulative error {} exceeds {}",
        report.cumulative_error,
        PARITY_TOLERANCE
    );
}

#[test]
fn test_golden_trace_leaves_no_buffers() {
    let ledger = BufferLedger::new();
    let baseline = ledger.snapshot();

    let report = ParityHarness::default()
        .run_isolated(&ledger, cpu_decoder, &load_trace())
        .unwrap();

    assert_eq!(report.steps, GOLDEN_STEPS);
    assert_eq!(ledger.snapshot(), baseline);
}

#[test]
fn test_manual_replay_matches_harness() {
    // Same replay by hand, disposing each superseded state explicitly.
    let ledger = BufferLedger::new();
    let mut decoder = cpu_decoder(&ledger).unwrap();
    decoder.init().unwrap();
    let params_bytes = ledger.live_bytes();

    let trace = load_trace();
    let mut state: Option<HiddenState<CpuBackend>> = None;
    let mut total = 0.0;
    for (input, expected) in trace.steps() {
        let out = decoder.forward(&input, state.as_ref()).unwrap();
        total += cumulative_abs_diff(&out.logits, expected);
        if let Some(old) = state.replace(out.state) {
            old.dispose();
        }
    }
    assert!(total <= f64::from(PARITY_TOLERANCE));

    let last = state.take().unwrap();
    assert_eq!(ledger.live_bytes(), params_bytes + last.num_bytes());
    last.dispose();
    decoder.dispose().unwrap();
    assert_eq!(ledger.live_bytes(), 0);
    assert_eq!(ledger.live_buffers(), 0);
}

#[test]
fn test_wrong_gate_order_breaks_parity() {
    let ledger = BufferLedger::new();
    let config = DecoderConfig {
        gate_order: genie::GateOrder::Ifjo,
        ..DecoderConfig::default()
    };
    let mut decoder =
        BurnDecoder::<CpuBackend>::new(load_store(), config, CpuDevice::default(), ledger)
            .unwrap();
    decoder.init().unwrap();

    let result = ParityHarness::default().replay(&decoder, &load_trace());
    assert!(matches!(result, Err(ParityFailure::Tolerance { .. })));
}

#[test]
fn test_truncated_trace_still_replays() {
    let ledger = BufferLedger::new();
    let mut decoder = cpu_decoder(&ledger).unwrap();
    decoder.init().unwrap();

    let mut trace = load_trace();
    trace.input_keys.truncate(16);
    trace.input_dts.truncate(16);
    trace.input_buttons.truncate(16);
    trace.output_logits.truncate(16);

    let report = ParityHarness::default().replay(&decoder, &trace).unwrap();
    assert_eq!(report.steps, 16);
}

#[test]
fn test_short_logit_rows_are_reported() {
    let ledger = BufferLedger::new();
    let mut decoder = cpu_decoder(&ledger).unwrap();
    decoder.init().unwrap();

    let mut trace = load_trace();
    trace.output_logits[3].pop();

    let result = ParityHarness::default().replay(&decoder, &trace);
    assert!(matches!(
        result,
        Err(ParityFailure::LogitCount {
            step: 3,
            produced: 88,
            expected: 87
        })
    ));
}

//! End-to-end scenarios through the simulated bench

use udc_freq::ChannelHealth;
use udcsim::{run_frames, run_freq, FrameScenario, FreqScenario};

#[test]
fn clean_pulse_trains_are_measured() {
    let scenario = FreqScenario::new("2000,1500,0,400", 0, 5, 1_000).unwrap();
    let report = run_freq(&scenario).unwrap();

    assert_eq!(report.simulated_ms, 5_000);
    assert_eq!(report.ticks, 500);
    assert!(report.interrupt_path_ok);

    let ch1 = &report.channels[0];
    assert_eq!(ch1.health, ChannelHealth::Ok);
    assert!((1_980..=2_020).contains(&ch1.statistics.frequency_hz), "{}", ch1.statistics.frequency_hz);
    assert_eq!(ch1.statistics.noise_rejected, 0);
    assert!(ch1.statistics.measurements >= 4);

    let ch2 = &report.channels[1];
    assert!((1_480..=1_520).contains(&ch2.statistics.frequency_hz));

    assert_eq!(report.channels[2].health, ChannelHealth::NoSignal);
    assert_eq!(report.channels[2].statistics.frequency_hz, 0);

    // 400 Hz is below the plausible range.
    let ch4 = &report.channels[3];
    assert_eq!(ch4.health, ChannelHealth::OutOfRange);
    assert_eq!(ch4.statistics.frequency_hz, 0);
    assert!(ch4.statistics.calculation_errors >= 4);
}

#[test]
fn glitches_are_rejected_not_counted() {
    let scenario = FreqScenario::new("2000,2000,2000,2000", 1, 3, 1_000).unwrap();
    let report = run_freq(&scenario).unwrap();
    for ch in &report.channels {
        assert!(ch.statistics.noise_rejected > 0);
        assert!((1_980..=2_020).contains(&ch.statistics.frequency_hz));
        // One glitch per edge is a tie, not a majority.
        assert_eq!(ch.health, ChannelHealth::Ok);
    }
}

#[test]
fn dead_lines_stall_the_interrupt_path() {
    let scenario = FreqScenario::new("0,0,0,0", 0, 4, 1_000).unwrap();
    let report = run_freq(&scenario).unwrap();
    assert!(!report.interrupt_path_ok);
    assert_eq!(report.interrupts, 0);
}

#[test]
fn frames_are_delimited_and_echoed() {
    let scenario = FrameScenario::new(115_200, "5,12,3").unwrap();
    let report = run_frames(&scenario).unwrap();

    let lengths: Vec<usize> = report.frames.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![5, 12, 3]);
    assert_eq!(report.frames[1][0], 1);
    assert_eq!(report.echoed, report.frames.concat());
    assert_eq!(report.diagnostics.received, 20);
    assert!(report.diagnostics.flags.is_clear());
}

#[test]
fn slow_baud_rate_still_frames_correctly() {
    let scenario = FrameScenario::new(9_600, "8,1").unwrap();
    let report = run_frames(&scenario).unwrap();
    let lengths: Vec<usize> = report.frames.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![8, 1]);
    assert_eq!(report.timing.char_time_us, 1_145);
}

#[test]
fn report_serializes_to_json() {
    let scenario = FrameScenario::new(19_200, "4").unwrap();
    let report = run_frames(&scenario).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["timing"]["baud_rate"], 19_200);
    assert_eq!(json["frames"][0].as_array().unwrap().len(), 4);
}

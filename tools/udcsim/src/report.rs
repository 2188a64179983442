//! Scenario results and their rendering

use colored::Colorize;
use serde::Serialize;
use udc_freq::{ChannelHealth, ChannelStatistics};
use udc_serial::{LinkDiagnostics, SerialTiming};

#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub configured_hz: u32,
    pub instantaneous_hz: u32,
    pub health: ChannelHealth,
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct FreqReport {
    pub simulated_ms: u64,
    pub ticks: u32,
    pub interrupts: u32,
    pub interrupt_path_ok: bool,
    pub channels: Vec<ChannelReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub timing: SerialTiming,
    pub frames: Vec<Vec<u8>>,
    pub echoed: Vec<u8>,
    pub diagnostics: LinkDiagnostics,
}

fn health_label(health: ChannelHealth) -> colored::ColoredString {
    let text = health.to_string();
    match health {
        ChannelHealth::Ok => text.green(),
        ChannelHealth::NoSignal => text.red(),
        ChannelHealth::ExcessiveNoise | ChannelHealth::OutOfRange => text.yellow(),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

impl FreqReport {
    pub fn print(&self) {
        println!(
            "{} {} ms simulated, {} ticks, {} interrupts",
            "freq".bright_cyan().bold(),
            self.simulated_ms,
            self.ticks,
            self.interrupts
        );
        for report in &self.channels {
            let s = &report.statistics;
            println!(
                "  CH{} {:>7} Hz (set {:>6}, min {:>6}, max {:>6}, now {:>6})  edges {:>7}  noise {:>5}  errors {:>3}  {}",
                s.channel + 1,
                s.frequency_hz,
                report.configured_hz,
                s.min_frequency_hz,
                s.max_frequency_hz,
                report.instantaneous_hz,
                s.lifetime_edges,
                s.noise_rejected,
                s.calculation_errors,
                health_label(report.health)
            );
        }
        if self.interrupt_path_ok {
            println!("  interrupt path {}", "alive".green());
        } else {
            println!("  interrupt path {}", "STALLED".red().bold());
        }
    }
}

impl FrameReport {
    pub fn print(&self) {
        println!("{} {}", "frame".bright_cyan().bold(), self.timing);
        for (i, frame) in self.frames.iter().enumerate() {
            println!("  #{:<3} {:>3} bytes  {}", i, frame.len(), hex(frame).dimmed());
        }
        let d = &self.diagnostics;
        println!(
            "  echoed {} bytes, received {}, dropped {}, {}",
            self.echoed.len(),
            d.received,
            d.dropped,
            if d.flags.is_clear() {
                d.flags.to_string().green()
            } else {
                d.flags.to_string().yellow()
            }
        );
    }
}

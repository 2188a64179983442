use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use udcsim::{run_frames, run_freq, FrameScenario, FreqScenario};

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic host bench for the UDC timing core")]
struct Opts {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it.
    #[arg(long, short = 'l', default_value = "warn", global = true)]
    log_level: String,

    /// Print the report as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive four simulated pulse trains through the acquisition engine.
    Freq {
        /// Output frequency per channel in Hz, comma separated; 0 is a dead line.
        #[arg(long, default_value = "2000,1500,0,400")]
        hz: String,

        /// Inject a glitch after every n-th edge (0 = clean signal).
        #[arg(long, default_value_t = 0)]
        noise_every: u32,

        /// Simulated duration in seconds.
        #[arg(long, default_value_t = 5)]
        seconds: u32,

        /// Measurement window in milliseconds.
        #[arg(long, default_value_t = 1_000)]
        window_ms: u32,
    },
    /// Push silence-delimited frames through the serial link and echo them.
    Frame {
        #[arg(long, default_value_t = 115_200)]
        baud: u32,

        /// Frame lengths in bytes, comma separated.
        #[arg(long, default_value = "5,12,3")]
        frames: String,
    },
}

fn init_logging(level: &str) {
    let filter = format!("udcsim={level},udc_freq={level},udc_serial={level},udc_clock={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    init_logging(&opts.log_level);

    match opts.command {
        Command::Freq {
            hz,
            noise_every,
            seconds,
            window_ms,
        } => {
            let scenario = FreqScenario::new(&hz, noise_every, seconds, window_ms)
                .context("invalid frequency scenario")?;
            let report = run_freq(&scenario).context("frequency scenario failed")?;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
        Command::Frame { baud, frames } => {
            let scenario = FrameScenario::new(baud, &frames).context("invalid frame scenario")?;
            let report = run_frames(&scenario).context("frame scenario failed")?;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
    }

    Ok(())
}

use clap::Parser;
use ofdmtrace_core::{FecMode, SimConfig, Simulation, TRACE_FILE};

#[derive(Parser)]
#[command(name = "ofdmtrace")]
#[command(about = "Run test frames through the OFDM modem and dump a signal trace")]
struct Cli {
    /// Send the payload twice instead of LDPC encoding it
    #[arg(long)]
    noldpc: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = SimConfig {
        fec: if cli.noldpc { FecMode::Duplicate } else { FecMode::Ldpc },
        verbose: log::log_enabled!(log::Level::Debug),
        ..SimConfig::default()
    };

    let mut sim = Simulation::mode_700d(config)?;
    let report = sim.run()?;

    for (f, frame) in report.frames.iter().enumerate() {
        println!(
            "frame {}: nin {} parity checks {}/{} iterations {}",
            f, frame.nin, frame.parity_checks, report.parity_bits, frame.iterations
        );
    }
    println!(
        "{} of {} frames converged",
        report.converged_frames(),
        report.frames.len()
    );

    report.trace.save(TRACE_FILE)?;
    println!("Wrote {}", TRACE_FILE);
    Ok(())
}

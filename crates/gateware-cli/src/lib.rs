//! Command-line front end for the gateware simulation core.
//!
//! The binary is a thin layer over [`run`]: argument parsing lives in [`Cli`],
//! every command writes its report to a caller-supplied writer so the same
//! paths are exercised by unit tests.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gateware_core::{
    boot_sequence, calculate_phase_step, solve, PllSolution, ScriptedMaster, SimConfig, SimStats,
    Simulator,
};
use serde::Serialize;
use tracing::info;
#[cfg(test)]
use tempfile as _;
use tracing_subscriber as _;

/// Tone the reference firmware programs when none is given.
pub const DEFAULT_FREQUENCY_HZ: f64 = 32_768.0;

/// gateware-sim command-line arguments.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "gateware-sim", author, version, about, long_about = None)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the NCO phase step for a tone.
    PhaseStep {
        /// Clock feeding the phase accumulator.
        #[arg(long, default_value_t = 16e6)]
        clock_hz: f64,
        /// Output frequency.
        #[arg(long)]
        frequency: f64,
    },
    /// Search PLL divider settings.
    Pll {
        /// Reference clock.
        #[arg(long, default_value_t = 16.0)]
        input_mhz: f64,
        /// Requested output clock.
        #[arg(long)]
        output_mhz: f64,
    },
    /// Run the top-level design under the reference firmware sequence.
    Simulate(SimulateArgs),
}

/// Arguments of `simulate`.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct SimulateArgs {
    /// Reference-clock edges to run.
    #[arg(long)]
    pub ticks: u64,
    /// NCO output frequency programmed by the firmware.
    #[arg(long, default_value_t = DEFAULT_FREQUENCY_HZ)]
    pub frequency: f64,
    /// JSON configuration file; missing fields take their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Firmware image placed after RAM.
    #[arg(long)]
    pub firmware: Option<PathBuf>,
    /// Text sent over the UART after the LED is lit.
    #[arg(long)]
    pub uart: Option<String>,
    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Outcome of a `simulate` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Raw counters.
    pub stats: SimStats,
    /// Fraction of high sine bits.
    pub sine_density: f64,
    /// Fraction of high cosine bits.
    pub cosine_density: f64,
    /// LED state at the end of the run.
    pub led: bool,
    /// Bytes fully sent by the UART.
    pub uart: String,
    /// Finished bus operations.
    pub bus_completions: usize,
    /// Whether the firmware sequence finished.
    pub firmware_done: bool,
    /// PLL search result, when a PLL domain was configured.
    pub pll: Option<PllSolution>,
}

/// Loads a JSON configuration file.
///
/// # Errors
///
/// Fails when the file cannot be read or is not a valid configuration.
pub fn load_config(path: &Path) -> Result<SimConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Builds the design, scripts the firmware sequence and runs it.
///
/// The phase step is computed for the clock the NCO actually runs on: the
/// PLL output when one is configured, otherwise the reference clock.
///
/// # Errors
///
/// Fails on unreadable inputs or an invalid configuration.
pub fn simulate(args: &SimulateArgs) -> Result<Summary> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    let firmware = match &args.firmware {
        Some(path) => fs::read(path)
            .with_context(|| format!("failed to read firmware {}", path.display()))?,
        None => Vec::new(),
    };

    let mut sim = Simulator::new(&config, &firmware, ScriptedMaster::default())
        .context("invalid simulator configuration")?;
    let nco_clock_hz = sim
        .pll_solution()
        .map_or(config.clock_hz, |solution| solution.f_actual_mhz * 1e6);
    let message = args.uart.as_deref().unwrap_or_default().as_bytes();
    for op in boot_sequence(nco_clock_hz, args.frequency, message) {
        sim.master_mut().push(op);
    }

    let stats = sim.run(args.ticks);
    info!(ticks = stats.sync_ticks, time_ps = stats.time_ps, "run finished");
    Ok(Summary {
        stats,
        sine_density: stats.sine_density(),
        cosine_density: stats.cosine_density(),
        led: sim.top().led(),
        uart: String::from_utf8_lossy(sim.top().uart().sent()).into_owned(),
        bus_completions: sim.master().completions().len(),
        firmware_done: sim.master().is_done(),
        pll: sim.pll_solution().copied(),
    })
}

fn write_summary(out: &mut impl Write, summary: &Summary) -> Result<()> {
    let stats = &summary.stats;
    writeln!(out, "sync ticks:     {}", stats.sync_ticks)?;
    writeln!(
        out,
        "signal ticks:   {} ({} in reset)",
        stats.signal_ticks, stats.signal_reset_ticks
    )?;
    if let Some(pll) = &summary.pll {
        writeln!(out, "pll:            {} ({} MHz)", pll.coefficients, pll.f_actual_mhz)?;
    }
    writeln!(out, "sine density:   {:.4}", summary.sine_density)?;
    writeln!(out, "cosine density: {:.4}", summary.cosine_density)?;
    writeln!(out, "led:            {}", if summary.led { "on" } else { "off" })?;
    writeln!(out, "uart:           {:?}", summary.uart)?;
    writeln!(
        out,
        "bus completions: {}{}",
        summary.bus_completions,
        if summary.firmware_done { "" } else { " (pending)" }
    )?;
    Ok(())
}

/// Executes `cli`, writing its report to `out`.
///
/// PLL precision warnings are logged by the solver as `tracing` events.
///
/// # Errors
///
/// Propagates command failures and write errors.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Command::PhaseStep {
            clock_hz,
            frequency,
        } => {
            writeln!(out, "{}", calculate_phase_step(*clock_hz, *frequency))?;
        }
        Command::Pll {
            input_mhz,
            output_mhz,
        } => {
            let solution = solve(*input_mhz, *output_mhz).context("no PLL configuration")?;
            let coefficients = solution.coefficients;
            writeln!(
                out,
                "{} {} {}",
                coefficients.divr, coefficients.divf, coefficients.divq
            )?;
            writeln!(out, "{} MHz", solution.f_actual_mhz)?;
        }
        Command::Simulate(args) => {
            let summary = simulate(args)?;
            if args.json {
                serde_json::to_writer_pretty(&mut *out, &summary)
                    .context("failed to encode summary")?;
                writeln!(out)?;
            } else {
                write_summary(out, &summary)?;
            }
        }
    }
    Ok(())
}

// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

// Harvard syringe pump chain controller
use std::time::Duration;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use pumpchain::{Chain, ChainConfig, Pump, PumpModel, PumpOptions, StartupCheck};

#[derive(Parser)]
#[command(name = "pumpchain")]
#[command(about = "Control Harvard syringe pumps on an RS-232 daisy chain", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Serial port to use (e.g., /dev/ttyUSB0 or COM1)
    #[arg(short, long)]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "9600")]
    baud: u32,

    /// How long to wait for a pump to answer
    #[arg(long, default_value = "100", value_name = "MS")]
    timeout_ms: u64,

    /// Data bits (5, 6, 7, or 8)
    #[arg(long, default_value = "8", value_name="BITS")]
    data_bits: u8,

    /// Parity (none, odd, or even)
    #[arg(long, default_value = "none")]
    parity: String,

    /// Stop bits (1 or 2)
    #[arg(long, default_value = "2", value_name="BITS")]
    stop_bits: u8,

    /// Pump address on the chain (0-99)
    #[arg(short, long, default_value = "0")]
    address: u8,

    /// Pump model
    #[arg(short, long, value_enum, default_value = "model33")]
    model: Model,

    /// Name used in log output
    #[arg(long)]
    name: Option<String>,

    /// Query firmware version and status before running the command
    #[arg(long)]
    verify: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Model {
    /// PHD 2000 with refill
    Phd2000Refill,
    /// PHD 2000 infuse only
    Phd2000NoRefill,
    /// Model 33 twin syringe
    Model33,
}

impl From<Model> for PumpModel {
    fn from(model: Model) -> Self {
        match model {
            Model::Phd2000Refill => PumpModel::Phd2000Refill,
            Model::Phd2000NoRefill => PumpModel::Phd2000NoRefill,
            Model::Model33 => PumpModel::Model33,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show run state and settings
    Status,
    /// Start pumping
    Run,
    /// Stop pumping
    Stop,
    /// Set a syringe's inner diameter in mm
    SetDiameter {
        value: f64,
        /// Syringe (0 = default, 1 = A, 2 = B)
        #[arg(short, long, default_value = "0")]
        syringe: u8,
    },
    /// Set the operating mode (e.g. PRO, PMP)
    SetMode {
        mode: String,
    },
    /// Set the pumping direction (INF, REF or REV)
    SetDirection {
        direction: String,
    },
    /// Set a syringe's flow rate
    SetRate {
        value: f64,
        /// Rate unit (e.g. ml/hr, ul/min)
        unit: String,
        /// Syringe (0 = default, 1 = A, 2 = B)
        #[arg(short, long, default_value = "0")]
        syringe: u8,
    },
    /// Run syringe B in parallel (on) or reciprocal (off) to syringe A
    SetParallel {
        #[arg(value_parser = ["on", "off"])]
        setting: String,
    },
    /// Poll the pump for a while, stopping early on a stall
    Watch {
        seconds: u64,
        #[arg(long, default_value = "1000", value_name = "MS")]
        interval_ms: u64,
    },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.debug { LevelFilter::Debug } else { LevelFilter::Info })
        .parse_default_env()
        .init();

    let config = ChainConfig::new(&cli.port)
        .with_baud_rate(cli.baud)
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_framing(cli.data_bits, &cli.parity, cli.stop_bits)
        .unwrap_or_else(|e| fail(e));

    let chain = match Chain::open(&config) {
        Ok(chain) => chain.into_shared(),
        Err(e) => fail(format!("Failed to open serial port: {}", e)),
    };

    let mut options = PumpOptions::new(cli.address);
    if let Some(name) = cli.name {
        options = options.with_name(name);
    }
    if cli.verify {
        options = options.with_startup(StartupCheck::Verify);
    }

    let model = PumpModel::from(cli.model);
    let mut pump = Pump::attach(&chain, model.profile(), options).unwrap_or_else(|e| fail(e));

    if let Err(e) = execute(&mut pump, cli.command) {
        fail(e);
    }
}

fn execute(pump: &mut Pump, command: Commands) -> pumpchain::Result<()> {
    match command {
        Commands::Status => {
            pump.refresh()?;
            println!("{}: {}", pump.name(), pump.state());
            if let Some(mode) = pump.current_mode() {
                println!("  mode: {}", mode);
            }
            if let Some(direction) = pump.current_direction() {
                println!("  direction: {}", direction);
            }
            if let Some(parallel) = pump.current_parallel_reciprocal() {
                println!("  parallel/reciprocal: {}", if parallel { "ON" } else { "OFF" });
            }
        }
        Commands::Run => pump.run()?,
        Commands::Stop => pump.stop()?,
        Commands::SetDiameter { value, syringe } => {
            // Some syringes are only configurable in certain modes
            if pump.profile().syringe(syringe)?.modes.is_some() {
                pump.mode()?;
            }
            pump.set_diameter(value, syringe)?;
        }
        Commands::SetMode { mode } => pump.set_mode(&mode)?,
        Commands::SetDirection { direction } => pump.set_direction(&direction)?,
        Commands::SetRate { value, unit, syringe } => {
            // Rate needs the current mode, which a fresh process has not cached
            pump.mode()?;
            pump.set_rate(value, &unit, syringe)?;
        }
        Commands::SetParallel { setting } => pump.set_parallel_reciprocal(setting == "on")?,
        Commands::Watch { seconds, interval_ms } => {
            let status = pump.watch(
                Duration::from_secs(seconds),
                Duration::from_millis(interval_ms),
            )?;
            println!("{}: {}", pump.name(), status);
        }
    }
    Ok(())
}

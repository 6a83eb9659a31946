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

//! Control of Harvard Apparatus syringe pumps over an RS-232 daisy chain.
//!
//! One [`Chain`] owns the serial port; any number of [`Pump`]s, each with
//! its own address and model [`PumpProfile`], share it and take turns.
//!
//! ```no_run
//! use pumpchain::{Chain, ChainConfig, Pump, PumpModel, PumpOptions};
//!
//! # fn main() -> pumpchain::Result<()> {
//! let chain = Chain::open(&ChainConfig::new("/dev/ttyUSB0"))?.into_shared();
//! let mut pump = Pump::attach(&chain, PumpModel::Model33.profile(), PumpOptions::new(1))?;
//!
//! pump.set_mode("PRO")?;
//! pump.set_diameter(18.08, 1)?;
//! pump.set_rate(12.2, "ml/hr", 1)?;
//! pump.run()?;
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod codec;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod pump;
pub mod serial;

pub use chain::{Chain, ChainConfig, SharedChain};
pub use error::{PumpError, Rejection, Result};
pub use profile::{PumpModel, PumpProfile, Status};
pub use pump::{Pump, PumpOptions, Rate, StartupCheck};

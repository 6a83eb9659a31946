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

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use log::{debug, info};
use serialport::{DataBits, Parity, StopBits};
use crate::codec;
use crate::error::{PumpError, Result};
use crate::protocol::COMMAND_TERMINATOR;
use crate::serial::{RealSerialPort, SerialPort};

// ============================================================================
// Configuration
// ============================================================================

/// Serial settings for a pump chain.
///
/// `timeout` bounds how long a single reply may take. Slow firmware needs
/// a larger value or every exchange ends in `TransportTimeout`; a larger
/// value also means a disconnected pump takes that long to be noticed.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub port: String,
    pub baud_rate: u32,
    pub timeout: Duration,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl ChainConfig {
    /// Harvard defaults: 9600 baud, 8 data bits, no parity, 2 stop bits.
    pub fn new(port: impl Into<String>) -> Self {
        ChainConfig {
            port: port.into(),
            baud_rate: 9600,
            timeout: Duration::from_millis(100),
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::Two,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set character framing from plain values such as `8`, `"none"`, `2`.
    pub fn with_framing(mut self, data_bits: u8, parity: &str, stop_bits: u8) -> Result<Self> {
        self.data_bits = match data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => {
                return Err(PumpError::Config(format!("{} data bits, expected 5 to 8", other)));
            }
        };
        self.parity = match parity.to_ascii_lowercase().as_str() {
            "none" => Parity::None,
            "odd" => Parity::Odd,
            "even" => Parity::Even,
            _ => {
                return Err(PumpError::Config(format!(
                    "parity {:?}, expected none, odd or even", parity
                )));
            }
        };
        self.stop_bits = match stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            other => {
                return Err(PumpError::Config(format!("{} stop bits, expected 1 or 2", other)));
            }
        };
        Ok(self)
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Handle pumps use to reach their chain. Not `Send`: one thread owns the bus.
pub type SharedChain = Rc<RefCell<Chain>>;

/// A daisy chain of pumps behind one serial port.
///
/// The chain exclusively owns the port. Pumps take turns through
/// [`Chain::send_and_receive`], which does not return until the reply is
/// complete or the timeout has passed, so exchanges never overlap.
pub struct Chain {
    port_name: String,
    serial: Box<dyn SerialPort>,
    timeout: Duration,
}

impl Chain {
    pub fn open(config: &ChainConfig) -> Result<Chain> {
        let port = RealSerialPort::open(
            &config.port,
            config.baud_rate,
            config.data_bits,
            config.parity,
            config.stop_bits,
            config.timeout,
        )?;

        let chain = Chain::with_port(config.port.clone(), Box::new(port), config.timeout)?;
        info!("Chain created on {} ({} baud)", config.port, config.baud_rate);
        Ok(chain)
    }

    /// Build a chain over an already open transport.
    pub fn with_port(
        port_name: impl Into<String>,
        mut serial: Box<dyn SerialPort>,
        timeout: Duration,
    ) -> Result<Chain> {
        // Stale bytes from a previous session confuse the first reply
        serial.clear()?;

        Ok(Chain {
            port_name: port_name.into(),
            serial,
            timeout,
        })
    }

    pub fn into_shared(self) -> SharedChain {
        Rc::new(RefCell::new(self))
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Write one command and read its reply, prompt included.
    pub fn send_and_receive(&mut self, command: &str) -> Result<String> {
        let mut line = command.to_string();
        if !line.ends_with(COMMAND_TERMINATOR) {
            line.push(COMMAND_TERMINATOR);
        }

        self.serial.write_all(line.as_bytes())?;

        let deadline = Instant::now() + self.timeout;
        let mut reply = Vec::new();
        let mut buf = [0u8; 64];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(command, &reply));
            }

            match self.serial.read_timeout(&mut buf, remaining) {
                Ok(n) => {
                    reply.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&reply);
                    if codec::is_complete_reply(&text) {
                        return Ok(text.into_owned());
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Err(self.timed_out(command, &reply));
                }
                Err(e) => return Err(PumpError::Transport(e)),
            }
        }
    }

    fn timed_out(&self, command: &str, partial: &[u8]) -> PumpError {
        debug!(
            "{}: no complete reply to {:?}, got {:?}",
            self.port_name,
            command.trim_end(),
            String::from_utf8_lossy(partial)
        );
        PumpError::TransportTimeout(self.timeout)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pump chain on {}", self.port_name)
    }
}

// ============================================================================
// Tests
// ============================================================================

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

use std::time::{Duration, Instant};
use log::{debug, error, info, warn};
use crate::chain::SharedChain;
use crate::codec;
use crate::error::{PumpError, Rejection, Result};
use crate::profile::{DirectionEntry, ModeEntry, PumpProfile, Status, SyringeEntry};
use crate::protocol::{self, MAX_ADDRESS};

// ============================================================================
// Options
// ============================================================================

/// What a pump does when it is attached to a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupCheck {
    /// Send nothing and start from `Stopped`
    #[default]
    AssumeStopped,
    /// Query the firmware version and status before returning
    Verify,
}

#[derive(Debug, Clone)]
pub struct PumpOptions {
    pub name: String,
    pub address: u8,
    pub startup: StartupCheck,
}

impl PumpOptions {
    pub fn new(address: u8) -> Self {
        PumpOptions {
            name: format!("pump{:02}", address),
            address,
            startup: StartupCheck::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_startup(mut self, startup: StartupCheck) -> Self {
        self.startup = startup;
        self
    }
}

/// A flow rate as set on, or read back from, a pump
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    pub value: f64,
    pub unit: &'static str,
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

// Status and payload of one successful exchange
struct Answer {
    status: Status,
    payload: Vec<String>,
}

impl Answer {
    fn line(&self, what: &str) -> Result<&str> {
        self.payload
            .first()
            .map(String::as_str)
            .ok_or_else(|| PumpError::Protocol(format!("reply to {} query has no payload", what)))
    }
}

// ============================================================================
// Pump
// ============================================================================

/// One addressable pump on a chain.
///
/// Settings are cached only after the pump has accepted them. Run state
/// changes only through `run`, `stop` and status queries; setters leave it
/// alone.
pub struct Pump {
    name: String,
    address: u8,
    chain: SharedChain,
    profile: &'static dyn PumpProfile,
    state: Status,
    mode: Option<&'static ModeEntry>,
    direction: Option<&'static DirectionEntry>,
    parallel_reciprocal: Option<bool>,
    diameters: Vec<Option<f64>>,
    rates: Vec<Option<Rate>>,
    firmware_version: Option<String>,
}

impl Pump {
    pub fn attach(
        chain: &SharedChain,
        profile: &'static dyn PumpProfile,
        options: PumpOptions,
    ) -> Result<Pump> {
        if options.address > MAX_ADDRESS {
            return Err(PumpError::Encoding(format!(
                "address {} is outside 0-{}", options.address, MAX_ADDRESS
            )));
        }

        let slots = profile.syringe_count();
        let mut pump = Pump {
            name: options.name,
            address: options.address,
            chain: chain.clone(),
            profile,
            state: Status::Stopped,
            mode: None,
            direction: None,
            parallel_reciprocal: None,
            diameters: vec![None; slots],
            rates: vec![None; slots],
            firmware_version: None,
        };

        if options.startup == StartupCheck::Verify {
            let version = pump.version()?;
            if !version.starts_with(profile.table().version_prefix) {
                warn!(
                    "{}: firmware version {} indicates this is probably not a {} pump",
                    pump.name, version, profile.label()
                );
            }
            pump.poll()?;
        }

        info!(
            "{}: {} attached at address {:02} on {}",
            pump.name,
            profile.label(),
            pump.address,
            pump.chain.borrow().port_name()
        );
        Ok(pump)
    }

    // ------------------------------------------------------------------------
    // Cached state
    // ------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn profile(&self) -> &'static dyn PumpProfile {
        self.profile
    }

    pub fn state(&self) -> Status {
        self.state
    }

    pub fn current_mode(&self) -> Option<&'static str> {
        self.mode.map(|m| m.name)
    }

    pub fn current_direction(&self) -> Option<&'static str> {
        self.direction.map(|d| d.name)
    }

    pub fn current_parallel_reciprocal(&self) -> Option<bool> {
        self.parallel_reciprocal
    }

    pub fn current_diameter(&self, syringe: u8) -> Option<f64> {
        let slot = self.profile.syringe(syringe).ok()?.slot;
        self.diameters.get(slot).copied().flatten()
    }

    pub fn current_rate(&self, syringe: u8) -> Option<Rate> {
        let slot = self.profile.syringe(syringe).ok()?.slot;
        self.rates.get(slot).copied().flatten()
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    // ------------------------------------------------------------------------
    // Run / stop
    // ------------------------------------------------------------------------

    pub fn run(&mut self) -> Result<()> {
        let verb = self.profile.table().verbs.run;
        self.start(verb)
    }

    /// Run against the configured direction (PHD 2000 refill models).
    pub fn run_reverse(&mut self) -> Result<()> {
        let verb = self.verb(self.profile.table().verbs.reverse, "reverse run")?;
        self.start(verb)
    }

    fn start(&mut self, verb: &'static str) -> Result<()> {
        let answer = match self.exchange(verb, "") {
            Ok(answer) => answer,
            Err(PumpError::Rejected { reason: Rejection::NotApplicable, status, .. })
                if status != Status::Stopped =>
            {
                info!("{}: pump is already {}, continuing", self.name, status);
                Answer { status, payload: Vec::new() }
            }
            Err(e) => return Err(e),
        };

        match answer.status {
            Status::Running => {
                self.state = Status::Running;
                info!("{}: pump has started running", self.name);
                Ok(())
            }
            Status::Stalled => {
                self.state = Status::Stalled;
                warn!("{}: pump is stalled, please check the syringe!", self.name);
                Err(PumpError::PumpStalled { pump: self.name.clone(), payload: answer.payload })
            }
            Status::Stopped => {
                self.state = Status::Stopped;
                Err(PumpError::UnexpectedStatus {
                    expected: Status::Running,
                    actual: Status::Stopped,
                })
            }
        }
    }

    /// Stop the pump. Stopping a stopped or stalled pump succeeds.
    pub fn stop(&mut self) -> Result<()> {
        let verb = self.profile.table().verbs.stop;
        let status = match self.exchange(verb, "") {
            Ok(answer) => answer.status,
            Err(PumpError::Rejected { reason: Rejection::NotApplicable, status, .. })
                if status != Status::Running =>
            {
                info!("{}: pump is already stopped, continuing", self.name);
                status
            }
            Err(e) => return Err(e),
        };

        match status {
            Status::Running => {
                self.state = Status::Running;
                Err(PumpError::UnexpectedStatus {
                    expected: Status::Stopped,
                    actual: Status::Running,
                })
            }
            Status::Stalled => {
                warn!("{}: pump still reports a stall after stopping", self.name);
                self.state = Status::Stopped;
                Ok(())
            }
            Status::Stopped => {
                self.state = Status::Stopped;
                info!("{}: stopped pump", self.name);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn set_mode(&mut self, name: &str) -> Result<()> {
        let verb = self.verb(self.profile.table().verbs.mode, "mode")?;
        let entry = self.profile.mode(name)?;

        self.exchange(verb, entry.token)?;
        self.mode = Some(entry);
        info!("{}: mode set to {}", self.name, entry.name);
        Ok(())
    }

    pub fn set_direction(&mut self, name: &str) -> Result<()> {
        let verb = self.verb(self.profile.table().verbs.direction, "direction")?;
        let entry = self.profile.direction(name)?;

        self.exchange(verb, entry.token)?;
        if entry.token == "REV" {
            // Reversal toggles, so read back where it landed
            let now = self.direction()?;
            info!("{}: direction reversed to {}", self.name, now);
        } else {
            self.direction = Some(entry);
            info!("{}: direction set to {}", self.name, entry.name);
        }
        Ok(())
    }

    /// Link syringe B to syringe A: in parallel (`true`) or reciprocally.
    pub fn set_parallel_reciprocal(&mut self, parallel: bool) -> Result<()> {
        let verb = self.verb(self.profile.table().verbs.parallel, "parallel/reciprocal")?;

        self.exchange(verb, if parallel { "ON" } else { "OFF" })?;
        self.parallel_reciprocal = Some(parallel);
        info!(
            "{}: parallel/reciprocal set to {}",
            self.name,
            if parallel { "ON" } else { "OFF" }
        );
        Ok(())
    }

    /// Set a syringe's inner diameter in millimetres. The pump must be stopped.
    pub fn set_diameter(&mut self, value: f64, syringe: u8) -> Result<()> {
        let text = self.profile.validate_diameter(value, syringe)?;
        let entry = self.configurable_syringe(syringe, "diameter")?;
        if self.state != Status::Stopped {
            return Err(PumpError::Precondition(format!(
                "{}: cannot set diameter while pump is {}, please stop the pump first",
                self.name, self.state
            )));
        }

        let verb = self.profile.table().verbs.set_diameter;

        self.exchange(verb, &format!("{}{}", entry.token, text))?;
        let sent = text.parse().unwrap_or(value);
        self.diameters[entry.slot] = Some(sent);
        info!("{}: diameter of syringe <{}> set to {} mm", self.name, syringe, text);
        Ok(())
    }

    /// Set a syringe's flow rate. A rate-compatible mode must be set first.
    pub fn set_rate(&mut self, value: f64, unit: &str, syringe: u8) -> Result<()> {
        let mode = self.mode.ok_or_else(|| {
            PumpError::Precondition(format!("{}: set a mode before setting a rate", self.name))
        })?;
        if !mode.rate_compatible {
            return Err(PumpError::Precondition(format!(
                "{}: rate cannot be set in mode {}", self.name, mode.name
            )));
        }

        let entry = self.configurable_syringe(syringe, "rate")?;
        let (unit_token, scale) = self.profile.resolve_unit(mode.name, unit)?;
        if !value.is_finite() || value < 0.0 {
            return Err(PumpError::OutOfRange(format!(
                "{}: rate {} {} is not a valid flow rate", self.name, value, unit
            )));
        }

        let text = codec::format_number(value * scale)?;
        let (verb, argument) = self.profile.rate_command(entry.token, &text, unit_token);

        self.exchange(verb, &argument)?;
        let rate = Rate {
            value: text.parse().unwrap_or(value * scale),
            unit: self.profile.unit_for_token(unit_token).unwrap_or(unit_token),
        };
        self.rates[entry.slot] = Some(rate);
        info!("{}: flowrate of syringe <{}> set to {}", self.name, syringe, rate);
        Ok(())
    }

    /// Set the volume after which the pump stops, in millilitres.
    pub fn set_target_volume(&mut self, ml: f64) -> Result<()> {
        let verb = self.verb(self.profile.table().verbs.set_target, "target volume")?;
        let text = codec::format_number(ml)?;

        self.exchange(verb, &text)?;
        info!("{}: target volume set to {} ml", self.name, text);
        Ok(())
    }

    pub fn clear_volume(&mut self) -> Result<()> {
        let verb = self.verb(self.profile.table().verbs.clear_volume, "volume clearing")?;
        self.exchange(verb, "")?;
        Ok(())
    }

    pub fn clear_target(&mut self) -> Result<()> {
        let verb = self.verb(self.profile.table().verbs.clear_target, "target clearing")?;
        self.exchange(verb, "")?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Ask for the prompt alone and record the run state it shows.
    pub fn poll(&mut self) -> Result<Status> {
        let answer = self.exchange(protocol::POLL, "")?;
        self.state = answer.status;
        if answer.status == Status::Stalled {
            warn!("{}: pump is stalled, please check the syringe!", self.name);
        }
        Ok(answer.status)
    }

    pub fn version(&mut self) -> Result<String> {
        let verb = self.profile.table().verbs.version;
        let answer = self.exchange(verb, "")?;
        let version = answer.line("version")?.to_string();
        debug!("{}: firmware version is {}", self.name, version);
        self.firmware_version = Some(version.clone());
        Ok(version)
    }

    pub fn mode(&mut self) -> Result<&'static str> {
        let verb = self.verb(self.profile.table().verbs.mode, "mode")?;
        let answer = self.exchange(verb, "")?;
        let line = answer.line("mode")?;
        let entry = self.profile.mode_for_token(line).ok_or_else(|| {
            PumpError::Protocol(format!("{}: unknown mode {:?}", self.name, line))
        })?;
        self.mode = Some(entry);
        Ok(entry.name)
    }

    pub fn direction(&mut self) -> Result<&'static str> {
        let verb = self.verb(self.profile.table().verbs.direction, "direction")?;
        let answer = self.exchange(verb, "")?;
        let line = answer.line("direction")?;
        let entry = self.profile.direction_for_reply(line).ok_or_else(|| {
            PumpError::Protocol(format!("{}: unknown direction {:?}", self.name, line))
        })?;
        self.direction = Some(entry);
        Ok(entry.name)
    }

    pub fn parallel_reciprocal(&mut self) -> Result<bool> {
        let verb = self.verb(self.profile.table().verbs.parallel, "parallel/reciprocal")?;
        let answer = self.exchange(verb, "")?;
        let parallel = match answer.line("parallel/reciprocal")? {
            "ON" => true,
            "OFF" => false,
            other => {
                return Err(PumpError::Protocol(format!(
                    "{}: unknown parallel/reciprocal setting {:?}", self.name, other
                )));
            }
        };
        self.parallel_reciprocal = Some(parallel);
        Ok(parallel)
    }

    pub fn diameter(&mut self, syringe: u8) -> Result<f64> {
        let entry = self.profile.syringe(syringe)?;
        let verb = self.profile.table().verbs.diameter;
        let answer = self.exchange(verb, entry.token)?;
        let (value, _) = codec::parse_quantity(answer.line("diameter")?)?;
        debug!("{}: diameter of syringe <{}> is {} mm", self.name, syringe, value);
        self.diameters[entry.slot] = Some(value);
        Ok(value)
    }

    pub fn rate(&mut self, syringe: u8) -> Result<Rate> {
        let entry = self.profile.syringe(syringe)?;
        let verbs = &self.profile.table().verbs;
        let answer = self.exchange(verbs.rate, entry.token)?;
        let (value, unit_text) = codec::parse_quantity(answer.line("rate")?)?;

        // Some firmware only prints the unit in answer to a separate query
        let unit_text = match verbs.rate_units {
            Some(units_verb) if unit_text.is_empty() => {
                let units = self.exchange(units_verb, "")?;
                units.line("rate units")?.chars().take(4).collect::<String>()
            }
            _ => unit_text.to_string(),
        };

        let unit = self.profile.unit_for_report(&unit_text).ok_or_else(|| {
            PumpError::Protocol(format!("{}: unknown rate unit {:?}", self.name, unit_text))
        })?;
        let rate = Rate { value, unit };
        debug!("{}: flow rate of syringe <{}> is {}", self.name, syringe, rate);
        self.rates[entry.slot] = Some(rate);
        Ok(rate)
    }

    /// Accumulated volume dispensed, in millilitres.
    pub fn volume(&mut self) -> Result<f64> {
        let verb = self.verb(self.profile.table().verbs.volume, "volume")?;
        let answer = self.exchange(verb, "")?;
        Ok(codec::parse_quantity(answer.line("volume")?)?.0)
    }

    /// Target volume, in millilitres.
    pub fn target_volume(&mut self) -> Result<f64> {
        let verb = self.verb(self.profile.table().verbs.target, "target volume")?;
        let answer = self.exchange(verb, "")?;
        Ok(codec::parse_quantity(answer.line("target volume")?)?.0)
    }

    /// Re-read run state and whatever settings the model can report.
    pub fn refresh(&mut self) -> Result<()> {
        self.poll()?;
        let verbs = &self.profile.table().verbs;
        if verbs.mode.is_some() {
            self.mode()?;
        }
        if verbs.direction.is_some() {
            self.direction()?;
        }
        if verbs.parallel.is_some() {
            self.parallel_reciprocal()?;
        }
        info!(
            "{}: state: {}, mode: {}, direction: {}, parallel/reciprocal: {}",
            self.name,
            self.state,
            self.current_mode().unwrap_or("?"),
            self.current_direction().unwrap_or("?"),
            match self.parallel_reciprocal {
                Some(true) => "ON",
                Some(false) => "OFF",
                None => "n/a",
            }
        );
        Ok(())
    }

    /// Poll every `interval` for `duration`, returning early on a stall.
    pub fn watch(&mut self, duration: Duration, interval: Duration) -> Result<Status> {
        let end = Instant::now() + duration;
        loop {
            let status = self.poll()?;
            if status == Status::Stalled {
                return Err(PumpError::PumpStalled { pump: self.name.clone(), payload: Vec::new() });
            }

            let now = Instant::now();
            if now >= end {
                return Ok(status);
            }
            std::thread::sleep(interval.min(end - now));
        }
    }

    // ------------------------------------------------------------------------
    // Exchange
    // ------------------------------------------------------------------------

    fn verb(&self, verb: Option<&'static str>, what: &'static str) -> Result<&'static str> {
        verb.ok_or_else(|| PumpError::UnsupportedOperation {
            model: self.profile.label(),
            operation: what,
        })
    }

    fn configurable_syringe(&self, syringe: u8, what: &str) -> Result<&'static SyringeEntry> {
        let entry = self.profile.syringe(syringe)?;
        if let Some(modes) = entry.modes {
            let mode = self.current_mode().unwrap_or("unset");
            if !modes.iter().any(|m| *m == mode) {
                return Err(PumpError::Precondition(format!(
                    "{}: can only set {} for syringe <{}> in mode {}",
                    self.name, what, syringe, modes.join("/")
                )));
            }
        }
        Ok(entry)
    }

    fn exchange(&mut self, verb: &str, argument: &str) -> Result<Answer> {
        let command = codec::encode_command(self.address, verb, argument)?;
        debug!("{}: writing command: {:?}", self.name, command);

        let raw = self.chain.borrow_mut().send_and_receive(&command)?;
        debug!("{}: reading response: {:?}", self.name, raw);

        let reply = codec::decode_reply(&raw, self.address).inspect_err(|e| {
            error!("{}: {} (command {:?})", self.name, e, command.trim_end());
        })?;
        if reply.address == codec::ReplyAddress::Implicit {
            debug!("{}: reply carried no address, taking it as ours", self.name);
        }

        let status = self.profile.classify(&reply.symbol).ok_or_else(|| {
            let msg = format!(
                "{}: unknown status symbol {:?} in reply to {:?}",
                self.name, reply.symbol, command.trim_end()
            );
            error!("{}", msg);
            PumpError::Protocol(msg)
        })?;

        if let Some(reason) = reply.rejection() {
            error!(
                "{}: pump reported {} when <{}> was issued",
                self.name, reason, command.trim_end()
            );
            return Err(PumpError::Rejected {
                command: command.trim_end().to_string(),
                reason,
                status,
            });
        }

        Ok(Answer { status, payload: reply.payload })
    }
}

impl std::fmt::Debug for Pump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pump")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("model", &self.profile.label())
            .field("state", &self.state)
            .field("mode", &self.current_mode())
            .field("direction", &self.current_direction())
            .field("parallel_reciprocal", &self.parallel_reciprocal)
            .field("diameters", &self.diameters)
            .field("rates", &self.rates)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

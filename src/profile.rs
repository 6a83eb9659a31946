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

//! Model capability profiles.
//!
//! A profile is static data: the modes, directions, rate units, status
//! symbols and syringe addressing one pump model understands. The pump
//! state machine is written once against [`PumpProfile`]; adding a model
//! means adding a [`ProfileTable`].

use crate::codec;
use crate::error::{PumpError, Result};
use crate::protocol;

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Stopped,
    Stalled,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Running => write!(f, "running"),
            Status::Stopped => write!(f, "stopped"),
            Status::Stalled => write!(f, "stalled"),
        }
    }
}

// ============================================================================
// Table Types
// ============================================================================

#[derive(Debug)]
pub struct ModeEntry {
    pub name: &'static str,
    pub token: &'static str,
    /// Whether a flow rate can be set in this mode
    pub rate_compatible: bool,
}

#[derive(Debug)]
pub struct DirectionEntry {
    pub name: &'static str,
    pub token: &'static str,
}

#[derive(Debug)]
pub struct UnitEntry {
    pub name: &'static str,
    pub token: &'static str,
    /// Multiplier taking a rate in `name` to a rate in `token`
    pub scale: f64,
    /// Modes the unit can be used in
    pub modes: &'static [&'static str],
    /// How the firmware prints this unit in a rate read-back
    pub reported: Option<&'static str>,
}

#[derive(Debug)]
pub struct SyringeEntry {
    pub index: u8,
    pub token: &'static str,
    /// Position in a pump's per-syringe settings
    pub slot: usize,
    /// Modes the syringe can be configured independently in (None = any)
    pub modes: Option<&'static [&'static str]>,
}

#[derive(Debug)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub inclusive: bool,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        if self.inclusive {
            value >= self.min && value <= self.max
        } else {
            value > self.min && value < self.max
        }
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.inclusive {
            write!(f, "[{}, {}]", self.min, self.max)
        } else {
            write!(f, "({}, {})", self.min, self.max)
        }
    }
}

/// How a rate command is laid out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSyntax {
    /// The unit token is the verb: `MLH12.20`
    UnitVerb,
    /// One rate verb, unit token after the value: `RATA12.20MH`
    RateVerb,
}

#[derive(Debug)]
pub struct Verbs {
    pub run: &'static str,
    pub stop: &'static str,
    pub reverse: Option<&'static str>,
    pub version: &'static str,
    pub mode: Option<&'static str>,
    pub direction: Option<&'static str>,
    pub parallel: Option<&'static str>,
    pub set_diameter: &'static str,
    pub diameter: &'static str,
    pub rate: &'static str,
    pub rate_units: Option<&'static str>,
    pub volume: Option<&'static str>,
    pub target: Option<&'static str>,
    pub set_target: Option<&'static str>,
    pub clear_volume: Option<&'static str>,
    pub clear_target: Option<&'static str>,
}

#[derive(Debug)]
pub struct ProfileTable {
    pub label: &'static str,
    /// Expected start of the firmware version string
    pub version_prefix: &'static str,
    pub mode_conversion: &'static [ModeEntry],
    pub directions: &'static [DirectionEntry],
    pub running_status: &'static [&'static str],
    pub stopped_status: &'static [&'static str],
    pub stalled_status: &'static [&'static str],
    /// None for single-syringe models
    pub syringe_selection: Option<&'static [SyringeEntry]>,
    pub unit_conversion: &'static [UnitEntry],
    pub diameter: Bounds,
    pub rate_syntax: RateSyntax,
    pub verbs: Verbs,
}

// ============================================================================
// PumpProfile Trait
// ============================================================================

/// The surface the pump state machine needs from a model.
///
/// Everything has a default driven by [`ProfileTable`]; a model whose
/// firmware deviates overrides only the method that differs.
pub trait PumpProfile: Sync + std::fmt::Debug {
    fn table(&self) -> &'static ProfileTable;

    fn label(&self) -> &'static str {
        self.table().label
    }

    /// Resolve a status symbol, `None` when it belongs to no status set.
    fn classify(&self, symbol: &str) -> Option<Status> {
        let table = self.table();
        let member = |set: &[&str]| set.iter().any(|s| *s == symbol);
        if member(table.running_status) {
            Some(Status::Running)
        } else if member(table.stopped_status) {
            Some(Status::Stopped)
        } else if member(table.stalled_status) {
            Some(Status::Stalled)
        } else {
            None
        }
    }

    fn mode(&self, name: &str) -> Result<&'static ModeEntry> {
        self.table()
            .mode_conversion
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| PumpError::UnsupportedSetting {
                model: self.label(),
                setting: "mode",
                value: name.to_string(),
            })
    }

    fn mode_for_token(&self, token: &str) -> Option<&'static ModeEntry> {
        self.table()
            .mode_conversion
            .iter()
            .find(|m| m.token.eq_ignore_ascii_case(token))
    }

    fn direction(&self, name: &str) -> Result<&'static DirectionEntry> {
        self.table()
            .directions
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| PumpError::UnsupportedSetting {
                model: self.label(),
                setting: "direction",
                value: name.to_string(),
            })
    }

    /// Match a direction read-back such as `INFUSE` on its token prefix.
    fn direction_for_reply(&self, reply: &str) -> Option<&'static DirectionEntry> {
        let reply = reply.trim().to_ascii_uppercase();
        self.table()
            .directions
            .iter()
            .find(|d| reply.starts_with(d.token))
    }

    fn syringe_count(&self) -> usize {
        match self.table().syringe_selection {
            Some(entries) => entries.iter().map(|s| s.slot).max().map_or(1, |max| max + 1),
            None => 1,
        }
    }

    /// Look up a syringe index; `0` always means the pump's default syringe.
    fn syringe(&self, index: u8) -> Result<&'static SyringeEntry> {
        let entries = self.table().syringe_selection.unwrap_or(&SINGLE_SYRINGE[..]);
        entries
            .iter()
            .find(|s| s.index == index)
            .ok_or_else(|| {
                PumpError::OutOfRange(format!("{} has no syringe {}", self.label(), index))
            })
    }

    /// Map a user-facing rate unit to its firmware token and scale factor.
    fn resolve_unit(&self, mode: &str, unit: &str) -> Result<(&'static str, f64)> {
        self.table()
            .unit_conversion
            .iter()
            .find(|u| {
                u.name.eq_ignore_ascii_case(unit)
                    && u.modes.iter().any(|m| m.eq_ignore_ascii_case(mode))
            })
            .map(|u| (u.token, u.scale))
            .ok_or_else(|| PumpError::UnsupportedUnit {
                model: self.label(),
                unit: unit.to_string(),
                mode: mode.to_string(),
            })
    }

    /// User-facing name of the unit the firmware reports as `reported`.
    fn unit_for_report(&self, reported: &str) -> Option<&'static str> {
        self.table()
            .unit_conversion
            .iter()
            .find(|u| u.reported.is_some_and(|r| r.eq_ignore_ascii_case(reported.trim())))
            .map(|u| u.name)
    }

    /// User-facing name of the unit a firmware token natively stands for.
    fn unit_for_token(&self, token: &str) -> Option<&'static str> {
        self.table()
            .unit_conversion
            .iter()
            .find(|u| u.token == token && u.reported.is_some())
            .map(|u| u.name)
    }

    /// Check a diameter and return exactly what will be sent for it.
    fn validate_diameter(&self, value: f64, syringe: u8) -> Result<String> {
        self.syringe(syringe)?;
        let bounds = &self.table().diameter;
        if !bounds.contains(value) {
            return Err(PumpError::OutOfRange(format!(
                "{} diameter {} mm is outside {} mm", self.label(), value, bounds
            )));
        }

        let text = codec::format_number(value)?;
        let rounded: f64 = text
            .parse()
            .map_err(|_| PumpError::Encoding(format!("cannot read back {:?}", text)))?;
        if !bounds.contains(rounded) {
            return Err(PumpError::OutOfRange(format!(
                "{} diameter {} mm rounds to {} mm, outside {} mm",
                self.label(), value, text, bounds
            )));
        }

        Ok(text)
    }

    /// Lay out a rate command as `(verb, argument)`.
    fn rate_command(
        &self,
        syringe_token: &str,
        value: &str,
        unit_token: &'static str,
    ) -> (&'static str, String) {
        match self.table().rate_syntax {
            RateSyntax::UnitVerb => (unit_token, format!("{}{}", syringe_token, value)),
            RateSyntax::RateVerb => (
                self.table().verbs.rate,
                format!("{}{}{}", syringe_token, value, unit_token),
            ),
        }
    }
}

static SINGLE_SYRINGE: [SyringeEntry; 2] = [
    SyringeEntry { index: 0, token: "", slot: 0, modes: None },
    SyringeEntry { index: 1, token: "", slot: 0, modes: None },
];

// ============================================================================
// Shipped Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpModel {
    Phd2000Refill,
    Phd2000NoRefill,
    Model33,
}

impl PumpModel {
    pub fn profile(self) -> &'static dyn PumpProfile {
        match self {
            PumpModel::Phd2000Refill => &PumpModel::Phd2000Refill,
            PumpModel::Phd2000NoRefill => &PumpModel::Phd2000NoRefill,
            PumpModel::Model33 => &PumpModel::Model33,
        }
    }
}

impl PumpProfile for PumpModel {
    fn table(&self) -> &'static ProfileTable {
        match self {
            PumpModel::Phd2000Refill => &PHD_2000_REFILL,
            PumpModel::Phd2000NoRefill => &PHD_2000_NO_REFILL,
            PumpModel::Model33 => &MODEL_33,
        }
    }
}

// PHD 2000

const PHD_RATE_MODES: &[&str] = &["PMP", "VOL"];

static PHD_2000_MODES: [ModeEntry; 3] = [
    ModeEntry { name: "PMP", token: "PMP", rate_compatible: true },
    ModeEntry { name: "VOL", token: "VOL", rate_compatible: true },
    ModeEntry { name: "PGM", token: "PGM", rate_compatible: false },
];

static PHD_2000_UNITS: [UnitEntry; 14] = [
    UnitEntry { name: "ml/hr", token: "MLH", scale: 1.0, modes: PHD_RATE_MODES, reported: Some("ml/h") },
    UnitEntry { name: "ul/hr", token: "ULH", scale: 1.0, modes: PHD_RATE_MODES, reported: Some("ul/h") },
    UnitEntry { name: "ml/min", token: "MLM", scale: 1.0, modes: PHD_RATE_MODES, reported: Some("ml/m") },
    UnitEntry { name: "ul/min", token: "ULM", scale: 1.0, modes: PHD_RATE_MODES, reported: Some("ul/m") },
    UnitEntry { name: "ml/h", token: "MLH", scale: 1.0, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "ul/h", token: "ULH", scale: 1.0, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "m/h", token: "MLH", scale: 1.0, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "u/h", token: "ULH", scale: 1.0, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "m/m", token: "MLM", scale: 1.0, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "u/m", token: "ULM", scale: 1.0, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "ml/sec", token: "MLM", scale: 60.0, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "ul/sec", token: "ULM", scale: 60.0, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "nl/min", token: "ULM", scale: 0.001, modes: PHD_RATE_MODES, reported: None },
    UnitEntry { name: "nl/hr", token: "ULH", scale: 0.001, modes: PHD_RATE_MODES, reported: None },
];

const PHD_2000_VERBS: Verbs = Verbs {
    run: protocol::RUN,
    stop: protocol::STOP,
    reverse: None,
    version: protocol::VERSION,
    mode: Some(protocol::MODE),
    direction: Some(protocol::DIRECTION),
    parallel: None,
    set_diameter: protocol::DIAMETER_MM,
    diameter: protocol::DIAMETER,
    rate: protocol::RATE,
    rate_units: Some(protocol::RATE_RANGE),
    volume: Some(protocol::VOLUME),
    target: Some(protocol::TARGET),
    set_target: Some(protocol::TARGET_ML),
    clear_volume: Some(protocol::CLEAR_VOLUME),
    clear_target: Some(protocol::CLEAR_TARGET),
};

pub static PHD_2000_REFILL: ProfileTable = ProfileTable {
    label: "PHD 2000 Refill",
    version_prefix: "PHD",
    mode_conversion: &PHD_2000_MODES,
    directions: &[
        DirectionEntry { name: "INF", token: "INF" },
        DirectionEntry { name: "REF", token: "REF" },
        DirectionEntry { name: "REV", token: "REV" },
    ],
    running_status: &[">", "<"],
    stopped_status: &[":", "T*"],
    stalled_status: &["*"],
    syringe_selection: None,
    unit_conversion: &PHD_2000_UNITS,
    diameter: Bounds { min: 0.1, max: 50.0, inclusive: true },
    rate_syntax: RateSyntax::UnitVerb,
    verbs: Verbs { reverse: Some(protocol::REVERSE), ..PHD_2000_VERBS },
};

pub static PHD_2000_NO_REFILL: ProfileTable = ProfileTable {
    label: "PHD 2000 NoRefill",
    version_prefix: "PHD",
    mode_conversion: &PHD_2000_MODES,
    directions: &[DirectionEntry { name: "INF", token: "INF" }],
    running_status: &[">"],
    stopped_status: &[":", "T*"],
    stalled_status: &["*"],
    syringe_selection: None,
    unit_conversion: &PHD_2000_UNITS,
    diameter: Bounds { min: 0.1, max: 50.0, inclusive: true },
    rate_syntax: RateSyntax::UnitVerb,
    verbs: PHD_2000_VERBS,
};

// Model 33

const MODEL_33_MODES: &[&str] = &["AUT", "PRO", "CON"];

pub static MODEL_33: ProfileTable = ProfileTable {
    label: "Model 33",
    version_prefix: "33",
    mode_conversion: &[
        ModeEntry { name: "AUT", token: "AUT", rate_compatible: true },
        ModeEntry { name: "PRO", token: "PRO", rate_compatible: true },
        ModeEntry { name: "CON", token: "CON", rate_compatible: true },
    ],
    directions: &[
        DirectionEntry { name: "INF", token: "INF" },
        DirectionEntry { name: "REF", token: "REF" },
        DirectionEntry { name: "REV", token: "REV" },
    ],
    running_status: &[">", "<"],
    stopped_status: &[":"],
    stalled_status: &["*"],
    syringe_selection: Some(&[
        SyringeEntry { index: 0, token: "", slot: 0, modes: None },
        SyringeEntry { index: 1, token: "A", slot: 0, modes: None },
        SyringeEntry { index: 2, token: "B", slot: 1, modes: Some(&["PRO"]) },
    ]),
    unit_conversion: &[
        UnitEntry { name: "ml/hr", token: "MH", scale: 1.0, modes: MODEL_33_MODES, reported: Some("ml/hr") },
        UnitEntry { name: "ul/hr", token: "UH", scale: 1.0, modes: MODEL_33_MODES, reported: Some("ul/hr") },
        UnitEntry { name: "ml/mn", token: "MM", scale: 1.0, modes: MODEL_33_MODES, reported: Some("ml/mn") },
        UnitEntry { name: "ul/mn", token: "UM", scale: 1.0, modes: MODEL_33_MODES, reported: Some("ul/mn") },
        UnitEntry { name: "ml/min", token: "MM", scale: 1.0, modes: MODEL_33_MODES, reported: None },
        UnitEntry { name: "ul/min", token: "UM", scale: 1.0, modes: MODEL_33_MODES, reported: None },
        UnitEntry { name: "ml/sec", token: "MM", scale: 60.0, modes: MODEL_33_MODES, reported: None },
        UnitEntry { name: "ul/sec", token: "UM", scale: 60.0, modes: MODEL_33_MODES, reported: None },
    ],
    diameter: Bounds { min: 0.1, max: 50.0, inclusive: false },
    rate_syntax: RateSyntax::RateVerb,
    verbs: Verbs {
        run: protocol::RUN,
        stop: protocol::STOP,
        reverse: None,
        version: protocol::VERSION,
        mode: Some(protocol::MODE),
        direction: Some(protocol::DIRECTION),
        parallel: Some(protocol::PARALLEL),
        set_diameter: protocol::DIAMETER,
        diameter: protocol::DIAMETER,
        rate: protocol::RATE,
        rate_units: None,
        volume: None,
        target: None,
        set_target: None,
        clear_volume: None,
        clear_target: None,
    },
};

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MODELS: [PumpModel; 3] = [
        PumpModel::Phd2000Refill,
        PumpModel::Phd2000NoRefill,
        PumpModel::Model33,
    ];

    #[test]
    fn test_status_sets_are_disjoint() {
        for model in ALL_MODELS {
            let table = model.table();
            for symbol in table.running_status {
                assert!(!table.stopped_status.contains(symbol), "{:?} {}", model, symbol);
                assert!(!table.stalled_status.contains(symbol), "{:?} {}", model, symbol);
            }
            for symbol in table.stopped_status {
                assert!(!table.stalled_status.contains(symbol), "{:?} {}", model, symbol);
            }
        }
    }

    #[test]
    fn test_classify() {
        let model = PumpModel::Model33;
        assert_eq!(model.classify(">"), Some(Status::Running));
        assert_eq!(model.classify("<"), Some(Status::Running));
        assert_eq!(model.classify(":"), Some(Status::Stopped));
        assert_eq!(model.classify("*"), Some(Status::Stalled));
        assert_eq!(model.classify("#"), None);
        assert_eq!(model.classify("T*"), None);

        assert_eq!(PumpModel::Phd2000Refill.classify("T*"), Some(Status::Stopped));
        assert_eq!(PumpModel::Phd2000Refill.classify("<"), Some(Status::Running));
        assert_eq!(PumpModel::Phd2000NoRefill.classify("<"), None);
    }

    #[test]
    fn test_every_declared_unit_resolves_in_its_modes() {
        for model in ALL_MODELS {
            let table = model.table();
            for unit in table.unit_conversion {
                for mode in unit.modes {
                    let (token, scale) = model.resolve_unit(mode, unit.name).unwrap();
                    assert_eq!(token, unit.token);
                    assert_eq!(scale, unit.scale);
                }
            }
        }
    }

    #[test]
    fn test_undeclared_units_are_unsupported() {
        for model in ALL_MODELS {
            for mode in model.table().mode_conversion {
                match model.resolve_unit(mode.name, "gal/day") {
                    Err(PumpError::UnsupportedUnit { unit, .. }) => assert_eq!(unit, "gal/day"),
                    other => panic!("expected unsupported unit, got {:?}", other),
                }
            }
        }

        // Model 33 spells minutes "mn"; "ml/m" is PHD shorthand
        assert!(matches!(
            PumpModel::Model33.resolve_unit("PRO", "m/m"),
            Err(PumpError::UnsupportedUnit { .. })
        ));
    }

    #[test]
    fn test_units_are_incompatible_with_program_mode() {
        assert!(matches!(
            PumpModel::Phd2000Refill.resolve_unit("PGM", "ml/hr"),
            Err(PumpError::UnsupportedUnit { .. })
        ));
        assert_eq!(PumpModel::Phd2000Refill.resolve_unit("VOL", "ml/hr").unwrap(), ("MLH", 1.0));
    }

    #[test]
    fn test_scaled_units() {
        assert_eq!(PumpModel::Model33.resolve_unit("PRO", "ml/sec").unwrap(), ("MM", 60.0));
        assert_eq!(PumpModel::Phd2000NoRefill.resolve_unit("PMP", "nl/min").unwrap(), ("ULM", 0.001));
    }

    #[test]
    fn test_validate_diameter() {
        let model = PumpModel::Model33;
        assert_eq!(model.validate_diameter(18.08, 1).unwrap(), "18.08");
        assert_eq!(model.validate_diameter(2.01, 2).unwrap(), "2.010");
        assert!(matches!(model.validate_diameter(-1.0, 1), Err(PumpError::OutOfRange(_))));
        assert!(matches!(model.validate_diameter(0.0, 1), Err(PumpError::OutOfRange(_))));
        assert!(matches!(model.validate_diameter(50.0, 1), Err(PumpError::OutOfRange(_))));
        assert!(matches!(model.validate_diameter(0.1, 1), Err(PumpError::OutOfRange(_))));
        assert!(matches!(model.validate_diameter(49.999, 1), Err(PumpError::OutOfRange(_))));
        assert!(matches!(model.validate_diameter(10.0, 3), Err(PumpError::OutOfRange(_))));

        let phd = PumpModel::Phd2000Refill;
        assert_eq!(phd.validate_diameter(50.0, 0).unwrap(), "50.00");
        assert_eq!(phd.validate_diameter(0.1, 0).unwrap(), "0.100");
        assert!(matches!(phd.validate_diameter(0.0, 0), Err(PumpError::OutOfRange(_))));
        assert!(matches!(phd.validate_diameter(50.01, 0), Err(PumpError::OutOfRange(_))));
        assert!(matches!(phd.validate_diameter(12.0, 2), Err(PumpError::OutOfRange(_))));
    }

    #[test]
    fn test_syringe_addressing() {
        let model = PumpModel::Model33;
        assert_eq!(model.syringe_count(), 2);
        assert_eq!(model.syringe(0).unwrap().token, "");
        assert_eq!(model.syringe(1).unwrap().token, "A");
        assert_eq!(model.syringe(2).unwrap().token, "B");
        assert_eq!(model.syringe(2).unwrap().slot, 1);
        assert!(model.syringe(3).is_err());

        let phd = PumpModel::Phd2000NoRefill;
        assert_eq!(phd.syringe_count(), 1);
        assert_eq!(phd.syringe(1).unwrap().token, "");
        assert!(phd.syringe(2).is_err());
    }

    #[test]
    fn test_rate_command_layout() {
        let model = PumpModel::Model33;
        assert_eq!(model.rate_command("A", "12.20", "MH"), ("RAT", "A12.20MH".to_string()));

        let phd = PumpModel::Phd2000Refill;
        assert_eq!(phd.rate_command("", "12.20", "MLH"), ("MLH", "12.20".to_string()));
        assert_eq!(phd.rate_command("", "0.500", "ULM"), ("ULM", "0.500".to_string()));
    }

    #[test]
    fn test_modes_and_directions() {
        assert_eq!(PumpModel::Model33.mode("pro").unwrap().token, "PRO");
        assert!(matches!(
            PumpModel::Model33.mode("PMP"),
            Err(PumpError::UnsupportedSetting { setting: "mode", .. })
        ));
        assert!(!PumpModel::Phd2000Refill.mode("PGM").unwrap().rate_compatible);

        assert!(PumpModel::Phd2000Refill.direction("REF").is_ok());
        assert!(matches!(
            PumpModel::Phd2000NoRefill.direction("REF"),
            Err(PumpError::UnsupportedSetting { setting: "direction", .. })
        ));
        assert_eq!(PumpModel::Model33.direction_for_reply("INFUSE").unwrap().name, "INF");
        assert_eq!(PumpModel::Model33.direction_for_reply("refill").unwrap().name, "REF");
    }

    #[test]
    fn test_reported_units() {
        assert_eq!(PumpModel::Model33.unit_for_report("ul/mn"), Some("ul/mn"));
        assert_eq!(PumpModel::Phd2000Refill.unit_for_report("ML/H"), Some("ml/hr"));
        assert_eq!(PumpModel::Phd2000Refill.unit_for_token("ULM"), Some("ul/min"));
        assert_eq!(PumpModel::Model33.unit_for_report("gal/day"), None);
    }

    #[test]
    fn test_only_refill_reverses() {
        assert_eq!(PumpModel::Phd2000Refill.table().verbs.reverse, Some("REV"));
        assert_eq!(PumpModel::Phd2000NoRefill.table().verbs.reverse, None);
        assert_eq!(PumpModel::Model33.table().verbs.parallel, Some("PAR"));
        assert_eq!(PumpModel::Phd2000Refill.table().verbs.parallel, None);
    }
}

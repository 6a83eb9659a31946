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

//! Error types for pump chains.
//!
//! Every failure falls into one of three groups, and [`PumpError::was_sent`]
//! tells them apart:
//!
//! - **never sent**: the request was invalid for the pump's profile
//!   (`Encoding`, `OutOfRange`, `UnsupportedUnit`, `UnsupportedSetting`,
//!   `UnsupportedOperation`, `Precondition`) or the chain was misconfigured
//!   (`Config`, `Port`). No byte reached the port.
//! - **sent but unanswered**: `TransportTimeout`, and I/O failures on an open port.
//! - **sent, answered, rejected**: `Protocol`, `Rejected`, `UnexpectedStatus`
//!   and `PumpStalled`.

use std::time::Duration;
use thiserror::Error;
use crate::profile::Status;

pub type Result<T> = std::result::Result<T, PumpError>;

/// Rejection markers a pump prints in place of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// `?` - the firmware could not parse the command
    Syntax,
    /// `NA` - the command is not applicable in the pump's current state
    NotApplicable,
    /// `OOR` - an argument was outside the firmware's limits
    OutOfRange,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Syntax => write!(f, "syntax error"),
            Rejection::NotApplicable => write!(f, "command not applicable at this time"),
            Rejection::OutOfRange => write!(f, "argument out of range"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PumpError {
    #[error("no reply within {0:?}")]
    TransportTimeout(Duration),

    #[error("serial I/O error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),

    #[error("invalid serial settings: {0}")]
    Config(String),

    #[error("cannot encode command: {0}")]
    Encoding(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("{model} does not support unit {unit:?} in mode {mode}")]
    UnsupportedUnit {
        model: &'static str,
        unit: String,
        mode: String,
    },

    #[error("{model} does not support {setting} {value:?}")]
    UnsupportedSetting {
        model: &'static str,
        setting: &'static str,
        value: String,
    },

    #[error("{model} does not support {operation}")]
    UnsupportedOperation {
        model: &'static str,
        operation: &'static str,
    },

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{pump}: pump stalled")]
    PumpStalled { pump: String, payload: Vec<String> },

    #[error("pump rejected {command:?}: {reason} (pump is {status})")]
    Rejected {
        command: String,
        reason: Rejection,
        status: Status,
    },

    #[error("expected pump to be {expected}, pump reports {actual}")]
    UnexpectedStatus { expected: Status, actual: Status },
}

impl PumpError {
    /// Whether any byte of the failed request was written to the chain.
    pub fn was_sent(&self) -> bool {
        !matches!(
            self,
            PumpError::Config(_)
                | PumpError::Encoding(_)
                | PumpError::OutOfRange(_)
                | PumpError::UnsupportedUnit { .. }
                | PumpError::UnsupportedSetting { .. }
                | PumpError::UnsupportedOperation { .. }
                | PumpError::Precondition(_)
                | PumpError::Port(_)
        )
    }

    /// Timeouts are the only failure worth repeating unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PumpError::TransportTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_were_never_sent() {
        assert!(!PumpError::Precondition("mode not set".into()).was_sent());
        assert!(!PumpError::OutOfRange("diameter -1".into()).was_sent());
        assert!(!PumpError::Encoding("address 100".into()).was_sent());
        assert!(!PumpError::Config("9 data bits".into()).was_sent());
        assert!(PumpError::TransportTimeout(Duration::from_millis(100)).was_sent());
        assert!(PumpError::Protocol("address mismatch".into()).was_sent());
    }

    #[test]
    fn test_only_timeouts_are_retryable() {
        assert!(PumpError::TransportTimeout(Duration::from_millis(100)).is_retryable());
        assert!(!PumpError::PumpStalled { pump: "p".into(), payload: vec![] }.is_retryable());
        assert!(!PumpError::Rejected {
            command: "01RUN".into(),
            reason: Rejection::NotApplicable,
            status: Status::Stopped,
        }
        .is_retryable());
    }

    #[test]
    fn test_display_includes_reason_and_status() {
        let err = PumpError::Rejected {
            command: "01DIA55.00".into(),
            reason: Rejection::OutOfRange,
            status: Status::Stopped,
        };
        assert_eq!(
            err.to_string(),
            "pump rejected \"01DIA55.00\": argument out of range (pump is stopped)"
        );
    }
}

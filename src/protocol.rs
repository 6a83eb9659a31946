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

//! Harvard pump chain protocol constants

/// Carriage return - terminates every command written to the chain
pub const COMMAND_TERMINATOR: char = '\r';

/// Line breaks the firmware puts around payload lines
pub const LINE_BREAKS: [char; 2] = ['\r', '\n'];

/// Highest address a pump can be set to on the front panel
pub const MAX_ADDRESS: u8 = 99;

/// Characters allowed in verbs and arguments besides ASCII letters and digits
pub const ARGUMENT_PUNCTUATION: [char; 2] = ['.', ' '];

/// Punctuation that appears inside payloads and can never close a prompt
pub const PAYLOAD_PUNCTUATION: [char; 4] = ['.', '/', '-', '?'];

/// Address digits at most in a prompt
pub const PROMPT_ADDRESS_DIGITS: usize = 2;

/// Numeric arguments are sent as five characters, decimal point included
pub const NUMBER_WIDTH: usize = 5;

/// Syntax error - printed in place of the payload
pub const REJECT_SYNTAX: &str = "?";

/// Not applicable - the command cannot be obeyed in the current state
pub const REJECT_NOT_APPLICABLE: &str = "NA";

/// Out of range - an argument exceeds the firmware's limits
pub const REJECT_OUT_OF_RANGE: &str = "OOR";

/// Status poll - the bare address, answered with a prompt
pub const POLL: &str = "";

/// Run the pump in its configured direction
pub const RUN: &str = "RUN";

/// Stop the pump
pub const STOP: &str = "STP";

/// Run in reverse (PHD 2000 refill models)
pub const REVERSE: &str = "REV";

/// Firmware version query
pub const VERSION: &str = "VER";

/// Operating mode query/set
pub const MODE: &str = "MOD";

/// Direction query/set
pub const DIRECTION: &str = "DIR";

/// Parallel/reciprocal linkage query/set (Model 33)
pub const PARALLEL: &str = "PAR";

/// Diameter query, and set on Model 33
pub const DIAMETER: &str = "DIA";

/// Diameter set in millimetres (PHD 2000)
pub const DIAMETER_MM: &str = "MMD";

/// Rate query, and set on Model 33
pub const RATE: &str = "RAT";

/// Rate units query (PHD 2000)
pub const RATE_RANGE: &str = "RNG";

/// Accumulated volume query (PHD 2000)
pub const VOLUME: &str = "VOL";

/// Target volume query (PHD 2000)
pub const TARGET: &str = "TAR";

/// Target volume set in millilitres (PHD 2000)
pub const TARGET_ML: &str = "MLT";

/// Clear accumulated volume (PHD 2000)
pub const CLEAR_VOLUME: &str = "CLV";

/// Clear target volume (PHD 2000)
pub const CLEAR_TARGET: &str = "CLT";

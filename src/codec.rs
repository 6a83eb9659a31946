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

//! Command framing and reply parsing.
//!
//! Commands go out as `<2-digit address><verb><argument>\r`. Replies come
//! back as zero or more payload lines followed by a prompt: the replying
//! pump's address (omitted by some firmware) and a status symbol such as
//! `:` or `>`. The prompt is not followed by a line break, so it is also
//! what marks the end of a reply.

use crate::error::{PumpError, Rejection, Result};
use crate::protocol::*;

// ============================================================================
// Reply Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyAddress {
    Explicit(u8),
    /// The prompt carried no address digits
    Implicit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub address: ReplyAddress,
    pub symbol: String,
    pub payload: Vec<String>,
}

impl Reply {
    /// The rejection marker the firmware printed instead of a payload, if any.
    pub fn rejection(&self) -> Option<Rejection> {
        self.payload.iter().find_map(|line| match line.as_str() {
            REJECT_SYNTAX => Some(Rejection::Syntax),
            REJECT_NOT_APPLICABLE => Some(Rejection::NotApplicable),
            REJECT_OUT_OF_RANGE => Some(Rejection::OutOfRange),
            _ => None,
        })
    }

    pub fn first_line(&self) -> Option<&str> {
        self.payload.first().map(String::as_str)
    }
}

// ============================================================================
// Encoding
// ============================================================================

fn is_argument_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ARGUMENT_PUNCTUATION.contains(&c)
}

pub fn encode_command(address: u8, verb: &str, argument: &str) -> Result<String> {
    if address > MAX_ADDRESS {
        return Err(PumpError::Encoding(format!(
            "address {} is outside 0-{}", address, MAX_ADDRESS
        )));
    }

    if let Some(c) = verb.chars().find(|c| !c.is_ascii_alphabetic()) {
        return Err(PumpError::Encoding(format!("{:?} is not allowed in verb {:?}", c, verb)));
    }

    if let Some(c) = argument.chars().find(|c| !is_argument_char(*c)) {
        return Err(PumpError::Encoding(format!(
            "{:?} is not allowed in argument {:?}", c, argument
        )));
    }

    Ok(format!("{:02}{}{}{}", address, verb, argument, COMMAND_TERMINATOR))
}

/// Render a non-negative number in the firmware's five-character field.
///
/// The value is rounded to as many decimals as fit, so `12.2` becomes
/// `"12.20"` and `2.1` becomes `"2.100"`. Rounding works on the exact
/// decimal expansion of the `f64`; a carry into a new integer digit drops
/// one decimal (`9.9996` becomes `"10.00"`).
pub fn format_number(value: f64) -> Result<String> {
    if !value.is_finite() || value < 0.0 {
        return Err(PumpError::OutOfRange(format!(
            "{} cannot be sent as a pump number", value
        )));
    }

    let whole = value.trunc();
    let mut int_digits = if whole < 1.0 { 1 } else { format!("{:.0}", whole).len() };

    loop {
        if int_digits >= NUMBER_WIDTH {
            return Err(PumpError::OutOfRange(format!(
                "{} does not fit in {} characters", value, NUMBER_WIDTH
            )));
        }

        let decimals = (NUMBER_WIDTH - 1).saturating_sub(int_digits);
        let text = format!("{:.*}", decimals, value);
        let produced = text.split('.').next().map_or(0, str::len);

        if produced > int_digits {
            int_digits = produced;
            continue;
        }

        return Ok(text);
    }
}

// ============================================================================
// Decoding
// ============================================================================

fn split_digits(text: &str) -> (&str, &str) {
    let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    text.split_at(end)
}

fn is_prompt_mark(c: char) -> bool {
    c.is_ascii_punctuation() && !PAYLOAD_PUNCTUATION.contains(&c)
}

/// Whether `raw` ends with a prompt, i.e. the pump has finished answering.
/// Line breaks after the prompt are ignored.
pub fn is_complete_reply(raw: &str) -> bool {
    let raw = raw.trim_end_matches(&LINE_BREAKS[..]);
    let tail = raw.rsplit(&LINE_BREAKS[..]).next().unwrap_or("");
    let (digits, rest) = split_digits(tail);
    if digits.len() > PROMPT_ADDRESS_DIGITS {
        return false;
    }

    let mut chars = rest.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(mark), None, None) => is_prompt_mark(mark),
        (Some(letter), Some(mark), None) => letter.is_ascii_alphabetic() && is_prompt_mark(mark),
        _ => false,
    }
}

pub fn decode_reply(raw: &str, expected_address: u8) -> Result<Reply> {
    let mut lines: Vec<&str> = raw
        .split(&LINE_BREAKS[..])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let prompt = lines
        .pop()
        .ok_or_else(|| PumpError::Protocol("empty reply".to_string()))?;

    let (digits, symbol) = split_digits(prompt);
    if symbol.is_empty() || symbol.contains(char::is_whitespace) {
        return Err(PumpError::Protocol(format!("reply {:?} has no status symbol", raw)));
    }
    if digits.len() > PROMPT_ADDRESS_DIGITS {
        return Err(PumpError::Protocol(format!("malformed prompt {:?}", prompt)));
    }

    let address = if digits.is_empty() {
        ReplyAddress::Implicit
    } else {
        let replied: u8 = digits
            .parse()
            .map_err(|_| PumpError::Protocol(format!("malformed prompt {:?}", prompt)))?;
        if replied != expected_address {
            return Err(PumpError::Protocol(format!(
                "reply from address {:02} while addressing {:02}",
                replied, expected_address
            )));
        }
        ReplyAddress::Explicit(replied)
    };

    Ok(Reply {
        address,
        symbol: symbol.to_string(),
        payload: lines.into_iter().map(String::from).collect(),
    })
}

/// Split a payload line such as `12.20 ml/hr` into its number and unit text.
pub fn parse_quantity(line: &str) -> Result<(f64, &str)> {
    let line = line.trim();
    let end = line
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(line.len());

    let value = line[..end]
        .parse::<f64>()
        .map_err(|_| PumpError::Protocol(format!("no number in {:?}", line)))?;

    Ok((value, line[end..].trim()))
}

// ============================================================================
// Tests
// ============================================================================

//! Text configuration source
//!
//! Minimal parser for the control block written as a TOML subset, as it
//! arrives over a serial console or is stored as text. It does NOT support
//! the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (integer, `none`, quoted or bare enum names)
//! - An optional `[control]` section header
//! - Comments (# ...), including trailing comments
//!
//! Keys left out keep their default value. The result is a [`RawConfig`];
//! validation is the configuration store's job.
//!
//! ```text
//! [control]
//! ces_dev = 5          # ±%
//! ces_thd = 25
//! lux_thd = 300
//! led_stat = 1200
//! lec_fins = 600
//! pumping_t = 30
//! pump_rest = 120
//! measinterval = 10
//! dictinterval = 60
//! recdinterval = 20
//! wlv_thd = 200
//! thermal = "aerate_when_high"
//! ```

use super::types::{RawConfig, SinkPolicy, ThermalResponse};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header (1-based line number)
    InvalidSection(u16),
    /// Line is not `key = value`
    InvalidLine(u16),
    /// Key is not part of the control block
    UnknownKey(u16),
    /// Value could not be parsed for its key
    InvalidValue(u16),
}

/// Parse a text control block into a raw configuration
pub fn parse_config(input: &str) -> Result<RawConfig, ParseError> {
    let mut config = RawConfig::default();

    for (index, line) in input.lines().enumerate() {
        let line_no = (index + 1).min(u16::MAX as usize) as u16;
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') || line[1..line.len() - 1].trim() != "control" {
                return Err(ParseError::InvalidSection(line_no));
            }
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine(line_no))?;
        apply_value(&mut config, key, value, line_no)?;
    }

    Ok(config)
}

/// Remove a trailing comment, ignoring `#` inside quotes
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Parse an integer value, allowing `_` digit separators
fn parse_int(value: &str) -> Option<i32> {
    let mut buf = [0u8; 16];
    let mut len = 0;
    for b in value.bytes().filter(|b| *b != b'_') {
        *buf.get_mut(len)? = b;
        len += 1;
    }
    core::str::from_utf8(&buf[..len]).ok()?.parse().ok()
}

/// Parse an optional integer (`none` disables)
fn parse_optional_int(value: &str) -> Option<Option<i32>> {
    match parse_string(value) {
        "none" | "off" => Some(None),
        v => parse_int(v).map(Some),
    }
}

/// Parse thermal response
fn parse_thermal(value: &str) -> Option<ThermalResponse> {
    match parse_string(value) {
        "unassigned" | "Unassigned" | "none" => Some(ThermalResponse::Unassigned),
        "aerate_when_high" | "AerateWhenHigh" | "high" => Some(ThermalResponse::AerateWhenHigh),
        "aerate_when_low" | "AerateWhenLow" | "low" => Some(ThermalResponse::AerateWhenLow),
        "aerate_on_any_excursion" | "AerateOnAnyExcursion" | "any" => {
            Some(ThermalResponse::AerateOnAnyExcursion)
        }
        _ => None,
    }
}

/// Parse sink policy
fn parse_sink_policy(value: &str) -> Option<SinkPolicy> {
    match parse_string(value) {
        "buffer" | "Buffer" => Some(SinkPolicy::Buffer),
        "drop" | "Drop" => Some(SinkPolicy::Drop),
        _ => None,
    }
}

/// Apply a key-value pair
fn apply_value(
    config: &mut RawConfig,
    key: &str,
    value: &str,
    line_no: u16,
) -> Result<(), ParseError> {
    let invalid = ParseError::InvalidValue(line_no);

    let int = || parse_int(value).ok_or(invalid);

    match key {
        "ces_dev" => config.ces_dev = int()?,
        "ces_thd" => config.ces_thd = int()?,
        "lux_thd" => config.lux_thd = int()?,
        "led_stat" => config.led_stat = int()?,
        "lec_fins" => config.lec_fins = int()?,
        "pumping_t" => config.pumping_t = int()?,
        "pump_rest" => config.pump_rest = int()?,
        "measinterval" => config.measinterval = int()?,
        "dictinterval" => config.dictinterval = int()?,
        "recdinterval" => config.recdinterval = int()?,
        "day_length" => config.day_length = int()?,
        "day_offset" => config.day_offset = int()?,
        "wlv_thd" => config.wlv_thd = parse_optional_int(value).ok_or(invalid)?,
        "thermal" => config.thermal = parse_thermal(value).ok_or(invalid)?,
        "sink_policy" => config.sink_policy = parse_sink_policy(value).ok_or(invalid)?,
        _ => return Err(ParseError::UnknownKey(line_no)),
    }

    Ok(())
}

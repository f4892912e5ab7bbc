use derive_more::Display;
use log::trace;
use serde::Serialize;

use crate::core::snmp::{Result, SnmpError};

const STRING_MARKER: &str = "STRING: ";
const INTEGER_MARKER: &str = "INTEGER: ";

/// The latest known scalar value of a metric.
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    #[display("{}", _0)]
    Text(String),
    #[display("{}", _0)]
    Integer(i64),
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Parse the raw response of a metric query into a [MetricValue].
///
/// A response looks like `SNMPv2-MIB::sysName.0 = STRING: consul-c2\n`, where only the
/// trimmed text after the type marker is retained. `STRING: ` takes precedence over `INTEGER: `.
///
/// # Returns
///
/// It returns `Ok(None)` when the response contains no supported type marker, or
/// [SnmpError::Parse] when the integer value is invalid.
pub fn parse_value(raw: &str) -> Result<Option<MetricValue>> {
    if let Some(index) = raw.find(STRING_MARKER) {
        let value = raw[index + STRING_MARKER.len()..].trim();
        return Ok(Some(MetricValue::Text(value.to_string())));
    }

    if let Some(index) = raw.find(INTEGER_MARKER) {
        return parse_integer(&raw[index + INTEGER_MARKER.len()..])
            .map(MetricValue::Integer)
            .map(Some);
    }

    trace!("No supported value type found within {:?}", raw);
    Ok(None)
}

/// Parse the leading base-10 integer of the given text.
/// Trailing text, such as a unit, is ignored.
fn parse_integer(value: &str) -> Result<i64> {
    let value = value.trim();
    let sign_len = if value.starts_with(|c: char| c == '+' || c == '-') {
        1
    } else {
        0
    };
    let digits_len = value[sign_len..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();

    if digits_len == 0 {
        return Err(SnmpError::Parse(format!("\"{}\" is not an integer", value)));
    }

    value[..sign_len + digits_len]
        .parse::<i64>()
        .map_err(|e| SnmpError::Parse(format!("\"{}\" is not a valid integer, {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_string() {
        let result = parse_value("SNMPv2-MIB::sysName.0 = STRING: consul-c2\n").unwrap();

        assert_eq!(Some(MetricValue::Text("consul-c2".to_string())), result);
    }

    #[test]
    fn test_parse_value_string_whitespace() {
        let result = parse_value("SNMPv2-MIB::sysDescr.0 = STRING:    Linux consul-c1  \r\n").unwrap();

        assert_eq!(Some(MetricValue::from("Linux consul-c1")), result);
    }

    #[test]
    fn test_parse_value_empty_string() {
        let result = parse_value("SNMPv2-MIB::sysContact.0 = STRING: \n").unwrap();

        assert_eq!(Some(MetricValue::from("")), result);
    }

    #[test]
    fn test_parse_value_integer() {
        let result = parse_value("UCD-SNMP-MIB::dskPercent.1 = INTEGER: 27\n").unwrap();

        assert_eq!(Some(MetricValue::Integer(27)), result);
    }

    #[test]
    fn test_parse_value_negative_integer() {
        let result = parse_value("LM-SENSORS-MIB::lmTempSensorsValue.1 = INTEGER: -12\n").unwrap();

        assert_eq!(Some(MetricValue::Integer(-12)), result);
    }

    #[test]
    fn test_parse_value_integer_with_unit() {
        let result = parse_value("UCD-SNMP-MIB::dskAvail.1 = INTEGER: 5450828 kB\n").unwrap();

        assert_eq!(Some(MetricValue::Integer(5450828)), result);
    }

    #[test]
    fn test_parse_value_invalid_integer() {
        let result = parse_value("IF-MIB::ifOperStatus.1 = INTEGER: up(1)\n");

        match result {
            Err(SnmpError::Parse(_)) => {}
            _ => assert!(false, "expected SnmpError::Parse, got {:?} instead", result),
        }
    }

    #[test]
    fn test_parse_value_integer_overflow() {
        let result = parse_value("X::y.0 = INTEGER: 99999999999999999999\n");

        assert!(result.is_err(), "expected an error, got {:?} instead", result);
    }

    #[test]
    fn test_parse_value_string_takes_precedence() {
        let result = parse_value("X::y.0 = INTEGER: 1 STRING: lorem\n").unwrap();

        assert_eq!(Some(MetricValue::from("lorem")), result);
    }

    #[test]
    fn test_parse_value_unknown_type() {
        let result = parse_value("DISMAN-EVENT-MIB::sysUpTimeInstance = Timeticks: (1234) 0:00:12.34\n").unwrap();

        assert_eq!(None, result);
    }

    #[test]
    fn test_parse_value_empty() {
        let result = parse_value("").unwrap();

        assert_eq!(None, result);
    }

    #[test]
    fn test_metric_value_serialize() {
        assert_eq!(
            "\"consul-c1\"",
            serde_json::to_string(&MetricValue::from("consul-c1")).unwrap()
        );
        assert_eq!("31", serde_json::to_string(&MetricValue::from(31i64)).unwrap());
    }
}

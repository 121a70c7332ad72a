//! Rendering outcomes for the terminal.
//!
//! Every outcome becomes a flat set of fields: `ok` always, `error` on
//! failure, and the reply's fields on success. Plain mode prints one
//! `key: value` line per field; JSON mode prints a pretty object with
//! sorted keys.

use pinrepl_protocol::{CommandError, Outcome, Reply};
use serde_json::{Map, Value};

use crate::error::ShellResult;

/// Placeholder printed by `rvd` for replies without a value.
pub const NO_VALUE: &str = "N/A";

/// The fields of an outcome in display order.
pub fn outcome_fields(outcome: &Outcome) -> ShellResult<Vec<(String, Value)>> {
    let mut fields = vec![("ok".to_string(), Value::Bool(outcome.ok()))];

    match &outcome.result {
        Ok(Reply::Ack) => {}
        Ok(Reply::Reset { note }) => fields.push(("note".to_string(), Value::from(*note))),
        Ok(Reply::DigitalRead { value }) => fields.push(("value".to_string(), Value::from(*value))),
        Ok(Reply::AnalogRead { value }) => fields.push(("value".to_string(), Value::from(*value))),
        Ok(Reply::Info(info)) => {
            if let Value::Object(map) = serde_json::to_value(info)? {
                fields.extend(map);
            }
        }
        Err(err) => {
            fields.push(("error".to_string(), Value::from(err.to_string())));
            if let CommandError::LinkTimeout { partial } = err {
                fields.push(("partial".to_string(), Value::from(partial.clone())));
            }
        }
    }
    Ok(fields)
}

/// Render an outcome in plain or JSON form, without a trailing newline.
pub fn render(outcome: &Outcome, json: bool) -> ShellResult<String> {
    let fields = outcome_fields(outcome)?;

    if json {
        let object: Map<String, Value> = fields.into_iter().collect();
        return Ok(serde_json::to_string_pretty(&Value::Object(object))?);
    }

    let lines: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!("{}: {}", key, plain(value)))
        .collect();
    Ok(lines.join("\n"))
}

/// The primary value of an outcome, or [`NO_VALUE`].
pub fn render_value(outcome: &Outcome) -> String {
    outcome
        .value()
        .map_or_else(|| NO_VALUE.to_string(), |value| value.to_string())
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(plain).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinrepl_protocol::{ArgumentError, CommandKind, DeviceInfo, RESET_NOTE};

    fn sample_info() -> DeviceInfo {
        DeviceInfo {
            millis: 1234,
            free_ram: 1536,
            total_ram: 2048,
            flash_size: 32256,
            cpu_freq: 16_000_000,
            version: 1,
            buffer_size: 10,
            digital_pins: 14,
            total_pins: 22,
            max_soft_pwm: 6,
            soft_pwm_freq: 50,
            commands_count: 8,
            success_code: 0xFF,
            error_code: 0xFE,
            hardware_pwm: vec![3, 5, 6],
            info: "board".to_string(),
        }
    }

    #[test]
    fn test_plain_ack() {
        let outcome = Outcome::success(CommandKind::Nop, Reply::Ack);
        assert_eq!(render(&outcome, false).unwrap(), "ok: true");
    }

    #[test]
    fn test_plain_read_value() {
        let outcome = Outcome::success(CommandKind::AnalogRead, Reply::AnalogRead { value: 1000 });
        assert_eq!(render(&outcome, false).unwrap(), "ok: true\nvalue: 1000");
    }

    #[test]
    fn test_plain_failure() {
        let outcome = Outcome::failure(None, CommandError::UnknownCommand("blink".into()));
        assert_eq!(
            render(&outcome, false).unwrap(),
            "ok: false\nerror: unknown command: blink"
        );
    }

    #[test]
    fn test_plain_info_lists() {
        let outcome = Outcome::success(CommandKind::Info, Reply::Info(sample_info()));
        let text = render(&outcome, false).unwrap();
        assert!(text.starts_with("ok: true\n"));
        assert!(text.contains("hardware_pwm: [3, 5, 6]"));
        assert!(text.contains("info: board"));
        assert!(text.contains("cpu_freq: 16000000"));
    }

    #[test]
    fn test_json_sorted_keys() {
        let outcome = Outcome::success(
            CommandKind::Reset,
            Reply::Reset { note: RESET_NOTE },
        );
        let text = render(&outcome, true).unwrap();
        assert_eq!(
            text,
            "{\n  \"note\": \"device reset likely triggered\",\n  \"ok\": true\n}"
        );
    }

    #[test]
    fn test_json_info_is_object() {
        let outcome = Outcome::success(CommandKind::Info, Reply::Info(sample_info()));
        let value: Value = serde_json::from_str(&render(&outcome, true).unwrap()).unwrap();
        assert_eq!(value["ok"], Value::Bool(true));
        assert_eq!(value["total_pins"], Value::from(22));
        assert_eq!(value["hardware_pwm"], serde_json::json!([3, 5, 6]));
    }

    #[test]
    fn test_partial_bytes_rendered() {
        let outcome = Outcome::failure(
            Some(CommandKind::AnalogRead),
            CommandError::LinkTimeout { partial: vec![0xE8] },
        );
        let value: Value = serde_json::from_str(&render(&outcome, true).unwrap()).unwrap();
        assert_eq!(value["partial"], serde_json::json!([232]));
        assert_eq!(value["ok"], Value::Bool(false));
    }

    #[test]
    fn test_render_value() {
        let read = Outcome::success(CommandKind::DigitalRead, Reply::DigitalRead { value: 1 });
        assert_eq!(render_value(&read), "1");

        let ack = Outcome::success(CommandKind::DigitalWrite, Reply::Ack);
        assert_eq!(render_value(&ack), NO_VALUE);

        let failed = Outcome::failure(
            Some(CommandKind::DigitalRead),
            CommandError::Argument(ArgumentError::Usage("on <pin>")),
        );
        assert_eq!(render_value(&failed), NO_VALUE);
    }
}

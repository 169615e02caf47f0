use std::str::FromStr;

/// Read an environment variable, treating unset and blank values alike
pub fn string(name: &str) -> Option<String> {
    let value = std::env::var(name).ok()?;
    let value = value.trim();

    (!value.is_empty()).then(|| value.to_owned())
}

/// Read a boolean environment variable
///
/// Accepts `1/0`, `true/false`, `yes/no` and `on/off` in any case.
/// Anything else is ignored with a warning so the caller falls back to its
/// default.
pub fn boolean(name: &str) -> Option<bool> {
    let raw = string(name)?;

    match parse_bool(&raw) {
        Some(value) => Some(value),
        None => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparsable boolean");
            None
        }
    }
}

/// Read and parse an environment variable with `FromStr`
pub fn parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = string(name)?;

    if let Ok(value) = raw.parse() {
        Some(value)
    } else {
        tracing::warn!(variable = name, value = %raw, "ignoring unparsable value");
        None
    }
}

/// Read a human-friendly duration (`"30s"`, `"5m"`) from the environment
pub fn duration(name: &str) -> Option<std::time::Duration> {
    let raw = string(name)?;

    match duration_str::parse(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparsable duration: {e}");
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

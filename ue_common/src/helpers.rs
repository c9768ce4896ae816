use std::{env, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads a boolean flag from the environment variable `name`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok(), default)
}

/// Reads and parses the environment variable `name`. Missing and malformed values both yield `None`; the error
/// message of a malformed value is handed to `on_error` so that callers can log it in their own voice.
pub fn env_parse<T, F>(name: &str, on_error: F) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: FnOnce(&str, String),
{
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            on_error(&raw, e.to_string());
            None
        },
    }
}

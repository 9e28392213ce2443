//! Security guard: forbidden-property filter and host-function lockdown.
//! Separate from the resource meter — this rejects operations outright
//! rather than metering them.

use crate::error::{messages, Error, Result};
use crate::runtime::value::Value;

/// `__proto__`, `constructor`, `prototype` — blocked on read, write, and
/// computed access, on every sandbox object.
pub fn is_forbidden_property(name: &str) -> bool {
    matches!(name, "__proto__" | "constructor" | "prototype")
}

pub fn check_property_name(name: &str) -> Result<()> {
    if is_forbidden_property(name) {
        Err(Error::type_error(messages::forbidden_property(name)))
    } else {
        Ok(())
    }
}

/// Host function property lockdown: reading or writing any property of a
/// host callable fails unconditionally.
pub fn check_host_function_read(target: &Value) -> Result<()> {
    if matches!(target, Value::HostFn(_)) {
        Err(Error::type_error(messages::cannot_read_host_function_property()))
    } else {
        Ok(())
    }
}

pub fn check_host_function_write(target: &Value) -> Result<()> {
    if matches!(target, Value::HostFn(_)) {
        Err(Error::type_error(messages::cannot_write_host_function_property()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_proto_constructor_prototype() {
        for name in ["__proto__", "constructor", "prototype"] {
            assert!(check_property_name(name).is_err(), "{name} should be forbidden");
        }
        assert!(check_property_name("ok").is_ok());
    }
}

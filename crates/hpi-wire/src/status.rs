use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::ScalarKind;
use crate::value::Value;

/// An HPI status code.
///
/// It is a signed 32-bit code, zero meaning success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(i32);

macro_rules! status_codes {
    ($($name:ident = $code:literal: $description:literal),* $(,)?) => {
        impl Status {
            $(
                #[doc = concat!($description, ".")]
                pub const $name: Self = Self($code);
            )*

            /// Returns a description of the status.
            #[must_use]
            pub const fn description(self) -> &'static str {
                match self.0 {
                    $($code => $description,)*
                    _ => "Unknown status code",
                }
            }
        }
    };
}

status_codes! {
    OK = 0: "Success",
    ERROR = -1001: "Unspecified error",
    UNSUPPORTED_API = -1002: "Operation not supported",
    BUSY = -1003: "Resource busy",
    INTERNAL_ERROR = -1004: "Internal error",
    INVALID_CMD = -1005: "Invalid command",
    TIMEOUT = -1006: "Timed out",
    OUT_OF_SPACE = -1007: "Out of space",
    OUT_OF_MEMORY = -1008: "Out of memory",
    INVALID_PARAMS = -1009: "Invalid parameters",
    INVALID_DATA = -1010: "Invalid data",
    NOT_PRESENT = -1011: "Not present",
    NO_RESPONSE = -1012: "No response",
    DUPLICATE = -1013: "Duplicate",
    INVALID_SESSION = -1014: "Invalid session",
    INVALID_DOMAIN = -1015: "Invalid domain",
    INVALID_RESOURCE = -1016: "Invalid resource",
    INVALID_REQUEST = -1017: "Invalid request",
    ENTITY_NOT_PRESENT = -1018: "Entity not present",
    READ_ONLY = -1019: "Read only",
    CAPABILITY = -1020: "Capability not available",
    UNKNOWN = -1021: "Unknown",
}

impl Status {
    /// Creates a [`Status`] from its code.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the status code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Checks whether the status means success.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }

    /// Converts the status into a value of the given scalar kind.
    ///
    /// Only 32-bit integers can carry a status.
    #[must_use]
    pub const fn to_value(self, kind: ScalarKind) -> Option<Value> {
        match kind {
            ScalarKind::U32 => Some(Value::U32(self.0.cast_unsigned())),
            ScalarKind::I32 => Some(Value::I32(self.0)),
            _ => None,
        }
    }

    /// Extracts a status from a 32-bit integer value.
    #[must_use]
    pub const fn from_value(value: &Value) -> Option<Self> {
        match *value {
            Value::U32(code) => Some(Self(code.cast_signed())),
            Value::I32(code) => Some(Self(code)),
            _ => None,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::OK
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Status;
    use crate::descriptor::ScalarKind;
    use crate::value::Value;

    #[test]
    fn status_wire_values() {
        let value = Status::INVALID_PARAMS.to_value(ScalarKind::U32).unwrap();
        assert_eq!(value, Value::U32((-1009i32).cast_unsigned()));
        assert_eq!(Status::from_value(&value), Some(Status::INVALID_PARAMS));

        assert_eq!(
            Status::from_value(&Value::I32(0)),
            Some(Status::OK)
        );
        assert_eq!(Status::OK.to_value(ScalarKind::U16), None);
        assert_eq!(Status::from_value(&Value::U8(0)), None);
    }

    #[test]
    fn status_display() {
        assert!(Status::OK.is_ok());
        assert!(!Status::UNSUPPORTED_API.is_ok());
        assert_eq!(
            Status::UNSUPPORTED_API.to_string(),
            "Operation not supported (-1002)"
        );
        assert_eq!(Status::new(-5).to_string(), "Unknown status code (-5)");
    }
}

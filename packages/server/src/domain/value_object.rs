//! Value objects
//!
//! 不変で、生成時にバリデーションを行う値の型。
//! 文字列の ID をそのまま引き回さず、型で用途を区別します。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

const MAX_USER_ID_LENGTH: usize = 64;
const MAX_DISPLAY_NAME_LENGTH: usize = 32;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw string
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValueObjectError::Empty($label));
                }
                if trimmed.chars().count() > $max {
                    return Err(ValueObjectError::TooLong {
                        field: $label,
                        max: $max,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Opaque room identifier, assigned at creation
    RoomId,
    "room_id",
    64
);

string_id!(
    /// Identity of a racing user, supplied by the client at join time
    UserId,
    "user_id",
    MAX_USER_ID_LENGTH
);

string_id!(
    /// Name shown to the other racers
    DisplayName,
    "display_name",
    MAX_DISPLAY_NAME_LENGTH
);

string_id!(
    /// Identity of one transport connection (one WebSocket)
    ConnectionId,
    "connection_id",
    64
);

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Seconds elapsed since `earlier`; negative if `earlier` is in the future.
    pub fn seconds_since(&self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / 1000.0
    }
}

/// The prompt every racer in a room types. Fixed at room creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceText {
    text: String,
    char_len: usize,
}

impl ReferenceText {
    pub fn new(text: String) -> Result<Self, ValueObjectError> {
        let char_len = text.chars().count();
        if char_len == 0 {
            return Err(ValueObjectError::Empty("reference_text"));
        }
        Ok(Self { text, char_len })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.char_len
    }
}

impl TryFrom<String> for ReferenceText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReferenceText> for String {
    fn from(value: ReferenceText) -> Self {
        value.text
    }
}

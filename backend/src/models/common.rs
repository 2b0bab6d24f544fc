use serde::Serialize;

/// Booking and operating times travel as 24-hour "HH:MM" strings.
pub(crate) mod hhmm {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::{format_description::BorrowedFormatItem, macros::format_description, Time};

    const FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

    pub fn serialize<S: Serializer>(time: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        let s = time.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        let s = String::deserialize(deserializer)?;
        Time::parse(&s, FORMAT).map_err(D::Error::custom)
    }
}

/// Uniform response envelope. Error responses use the same shape with
/// `success: false` and a machine-checkable `reason` (see `error.rs`).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

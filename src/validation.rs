// Validation utilities module
// Custom validation functions and input normalizing deserializers shared by request DTOs

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Validates that a username only contains ASCII letters and digits
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !username.is_empty() && username.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_alphanumeric");
        error.message = Some("Username may only contain letters and digits".into());
        Err(error)
    }
}

/// Validates that a password has at least 6 characters besides surrounding whitespace
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().chars().count() >= 6 {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_length");
        error.message = Some("Password must be at least 6 characters".into());
        Err(error)
    }
}

/// Validates that a number is finite (rejects NaN and infinities)
pub fn validate_finite(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("amount_not_finite"))
    }
}

/// Deserializes a string and trims surrounding whitespace
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

/// Deserializes an optional string and trims surrounding whitespace
/// Use with `#[serde(default)]` so an absent field becomes `None`
pub fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trim().to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Millis(i64),
    Text(String),
}

/// Deserializes a date given as RFC 3339, `YYYY-MM-DD`, a naive timestamp,
/// or integer milliseconds since the Unix epoch
pub fn flexible_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDate::deserialize(deserializer)? {
        RawDate::Millis(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
            .ok_or_else(|| serde::de::Error::custom("date timestamp is out of range")),
        RawDate::Text(text) => parse_date(text.trim())
            .ok_or_else(|| serde::de::Error::custom(format!("date must be a valid date, got '{}'", text))),
    }
}

/// Parse the textual date forms accepted by `flexible_date`
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice42").is_ok());
        assert!(validate_username("AB").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username("ünïcode").is_err());
    }

    #[test]
    fn test_password_length_ignores_padding() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password(" secret12 ").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("   short   ").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_finite_amounts() {
        assert!(validate_finite(12.5).is_ok());
        assert!(validate_finite(-3.0).is_ok());
        assert!(validate_finite(f64::NAN).is_err());
        assert!(validate_finite(f64::INFINITY).is_err());
    }

    #[test]
    fn test_parse_date_forms() {
        let rfc = parse_date("2024-03-05T10:30:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let plain = parse_date("2024-03-05").unwrap();
        assert_eq!((plain.year(), plain.month(), plain.day()), (2024, 3, 5));
        assert_eq!(plain.hour(), 0);

        let naive = parse_date("2024-03-05T10:30:00.250").unwrap();
        assert_eq!(naive.minute(), 30);

        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-13-40").is_none());
    }

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "trimmed")]
        name: String,
        #[serde(default, deserialize_with = "trimmed_opt")]
        tag: Option<String>,
        #[serde(deserialize_with = "flexible_date")]
        date: DateTime<Utc>,
    }

    #[test]
    fn test_deserializers() {
        let sample: Sample =
            serde_json::from_str(r#"{"name":"  padded  ","date":1700000000000}"#).unwrap();
        assert_eq!(sample.name, "padded");
        assert_eq!(sample.tag, None);
        assert_eq!(sample.date.timestamp(), 1_700_000_000);

        let tagged: Sample =
            serde_json::from_str(r#"{"name":"x","tag":" t ","date":"2023-01-02"}"#).unwrap();
        assert_eq!(tagged.tag.as_deref(), Some("t"));

        let bad = serde_json::from_str::<Sample>(r#"{"name":"x","date":"someday"}"#);
        assert!(bad.is_err());
    }
}

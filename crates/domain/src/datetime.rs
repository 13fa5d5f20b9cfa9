use chrono::NaiveDateTime;
use chrono_tz::Tz;
use serde_json::Value;
use tablegate_core::{AppError, AppResult};

use crate::query::Row;

/// Storage format of UTC datetime columns.
pub const STORED_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format of converted datetime columns; ends with the zone abbreviation.
pub const CONVERTED_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Column converted when no explicit field list is given.
pub const DEFAULT_DATETIME_FIELD: &str = "datetime";

/// Parses an IANA time zone name such as `Europe/Berlin`.
pub fn parse_time_zone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("unknown time zone '{name}'")))
}

/// Converts one stored UTC datetime into local time of the zone.
pub fn convert_utc_datetime(value: &str, zone: Tz) -> AppResult<String> {
    let naive = NaiveDateTime::parse_from_str(value, STORED_DATETIME_FORMAT).map_err(|error| {
        AppError::Validation(format!("invalid stored datetime '{value}': {error}"))
    })?;

    Ok(naive
        .and_utc()
        .with_timezone(&zone)
        .format(CONVERTED_DATETIME_FORMAT)
        .to_string())
}

/// Rewrites the listed datetime columns of a row into the zone.
///
/// Missing and null columns are left untouched.
pub fn convert_row_datetimes(mut row: Row, zone: Tz, fields: &[&str]) -> AppResult<Row> {
    for field in fields {
        let Some(Value::String(stored)) = row.get(*field) else {
            continue;
        };

        let converted = convert_utc_datetime(stored, zone)?;
        row.insert((*field).to_owned(), Value::String(converted));
    }

    Ok(row)
}

/// Applies [`convert_row_datetimes`] to every row of a result set.
pub fn convert_rows_datetimes(rows: Vec<Row>, zone: Tz, fields: &[&str]) -> AppResult<Vec<Row>> {
    rows.into_iter()
        .map(|row| convert_row_datetimes(row, zone, fields))
        .collect()
}

//! Timestamp format shared by `Date`, `Last-Modified` and `If-Modified-Since`.
//!
//! The server speaks a single fixed layout,
//! `<weekday> <month> <day> <HH:mm:ss> <tz> <year>`, e.g.
//! `Tue Oct 19 21:42:22 CEST 2021`. Timestamps it emits always use `UTC`,
//! so a client can echo `Last-Modified` straight back as `If-Modified-Since`.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc, Weekday};

use crate::http::parser::ParseError;

/// Renders a timestamp as `Tue Oct 19 21:42:22 UTC 2021`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%a %b %d %H:%M:%S UTC %Y").to_string()
}

/// Parses an `If-Modified-Since` value.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let malformed = || ParseError::MalformedDate(value.to_string());

    let tokens: Vec<&str> = value.split_whitespace().collect();
    let [weekday, month, day, time, zone, year] = tokens.as_slice() else {
        return Err(malformed());
    };

    weekday.parse::<Weekday>().map_err(|_| malformed())?;
    let offset = zone_offset(zone).ok_or_else(malformed)?;

    let naive = NaiveDateTime::parse_from_str(
        &format!("{month} {day} {time} {year}"),
        "%b %d %H:%M:%S %Y",
    )
    .map_err(|_| malformed())?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(malformed)
}

/// Resolves a zone token to a fixed offset: a known abbreviation or `±HHMM`.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let hours = match zone.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "UT" | "Z" | "WET" => 0,
        "BST" | "CET" | "WEST" => 1,
        "CEST" | "EET" => 2,
        "EEST" => 3,
        "JST" => 9,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        "IST" => return FixedOffset::east_opt(5 * 3600 + 30 * 60),
        _ => return numeric_offset(zone),
    };
    FixedOffset::east_opt(hours * 3600)
}

fn numeric_offset(zone: &str) -> Option<FixedOffset> {
    let (sign, digits) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

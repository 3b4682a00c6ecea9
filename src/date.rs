use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::well_known::{Iso8601, Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, UtcOffset};

static STRICT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid strict date regex"));

/// Calendar position of a post, always expressed in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostDate {
    instant: OffsetDateTime,
}

impl PostDate {
    pub fn from_utc(instant: OffsetDateTime) -> Self {
        Self {
            instant: instant.to_offset(UtcOffset::UTC),
        }
    }

    pub fn instant(&self) -> OffsetDateTime {
        self.instant
    }

    pub fn year(&self) -> i32 {
        self.instant.year()
    }

    pub fn month(&self) -> Month {
        self.instant.month()
    }

    pub fn year_key(&self) -> String {
        format!("{:04}", self.year())
    }

    /// `YYYY-MM`, the bucket key for this date.
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.year(), u8::from(self.month()))
    }

    /// English month name followed by the year, e.g. `January 2024`.
    pub fn month_label(&self) -> String {
        format!("{} {}", self.month(), self.year())
    }
}

/// Parses a post timestamp.
///
/// A bare `YYYY-MM-DD` is pinned to UTC midnight so the calendar day never
/// shifts with the reader's timezone. Anything else goes through the general
/// parsers; naive date-times are read as UTC.
pub fn parse_post_date(raw: &str) -> Option<PostDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(caps) = STRICT_DATE.captures(raw) {
        return parse_strict(&caps[1], &caps[2], &caps[3]);
    }
    parse_general(raw).map(PostDate::from_utc)
}

fn parse_strict(year: &str, month: &str, day: &str) -> Option<PostDate> {
    let year: i32 = year.parse().ok()?;
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    let day: u8 = day.parse().ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(PostDate::from_utc(date.midnight().assume_utc()))
}

fn parse_general(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed);
    }
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc2822) {
        return Some(parsed);
    }
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(parsed);
    }

    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for format in naive_formats {
        if let Ok(parsed) = PrimitiveDateTime::parse(raw, format) {
            return Some(parsed.assume_utc());
        }
    }

    Date::parse(raw, format_description!("[year]/[month]/[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

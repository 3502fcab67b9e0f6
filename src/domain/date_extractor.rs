//! Recognition of date/time phrases inside free-form task text.
//!
//! [`DateExtractor`] is the seam: callers only rely on "first phrase wins,
//! report its byte span and the instant it names". [`EnglishDateExtractor`]
//! is the bundled recognizer for common English phrasings such as
//! `tomorrow 2pm`, `next friday`, `March 3` or `in 2 weeks`.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use regex::{Captures, Regex};

/// A recognized phrase: its byte range in the input and the instant it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub span: Range<usize>,
    pub instant: DateTime<Utc>,
}

pub trait DateExtractor: Send + Sync + 'static {
    /// Finds the leftmost date/time phrase in `text`, resolved relative to `now`.
    fn find_first_date(&self, text: &str, now: DateTime<Utc>) -> Option<DateMatch>;
}

const WEEKDAY_FULL: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";
const WEEKDAY_ANY: &str = "mon(?:day)?|tue(?:s(?:day)?)?|wed(?:nesday)?|thu(?:r(?:s(?:day)?)?)?|fri(?:day)?|sat(?:urday)?|sun(?:day)?";
const MONTH: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";
const COUNT: &str = r"\d{1,3}|an?|one|two|three|four|five|six|seven|eight|nine|ten";
const TIME: &str = r"\d{1,2}(?::[0-5]\d)?\s*(?:am|pm)|(?:[01]?\d|2[0-3]):[0-5]\d|noon|midnight";

fn phrase_pattern() -> String {
    let date = [
        r"day\s+after\s+tomorrow".to_string(),
        "today|tonight|tomorrow|tmrw".to_string(),
        r"next\s+(?:week|month|year)".to_string(),
        format!(r"(?:next|this|on)\s+(?:{WEEKDAY_ANY})"),
        format!(r"in\s+(?:{COUNT})\s+(?:days?|weeks?|months?)"),
        format!(r"(?:{MONTH})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?"),
        format!(r"\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:{MONTH})(?:,?\s+\d{{4}})?"),
        r"\d{4}-\d{2}-\d{2}".to_string(),
        r"\d{1,2}/\d{1,2}(?:/\d{2}(?:\d{2})?)?".to_string(),
        WEEKDAY_FULL.to_string(),
    ]
    .join("|");
    let time = format!(r"(?:at\s+)?(?:{TIME})|at\s+\d{{1,2}}");
    format!(
        r"(?i)\b(?:(?P<date>{date})(?:,?\s+(?P<time>{time}))?|(?P<time2>{time})(?:\s+(?P<date2>{date}))?)\b"
    )
}

static PHRASE: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(&phrase_pattern()) {
    Ok(re) => Some(re),
    Err(err) => {
        tracing::error!(%err, "date phrase pattern failed to compile; due dates disabled");
        None
    }
});

fn noon() -> NaiveTime { NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default() }

fn evening() -> NaiveTime { NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default() }

/// Regex-driven English recognizer. Calendar math runs in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishDateExtractor;

impl DateExtractor for EnglishDateExtractor {
    fn find_first_date(&self, text: &str, now: DateTime<Utc>) -> Option<DateMatch> {
        let re = PHRASE.as_ref()?;
        let today = now.with_timezone(&Local).date_naive();
        re.captures_iter(text).find_map(|caps| {
            let whole = caps.get(0)?;
            let naive = resolve(&caps, today)?;
            let instant = Local.from_local_datetime(&naive).earliest()?.with_timezone(&Utc);
            Some(DateMatch { span: whole.range(), instant })
        })
    }
}

fn resolve(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDateTime> {
    let date_text = caps.name("date").or_else(|| caps.name("date2")).map(|m| m.as_str());
    let time_text = caps.name("time").or_else(|| caps.name("time2")).map(|m| m.as_str());

    let (date, hinted) = match date_text {
        Some(text) => parse_date(text, today)?,
        None => (today, None),
    };
    let time = match time_text {
        Some(text) => parse_time(text)?,
        None => hinted.unwrap_or_else(noon),
    };
    Some(date.and_time(time))
}

fn parse_date(text: &str, today: NaiveDate) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let lower = text.to_lowercase().replace([',', '.'], " ");
    let tokens: Vec<&str> = lower.split_whitespace().collect();
    let plain = |d: NaiveDate| Some((d, None));

    match tokens.as_slice() {
        ["day", "after", "tomorrow"] => plain(today + Days::new(2)),
        ["today"] => plain(today),
        ["tonight"] => Some((today, Some(evening()))),
        ["tomorrow" | "tmrw"] => plain(today + Days::new(1)),
        ["next", "week"] => plain(today + Days::new(7)),
        ["next", "month"] => plain(today.checked_add_months(Months::new(1))?),
        ["next", "year"] => plain(today.checked_add_months(Months::new(12))?),
        [prefix @ ("next" | "this" | "on"), day] => plain(upcoming(today, weekday(day)?, *prefix == "this")),
        ["in", n, unit] => {
            let n = count(n)?;
            match unit.trim_end_matches('s') {
                "day" => plain(today.checked_add_days(Days::new(n.into()))?),
                "week" => plain(today.checked_add_days(Days::new(u64::from(n) * 7))?),
                "month" => plain(today.checked_add_months(Months::new(n))?),
                _ => None,
            }
        }
        [single] => {
            if let Some(day) = weekday(single).filter(|_| single.ends_with("day")) {
                plain(upcoming(today, day, false))
            } else if single.contains('-') {
                plain(NaiveDate::parse_from_str(single, "%Y-%m-%d").ok()?)
            } else if single.contains('/') {
                plain(numeric_date(single, today)?)
            } else {
                None
            }
        }
        _ => plain(month_day(&tokens, today)?),
    }
}

/// `March 3`, `Mar 3rd 2027`, `3 March`, `3rd of March 2027`.
fn month_day(tokens: &[&str], today: NaiveDate) -> Option<NaiveDate> {
    let (month, day, year) = match tokens {
        [m, d] if month(m).is_some() => (month(m)?, day_number(d)?, None),
        [m, d, y] if month(m).is_some() => (month(m)?, day_number(d)?, Some(*y)),
        [d, "of", m] | [d, m] => (month(m)?, day_number(d)?, None),
        [d, "of", m, y] | [d, m, y] => (month(m)?, day_number(d)?, Some(*y)),
        _ => return None,
    };
    let year = match year {
        Some(y) => y.parse().ok()?,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// US ordering: `M/D`, `M/D/YY`, `M/D/YYYY`.
fn numeric_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let mut parts = text.split('/');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year = match parts.next() {
        Some(y) if y.len() == 2 => 2000 + y.parse::<i32>().ok()?,
        Some(y) => y.parse().ok()?,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let lower = text.to_lowercase();
    let rest = lower.strip_prefix("at").map_or(lower.as_str(), str::trim_start);
    match rest {
        "noon" => return Some(noon()),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    let (clock, meridiem) = if let Some(c) = rest.strip_suffix("am") {
        (c.trim_end(), Some(false))
    } else if let Some(c) = rest.strip_suffix("pm") {
        (c.trim_end(), Some(true))
    } else {
        (rest, None)
    };
    let (hour, minute) = match clock.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (clock.parse::<u32>().ok()?, 0),
    };
    let hour = match meridiem {
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some(pm) => hour % 12 + if pm { 12 } else { 0 },
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Next date falling on `day`. Today only counts when `include_today` is set.
fn upcoming(today: NaiveDate, day: Weekday, include_today: bool) -> NaiveDate {
    let ahead = (day.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 && !include_today { 7 } else { ahead };
    today + Days::new(ahead.into())
}

fn weekday(token: &str) -> Option<Weekday> {
    match token.get(..3)? {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month(token: &str) -> Option<u32> {
    let m = match token.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(m)
}

fn day_number(token: &str) -> Option<u32> {
    token.trim_end_matches(|c: char| c.is_ascii_alphabetic()).parse().ok()
}

fn count(token: &str) -> Option<u32> {
    let n = match token {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => return digits.parse().ok(),
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    // Monday 2026-10-19, 09:00 local.
    fn now() -> DateTime<Utc> {
        Local.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap().with_timezone(&Utc)
    }

    fn find(text: &str) -> Option<(String, NaiveDateTime)> {
        EnglishDateExtractor.find_first_date(text, now())
            .map(|m| (text[m.span].to_string(), m.instant.with_timezone(&Local).naive_local()))
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn date_followed_by_time() {
        assert_eq!(find("Call Max tomorrow 2pm"), Some(("tomorrow 2pm".into(), at(2026, 10, 20, 14, 0))));
        assert_eq!(find("Review tomorrow at 9:30 am"), Some(("tomorrow at 9:30 am".into(), at(2026, 10, 20, 9, 30))));
    }

    #[test]
    fn time_followed_by_date() {
        assert_eq!(find("Dentist at 5pm on friday"), Some(("at 5pm on friday".into(), at(2026, 10, 23, 17, 0))));
        assert_eq!(find("2pm tomorrow standup"), Some(("2pm tomorrow".into(), at(2026, 10, 20, 14, 0))));
    }

    #[test]
    fn weekday_phrases() {
        assert_eq!(find("next friday").unwrap().1, at(2026, 10, 23, 12, 0));
        assert_eq!(find("this monday").unwrap().1, at(2026, 10, 19, 12, 0));
        assert_eq!(find("on monday").unwrap().1, at(2026, 10, 26, 12, 0));
        assert_eq!(find("Gym Saturday").unwrap().1, at(2026, 10, 24, 12, 0));
        assert_eq!(find("next tue").unwrap().1, at(2026, 10, 20, 12, 0));
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(find("in 3 days").unwrap().1, at(2026, 10, 22, 12, 0));
        assert_eq!(find("in a week").unwrap().1, at(2026, 10, 26, 12, 0));
        assert_eq!(find("in two months").unwrap().1, at(2026, 12, 19, 12, 0));
        assert_eq!(find("next week").unwrap().1, at(2026, 10, 26, 12, 0));
        assert_eq!(find("day after tomorrow").unwrap().1, at(2026, 10, 21, 12, 0));
        assert_eq!(find("Pack tonight").unwrap().1, at(2026, 10, 19, 20, 0));
    }

    #[test]
    fn calendar_dates() {
        assert_eq!(find("Pay rent March 3"), Some(("March 3".into(), at(2026, 3, 3, 12, 0))));
        assert_eq!(find("Trip 3rd of March 2027").unwrap().1, at(2027, 3, 3, 12, 0));
        assert_eq!(find("Launch Dec 1st, 2026 noon").unwrap().1, at(2026, 12, 1, 12, 0));
        assert_eq!(find("Ship 2026-12-24").unwrap().1, at(2026, 12, 24, 12, 0));
        assert_eq!(find("Party 12/31 at 21").unwrap().1, at(2026, 12, 31, 21, 0));
    }

    #[test]
    fn standalone_time_is_today() {
        let (span, when) = find("Meet Sam at 3pm").unwrap();
        assert_eq!(span, "at 3pm");
        assert_eq!(when.date(), at(2026, 10, 19, 0, 0).date());
        assert_eq!(when.hour(), 15);
    }

    #[test]
    fn only_first_phrase_counts() {
        let (span, when) = find("tomorrow or friday").unwrap();
        assert_eq!(span, "tomorrow");
        assert_eq!(when, at(2026, 10, 20, 12, 0));
    }

    #[test]
    fn invalid_date_is_skipped() {
        assert_eq!(find("Feb 30 then tomorrow").unwrap().0, "tomorrow");
    }

    #[test]
    fn ignores_text_without_dates() {
        assert_eq!(find("Buy milk"), None);
        assert_eq!(find("Chat about the 5 samples we sat on"), None);
        assert_eq!(find(""), None);
    }
}

use std::sync::Arc;

use chrono::{DateTime, Local, Months, TimeZone, Utc};

use super::date_extractor::{DateExtractor, EnglishDateExtractor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTask {
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
}

/// Splits raw task input into a title and an optional due date.
#[derive(Clone)]
pub struct TaskTextParser {
    extractor: Arc<dyn DateExtractor>,
}

impl Default for TaskTextParser {
    fn default() -> Self { Self::new(Arc::new(EnglishDateExtractor)) }
}

impl TaskTextParser {
    pub fn new(extractor: Arc<dyn DateExtractor>) -> Self { Self { extractor } }

    pub fn parse(&self, raw: &str, now: DateTime<Utc>) -> ParsedTask {
        let trimmed = raw.trim();
        let Some(found) = self.extractor.find_first_date(raw, now) else {
            return ParsedTask { title: trimmed.to_string(), due_date: None };
        };
        let (Some(before), Some(after)) = (raw.get(..found.span.start), raw.get(found.span.end..)) else {
            return ParsedTask { title: trimmed.to_string(), due_date: None };
        };

        let cleaned = format!("{before} {after}").split_whitespace().collect::<Vec<_>>().join(" ");
        let title = if cleaned.is_empty() { trimmed.to_string() } else { cleaned };
        ParsedTask { title, due_date: Some(upcoming_or_today(found.instant, now)) }
    }
}

/// Keeps instants on today's calendar day or later; pushes earlier ones a
/// year ahead. One year only, even if that is still in the past.
fn upcoming_or_today(instant: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let local = instant.with_timezone(&Local);
    if local.date_naive() >= now.with_timezone(&Local).date_naive() {
        return instant;
    }
    local
        .naive_local()
        .checked_add_months(Months::new(12))
        .and_then(|next| Local.from_local_datetime(&next).earliest())
        .map_or(instant, |next| next.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Timelike};

    use super::*;
    use crate::domain::date_extractor::DateMatch;

    fn now() -> DateTime<Utc> {
        Local.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap().with_timezone(&Utc)
    }

    struct Unavailable;

    impl DateExtractor for Unavailable {
        fn find_first_date(&self, _: &str, _: DateTime<Utc>) -> Option<DateMatch> { None }
    }

    struct Fixed(DateMatch);

    impl DateExtractor for Fixed {
        fn find_first_date(&self, _: &str, _: DateTime<Utc>) -> Option<DateMatch> { Some(self.0.clone()) }
    }

    #[test]
    fn text_without_date_is_trimmed() {
        let parsed = TaskTextParser::default().parse("   Buy   milk  ", now());
        assert_eq!(parsed, ParsedTask { title: "Buy   milk".into(), due_date: None });
    }

    #[test]
    fn strips_phrase_and_collapses_whitespace() {
        let parsed = TaskTextParser::default().parse("Call Max tomorrow 2pm", now());
        assert_eq!(parsed.title, "Call Max");
        let due = parsed.due_date.unwrap().with_timezone(&Local);
        assert_eq!(due.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(due.hour(), 14);

        let parsed = TaskTextParser::default().parse("Send  tomorrow   report ", now());
        assert_eq!(parsed.title, "Send report");
    }

    #[test]
    fn date_only_input_keeps_raw_title() {
        let parsed = TaskTextParser::default().parse("  tomorrow ", now());
        assert_eq!(parsed.title, "tomorrow");
        assert!(parsed.due_date.is_some());
    }

    #[test]
    fn past_date_moves_to_next_year() {
        let parsed = TaskTextParser::default().parse("Pay rent March 3", now());
        assert_eq!(parsed.title, "Pay rent");
        let due = parsed.due_date.unwrap().with_timezone(&Local);
        assert_eq!((due.year(), due.month(), due.day(), due.hour()), (2027, 3, 3, 12));
    }

    #[test]
    fn earlier_today_is_kept() {
        let parsed = TaskTextParser::default().parse("Standup at 8am", now());
        let due = parsed.due_date.unwrap();
        assert!(due < now());
        assert_eq!(due.with_timezone(&Local).date_naive(), now().with_timezone(&Local).date_naive());
    }

    #[test]
    fn only_one_year_is_added() {
        let long_ago = Local.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap().with_timezone(&Utc);
        let parser = TaskTextParser::new(Arc::new(Fixed(DateMatch { span: 0..4, instant: long_ago })));
        let parsed = parser.parse("then party", now());
        assert_eq!(parsed.title, "party");
        assert_eq!(parsed.due_date.unwrap().with_timezone(&Local).year(), 2021);
    }

    #[test]
    fn unavailable_recognizer_means_no_due_date() {
        let parser = TaskTextParser::new(Arc::new(Unavailable));
        assert_eq!(parser.parse(" Call Max tomorrow ", now()), ParsedTask { title: "Call Max tomorrow".into(), due_date: None });
    }
}

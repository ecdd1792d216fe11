//! Askama filters for the board templates.

use chrono::{DateTime, Datelike, Utc};
use kh_core::content::{segments, Segment};
use kh_core::models::Mood;

const ARABIC_MONTHS: [&str; 12] = [
    "يناير", "فبراير", "مارس", "أبريل", "مايو", "يونيو",
    "يوليو", "أغسطس", "سبتمبر", "أكتوبر", "نوفمبر", "ديسمبر",
];

/// Relative age of a post, e.g. `5د` or `2س`.
pub fn time_ago(at: &DateTime<Utc>) -> ::askama::Result<String> {
    Ok(time_ago_at(*at, Utc::now()))
}

/// `الآن` under a minute, then minutes, hours and days, then a short date.
pub fn time_ago_at(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds();
    if seconds < 60 {
        return "الآن".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}د");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}س");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}ي");
    }
    format!("{} {}", at.day(), ARABIC_MONTHS[at.month0() as usize])
}

pub fn mood_name(mood: &Mood) -> ::askama::Result<String> {
    Ok(crate::mood_label(mood).to_string())
}

/// Wraps hashtags of already-escaped content in highlight spans.
pub fn highlight_hashtags(content: &str) -> ::askama::Result<String> {
    let mut out = String::with_capacity(content.len());
    for segment in segments(content) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Hashtag(tag) => {
                out.push_str("<span class=\"hashtag\">");
                out.push_str(tag);
                out.push_str("</span>");
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn relative_labels() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        assert_eq!(time_ago_at(now - Duration::seconds(10), now), "الآن");
        assert_eq!(time_ago_at(now - Duration::minutes(5), now), "5د");
        assert_eq!(time_ago_at(now - Duration::hours(3), now), "3س");
        assert_eq!(time_ago_at(now - Duration::days(2), now), "2ي");
        assert_eq!(time_ago_at(now - Duration::days(10), now), "10 مارس");
    }

    #[test]
    fn future_timestamps_read_as_now() {
        let now = Utc::now();
        assert_eq!(time_ago_at(now + Duration::minutes(3), now), "الآن");
    }

    #[test]
    fn hashtags_are_wrapped() {
        assert_eq!(
            highlight_hashtags("أهلاً #سلام &amp; #tag").unwrap(),
            "أهلاً <span class=\"hashtag\">#سلام</span> &amp; <span class=\"hashtag\">#tag</span>"
        );
    }
}

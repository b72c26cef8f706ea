//! Display formatting for catalog data: schedule summaries, fees, dates and labels.

use chrono::{DateTime, NaiveDate};

use crate::models::{Course, CourseSchedule};

const UNKNOWN: &str = "Unknown";

fn short_day(day: &str) -> String {
    match day {
        "Monday" => "Mon".to_string(),
        "Tuesday" => "Tue".to_string(),
        "Wednesday" => "Wed".to_string(),
        "Thursday" => "Thu".to_string(),
        "Friday" => "Fri".to_string(),
        "Saturday" => "Sat".to_string(),
        "Sunday" => "Sun".to_string(),
        other => other.chars().take(3).collect(),
    }
}

/// format_time_24_to_12
///
/// `"13:05"` -> `"1:05 PM"`, `"00:00"` -> `"12:00 AM"`. Seconds, if present, are dropped.
/// Unparsable input is returned unchanged.
pub fn format_time_24_to_12(time24: &str) -> String {
    let mut parts = time24.split(':');
    let hour = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    let minute = parts.next().and_then(|m| m.trim().parse::<u32>().ok());
    let (Some(hour), Some(minute)) = (hour, minute) else {
        return time24.to_string();
    };

    let period = if hour >= 12 { "PM" } else { "AM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour12}:{minute:02} {period}")
}

fn time_range(schedule: &CourseSchedule) -> String {
    format!(
        "{}–{}",
        format_time_24_to_12(&schedule.start_time),
        format_time_24_to_12(&schedule.end_time)
    )
}

/// format_schedule_summary
///
/// Collapses a weekly schedule into one line. When every session shares the same hours the
/// days are listed once: `"Mon, Wed ( 9:00 AM–11:00 AM )"`. Otherwise each day carries its
/// own range.
pub fn format_schedule_summary(schedules: &[CourseSchedule]) -> String {
    let Some(first) = schedules.first() else {
        return String::new();
    };

    let same_time = schedules
        .iter()
        .all(|s| s.start_time == first.start_time && s.end_time == first.end_time);

    if same_time {
        let days: Vec<String> = schedules.iter().map(|s| short_day(&s.day_of_week)).collect();
        return format!("{} ( {} )", days.join(", "), time_range(first));
    }

    schedules
        .iter()
        .map(|s| format!("{} ( {} )", short_day(&s.day_of_week), time_range(s)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Groups the integer part with commas, keeping up to three trimmed decimals.
fn group_thousands(amount: f64) -> String {
    let negative = amount < 0.0;
    let rounded = (amount.abs() * 1000.0).round() / 1000.0;
    let whole = rounded.trunc() as u64;
    let fraction = ((rounded - rounded.trunc()) * 1000.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction > 0 {
        let decimals = format!("{fraction:03}");
        grouped.push('.');
        grouped.push_str(decimals.trim_end_matches('0'));
    }
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// `120000.0` -> `"MMK 120,000"`.
pub fn format_mmk(amount: f64) -> String {
    format!("MMK {}", group_thousands(amount))
}

pub fn fee_label(amount: Option<f64>) -> String {
    amount.map(format_mmk).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Parses either a plain ISO date or an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// format_date
///
/// `"2025-01-05"` -> `"Jan 5, 2025"`. Input that is not a date is shown as-is.
pub fn format_date(value: &str) -> String {
    match parse_date(value) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => value.to_string(),
    }
}

pub fn optional_date_label(value: Option<&str>) -> String {
    value.map(format_date).unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn course_type_label(course_type: Option<&str>) -> String {
    match course_type {
        None => UNKNOWN.to_string(),
        Some("one_on_one") => "One-on-one".to_string(),
        Some("private") => "Private".to_string(),
        Some("group") => "Group".to_string(),
        Some("teacher_training") => "Teacher training".to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn status_label(status: Option<&str>) -> String {
    match status {
        None => UNKNOWN.to_string(),
        Some("upcoming") => "Upcoming".to_string(),
        Some("in_progress") => "In progress".to_string(),
        Some("completed") => "Completed".to_string(),
        Some("cancelled") => "Cancelled".to_string(),
        Some(other) => other.to_string(),
    }
}

/// `"3 months"`, `"1 month"`; `None` when the course has no duration.
pub fn duration_label(course: &Course) -> Option<String> {
    let duration = course.duration?;
    let unit = if course.duration_unit.is_empty() {
        "month"
    } else {
        course.duration_unit.as_str()
    };
    let plural = if duration == 1 { "" } else { "s" };
    Some(format!("{duration} {unit}{plural}"))
}

pub fn hours_label(total_hours: Option<f64>) -> Option<String> {
    let hours = total_hours?;
    let plural = if (hours - 1.0).abs() < f64::EPSILON { "hour" } else { "hours" };
    Some(format!("{} {plural}", group_thousands(hours)))
}

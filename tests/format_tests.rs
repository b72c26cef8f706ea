use tiptop_site::{
    format::{
        course_type_label, duration_label, fee_label, format_date, format_mmk,
        format_schedule_summary, format_time_24_to_12, hours_label, optional_date_label,
        parse_date, status_label,
    },
    models::{Course, CourseSchedule},
};

fn session(day: &str, start: &str, end: &str) -> CourseSchedule {
    CourseSchedule {
        day_of_week: day.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
    }
}

#[test]
fn test_format_time_24_to_12() {
    assert_eq!(format_time_24_to_12("00:00"), "12:00 AM");
    assert_eq!(format_time_24_to_12("09:05"), "9:05 AM");
    assert_eq!(format_time_24_to_12("12:30"), "12:30 PM");
    assert_eq!(format_time_24_to_12("13:05:00"), "1:05 PM");
    assert_eq!(format_time_24_to_12("noon"), "noon");
}

#[test]
fn test_schedule_summary_groups_shared_hours() {
    let schedules = vec![
        session("Monday", "09:00", "11:00"),
        session("Wednesday", "09:00", "11:00"),
    ];
    assert_eq!(
        format_schedule_summary(&schedules),
        "Mon, Wed ( 9:00 AM–11:00 AM )"
    );
}

#[test]
fn test_schedule_summary_lists_differing_hours() {
    let schedules = vec![
        session("Saturday", "09:00", "11:00"),
        session("Sunday", "14:00", "16:30"),
    ];
    assert_eq!(
        format_schedule_summary(&schedules),
        "Sat ( 9:00 AM–11:00 AM ), Sun ( 2:00 PM–4:30 PM )"
    );
    assert_eq!(format_schedule_summary(&[]), "");
}

#[test]
fn test_format_mmk_and_fee_label() {
    assert_eq!(format_mmk(120000.0), "MMK 120,000");
    assert_eq!(format_mmk(999.0), "MMK 999");
    assert_eq!(format_mmk(1234567.5), "MMK 1,234,567.5");
    assert_eq!(fee_label(None), "Unknown");
    assert_eq!(fee_label(Some(0.0)), "MMK 0");
}

#[test]
fn test_dates() {
    assert_eq!(format_date("2025-01-05"), "Jan 5, 2025");
    assert_eq!(format_date("2025-11-20T10:00:00+06:30"), "Nov 20, 2025");
    assert_eq!(format_date("soon"), "soon");
    assert!(parse_date("2025-02-30").is_none());
    assert_eq!(optional_date_label(None), "Unknown");
}

#[test]
fn test_labels() {
    assert_eq!(course_type_label(Some("one_on_one")), "One-on-one");
    assert_eq!(course_type_label(Some("workshop")), "workshop");
    assert_eq!(course_type_label(None), "Unknown");
    assert_eq!(status_label(Some("in_progress")), "In progress");
    assert_eq!(status_label(None), "Unknown");
    assert_eq!(hours_label(Some(1.0)).as_deref(), Some("1 hour"));
    assert_eq!(hours_label(Some(36.0)).as_deref(), Some("36 hours"));
    assert_eq!(hours_label(None), None);
}

#[test]
fn test_duration_label() {
    let course = Course {
        duration: Some(1),
        duration_unit: "month".to_string(),
        ..Course::default()
    };
    assert_eq!(duration_label(&course).as_deref(), Some("1 month"));

    let weeks = Course {
        duration: Some(6),
        duration_unit: "week".to_string(),
        ..Course::default()
    };
    assert_eq!(duration_label(&weeks).as_deref(), Some("6 weeks"));

    // Course::default() has an empty unit; "month" is assumed.
    let unitless = Course {
        duration: Some(2),
        ..Course::default()
    };
    assert_eq!(duration_label(&unitless).as_deref(), Some("2 months"));
    assert_eq!(duration_label(&Course::default()), None);
}

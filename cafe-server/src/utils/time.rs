//! 时间段工具函数
//!
//! 预订时间段以展示字符串保存 (如 `"06:00 PM"`)，
//! 冲突检测时解析为 `[开始, 开始 + 时长)` 的区间。

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// 支持的时间段格式，依次尝试
const SLOT_FORMATS: [&str; 3] = ["%I:%M %p", "%H:%M", "%I %p"];

/// 解析时间段字符串，无法解析时返回 `None`
pub fn parse_time_slot(slot: &str) -> Option<NaiveTime> {
    let slot = slot.trim().to_uppercase();
    SLOT_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&slot, format).ok())
}

/// 预订占用区间 `[start, end)`，结束时间溢出日期范围时返回 `None`
pub fn slot_window(
    date: NaiveDate,
    slot: &str,
    duration_minutes: u32,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = date.and_time(parse_time_slot(slot)?);
    let end = start.checked_add_signed(Duration::minutes(i64::from(duration_minutes)))?;
    Some((start, end))
}

/// 两个预订时间段是否重叠
///
/// 任一时间段无法解析时，退化为同日同字符串比较。
pub fn slots_overlap(
    a: (NaiveDate, &str, u32),
    b: (NaiveDate, &str, u32),
) -> bool {
    match (slot_window(a.0, a.1, a.2), slot_window(b.0, b.1, b.2)) {
        (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && b_start < a_end,
        _ => a.0 == b.0 && a.1.trim().eq_ignore_ascii_case(b.1.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_parse_time_slot_formats() {
        let six_pm = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        assert_eq!(parse_time_slot("06:00 PM"), Some(six_pm));
        assert_eq!(parse_time_slot("6:00 pm"), Some(six_pm));
        assert_eq!(parse_time_slot("18:00"), Some(six_pm));
        assert_eq!(parse_time_slot("evening"), None);
    }

    #[test]
    fn test_overlap_windows() {
        // 18:00-19:30 vs 19:00-20:30
        assert!(slots_overlap((day(), "06:00 PM", 90), (day(), "07:00 PM", 90)));
        // back to back does not overlap
        assert!(!slots_overlap((day(), "06:00 PM", 60), (day(), "07:00 PM", 60)));
        // different days
        let next = day().succ_opt().unwrap();
        assert!(!slots_overlap((day(), "06:00 PM", 90), (next, "06:00 PM", 90)));
    }

    #[test]
    fn test_window_at_end_of_calendar() {
        assert_eq!(slot_window(NaiveDate::MAX, "11:00 PM", 90), None);
        // falls back to equality instead of panicking
        assert!(!slots_overlap(
            (NaiveDate::MAX, "11:00 PM", 90),
            (day(), "11:00 PM", 90)
        ));
    }

    #[test]
    fn test_unparseable_slots_fall_back_to_equality() {
        assert!(slots_overlap((day(), "brunch", 90), (day(), "Brunch", 90)));
        assert!(!slots_overlap((day(), "brunch", 90), (day(), "06:00 PM", 90)));
    }
}

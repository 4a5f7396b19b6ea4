//! 工时计算：按顺序两两配对打卡时间，累加每段时长
//!
//! 打卡为 24 小时制 `HH:MM`。配对严格按输入顺序取相邻两项 (punch[2i], punch[2i+1])，
//! 不排序、不检测跨段重叠，只要求每段起点严格早于终点。

use chrono::NaiveTime;
use thiserror::Error;

/// 校验失败的文本会原样交还给 Supervisor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkingHoursError {
    #[error(
        "Could not calculate. The number of clock punches must be even and at least two \
        (got {0}). Give it back to human and request user to check."
    )]
    InvalidPunchCount(usize),

    #[error("Could not calculate. Start time must be before end time ({start} -> {end}).")]
    InvalidInterval { start: String, end: String },

    #[error("Could not calculate. '{0}' is not a valid 24-hour HH:MM time.")]
    InvalidTimestamp(String),
}

/// 累计工时（分钟）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedTime {
    pub minutes: i64,
}

impl std::fmt::Display for WorkedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} hours and {} minutes", self.minutes / 60, self.minutes % 60)
    }
}

fn parse_punch(raw: &str) -> Result<NaiveTime, WorkingHoursError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| WorkingHoursError::InvalidTimestamp(raw.to_string()))
}

pub fn total_working_time<S: AsRef<str>>(punches: &[S]) -> Result<WorkedTime, WorkingHoursError> {
    let times = punches
        .iter()
        .map(|p| parse_punch(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    if times.len() % 2 != 0 || times.len() < 2 {
        return Err(WorkingHoursError::InvalidPunchCount(times.len()));
    }

    let mut minutes = 0;
    for (pair, raw) in times.chunks_exact(2).zip(punches.chunks_exact(2)) {
        let (start, end) = (pair[0], pair[1]);
        if start >= end {
            return Err(WorkingHoursError::InvalidInterval {
                start: raw[0].as_ref().trim().to_string(),
                end: raw[1].as_ref().trim().to_string(),
            });
        }
        minutes += (end - start).num_minutes();
    }

    Ok(WorkedTime { minutes })
}

/// 便捷形式：直接返回 "{h} hours and {m} minutes"
pub fn working_hours<S: AsRef<str>>(punches: &[S]) -> Result<String, WorkingHoursError> {
    total_working_time(punches).map(|t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_day_with_lunch_break() {
        let out = working_hours(&["09:00", "12:00", "13:00", "17:00"]).unwrap();
        assert_eq!(out, "7 hours and 0 minutes");
    }

    #[test]
    fn test_minutes_remainder() {
        let t = total_working_time(&["08:10", "10:15"]).unwrap();
        assert_eq!(t.minutes, 125);
        assert_eq!(t.to_string(), "2 hours and 5 minutes");
    }

    #[test]
    fn test_odd_punch_count() {
        let err = working_hours(&["09:00", "12:00", "13:00"]).unwrap_err();
        assert_eq!(err, WorkingHoursError::InvalidPunchCount(3));
        assert!(err.to_string().contains("must be even"));
    }

    #[test]
    fn test_too_few_punches() {
        let empty: [&str; 0] = [];
        assert_eq!(
            working_hours(&empty).unwrap_err(),
            WorkingHoursError::InvalidPunchCount(0)
        );
        assert_eq!(
            working_hours(&["09:00"]).unwrap_err(),
            WorkingHoursError::InvalidPunchCount(1)
        );
    }

    #[test]
    fn test_start_not_before_end() {
        let err = working_hours(&["13:00", "09:00"]).unwrap_err();
        assert_eq!(
            err,
            WorkingHoursError::InvalidInterval {
                start: "13:00".into(),
                end: "09:00".into()
            }
        );
        assert!(matches!(
            working_hours(&["09:00", "09:00"]),
            Err(WorkingHoursError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_pairs_are_not_sorted() {
        // 第二段在第一段之前也照样计算，只校验段内顺序
        let out = working_hours(&["14:00", "15:30", "08:00", "09:00"]).unwrap();
        assert_eq!(out, "2 hours and 30 minutes");
    }

    #[test]
    fn test_invalid_timestamp() {
        assert_eq!(
            working_hours(&["9am", "17:00"]).unwrap_err(),
            WorkingHoursError::InvalidTimestamp("9am".into())
        );
        assert!(working_hours(&["24:00", "25:00"]).is_err());
    }
}

use chrono::NaiveTime;

use crate::error::ScheduleError;

/// Parses a shift time in strict `HH:MM` form.
///
/// Exactly two digits for hour and minute; `9:00`, `09:00:00` and `24:00`
/// are rejected.
pub fn parse_shift_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidScheduleFormat(value.to_string());

    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }

    let digit = |i: usize| u32::from(bytes[i] - b'0');
    let hour = digit(0) * 10 + digit(1);
    let minute = digit(3) * 10 + digit(4);

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_range() {
        assert_eq!(
            parse_shift_time("00:00").unwrap(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_shift_time("23:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["9:00", "09:0", "24:00", "12:60", "09:00:00", "0900", "ab:cd", "", " 09:00"] {
            assert!(
                matches!(
                    parse_shift_time(bad),
                    Err(ScheduleError::InvalidScheduleFormat(ref v)) if v == bad
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}

use chrono::{DateTime, Datelike, TimeZone};

use crate::data_types::workout::WorkoutType;

pub mod facilities;
pub mod geo;
pub mod logging;
pub mod settings;

pub struct DateTimeUtils {}

impl DateTimeUtils {
    const MONTHS: [&'static str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    pub fn month_name<Tz: TimeZone>(datetime: &DateTime<Tz>) -> &'static str {
        DateTimeUtils::MONTHS[datetime.month0() as usize]
    }

    /// `<emoji> <Type> on <Month> <Day>`
    pub fn describe<Tz: TimeZone>(workout_type: WorkoutType, datetime: &DateTime<Tz>) -> String {
        format!(
            "{} {} on {} {}",
            workout_type.emoji(),
            workout_type.label(),
            DateTimeUtils::month_name(datetime),
            datetime.day()
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, Utc};

    use super::*;

    #[test]
    fn describes_with_month_table() {
        let date = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();

        assert_eq!(DateTimeUtils::month_name(&date), "December");
        assert_eq!(
            DateTimeUtils::describe(WorkoutType::Cycling, &date),
            "🚴‍♀️ Cycling on December 31"
        );
    }

    #[test]
    fn first_month_is_january() {
        let date = Local.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap();

        assert_eq!(
            DateTimeUtils::describe(WorkoutType::Running, &date),
            "🏃‍♂️ Running on January 9"
        );
    }
}

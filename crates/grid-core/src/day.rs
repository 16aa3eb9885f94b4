use chrono::Local;

pub use chrono::NaiveDate;

/// First day of the daily series (day index 0)
pub const EPOCH: (i32, u32, u32) = (2025, 1, 1);

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(EPOCH.0, EPOCH.1, EPOCH.2).unwrap_or(NaiveDate::MIN)
}

/// Days between the epoch and `date`, clamped to zero for dates before the epoch
pub fn day_index_for(date: NaiveDate) -> u32 {
    let days = date.signed_duration_since(epoch_date()).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// Day index of the local calendar date
pub fn today() -> u32 {
    day_index_for(Local::now().date_naive())
}

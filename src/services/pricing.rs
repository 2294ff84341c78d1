//! Package pricing. Totals are quoted in whole dollars and charged in cents.

pub const BASE_FEE: i64 = 350;
pub const LIGHTING_FEE: i64 = 100;
pub const PHOTOGRAPHY_FEE: i64 = 150;
pub const VIDEO_FEE: i64 = 100;
pub const EXTRA_HOUR_FEE: i64 = 75;

/// Hours included in the base package.
const BASE_ALLOWANCE_MINUTES: i64 = 4 * 60;

/// Late-night cutoff: end times from midnight through 2:00 AM belong to the
/// previous evening, so events can run past midnight.
const LATE_NIGHT_CUTOFF_MINUTES: i64 = 2 * 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageOptions {
    pub lighting: bool,
    pub photography: bool,
    pub video: bool,
    pub additional_hours: i32,
}

/// Total in whole dollars. Negative hour counts are clamped to zero.
pub fn compute_total(options: &PackageOptions) -> i64 {
    let mut total = BASE_FEE;
    if options.lighting {
        total += LIGHTING_FEE;
    }
    if options.photography {
        total += PHOTOGRAPHY_FEE;
    }
    if options.video {
        total += VIDEO_FEE;
    }
    total += i64::from(options.additional_hours.max(0)) * EXTRA_HOUR_FEE;
    total
}

pub fn total_cents(options: &PackageOptions) -> i64 {
    compute_total(options) * 100
}

/// Parses a 12-hour clock string like "9:30 PM" into minutes since midnight.
pub fn parse_time_12h(s: &str) -> Option<i64> {
    let s = s.trim();
    let (time_part, meridiem) = s.split_once(' ')?;
    let (hour_str, minute_str) = time_part.split_once(':')?;
    let hour: i64 = hour_str.parse().ok()?;
    let minute: i64 = minute_str.parse().ok()?;
    if !(1..=12).contains(&hour) || !(0..=59).contains(&minute) {
        return None;
    }

    let hour24 = match meridiem.to_ascii_uppercase().as_str() {
        "AM" => hour % 12,
        "PM" => hour % 12 + 12,
        _ => return None,
    };
    Some(hour24 * 60 + minute)
}

/// Minutes since midnight, with times up to 2:00 AM shifted past midnight so
/// that an event ending at 1:00 AM sorts after one starting at 11:00 PM.
fn minutes_with_wraparound(minutes: i64) -> i64 {
    if minutes <= LATE_NIGHT_CUTOFF_MINUTES {
        minutes + 24 * 60
    } else {
        minutes
    }
}

/// Event duration in minutes, or None when either time fails to parse.
pub fn event_duration_minutes(start_time: &str, end_time: &str) -> Option<i64> {
    let start = minutes_with_wraparound(parse_time_12h(start_time)?);
    let end = minutes_with_wraparound(parse_time_12h(end_time)?);
    Some((end - start).max(0))
}

/// Hours beyond the 4-hour base allowance, rounded up to the next whole hour.
/// Unparseable times yield zero additional hours rather than an error; the
/// quote then covers the base package only.
pub fn additional_hours(start_time: &str, end_time: &str) -> i32 {
    let Some(duration) = event_duration_minutes(start_time, end_time) else {
        return 0;
    };
    let extra = duration - BASE_ALLOWANCE_MINUTES;
    if extra <= 0 {
        return 0;
    }
    (extra as u64).div_ceil(60) as i32
}

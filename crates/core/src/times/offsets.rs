//! Offset arithmetic for hide/restore target instants

use chrono::{DateTime, Utc};
use shomer_domain::{HideOffset, QuietPeriod, RestoreOffset};

/// Apply a user's configured offsets to a quiet period.
///
/// `hide_at = entry - hide_offset`, `restore_at = exit + restore_offset`.
/// Whether either instant is already in the past is the scheduler's concern,
/// not this function's.
pub fn apply_offsets(
    period: &QuietPeriod,
    hide_offset: HideOffset,
    restore_offset: RestoreOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (period.entry - hide_offset.duration(), period.exit + restore_offset.duration())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use shomer_domain::QuietPeriodSourceKind;

    use super::*;

    fn period() -> QuietPeriod {
        QuietPeriod::new(
            Utc.with_ymd_and_hms(2025, 7, 4, 19, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 7, 5, 20, 15, 0).unwrap(),
            QuietPeriodSourceKind::Manual,
        )
        .unwrap()
    }

    #[test]
    fn one_hour_hide_offset_shifts_entry_back() {
        let (hide_at, restore_at) =
            apply_offsets(&period(), HideOffset::Before1Hour, RestoreOffset::AtExit);
        assert_eq!(hide_at, Utc.with_ymd_and_hms(2025, 7, 4, 18, 0, 0).unwrap());
        assert_eq!(restore_at, Utc.with_ymd_and_hms(2025, 7, 5, 20, 15, 0).unwrap());
    }

    #[test]
    fn zero_offsets_keep_interval_endpoints() {
        let (hide_at, restore_at) =
            apply_offsets(&period(), HideOffset::AtEntry, RestoreOffset::AtExit);
        assert_eq!(hide_at, period().entry);
        assert_eq!(restore_at, period().exit);
    }

    #[test]
    fn restore_offset_shifts_exit_forward() {
        let (_, restore_at) =
            apply_offsets(&period(), HideOffset::Before15Min, RestoreOffset::After30Min);
        assert_eq!(restore_at, Utc.with_ymd_and_hms(2025, 7, 5, 20, 45, 0).unwrap());
    }
}

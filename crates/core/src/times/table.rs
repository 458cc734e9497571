//! Weekly Shabbat time tables and quiet period projection
//!
//! Each supported location carries an IANA timezone, a Friday
//! candle-lighting wall-clock time, and a Saturday havdalah wall-clock time.
//! The source projects the pair onto the next upcoming Friday/Saturday dates
//! in the location's zone: this week's pair while its exit is still in the
//! future, next week's otherwise.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use shomer_domain::{
    QuietPeriod, QuietPeriodSourceKind, Result, ScheduleMode, ShomerError, UserAccount,
};
use tracing::debug;

use super::ports::{ManualOverrideStore, QuietPeriodSource};

/// Weekly entry/exit wall-clock times for one location.
#[derive(Debug, Clone)]
pub struct LocationEntry {
    pub name: &'static str,
    pub timezone: Tz,
    /// Friday candle-lighting time (quiet period entry).
    pub candle_lighting: NaiveTime,
    /// Saturday havdalah time (quiet period exit).
    pub havdalah: NaiveTime,
}

/// Built-in table of per-location weekly Shabbat times.
#[derive(Debug, Clone)]
pub struct LocationTable {
    entries: HashMap<&'static str, LocationEntry>,
}

impl LocationTable {
    /// Table with the locations the service ships with.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        let mut add = |id: &'static str, name: &'static str, tz: Tz, candle: (u32, u32), havdalah: (u32, u32)| {
            entries.insert(
                id,
                LocationEntry {
                    name,
                    timezone: tz,
                    candle_lighting: time_of(candle.0, candle.1),
                    havdalah: time_of(havdalah.0, havdalah.1),
                },
            );
        };

        add("jerusalem", "Jerusalem", chrono_tz::Asia::Jerusalem, (18, 30), (19, 45));
        add("tel-aviv", "Tel Aviv", chrono_tz::Asia::Jerusalem, (18, 45), (19, 50));
        add("new-york", "New York", chrono_tz::America::New_York, (19, 0), (20, 15));
        add("london", "London", chrono_tz::Europe::London, (19, 30), (20, 45));
        add("los-angeles", "Los Angeles", chrono_tz::America::Los_Angeles, (19, 0), (20, 10));

        Self { entries }
    }

    /// Look up a location by identifier.
    pub fn get(&self, location_id: &str) -> Option<&LocationEntry> {
        self.entries.get(location_id)
    }

    /// All known location identifiers.
    pub fn location_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

fn time_of(hour: u32, minute: u32) -> NaiveTime {
    // Table constants are always valid wall-clock times.
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Quiet period source backed by the location table and manual overrides.
pub struct ShabbatTimesSource {
    table: LocationTable,
    overrides: Arc<dyn ManualOverrideStore>,
}

impl ShabbatTimesSource {
    pub fn new(table: LocationTable, overrides: Arc<dyn ManualOverrideStore>) -> Self {
        Self { table, overrides }
    }

    /// Project the location's weekly pair onto concrete UTC instants,
    /// relative to `now`.
    pub fn project(
        &self,
        location_id: &str,
        now: DateTime<Utc>,
    ) -> Result<QuietPeriod> {
        let entry = self
            .table
            .get(location_id)
            .ok_or_else(|| ShomerError::NotFound(format!("unknown location: {location_id}")))?;

        // Start from this week's Friday so a period already in progress on
        // Saturday is still returned, then roll forward once its exit has
        // passed.
        let local_today = now.with_timezone(&entry.timezone).date_naive();
        let days_since_friday = (i64::from(local_today.weekday().num_days_from_monday())
            - i64::from(Weekday::Fri.num_days_from_monday()))
        .rem_euclid(7);
        let mut friday = local_today - Duration::days(days_since_friday);

        for _ in 0..3 {
            let entry_utc =
                local_instant(entry.timezone, friday.and_time(entry.candle_lighting))?;
            let exit_utc = local_instant(
                entry.timezone,
                (friday + Duration::days(1)).and_time(entry.havdalah),
            )?;

            if exit_utc > now {
                debug!(location_id, %entry_utc, %exit_utc, "projected quiet period");
                return QuietPeriod::new(
                    entry_utc,
                    exit_utc,
                    QuietPeriodSourceKind::Location(location_id.to_string()),
                );
            }

            friday += Duration::days(7);
        }

        Err(ShomerError::Internal(format!(
            "quiet period projection did not converge for {location_id}"
        )))
    }
}

/// Resolve a local wall-clock datetime to a UTC instant, taking the earliest
/// candidate when DST makes the local time ambiguous or skipped.
fn local_instant(tz: Tz, local: chrono::NaiveDateTime) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            ShomerError::Internal(format!("unresolvable local time {local} in zone {tz}"))
        })
}

#[async_trait]
impl QuietPeriodSource for ShabbatTimesSource {
    async fn quiet_period(&self, user: &UserAccount) -> Result<QuietPeriod> {
        match &user.schedule_mode {
            ScheduleMode::Location(location_id) => self.project(location_id, Utc::now()),
            ScheduleMode::Manual => {
                let stored = self.overrides.get_override(&user.id).await?;
                let (entry, exit) = stored
                    .as_ref()
                    .and_then(shomer_domain::ManualOverride::interval)
                    .ok_or_else(|| {
                        ShomerError::NotFound(format!(
                            "no complete manual override for user {}",
                            user.id
                        ))
                    })?;
                QuietPeriod::new(entry, exit, QuietPeriodSourceKind::Manual)
            }
        }
    }
}

//! Date-range agenda over calendar events.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use entity::calendar_event;
use platform_api::ApiClient;
use tracing::{Instrument, info_span, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct DayAgenda {
    pub date: NaiveDate,
    pub events: Vec<calendar_event::Model>,
}

#[derive(Clone, Debug, Default)]
pub struct CalendarView {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    events: Vec<calendar_event::Model>,
    loading: bool,
    error: Option<String>,
}

impl CalendarView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.from.zip(self.to)
    }

    pub fn events(&self) -> &[calendar_event::Model] {
        &self.events
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Load events overlapping `[from, to)`. An empty or inverted range is
    /// rejected without a request.
    pub async fn load(&mut self, client: &ApiClient, from: DateTime<Utc>, to: DateTime<Utc>) {
        if from >= to {
            self.error = Some("Range end must be after its start".to_string());
            return;
        }
        self.from = Some(from);
        self.to = Some(to);
        self.loading = true;
        self.error = None;
        let span = info_span!("crm.calendar", %from, %to);
        let result = client
            .resource::<calendar_event::Model>()
            .between(from, to)
            .instrument(span.clone())
            .await;
        self.loading = false;
        match result {
            Ok(mut events) => {
                events.sort_by_key(|e| e.starts_at);
                self.events = events;
            }
            Err(err) => {
                warn!(parent: &span, error = %err, "calendar load failed");
                self.error = Some(format!("Failed to load events: {err}"));
            }
        }
    }

    /// Monday-to-Monday week containing `day`.
    pub async fn load_week(&mut self, client: &ApiClient, day: NaiveDate) {
        let (from, to) = week_bounds(day);
        self.load(client, from, to).await;
    }

    pub async fn load_month(&mut self, client: &ApiClient, year: i32, month: u32) {
        match month_bounds(year, month) {
            Some((from, to)) => self.load(client, from, to).await,
            None => self.error = Some(format!("Invalid month {year}-{month:02}")),
        }
    }

    /// Events grouped by the UTC day they start on, inside the loaded range.
    pub fn agenda(&self) -> Vec<DayAgenda> {
        group_by_day(&self.events)
    }
}

pub fn group_by_day(events: &[calendar_event::Model]) -> Vec<DayAgenda> {
    let mut days: BTreeMap<NaiveDate, Vec<calendar_event::Model>> = BTreeMap::new();
    for event in events {
        days.entry(event.starts_at.date_naive())
            .or_default()
            .push(event.clone());
    }
    days.into_iter()
        .map(|(date, mut events)| {
            events.sort_by_key(|e| e.starts_at);
            DayAgenda { date, events }
        })
        .collect()
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

pub fn week_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    let start = midnight(monday);
    (start, start + Duration::days(7))
}

pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((midnight(first), midnight(next)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn event(title: &str, starts_at: DateTime<Utc>) -> calendar_event::Model {
        calendar_event::Model {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            location: None,
            starts_at,
            ends_at: starts_at + Duration::hours(1),
            kind: calendar_event::Kind::Meeting,
            attendees: Vec::new(),
            account_id: None,
            deal_id: None,
            created_at: starts_at,
        }
    }

    #[test]
    fn events_group_by_start_day_in_order() {
        let at = |d, h| Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).unwrap();
        let agenda = group_by_day(&[
            event("late", at(3, 16)),
            event("next", at(4, 9)),
            event("early", at(3, 8)),
        ]);
        assert_eq!(agenda.len(), 2);
        assert_eq!(agenda[0].date, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        let titles: Vec<_> = agenda[0].events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "late"]);
    }

    #[test]
    fn week_and_month_bounds() {
        // 2026-03-05 is a Thursday.
        let (from, to) = week_bounds(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());

        let (from, to) = month_bounds(2026, 12).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
        assert!(month_bounds(2026, 13).is_none());
    }
}

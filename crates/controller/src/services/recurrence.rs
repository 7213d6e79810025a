// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Expansion of recurrence rules into concrete occurrences
//!
//! A recurring event is materialized at creation time: the anchor row keeps
//! the rule, every later occurrence becomes an own event row pointing back
//! at the anchor via `recurrence_parent_id`. Children are independent,
//! deletable bookings.
use chrono::{Days, Months, NaiveDate};
use db_storage::events::{Event, NewEvent, RecurrenceFrequency};

/// A complete recurrence rule
///
/// Rules missing the frequency, a positive interval or the end date are
/// never expanded, the anchor then only records the partial fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: RecurrenceFrequency,
    pub interval: u32,
    /// Inclusive last date an occurrence may fall on
    pub until: NaiveDate,
}

impl RecurrenceRule {
    pub fn from_parts(
        frequency: Option<RecurrenceFrequency>,
        interval: Option<i32>,
        until: Option<NaiveDate>,
    ) -> Option<Self> {
        match (frequency, interval, until) {
            (Some(frequency), Some(interval), Some(until)) if interval > 0 => Some(Self {
                frequency,
                interval: interval as u32,
                until,
            }),
            _ => None,
        }
    }

    pub fn of(event: &Event) -> Option<Self> {
        Self::from_parts(
            event.recurrence_frequency,
            event.recurrence_interval,
            event.recurrence_end,
        )
    }
}

/// Expands the rule into all occurrence dates after the anchor date
///
/// The anchor itself is never re-emitted. Expansion is pure, the same
/// anchor and rule always produce the same sequence.
pub fn expand(anchor: NaiveDate, rule: &RecurrenceRule) -> Vec<NaiveDate> {
    let mut dates = Vec::new();

    for occurrence in 1u32.. {
        // stepping from the anchor every time keeps month-end dates stable,
        // Jan 31 + 2 months is Mar 31 even though Feb clamps to its end
        let units = match occurrence.checked_mul(rule.interval) {
            Some(units) => units,
            None => break,
        };

        let date = match step(anchor, rule.frequency, units) {
            Some(date) => date,
            None => break,
        };

        if date > rule.until {
            break;
        }

        dates.push(date);
    }

    dates
}

fn step(anchor: NaiveDate, frequency: RecurrenceFrequency, units: u32) -> Option<NaiveDate> {
    match frequency {
        RecurrenceFrequency::Day => anchor.checked_add_days(Days::new(u64::from(units))),
        RecurrenceFrequency::Week => anchor.checked_add_days(Days::new(u64::from(units) * 7)),
        RecurrenceFrequency::Month => anchor.checked_add_months(Months::new(units)),
        RecurrenceFrequency::Year => {
            anchor.checked_add_months(Months::new(units.checked_mul(12)?))
        }
    }
}

/// Creates the insertable occurrence of the anchor on the given date
///
/// Copies exactly name, description, times of day, author and room. The
/// attendee set is copied separately by the caller, the child carries no
/// recurrence rule of its own.
pub fn materialize_occurrence(anchor: &Event, date: NaiveDate) -> NewEvent {
    NewEvent {
        name: anchor.name.clone(),
        description: anchor.description.clone(),
        date,
        time_start: anchor.time_start,
        time_end: anchor.time_end,
        author_id: anchor.author_id,
        room_id: anchor.room_id,
        recurrence_frequency: None,
        recurrence_interval: None,
        recurrence_end: None,
        recurrence_parent_id: Some(anchor.id),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn rule(frequency: RecurrenceFrequency, interval: u32, until: &str) -> RecurrenceRule {
        RecurrenceRule {
            frequency,
            interval,
            until: date(until),
        }
    }

    #[test]
    fn biweekly_expansion_is_bounded() {
        // anchor + 40 days
        let rule = rule(RecurrenceFrequency::Week, 2, "2025-02-10");

        let dates = expand(date("2025-01-01"), &rule);

        assert_eq!(dates, vec![date("2025-01-15"), date("2025-01-29")]);
    }

    #[test]
    fn until_is_inclusive() {
        let rule = rule(RecurrenceFrequency::Day, 1, "2025-01-03");

        let dates = expand(date("2025-01-01"), &rule);

        assert_eq!(dates, vec![date("2025-01-02"), date("2025-01-03")]);
    }

    #[test]
    fn anchor_is_never_emitted() {
        let rule = rule(RecurrenceFrequency::Month, 1, "2025-01-01");

        let dates = expand(date("2025-01-01"), &rule);

        assert!(dates.is_empty());
    }

    #[test]
    fn monthly_steps_clamp_to_month_end() {
        let rule = rule(RecurrenceFrequency::Month, 1, "2025-04-30");

        let dates = expand(date("2025-01-31"), &rule);

        assert_eq!(
            dates,
            vec![date("2025-02-28"), date("2025-03-31"), date("2025-04-30")]
        );
    }

    #[test]
    fn yearly_expansion() {
        let rule = rule(RecurrenceFrequency::Year, 1, "2027-06-01");

        let dates = expand(date("2025-05-20"), &rule);

        assert_eq!(dates, vec![date("2026-05-20"), date("2027-05-20")]);
    }

    #[test]
    fn incomplete_rules_are_not_expanded() {
        assert_eq!(
            RecurrenceRule::from_parts(Some(RecurrenceFrequency::Day), Some(1), None),
            None
        );
        assert_eq!(
            RecurrenceRule::from_parts(Some(RecurrenceFrequency::Day), None, Some(date("2025-01-05"))),
            None
        );
        assert_eq!(
            RecurrenceRule::from_parts(None, Some(1), Some(date("2025-01-05"))),
            None
        );
        assert_eq!(
            RecurrenceRule::from_parts(Some(RecurrenceFrequency::Day), Some(0), Some(date("2025-01-05"))),
            None
        );
    }
}

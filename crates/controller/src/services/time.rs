// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Time and conflict model of the booking core
//!
//! Events are single-day bookings, their times of day are stored shifted to
//! UTC by the integer hour offset of the office. All comparisons operate on
//! the stored values which is self-consistent per room since a room belongs
//! to exactly one office.
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use db_storage::events::Event;

/// The booked slot of an event, in stored (UTC-shifted) times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedSlot {
    pub date: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

impl BookedSlot {
    pub fn of(event: &Event) -> Self {
        Self {
            date: event.date,
            time_start: event.time_start,
            time_end: event.time_end,
        }
    }
}

/// A window is valid when it starts strictly before it ends
pub fn is_valid_window(time_start: NaiveTime, time_end: NaiveTime) -> bool {
    time_start < time_end
}

/// Half-open overlap test of two slots
///
/// Slots only overlap when they are booked on the same calendar date,
/// touching windows (`end == start`) do not conflict.
pub fn overlaps(a: BookedSlot, b: BookedSlot) -> bool {
    a.date == b.date && a.time_start < b.time_end && a.time_end > b.time_start
}

/// Shifts a locally entered time of day into the stored UTC value
///
/// Wraps across midnight without touching the calendar date, an event
/// entered close to midnight in a non-zero offset office keeps its local
/// date while the stored clock value rolls over.
pub fn shift_from_office_local(time: NaiveTime, offset_hours: i32) -> NaiveTime {
    let (shifted, _) = time.overflowing_sub_signed(Duration::hours(i64::from(offset_hours)));
    shifted
}

/// Inverse of [`shift_from_office_local`]
pub fn shift_to_office_local(time: NaiveTime, offset_hours: i32) -> NaiveTime {
    let (shifted, _) = time.overflowing_add_signed(Duration::hours(i64::from(offset_hours)));
    shifted
}

/// Combines the stored date and time of day into an UTC instant
pub fn instant(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time))
}

/// UTC instant the event starts at
pub fn starts_at(event: &Event) -> DateTime<Utc> {
    instant(event.date, event.time_start)
}

/// UTC instant the event ends at
pub fn ends_at(event: &Event) -> DateTime<Utc> {
    instant(event.date, event.time_end)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slot(date: &str, start: &str, end: &str) -> BookedSlot {
        BookedSlot {
            date: date.parse().unwrap(),
            time_start: start.parse().unwrap(),
            time_end: end.parse().unwrap(),
        }
    }

    #[test]
    fn overlap_requires_same_date() {
        let a = slot("2025-06-10", "10:00:00", "11:00:00");
        let b = slot("2025-06-11", "10:00:00", "11:00:00");

        assert!(!overlaps(a, b));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = slot("2025-06-10", "10:00:00", "11:00:00");
        let b = slot("2025-06-10", "10:30:00", "11:30:00");

        assert!(overlaps(a, b));
        assert!(overlaps(b, a));
    }

    #[test]
    fn slot_overlaps_itself() {
        let a = slot("2025-06-10", "10:00:00", "11:00:00");

        assert!(overlaps(a, a));
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let a = slot("2025-06-10", "10:00:00", "11:00:00");
        let b = slot("2025-06-10", "11:00:00", "12:00:00");

        assert!(!overlaps(a, b));
        assert!(!overlaps(b, a));
    }

    #[test]
    fn window_validity() {
        let ten: NaiveTime = "10:00:00".parse().unwrap();
        let eleven: NaiveTime = "11:00:00".parse().unwrap();

        assert!(is_valid_window(ten, eleven));
        assert!(!is_valid_window(eleven, ten));
        assert!(!is_valid_window(ten, ten));
    }

    #[test]
    fn positive_offset_shifts_backwards() {
        let local: NaiveTime = "14:00:00".parse().unwrap();

        let stored = shift_from_office_local(local, 3);

        assert_eq!(stored, "11:00:00".parse().unwrap());
        assert_eq!(shift_to_office_local(stored, 3), local);
    }

    #[test]
    fn negative_offset_shifts_forwards() {
        let local: NaiveTime = "14:00:00".parse().unwrap();

        let stored = shift_from_office_local(local, -5);

        assert_eq!(stored, "19:00:00".parse().unwrap());
        assert_eq!(shift_to_office_local(stored, -5), local);
    }

    #[test]
    fn shift_wraps_across_midnight() {
        let local: NaiveTime = "01:00:00".parse().unwrap();

        // the stored clock value rolls over, the date is left alone
        let stored = shift_from_office_local(local, 3);

        assert_eq!(stored, "22:00:00".parse().unwrap());
    }

    #[test]
    fn instant_combines_date_and_time() {
        let at = instant("2025-06-10".parse().unwrap(), "11:00:00".parse().unwrap());

        assert_eq!(at.to_rfc3339(), "2025-06-10T11:00:00+00:00");
    }

    /// A booking of 14:00-15:00 local in a +3 office is stored as
    /// 11:00-12:00 UTC and collides with a 13:30-14:30 local attempt.
    #[test]
    fn stored_slots_of_an_offset_office_conflict() {
        let date: NaiveDate = "2025-06-10".parse().unwrap();

        let booked = BookedSlot {
            date,
            time_start: shift_from_office_local("14:00:00".parse().unwrap(), 3),
            time_end: shift_from_office_local("15:00:00".parse().unwrap(), 3),
        };

        assert_eq!(booked.time_start, "11:00:00".parse().unwrap());
        assert_eq!(booked.time_end, "12:00:00".parse().unwrap());

        let candidate = BookedSlot {
            date,
            time_start: shift_from_office_local("13:30:00".parse().unwrap(), 3),
            time_end: shift_from_office_local("14:30:00".parse().unwrap(), 3),
        };

        assert!(overlaps(booked, candidate));
    }
}

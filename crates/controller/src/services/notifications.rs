// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Computes and arms the timed notification tasks of an event
//!
//! Scheduling is idempotent: every pass first cancels all tasks of the
//! event before arming the current set, repeated edits therefore never
//! leave duplicate or stale tasks behind.
use crate::services::time;
use chrono::{DateTime, Duration, Utc};
use database::DbConnection;
use db_storage::events::{Event, EventId};
use db_storage::scheduled_tasks::{NewScheduledTask, ScheduledTask, TaskKind};

#[derive(Clone)]
pub struct NotificationScheduler {
    reminder_lead_minutes: Vec<u32>,
}

impl NotificationScheduler {
    pub fn new(reminder_lead_minutes: Vec<u32>) -> Self {
        Self {
            reminder_lead_minutes,
        }
    }

    /// Computes the tasks to arm for the event
    ///
    /// One reminder per configured lead time plus the summary at the event
    /// end. Only instants strictly in the future make it into the set,
    /// past-due candidates are silently skipped.
    pub fn compute(&self, event: &Event, now: DateTime<Utc>) -> Vec<NewScheduledTask> {
        let starts_at = time::starts_at(event);
        let ends_at = time::ends_at(event);

        let mut tasks = Vec::with_capacity(self.reminder_lead_minutes.len() + 1);

        for &lead_minutes in &self.reminder_lead_minutes {
            let fire_at = starts_at - Duration::minutes(i64::from(lead_minutes));

            if fire_at > now {
                tasks.push(NewScheduledTask {
                    event_id: event.id,
                    kind: TaskKind::Reminder,
                    lead_minutes: lead_minutes as i32,
                    fire_at,
                });
            }
        }

        if ends_at > now {
            tasks.push(NewScheduledTask {
                event_id: event.id,
                kind: TaskKind::Summary,
                lead_minutes: 0,
                fire_at: ends_at,
            });
        }

        tasks
    }

    /// Cancels all pending tasks of the event and arms the current set
    #[tracing::instrument(err, skip_all)]
    pub fn reschedule(
        &self,
        conn: &mut DbConnection,
        event: &Event,
    ) -> database::Result<Vec<ScheduledTask>> {
        ScheduledTask::delete_all_for_event(conn, event.id)?;

        let mut scheduled = Vec::new();

        for task in self.compute(event, Utc::now()) {
            scheduled.push(task.insert(conn)?);
        }

        Ok(scheduled)
    }

    /// Cancels all pending tasks of the event
    #[tracing::instrument(err, skip_all)]
    pub fn cancel(&self, conn: &mut DbConnection, event_id: EventId) -> database::Result<usize> {
        ScheduledTask::delete_all_for_event(conn, event_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use db_storage::employees::EmployeeId;
    use db_storage::rooms::RoomId;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn example_event() -> Event {
        Event {
            id: EventId::from(Uuid::from_u128(1)),
            id_serial: 1,
            name: "Weekly sync".into(),
            description: "".into(),
            date: "2025-06-10".parse().unwrap(),
            time_start: "11:00:00".parse().unwrap(),
            time_end: "12:00:00".parse().unwrap(),
            author_id: EmployeeId::from(Uuid::from_u128(2)),
            room_id: RoomId::from(Uuid::from_u128(3)),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            recurrence_frequency: None,
            recurrence_interval: None,
            recurrence_end: None,
            recurrence_parent_id: None,
        }
    }

    #[test]
    fn all_candidates_in_the_future() {
        let scheduler = NotificationScheduler::new(vec![60, 10]);
        let event = example_event();

        let now = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
        let tasks = scheduler.compute(&event, now);

        let expected = vec![
            NewScheduledTask {
                event_id: event.id,
                kind: TaskKind::Reminder,
                lead_minutes: 60,
                fire_at: Utc.with_ymd_and_hms(2025, 6, 10, 10, 0, 0).unwrap(),
            },
            NewScheduledTask {
                event_id: event.id,
                kind: TaskKind::Reminder,
                lead_minutes: 10,
                fire_at: Utc.with_ymd_and_hms(2025, 6, 10, 10, 50, 0).unwrap(),
            },
            NewScheduledTask {
                event_id: event.id,
                kind: TaskKind::Summary,
                lead_minutes: 0,
                fire_at: Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap(),
            },
        ];

        assert_eq!(tasks, expected);
    }

    #[test]
    fn past_due_reminders_are_skipped() {
        let scheduler = NotificationScheduler::new(vec![60, 10]);
        let event = example_event();

        // 30 minutes before start, the 60 minute reminder is already due
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 10, 30, 0).unwrap();
        let tasks = scheduler.compute(&event, now);

        let kinds: Vec<_> = tasks.iter().map(|t| (t.kind, t.lead_minutes)).collect();

        assert_eq!(kinds, vec![(TaskKind::Reminder, 10), (TaskKind::Summary, 0)]);
    }

    #[test]
    fn nothing_is_scheduled_for_past_events() {
        let scheduler = NotificationScheduler::new(vec![60, 10]);
        let event = example_event();

        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let tasks = scheduler.compute(&event, now);

        assert_eq!(tasks, vec![]);
    }

    #[test]
    fn compute_is_pure() {
        let scheduler = NotificationScheduler::new(vec![60]);
        let event = example_event();
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();

        assert_eq!(scheduler.compute(&event, now), scheduler.compute(&event, now));
    }
}

// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Durable queue of delayed notification tasks
//!
//! A scheduled task is the promise to hand a reminder or summary
//! notification to the delivery worker at `fire_at`. The booking core only
//! schedules and cancels tasks keyed by event id, claiming due tasks is
//! done atomically so concurrent workers never deliver a task twice.
use crate::events::{Event, EventId};
use crate::schema::scheduled_tasks;
use chrono::{DateTime, Utc};
use database::{DbConnection, Result};
use diesel::prelude::*;

diesel_newtype! {
    #[derive(Copy)] ScheduledTaskId(uuid::Uuid)
}

sql_enum!(
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "snake_case")]
    TaskKind,
    "scheduled_task_kind",
    TaskKindType,
    {
        Reminder = b"reminder",
        Summary = b"summary",
    }
);

#[derive(Debug, Clone, Queryable, Identifiable, Associations, PartialEq)]
#[diesel(table_name = scheduled_tasks, belongs_to(Event, foreign_key = event_id))]
pub struct ScheduledTask {
    pub id: ScheduledTaskId,
    pub event_id: EventId,
    pub kind: TaskKind,

    /// Minutes before the event start a reminder fires, 0 for summaries
    pub lead_minutes: i32,
    pub fire_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ScheduledTask {
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_event(
        conn: &mut DbConnection,
        event_id: EventId,
    ) -> Result<Vec<ScheduledTask>> {
        let query = scheduled_tasks::table
            .filter(scheduled_tasks::event_id.eq(event_id))
            .order_by(scheduled_tasks::fire_at.asc());

        let tasks = query.load(conn)?;

        Ok(tasks)
    }

    /// Cancels every pending task of the event
    #[tracing::instrument(err, skip_all)]
    pub fn delete_all_for_event(conn: &mut DbConnection, event_id: EventId) -> Result<usize> {
        let deleted = diesel::delete(scheduled_tasks::table)
            .filter(scheduled_tasks::event_id.eq(event_id))
            .execute(conn)?;

        Ok(deleted)
    }

    /// Claims all tasks that are due at `now`
    ///
    /// The claimed rows are deleted and returned in one statement, a task
    /// is therefore only ever handed to a single worker.
    #[tracing::instrument(err, skip_all)]
    pub fn claim_due(conn: &mut DbConnection, now: DateTime<Utc>) -> Result<Vec<ScheduledTask>> {
        let query = diesel::delete(scheduled_tasks::table)
            .filter(scheduled_tasks::fire_at.le(now))
            .returning(scheduled_tasks::all_columns);

        let tasks = query.get_results(conn)?;

        Ok(tasks)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = scheduled_tasks)]
pub struct NewScheduledTask {
    pub event_id: EventId,
    pub kind: TaskKind,
    pub lead_minutes: i32,
    pub fire_at: DateTime<Utc>,
}

impl NewScheduledTask {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<ScheduledTask> {
        let query = self.insert_into(scheduled_tasks::table);

        let task = query.get_result(conn)?;

        Ok(task)
    }
}

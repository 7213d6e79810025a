// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! The event scheduling engine
//!
//! Orchestrates create/update/delete of events: validates conflict-free
//! placement, persists the event and its recurrence children and (re)arms
//! the notification schedule. The conflict check and the write run in one
//! transaction holding a row lock on the room, concurrent bookings on the
//! same room are serialized.
use crate::services::calendar::CalendarSyncHandle;
use crate::services::error::ServiceError;
use crate::services::notifications::NotificationScheduler;
use crate::services::recurrence::{self, RecurrenceRule};
use crate::services::time;
use chrono::{NaiveDate, NaiveTime, Utc};
use database::{Db, DbConnection, OptionalExt};
use db_storage::employees::{Employee, EmployeeId};
use db_storage::events::{
    Event, EventAttendee, EventCounts, EventFilter, EventId, NewEvent, NewEventAttendee,
    RecurrenceFrequency, UpdateEvent,
};
use db_storage::offices::Office;
use db_storage::rooms::{Room, RoomId};
use db_storage::Status;
use diesel::Connection;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(max = 4096))]
    #[serde(default)]
    pub description: String,

    pub date: NaiveDate,

    /// Start time of day in the wall-clock time of the rooms office
    pub time_start: NaiveTime,

    /// End time of day in the wall-clock time of the rooms office
    pub time_end: NaiveTime,

    pub author_id: EmployeeId,
    pub room_id: RoomId,

    #[serde(default)]
    pub attendee_ids: Vec<EmployeeId>,

    pub recurrence_frequency: Option<RecurrenceFrequency>,
    #[validate(range(min = 1))]
    pub recurrence_interval: Option<i32>,
    pub recurrence_end: Option<NaiveDate>,
}

/// Sparse patch of an event, absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    pub date: Option<NaiveDate>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,

    pub author_id: Option<EmployeeId>,
    pub room_id: Option<RoomId>,

    /// Replaces the attendee set with exactly this list
    pub attendee_ids: Option<Vec<EmployeeId>>,
}

#[derive(Clone)]
pub struct EventService {
    db: Arc<Db>,
    scheduler: NotificationScheduler,
    calendar: CalendarSyncHandle,
}

impl EventService {
    pub fn new(db: Arc<Db>, scheduler: NotificationScheduler, calendar: CalendarSyncHandle) -> Self {
        Self {
            db,
            scheduler,
            calendar,
        }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn create(&self, request: CreateEventRequest) -> Result<Event, ServiceError> {
        request.validate()?;

        let mut conn = self.db.get_conn()?;

        let (event, children, room) = conn.transaction(|conn| {
            let room = Room::get_for_update(conn, request.room_id)
                .optional()?
                .ok_or_else(|| {
                    ServiceError::not_found("meeting room", *request.room_id.inner())
                })?;

            if room.status != Status::Active {
                return Err(ServiceError::RoomNotActive(room.id));
            }

            let office = Office::get(conn, room.office_id)?;

            let author = Employee::get(conn, request.author_id)
                .optional()?
                .ok_or_else(|| ServiceError::not_found("employee", *request.author_id.inner()))?;

            let time_start = time::shift_from_office_local(request.time_start, office.time_zone);
            let time_end = time::shift_from_office_local(request.time_end, office.time_zone);

            validate_placement(conn, room.id, request.date, time_start, time_end, None)?;

            // a partial rule is recorded but never expanded
            let (recurrence_frequency, recurrence_interval) =
                match (request.recurrence_frequency, request.recurrence_interval) {
                    (Some(frequency), Some(interval)) => (Some(frequency), Some(interval)),
                    _ => (None, None),
                };

            let event = NewEvent {
                name: request.name,
                description: request.description,
                date: request.date,
                time_start,
                time_end,
                author_id: author.id,
                room_id: room.id,
                recurrence_frequency,
                recurrence_interval,
                recurrence_end: request.recurrence_end,
                recurrence_parent_id: None,
            }
            .insert(conn)?;

            let attendee_ids = attach_attendees(conn, event.id, &request.attendee_ids)?;

            let children = generate_occurrences(conn, &event, &attendee_ids)?;

            self.scheduler.reschedule(conn, &event)?;

            Ok((event, children, room))
        })?;

        self.calendar.spawn_sync(event.clone(), room.clone());
        for child in children {
            self.calendar.spawn_sync(child, room.clone());
        }

        Ok(event)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn update(&self, event_id: EventId, patch: PatchEventRequest) -> Result<Event, ServiceError> {
        patch.validate()?;

        let mut conn = self.db.get_conn()?;

        let (event, children, room) = conn.transaction(|conn| {
            let event = Event::get(conn, event_id)
                .optional()?
                .ok_or_else(|| ServiceError::not_found("event", *event_id.inner()))?;

            let room_id = patch.room_id.unwrap_or(event.room_id);
            let room = Room::get_for_update(conn, room_id)
                .optional()?
                .ok_or_else(|| ServiceError::not_found("meeting room", *room_id.inner()))?;

            if patch.room_id.is_some() && room.status != Status::Active {
                return Err(ServiceError::RoomNotActive(room.id));
            }

            let office = Office::get(conn, room.office_id)?;

            if let Some(author_id) = patch.author_id {
                Employee::get(conn, author_id)
                    .optional()?
                    .ok_or_else(|| ServiceError::not_found("employee", *author_id.inner()))?;
            }

            let time_start = patch
                .time_start
                .map(|t| time::shift_from_office_local(t, office.time_zone))
                .unwrap_or(event.time_start);
            let time_end = patch
                .time_end
                .map(|t| time::shift_from_office_local(t, office.time_zone))
                .unwrap_or(event.time_end);
            let date = patch.date.unwrap_or(event.date);

            validate_placement(conn, room.id, date, time_start, time_end, Some(event.id))?;

            let event = UpdateEvent {
                name: patch.name,
                description: patch.description,
                date: patch.date,
                time_start: patch.time_start.map(|_| time_start),
                time_end: patch.time_end.map(|_| time_end),
                author_id: patch.author_id,
                room_id: patch.room_id,
                updated_at: Some(Utc::now()),
                ..Default::default()
            }
            .apply(conn, event.id)?;

            let attendee_ids = match &patch.attendee_ids {
                Some(requested) => reconcile_attendees(conn, event.id, requested)?,
                None => Event::get_attendee_ids(conn, event.id)?,
            };

            // regenerate the series from the updated anchor, stale children
            // from the previous schedule are dropped first
            Event::delete_children_of(conn, event.id)?;
            let children = generate_occurrences(conn, &event, &attendee_ids)?;

            self.scheduler.reschedule(conn, &event)?;

            Ok((event, children, room))
        })?;

        self.calendar.spawn_sync(event.clone(), room.clone());
        for child in children {
            self.calendar.spawn_sync(child, room.clone());
        }

        Ok(event)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete(&self, event_id: EventId) -> Result<(), ServiceError> {
        let mut conn = self.db.get_conn()?;

        let (event, room) = conn.transaction::<_, ServiceError, _>(|conn| {
            let (event, room) = Event::get_with_room(conn, event_id)
                .optional()?
                .ok_or_else(|| ServiceError::not_found("event", *event_id.inner()))?;

            self.scheduler.cancel(conn, event.id)?;

            Event::delete_children_of(conn, event.id)?;
            Event::delete_by_id(conn, event.id)?;

            Ok((event, room))
        })?;

        self.calendar.spawn_delete(event, room);

        Ok(())
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(&self, event_id: EventId) -> Result<Event, ServiceError> {
        let mut conn = self.db.get_conn()?;

        Event::get(&mut conn, event_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("event", *event_id.inner()))
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_attendees(&self, event_id: EventId) -> Result<Vec<Employee>, ServiceError> {
        let mut conn = self.db.get_conn()?;

        Ok(Event::get_attendees(&mut conn, event_id)?)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_by_date(&self, date: NaiveDate) -> Result<Vec<Event>, ServiceError> {
        let mut conn = self.db.get_conn()?;

        Ok(Event::get_all_by_date(&mut conn, date)?)
    }

    /// Filtered, paginated listing with the aggregate badge counts
    #[tracing::instrument(err, skip_all)]
    pub fn list(
        &self,
        filter: &EventFilter,
        user: Option<EmployeeId>,
    ) -> Result<(Vec<Event>, EventCounts), ServiceError> {
        let mut conn = self.db.get_conn()?;

        let today = Utc::now().date_naive();

        Ok(Event::get_all_by_filter(&mut conn, filter, user, today)?)
    }
}

/// Rejects invalid windows and double bookings
///
/// The times must already be shifted to the stored UTC values.
fn validate_placement(
    conn: &mut DbConnection,
    room_id: RoomId,
    date: NaiveDate,
    time_start: NaiveTime,
    time_end: NaiveTime,
    exclude: Option<EventId>,
) -> Result<(), ServiceError> {
    if !time::is_valid_window(time_start, time_end) {
        return Err(ServiceError::InvalidTimeWindow);
    }

    let conflicting = Event::get_conflicting(conn, room_id, date, time_start, time_end, exclude)?;

    if let Some(conflict) = conflicting.first() {
        return Err(ServiceError::Conflict {
            conflicting: conflict.id,
        });
    }

    Ok(())
}

/// Attaches the requested attendees to the event
///
/// Ids that do not resolve are skipped silently, bad attendee input never
/// fails the booking.
fn attach_attendees(
    conn: &mut DbConnection,
    event_id: EventId,
    attendee_ids: &[EmployeeId],
) -> Result<Vec<EmployeeId>, ServiceError> {
    let mut attached = Vec::with_capacity(attendee_ids.len());

    for &employee_id in attendee_ids {
        if Employee::get(conn, employee_id).optional()?.is_none() {
            log::debug!("skipping unknown attendee {employee_id} for event {event_id}");
            continue;
        }

        NewEventAttendee {
            event_id,
            employee_id,
        }
        .try_insert(conn)?;

        attached.push(employee_id);
    }

    Ok(attached)
}

/// Reconciles the attendee set to exactly the requested list
fn reconcile_attendees(
    conn: &mut DbConnection,
    event_id: EventId,
    requested: &[EmployeeId],
) -> Result<Vec<EmployeeId>, ServiceError> {
    let current = Event::get_attendee_ids(conn, event_id)?;

    for &employee_id in requested {
        if current.contains(&employee_id) {
            continue;
        }

        if Employee::get(conn, employee_id).optional()?.is_none() {
            log::debug!("skipping unknown attendee {employee_id} for event {event_id}");
            continue;
        }

        NewEventAttendee {
            event_id,
            employee_id,
        }
        .try_insert(conn)?;
    }

    for &employee_id in &current {
        if !requested.contains(&employee_id) {
            EventAttendee::delete_by_employee(conn, event_id, employee_id)?;
        }
    }

    Ok(Event::get_attendee_ids(conn, event_id)?)
}

/// Expands the recurrence rule of the anchor and persists the children
///
/// Each occurrence is conflict-checked like the anchor, an occurrence that
/// lands on an occupied slot is skipped with a warning instead of failing
/// the whole series.
fn generate_occurrences(
    conn: &mut DbConnection,
    anchor: &Event,
    attendee_ids: &[EmployeeId],
) -> Result<Vec<Event>, ServiceError> {
    let rule = match RecurrenceRule::of(anchor) {
        Some(rule) => rule,
        None => return Ok(Vec::new()),
    };

    let mut children = Vec::new();

    for date in recurrence::expand(anchor.date, &rule) {
        let conflicting = Event::get_conflicting(
            conn,
            anchor.room_id,
            date,
            anchor.time_start,
            anchor.time_end,
            None,
        )?;

        if let Some(conflict) = conflicting.first() {
            log::warn!(
                "skipping occurrence of event {} on {date}, slot taken by event {}",
                anchor.id,
                conflict.id
            );
            continue;
        }

        let child = recurrence::materialize_occurrence(anchor, date).insert(conn)?;

        for &employee_id in attendee_ids {
            NewEventAttendee {
                event_id: child.id,
                employee_id,
            }
            .try_insert(conn)?;
        }

        children.push(child);
    }

    Ok(children)
}

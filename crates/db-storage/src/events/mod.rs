// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Event specific database structs and queries
//!
//! Events are single meetings inside a meeting room. Times of an event are
//! stored shifted to UTC by the integer offset of the office the room
//! belongs to, the calendar date is stored as entered.
use crate::employees::{Employee, EmployeeId};
use crate::offices::OfficeId;
use crate::rooms::{Room, RoomId};
use crate::schema::{employees, event_attendees, events, rooms};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use database::{DbConnection, Paginate, Result};
use diesel::pg::Pg;
use diesel::prelude::*;
use std::str::FromStr;

diesel_newtype! {
    #[derive(Copy)] EventId(uuid::Uuid)
}

sql_enum!(
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "snake_case")]
    RecurrenceFrequency,
    "recurrence_frequency",
    RecurrenceFrequencyType,
    {
        Day = b"day",
        Week = b"week",
        Month = b"month",
        Year = b"year",
    }
);

impl FromStr for RecurrenceFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(format!("unknown recurrence frequency {s:?}")),
        }
    }
}

/// Relation of the requesting employee to an event
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventRelation {
    Author,
    Participant,
}

/// Filter for the paginated event queries
///
/// Every recognized query option is an explicit field, `None` fields are
/// not applied.
#[derive(Debug, Default)]
pub struct EventFilter {
    pub room_id: Option<RoomId>,
    pub relation: Option<EventRelation>,
    pub name: Option<String>,
    pub desc_order: bool,
    /// `Some(true)` restricts to events before today, `Some(false)` to
    /// today and later
    pub archived: Option<bool>,
    pub date: Option<NaiveDate>,
    pub office_id: Option<OfficeId>,
    pub page: i64,
    pub limit: i64,
}

/// Aggregate counts returned next to a filtered event page
///
/// `total` is the count of all events matching the filter. The author and
/// participant counts are computed under the same filter minus the relation
/// clause and ignore pagination, they back the dashboard badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct EventCounts {
    pub total: i64,
    pub as_author: i64,
    pub as_participant: i64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, PartialEq)]
#[diesel(table_name = events, belongs_to(Room, foreign_key = room_id))]
pub struct Event {
    pub id: EventId,
    pub id_serial: i64,
    pub name: String,
    pub description: String,
    pub date: NaiveDate,

    /// start time-of-day of the event, stored in UTC
    pub time_start: NaiveTime,

    /// end time-of-day of the event, stored in UTC
    pub time_end: NaiveTime,

    pub author_id: EmployeeId,
    pub room_id: RoomId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Cadence of the recurrence rule, None for single events
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    pub recurrence_interval: Option<i32>,

    /// Inclusive last date of the recurrence, rules without an end date are
    /// recorded but never expanded
    pub recurrence_end: Option<NaiveDate>,

    /// Back-reference to the event this occurrence was generated from
    pub recurrence_parent_id: Option<EventId>,
}

impl Event {
    /// Returns true when this row is a generated occurrence of another event
    pub fn is_generated_occurrence(&self) -> bool {
        self.recurrence_parent_id.is_some()
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, event_id: EventId) -> Result<Event> {
        let query = events::table.filter(events::id.eq(event_id));

        let event = query.first(conn)?;

        Ok(event)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_with_room(conn: &mut DbConnection, event_id: EventId) -> Result<(Event, Room)> {
        let query = events::table
            .inner_join(rooms::table)
            .filter(events::id.eq(event_id));

        let event_with_room = query.first(conn)?;

        Ok(event_with_room)
    }

    /// Returns all events in the room whose time window overlaps the given
    /// one on the same calendar date
    ///
    /// Overlap is checked half-open: `start_a < end_b AND end_a > start_b`.
    /// The times must already be shifted to UTC like the stored values.
    #[tracing::instrument(err, skip_all)]
    pub fn get_conflicting(
        conn: &mut DbConnection,
        room_id: RoomId,
        date: NaiveDate,
        time_start: NaiveTime,
        time_end: NaiveTime,
        exclude: Option<EventId>,
    ) -> Result<Vec<Event>> {
        let mut query = events::table
            .filter(events::room_id.eq(room_id))
            .filter(events::date.eq(date))
            .filter(events::time_start.lt(time_end))
            .filter(events::time_end.gt(time_start))
            .order_by(events::time_start.asc())
            .into_boxed();

        if let Some(exclude) = exclude {
            query = query.filter(events::id.ne(exclude));
        }

        let conflicting = query.load(conn)?;

        Ok(conflicting)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_by_date(conn: &mut DbConnection, date: NaiveDate) -> Result<Vec<Event>> {
        let query = events::table
            .filter(events::date.eq(date))
            .order_by(events::time_start.asc());

        let events = query.load(conn)?;

        Ok(events)
    }

    /// Filtered, paginated event listing with aggregate counts
    ///
    /// `today` partitions archived from upcoming events and is expected to
    /// be the current date at local midnight.
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_by_filter(
        conn: &mut DbConnection,
        filter: &EventFilter,
        user: Option<EmployeeId>,
        today: NaiveDate,
    ) -> Result<(Vec<Event>, EventCounts)> {
        let mut query = filtered(filter, today);

        if let (Some(relation), Some(user)) = (filter.relation, user) {
            query = match relation {
                EventRelation::Author => query.filter(events::author_id.eq(user)),
                EventRelation::Participant => {
                    query.filter(events::id.eq_any(attended_by(user)))
                }
            };
        }

        query = if filter.desc_order {
            query
                .order_by(events::date.desc())
                .then_order_by(events::id_serial.desc())
        } else {
            query
                .order_by(events::date.asc())
                .then_order_by(events::id_serial.asc())
        };

        let (events, total) = query
            .paginate_by(filter.limit, filter.page)
            .load_and_count(conn)?;

        // The relation counts intentionally drop the relation clause of the
        // filter, they answer "how many of these are mine" for both kinds.
        let (as_author, as_participant) = if let Some(user) = user {
            let (_, as_author) = filtered(filter, today)
                .filter(events::author_id.eq(user))
                .paginate_by(1, 1)
                .load_and_count::<Event>(conn)?;

            let (_, as_participant) = filtered(filter, today)
                .filter(events::id.eq_any(attended_by(user)))
                .paginate_by(1, 1)
                .load_and_count::<Event>(conn)?;

            (as_author, as_participant)
        } else {
            (0, 0)
        };

        Ok((
            events,
            EventCounts {
                total,
                as_author,
                as_participant,
            },
        ))
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_children_of(conn: &mut DbConnection, parent_id: EventId) -> Result<Vec<Event>> {
        let query = events::table
            .filter(events::recurrence_parent_id.eq(parent_id))
            .order_by(events::date.asc());

        let children = query.load(conn)?;

        Ok(children)
    }

    /// Deletes all generated occurrences pointing at the given parent
    #[tracing::instrument(err, skip_all)]
    pub fn delete_children_of(conn: &mut DbConnection, parent_id: EventId) -> Result<usize> {
        let deleted = diesel::delete(events::table)
            .filter(events::recurrence_parent_id.eq(parent_id))
            .execute(conn)?;

        Ok(deleted)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete_by_id(conn: &mut DbConnection, event_id: EventId) -> Result<()> {
        diesel::delete(events::table)
            .filter(events::id.eq(event_id))
            .execute(conn)?;

        Ok(())
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_attendees(conn: &mut DbConnection, event_id: EventId) -> Result<Vec<Employee>> {
        let query = event_attendees::table
            .inner_join(employees::table)
            .filter(event_attendees::event_id.eq(event_id))
            .select(employees::all_columns)
            .order_by(employees::id_serial.asc());

        let attendees = query.load(conn)?;

        Ok(attendees)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_attendee_ids(conn: &mut DbConnection, event_id: EventId) -> Result<Vec<EmployeeId>> {
        let query = event_attendees::table
            .filter(event_attendees::event_id.eq(event_id))
            .select(event_attendees::employee_id);

        let attendee_ids = query.load(conn)?;

        Ok(attendee_ids)
    }
}

/// Base filter query, everything applied except the relation clause
fn filtered<'a>(filter: &EventFilter, today: NaiveDate) -> events::BoxedQuery<'a, Pg> {
    let mut query = events::table.into_boxed();

    if let Some(room_id) = filter.room_id {
        query = query.filter(events::room_id.eq(room_id));
    }

    if let Some(name) = &filter.name {
        query = query.filter(events::name.ilike(format!("%{name}%")));
    }

    if let Some(archived) = filter.archived {
        query = if archived {
            query.filter(events::date.lt(today))
        } else {
            query.filter(events::date.ge(today))
        };
    }

    if let Some(date) = filter.date {
        query = query.filter(events::date.eq(date));
    }

    if let Some(office_id) = filter.office_id {
        let rooms_of_office = rooms::table
            .filter(rooms::office_id.eq(office_id))
            .select(rooms::id);

        query = query.filter(events::room_id.eq_any(rooms_of_office));
    }

    query
}

/// Subquery selecting all event ids the employee attends
fn attended_by(
    user: EmployeeId,
) -> diesel::dsl::Select<
    diesel::dsl::Filter<event_attendees::table, diesel::dsl::Eq<event_attendees::employee_id, EmployeeId>>,
    event_attendees::event_id,
> {
    event_attendees::table
        .filter(event_attendees::employee_id.eq(user))
        .select(event_attendees::event_id)
}

#[derive(Debug, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub author_id: EmployeeId,
    pub room_id: RoomId,
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    pub recurrence_interval: Option<i32>,
    pub recurrence_end: Option<NaiveDate>,
    pub recurrence_parent_id: Option<EventId>,
}

impl NewEvent {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Event> {
        let query = self.insert_into(events::table);

        let event = query.get_result(conn)?;

        Ok(event)
    }
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = events)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub author_id: Option<EmployeeId>,
    pub room_id: Option<RoomId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub recurrence_frequency: Option<Option<RecurrenceFrequency>>,
    pub recurrence_interval: Option<Option<i32>>,
    pub recurrence_end: Option<Option<NaiveDate>>,
}

impl UpdateEvent {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(self, conn: &mut DbConnection, event_id: EventId) -> Result<Event> {
        let query = diesel::update(events::table)
            .filter(events::id.eq(event_id))
            .set(self)
            .returning(events::all_columns);

        let event = query.get_result(conn)?;

        Ok(event)
    }
}

#[derive(Debug, Queryable, Identifiable, Associations)]
#[diesel(
    table_name = event_attendees,
    primary_key(event_id, employee_id),
    belongs_to(Event, foreign_key = event_id),
    belongs_to(Employee, foreign_key = employee_id)
)]
pub struct EventAttendee {
    pub event_id: EventId,
    pub employee_id: EmployeeId,
}

impl EventAttendee {
    /// Deletes an attendee entry by event_id and employee_id
    ///
    /// Returns true if something was deleted
    #[tracing::instrument(err, skip_all)]
    pub fn delete_by_employee(
        conn: &mut DbConnection,
        event_id: EventId,
        employee_id: EmployeeId,
    ) -> Result<bool> {
        let lines_changed = diesel::delete(event_attendees::table)
            .filter(
                event_attendees::event_id
                    .eq(event_id)
                    .and(event_attendees::employee_id.eq(employee_id)),
            )
            .execute(conn)?;

        Ok(lines_changed > 0)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete_all_for_event(conn: &mut DbConnection, event_id: EventId) -> Result<()> {
        diesel::delete(event_attendees::table)
            .filter(event_attendees::event_id.eq(event_id))
            .execute(conn)?;

        Ok(())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = event_attendees)]
pub struct NewEventAttendee {
    pub event_id: EventId,
    pub employee_id: EmployeeId,
}

impl NewEventAttendee {
    /// Tries to insert the attendee entry into the database
    ///
    /// When yielding a unique key violation, None is returned.
    #[tracing::instrument(err, skip_all)]
    pub fn try_insert(self, conn: &mut DbConnection) -> Result<Option<EventAttendee>> {
        let query = self.insert_into(event_attendees::table);

        let result = query.get_result(conn);

        match result {
            Ok(attendee) => Ok(Some(attendee)),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                ..,
            )) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

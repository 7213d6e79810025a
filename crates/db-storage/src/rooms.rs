// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Contains the meeting room specific database structs and queries
use crate::employees::EmployeeId;
use crate::offices::{Office, OfficeId};
use crate::schema::{room_members, rooms};
use crate::Status;
use database::{DbConnection, Paginate, Result};
use diesel::prelude::*;

diesel_newtype! {
    #[derive(Copy)] RoomId(uuid::Uuid)
}

/// Filter for the paginated room queries
///
/// Every recognized query option is an explicit field, `None` fields are
/// not applied.
#[derive(Debug, Default)]
pub struct RoomFilter {
    pub office_id: Option<OfficeId>,
    pub name: Option<String>,
    pub active_only: bool,
    pub accessible_only: bool,
    pub page: i64,
    pub limit: i64,
}

/// Diesel meeting room struct
///
/// Is used as a result in various queries. Represents a room column
#[derive(Debug, Clone, Queryable, Identifiable, PartialEq)]
#[diesel(table_name = rooms)]
pub struct Room {
    pub id: RoomId,
    pub id_serial: i64,
    pub name: String,
    pub description: String,
    pub size: i32,
    pub status: Status,
    pub is_public: bool,
    pub calendar_code: Option<String>,
    pub photo_paths: Vec<String>,
    pub office_id: OfficeId,
}

impl Room {
    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, room_id: RoomId) -> Result<Room> {
        let query = rooms::table.filter(rooms::id.eq(room_id));

        let room = query.first(conn)?;

        Ok(room)
    }

    /// Fetches the room while taking a `FOR UPDATE` row lock
    ///
    /// Serializes concurrent bookings on the same room, the lock is held
    /// until the surrounding transaction finishes.
    #[tracing::instrument(err, skip_all)]
    pub fn get_for_update(conn: &mut DbConnection, room_id: RoomId) -> Result<Room> {
        let query = rooms::table.filter(rooms::id.eq(room_id)).for_update();

        let room = query.first(conn)?;

        Ok(room)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_with_office(conn: &mut DbConnection, room_id: RoomId) -> Result<(Room, Office)> {
        let query = rooms::table
            .inner_join(crate::schema::offices::table)
            .filter(rooms::id.eq(room_id));

        let room_with_office = query.first(conn)?;

        Ok(room_with_office)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_by_filter(
        conn: &mut DbConnection,
        filter: &RoomFilter,
        user: Option<EmployeeId>,
    ) -> Result<(Vec<Room>, i64)> {
        let mut query = rooms::table.order_by(rooms::id_serial.desc()).into_boxed();

        if let Some(office_id) = filter.office_id {
            query = query.filter(rooms::office_id.eq(office_id));
        }

        if let Some(name) = &filter.name {
            query = query.filter(rooms::name.ilike(format!("%{name}%")));
        }

        if filter.active_only {
            query = query.filter(rooms::status.eq(Status::Active));
        }

        if filter.accessible_only {
            if let Some(user) = user {
                let member_of = room_members::table
                    .filter(room_members::employee_id.eq(user))
                    .select(room_members::room_id);

                query = query.filter(rooms::is_public.eq(true).or(rooms::id.eq_any(member_of)));
            }
        }

        let rooms = query
            .paginate_by(filter.limit, filter.page)
            .load_and_count(conn)?;

        Ok(rooms)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_member_ids(conn: &mut DbConnection, room_id: RoomId) -> Result<Vec<EmployeeId>> {
        let query = room_members::table
            .filter(room_members::room_id.eq(room_id))
            .select(room_members::employee_id);

        let member_ids = query.load(conn)?;

        Ok(member_ids)
    }

    /// Adds an employee to the access list of the room
    ///
    /// Only private rooms carry an access list, for public rooms this is a
    /// no-op. The list is bounded by the rooms capacity, employees beyond
    /// that are not added.
    ///
    /// Returns true if the employee was added
    #[tracing::instrument(err, skip_all)]
    pub fn add_member(&self, conn: &mut DbConnection, employee_id: EmployeeId) -> Result<bool> {
        if self.is_public {
            return Ok(false);
        }

        let member_count: i64 = room_members::table
            .filter(room_members::room_id.eq(self.id))
            .count()
            .get_result(conn)?;

        if member_count >= i64::from(self.size) {
            return Ok(false);
        }

        let result = diesel::insert_into(room_members::table)
            .values((
                room_members::room_id.eq(self.id),
                room_members::employee_id.eq(employee_id),
            ))
            .execute(conn);

        match result {
            Ok(_) => Ok(true),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                ..,
            )) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes an employee from the access list, a no-op for public rooms
    #[tracing::instrument(err, skip_all)]
    pub fn remove_member(&self, conn: &mut DbConnection, employee_id: EmployeeId) -> Result<bool> {
        if self.is_public {
            return Ok(false);
        }

        let lines_changed = diesel::delete(room_members::table)
            .filter(
                room_members::room_id
                    .eq(self.id)
                    .and(room_members::employee_id.eq(employee_id)),
            )
            .execute(conn)?;

        Ok(lines_changed > 0)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn clear_members(conn: &mut DbConnection, room_id: RoomId) -> Result<()> {
        diesel::delete(room_members::table)
            .filter(room_members::room_id.eq(room_id))
            .execute(conn)?;

        Ok(())
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete_by_id(conn: &mut DbConnection, room_id: RoomId) -> Result<()> {
        diesel::delete(rooms::table)
            .filter(rooms::id.eq(room_id))
            .execute(conn)?;

        Ok(())
    }
}

/// Diesel insertable room struct
///
/// Represents fields that have to be provided on room insertion.
#[derive(Debug, Insertable)]
#[diesel(table_name = rooms)]
pub struct NewRoom {
    pub name: String,
    pub description: String,
    pub size: i32,
    pub status: Status,
    pub is_public: bool,
    pub calendar_code: Option<String>,
    pub photo_paths: Vec<String>,
    pub office_id: OfficeId,
}

impl NewRoom {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Room> {
        let query = self.insert_into(rooms::table);

        let room = query.get_result(conn)?;

        Ok(room)
    }
}

/// Diesel room struct for updates
///
/// Is used in update queries. None fields will be ignored on update queries
#[derive(Debug, AsChangeset)]
#[diesel(table_name = rooms)]
pub struct UpdateRoom {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: Option<i32>,
    pub status: Option<Status>,
    pub is_public: Option<bool>,
    pub calendar_code: Option<Option<String>>,
    pub photo_paths: Option<Vec<String>>,
    pub office_id: Option<OfficeId>,
}

impl UpdateRoom {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(self, conn: &mut DbConnection, room_id: RoomId) -> Result<Room> {
        let query = diesel::update(rooms::table)
            .filter(rooms::id.eq(room_id))
            .set(self)
            .returning(rooms::all_columns);

        let room = query.get_result(conn)?;

        Ok(room)
    }
}

// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Meeting room management
use crate::services::access;
use crate::services::error::ServiceError;
use database::{Db, OptionalExt};
use db_storage::employees::{Employee, EmployeeId};
use db_storage::offices::{Office, OfficeId};
use db_storage::rooms::{NewRoom, Room, RoomFilter, RoomId, UpdateRoom};
use db_storage::Status;
use diesel::Connection;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Capacity of the room, also bounds the access list of private rooms
    #[validate(range(min = 1, max = 100))]
    pub size: i32,

    #[serde(default = "default_status")]
    pub status: Status,

    #[serde(default = "default_is_public")]
    pub is_public: bool,

    pub calendar_code: Option<String>,

    #[serde(default)]
    pub photo_paths: Vec<String>,

    pub office_id: OfficeId,

    #[serde(default)]
    pub employee_ids: Vec<EmployeeId>,
}

fn default_status() -> Status {
    Status::Active
}

fn default_is_public() -> bool {
    true
}

/// Sparse patch of a room, absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchRoomRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 100))]
    pub size: Option<i32>,

    pub status: Option<Status>,
    pub is_public: Option<bool>,
    pub calendar_code: Option<Option<String>>,
    pub photo_paths: Option<Vec<String>>,
    pub office_id: Option<OfficeId>,

    /// Replaces the access list with exactly this list
    pub employee_ids: Option<Vec<EmployeeId>>,
}

impl PatchRoomRequest {
    /// True when no column of the room row itself is patched
    fn leaves_row_unchanged(&self) -> bool {
        let PatchRoomRequest {
            name,
            description,
            size,
            status,
            is_public,
            calendar_code,
            photo_paths,
            office_id,
            employee_ids: _,
        } = self;

        name.is_none()
            && description.is_none()
            && size.is_none()
            && status.is_none()
            && is_public.is_none()
            && calendar_code.is_none()
            && photo_paths.is_none()
            && office_id.is_none()
    }
}

/// A room annotated with the access flag of the requesting employee
#[derive(Debug, Clone)]
pub struct RoomWithAccess {
    pub room: Room,
    pub can_access: bool,
}

#[derive(Clone)]
pub struct RoomService {
    db: Arc<Db>,
}

impl RoomService {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn create(&self, request: CreateRoomRequest) -> Result<Room, ServiceError> {
        request.validate()?;

        let mut conn = self.db.get_conn()?;

        let room = conn.transaction::<_, ServiceError, _>(|conn| {
            Office::get(conn, request.office_id)
                .optional()?
                .ok_or_else(|| ServiceError::not_found("office", *request.office_id.inner()))?;

            let room = NewRoom {
                name: request.name,
                description: request.description,
                size: request.size,
                status: request.status,
                is_public: request.is_public,
                calendar_code: request.calendar_code,
                photo_paths: request.photo_paths,
                office_id: request.office_id,
            }
            .insert(conn)?;

            add_members(conn, &room, &request.employee_ids)?;

            Ok(room)
        })?;

        Ok(room)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn update(&self, room_id: RoomId, patch: PatchRoomRequest) -> Result<Room, ServiceError> {
        patch.validate()?;

        let mut conn = self.db.get_conn()?;

        let room = conn.transaction::<_, ServiceError, _>(|conn| {
            let room = Room::get(conn, room_id)
                .optional()?
                .ok_or_else(|| ServiceError::not_found("meeting room", *room_id.inner()))?;

            if let Some(office_id) = patch.office_id {
                Office::get(conn, office_id)
                    .optional()?
                    .ok_or_else(|| ServiceError::not_found("office", *office_id.inner()))?;
            }

            let leaves_row_unchanged = patch.leaves_row_unchanged();
            let employee_ids = patch.employee_ids;

            let room = if leaves_row_unchanged {
                room
            } else {
                UpdateRoom {
                    name: patch.name,
                    description: patch.description,
                    size: patch.size,
                    status: patch.status,
                    is_public: patch.is_public,
                    calendar_code: patch.calendar_code,
                    photo_paths: patch.photo_paths,
                    office_id: patch.office_id,
                }
                .apply(conn, room_id)?
            };

            if let Some(employee_ids) = employee_ids {
                Room::clear_members(conn, room.id)?;
                add_members(conn, &room, &employee_ids)?;
            }

            Ok(room)
        })?;

        Ok(room)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete(&self, room_id: RoomId) -> Result<(), ServiceError> {
        let mut conn = self.db.get_conn()?;

        Room::get(&mut conn, room_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("meeting room", *room_id.inner()))?;

        Room::delete_by_id(&mut conn, room_id)?;

        Ok(())
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(
        &self,
        room_id: RoomId,
        user: Option<EmployeeId>,
    ) -> Result<RoomWithAccess, ServiceError> {
        let mut conn = self.db.get_conn()?;

        let room = Room::get(&mut conn, room_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("meeting room", *room_id.inner()))?;

        let can_access = match user {
            Some(user) => {
                let members = Room::get_member_ids(&mut conn, room.id)?;
                access::room_accessible(&room, &members, user)
            }
            None => room.is_public,
        };

        Ok(RoomWithAccess { room, can_access })
    }

    #[tracing::instrument(err, skip_all)]
    pub fn list(
        &self,
        filter: &RoomFilter,
        user: Option<EmployeeId>,
    ) -> Result<(Vec<RoomWithAccess>, i64), ServiceError> {
        let mut conn = self.db.get_conn()?;

        let (rooms, total) = Room::get_all_by_filter(&mut conn, filter, user)?;

        let mut annotated = Vec::with_capacity(rooms.len());

        for room in rooms {
            let can_access = match user {
                Some(user) => {
                    let members = Room::get_member_ids(&mut conn, room.id)?;
                    access::room_accessible(&room, &members, user)
                }
                None => room.is_public,
            };

            annotated.push(RoomWithAccess { room, can_access });
        }

        Ok((annotated, total))
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_member_ids(&self, room_id: RoomId) -> Result<Vec<EmployeeId>, ServiceError> {
        let mut conn = self.db.get_conn()?;

        Ok(Room::get_member_ids(&mut conn, room_id)?)
    }
}

/// Adds the listed employees to the access list of the room
///
/// Unknown employee ids fail the mutation, the access list is an explicit
/// administrative input unlike event attendees.
fn add_members(
    conn: &mut database::DbConnection,
    room: &Room,
    employee_ids: &[EmployeeId],
) -> Result<(), ServiceError> {
    for &employee_id in employee_ids {
        Employee::get(conn, employee_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("employee", *employee_id.inner()))?;

        if !room.add_member(conn, employee_id)? {
            log::debug!(
                "employee {employee_id} not added to access list of room {}",
                room.id
            );
        }
    }

    Ok(())
}

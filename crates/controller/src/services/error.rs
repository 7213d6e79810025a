// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Error types raised from the booking services
use database::DatabaseError;
use db_storage::events::EventId;
use db_storage::rooms::RoomId;
use validator::ValidationErrors;

/// The error raised from the create/update/delete paths of the services
///
/// Carries enough context to render a user facing message, the HTTP layer
/// maps the variants onto status codes.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A referenced resource id did not resolve
    #[error("{kind} {id} could not be found")]
    NotFound { kind: &'static str, id: uuid::Uuid },

    /// The meeting room exists but does not accept new events
    #[error("meeting room {0} is not active")]
    RoomNotActive(RoomId),

    /// The requested time window has `start >= end`
    #[error("invalid time window, time_start must be before time_end")]
    InvalidTimeWindow,

    /// The requested time window overlaps an existing booking
    #[error("time window overlaps event {conflicting} in the same room")]
    Conflict { conflicting: EventId },

    #[error("some provided values are invalid")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Database(DatabaseError),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: uuid::Uuid) -> Self {
        Self::NotFound { kind, id }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(db_error: DatabaseError) -> Self {
        Self::Database(db_error)
    }
}

impl From<diesel::result::Error> for ServiceError {
    fn from(diesel_error: diesel::result::Error) -> Self {
        Self::Database(diesel_error.into())
    }
}

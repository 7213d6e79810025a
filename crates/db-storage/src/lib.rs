// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Contains the database ORM and database migrations for the booking platform.
//! Builds upon roomplanner-database.

#[macro_use]
mod macros;
mod schema;

pub mod employees;
pub mod events;
pub mod migrations;
pub mod offices;
pub mod organizations;
pub mod rooms;
pub mod scheduled_tasks;

sql_enum!(
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "snake_case")]
    Status,
    "status",
    StatusType,
    {
        Active = b"active",
        Inactive = b"inactive",
    }
);

// SQL types reexport for schema.rs
pub mod sql_types {
    pub use super::events::RecurrenceFrequencyType as RecurrenceFrequency;
    pub use super::scheduled_tasks::TaskKindType as ScheduledTaskKind;
    pub use super::StatusType as Status;
    pub use diesel::sql_types::*;
}

// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Service layer of the booking platform
pub mod access;
pub mod calendar;
pub mod employees;
pub mod error;
pub mod events;
pub mod notifications;
pub mod notify;
pub mod offices;
pub mod organizations;
pub mod recurrence;
pub mod rooms;
pub mod time;
pub mod worker;

pub use calendar::{CalDavSync, CalendarSync, CalendarSyncHandle, DisabledCalendarSync};
pub use employees::EmployeeService;
pub use error::ServiceError;
pub use events::EventService;
pub use notifications::NotificationScheduler;
pub use notify::NotifyService;
pub use offices::OfficeService;
pub use organizations::OrganizationService;
pub use rooms::RoomService;
pub use worker::NotificationWorker;

// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Mirrors events into an external CalDAV calendar
//!
//! Sync runs fire-and-forget next to the booking mutations, a failed sync
//! is logged and never fails the create/update/delete that triggered it.
use crate::settings::CalDavConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use db_storage::events::{Event, RecurrenceFrequency};
use db_storage::rooms::Room;
use reqwest::Method;
use std::sync::Arc;

#[async_trait]
pub trait CalendarSync: Send + Sync {
    async fn sync_event(&self, event: &Event, room: &Room) -> Result<()>;
    async fn delete_event(&self, event: &Event, room: &Room) -> Result<()>;
}

/// No-op sync used when no calendar is configured
pub struct DisabledCalendarSync;

#[async_trait]
impl CalendarSync for DisabledCalendarSync {
    async fn sync_event(&self, event: &Event, _room: &Room) -> Result<()> {
        log::debug!("calendar sync disabled, not syncing event {}", event.id);
        Ok(())
    }

    async fn delete_event(&self, event: &Event, _room: &Room) -> Result<()> {
        log::debug!("calendar sync disabled, not deleting event {}", event.id);
        Ok(())
    }
}

/// Cloneable handle dispatching sync calls onto the runtime
#[derive(Clone)]
pub struct CalendarSyncHandle {
    sync: Arc<dyn CalendarSync>,
}

impl CalendarSyncHandle {
    pub fn new(sync: Arc<dyn CalendarSync>) -> Self {
        Self { sync }
    }

    pub fn spawn_sync(&self, event: Event, room: Room) {
        self.spawn(event, room, false)
    }

    pub fn spawn_delete(&self, event: Event, room: Room) {
        self.spawn(event, room, true)
    }

    fn spawn(&self, event: Event, room: Room, delete: bool) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::debug!("no runtime available, skipping calendar sync");
                return;
            }
        };

        let sync = self.sync.clone();

        handle.spawn(async move {
            let result = if delete {
                sync.delete_event(&event, &room).await
            } else {
                sync.sync_event(&event, &room).await
            };

            if let Err(e) = result {
                log::warn!(
                    "Failed to sync event {} to the external calendar, {:?}",
                    event.id,
                    e
                );
            }
        });
    }
}

/// CalDAV backed sync
///
/// Every room gets an own calendar collection, events are stored as
/// `event_<id>.ics` resources inside it.
pub struct CalDavSync {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl CalDavSync {
    pub fn new(settings: &CalDavConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create http client for CalDAV sync")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    /// The calendar collection of the room, the room id is used when no
    /// explicit calendar code is set
    fn calendar_code(room: &Room) -> String {
        room.calendar_code
            .clone()
            .unwrap_or_else(|| room.id.to_string())
    }

    fn calendar_url(&self, room: &Room) -> String {
        format!(
            "{}/calendars/{}/{}/",
            self.base_url,
            self.username,
            Self::calendar_code(room)
        )
    }

    fn event_url(&self, event: &Event, room: &Room) -> String {
        format!("{}event_{}.ics", self.calendar_url(room), event.id)
    }

    /// Creates the calendar collection of the room if it does not exist yet
    async fn ensure_calendar(&self, room: &Room) -> Result<()> {
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<C:mkcalendar xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <D:set>
        <D:prop>
            <D:displayname>{}</D:displayname>
        </D:prop>
    </D:set>
</C:mkcalendar>"#,
            room.name
        );

        let method = Method::from_bytes(b"MKCALENDAR").context("Invalid CalDAV method")?;

        let response = self
            .client
            .request(method, self.calendar_url(room))
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(body)
            .send()
            .await
            .context("MKCALENDAR request failed")?;

        // an already existing collection answers 405
        if !response.status().is_success()
            && response.status() != reqwest::StatusCode::METHOD_NOT_ALLOWED
        {
            anyhow::bail!("MKCALENDAR answered {}", response.status());
        }

        Ok(())
    }
}

#[async_trait]
impl CalendarSync for CalDavSync {
    async fn sync_event(&self, event: &Event, room: &Room) -> Result<()> {
        self.ensure_calendar(room).await?;

        let response = self
            .client
            .put(self.event_url(event, room))
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, "text/calendar")
            .body(build_vcalendar(event))
            .send()
            .await
            .context("PUT of the event resource failed")?;

        response
            .error_for_status()
            .context("CalDAV server rejected the event resource")?;

        Ok(())
    }

    async fn delete_event(&self, event: &Event, room: &Room) -> Result<()> {
        let response = self
            .client
            .delete(self.event_url(event, room))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .context("DELETE of the event resource failed")?;

        // deleting an already removed resource is fine
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("DELETE answered {}", response.status());
        }

        Ok(())
    }
}

/// Builds the iCalendar RRULE of the events recurrence fields
///
/// Returns None when the rule is incomplete.
pub fn build_rrule(event: &Event) -> Option<String> {
    let freq = match event.recurrence_frequency? {
        RecurrenceFrequency::Day => "DAILY",
        RecurrenceFrequency::Week => "WEEKLY",
        RecurrenceFrequency::Month => "MONTHLY",
        RecurrenceFrequency::Year => "YEARLY",
    };

    let interval = event.recurrence_interval.filter(|interval| *interval > 0)?;

    let mut rrule = format!("FREQ={freq};INTERVAL={interval}");

    if let Some(until) = event.recurrence_end {
        rrule.push_str(&format!(";UNTIL={}T235959Z", until.format("%Y%m%d")));
    }

    Some(rrule)
}

fn build_vcalendar(event: &Event) -> String {
    let dtstart = format!(
        "{}T{}Z",
        event.date.format("%Y%m%d"),
        event.time_start.format("%H%M%S")
    );
    let dtend = format!(
        "{}T{}Z",
        event.date.format("%Y%m%d"),
        event.time_end.format("%H%M%S")
    );

    let rrule_line = match build_rrule(event) {
        Some(rrule) => format!("RRULE:{rrule}\r\n"),
        None => String::new(),
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//roomplanner//booking//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:event_{id}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         {rrule_line}END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        id = event.id,
        summary = event.name,
        description = event.description,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};
    use db_storage::employees::EmployeeId;
    use db_storage::events::EventId;
    use db_storage::rooms::RoomId;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn example_event() -> Event {
        Event {
            id: EventId::from(Uuid::from_u128(1)),
            id_serial: 1,
            name: "Planning".into(),
            description: "Quarterly planning".into(),
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
    fn rrule_of_single_events_is_none() {
        assert_eq!(build_rrule(&example_event()), None);
    }

    #[test]
    fn rrule_of_biweekly_rule() {
        let mut event = example_event();
        event.recurrence_frequency = Some(RecurrenceFrequency::Week);
        event.recurrence_interval = Some(2);
        event.recurrence_end = Some("2025-08-01".parse().unwrap());

        assert_eq!(
            build_rrule(&event).as_deref(),
            Some("FREQ=WEEKLY;INTERVAL=2;UNTIL=20250801T235959Z")
        );
    }

    #[test]
    fn vcalendar_contains_window_and_rrule() {
        let mut event = example_event();
        event.recurrence_frequency = Some(RecurrenceFrequency::Day);
        event.recurrence_interval = Some(1);
        event.recurrence_end = Some("2025-06-12".parse().unwrap());

        let ics = build_vcalendar(&event);

        assert!(ics.contains("DTSTART:20250610T110000Z\r\n"));
        assert!(ics.contains("DTEND:20250610T120000Z\r\n"));
        assert!(ics.contains("RRULE:FREQ=DAILY;INTERVAL=1;UNTIL=20250612T235959Z\r\n"));
        assert!(ics.contains("UID:event_00000000-0000-0000-0000-000000000001\r\n"));
    }
}

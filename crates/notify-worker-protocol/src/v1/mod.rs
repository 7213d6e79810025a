// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

mod meetings;

pub use meetings::{MeetingReminder, MeetingSummary};

#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub struct Email(String);

impl Email {
    pub fn new(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Email {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Email {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub struct Employee {
    pub email: Email,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
}

/// An instant paired with the integer hour offset of the office
///
/// The worker renders the local wall-clock time from both fields.
#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub struct Time {
    pub time: chrono::DateTime<Utc>,
    pub offset_hours: i32,
}

#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_time: Time,
    pub end_time: Time,
    pub rrule: Option<String>,
    pub room: Room,
    pub organizer: Employee,
}

#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
}

#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub struct PushSubscription {
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_token: String,
}

/// The different kinds of NotifyTasks that are currently supported
#[derive(Deserialize, PartialEq, Debug)]
#[cfg_attr(any(test, feature = "client"), derive(Serialize))]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum Message {
    /// A notification sent to every attendee before the meeting starts
    MeetingReminder(MeetingReminder),
    /// A notification sent to every attendee when the meeting ended
    MeetingSummary(MeetingSummary),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::NotifyTask;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn example_event() -> Event {
        Event {
            id: Uuid::from_u128(1),
            name: "Morning standup".into(),
            description: "Daily sync".into(),
            start_time: Time {
                time: Utc.with_ymd_and_hms(2025, 6, 10, 11, 0, 0).unwrap(),
                offset_hours: 3,
            },
            end_time: Time {
                time: Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap(),
                offset_hours: 3,
            },
            rrule: None,
            room: Room {
                id: Uuid::from_u128(2),
                name: "Blue Room".into(),
            },
            organizer: Employee {
                email: "alice@example.org".into(),
                name: "Alice".into(),
                surname: "Author".into(),
                patronymic: None,
            },
        }
    }

    #[test]
    fn reminder_format() {
        let task = NotifyTask::V1(Message::MeetingReminder(MeetingReminder {
            recipient: Employee {
                email: "bob@example.org".into(),
                name: "Bob".into(),
                surname: "Attendee".into(),
                patronymic: None,
            },
            event: example_event(),
            minutes_before: 60,
            push_subscriptions: vec![PushSubscription {
                endpoint: "https://push.example.org/sub/1".into(),
                p256dh_key: "p256dh".into(),
                auth_token: "auth".into(),
            }],
        }));

        let produced = serde_json::to_value(&task).unwrap();

        let expected = serde_json::json!({
            "version": "1",
            "message": "meeting_reminder",
            "recipient": {
                "email": "bob@example.org",
                "name": "Bob",
                "surname": "Attendee",
                "patronymic": null,
            },
            "event": {
                "id": "00000000-0000-0000-0000-000000000001",
                "name": "Morning standup",
                "description": "Daily sync",
                "start_time": {
                    "time": "2025-06-10T11:00:00Z",
                    "offset_hours": 3,
                },
                "end_time": {
                    "time": "2025-06-10T12:00:00Z",
                    "offset_hours": 3,
                },
                "rrule": null,
                "room": {
                    "id": "00000000-0000-0000-0000-000000000002",
                    "name": "Blue Room",
                },
                "organizer": {
                    "email": "alice@example.org",
                    "name": "Alice",
                    "surname": "Author",
                    "patronymic": null,
                },
            },
            "minutes_before": 60,
            "push_subscriptions": [
                {
                    "endpoint": "https://push.example.org/sub/1",
                    "p256dh_key": "p256dh",
                    "auth_token": "auth",
                }
            ],
        });

        assert_eq!(produced, expected);
    }

    #[test]
    fn summary_roundtrip() {
        let task = NotifyTask::V1(Message::MeetingSummary(MeetingSummary {
            recipient: Employee {
                email: "bob@example.org".into(),
                name: "Bob".into(),
                surname: "Attendee".into(),
                patronymic: Some("B.".into()),
            },
            event: example_event(),
            push_subscriptions: vec![],
        }));

        let json = serde_json::to_string(&task).unwrap();
        let parsed: NotifyTask = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, task);
    }
}

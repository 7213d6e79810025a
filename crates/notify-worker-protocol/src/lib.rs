// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use serde::Deserialize;
#[cfg(any(test, feature = "client"))]
use serde::Serialize;

pub mod v1;

/// Versioned Notify Task Protocol
///
/// Tasks are published to the notification worker queue which renders and
/// delivers the mails and fans out the web-push messages.
#[derive(Deserialize, PartialEq, Debug)]
#[cfg_attr(any(test, feature = "client"), derive(Serialize))]
#[serde(tag = "version")]
pub enum NotifyTask {
    #[serde(rename = "1")]
    V1(v1::Message),
}

#[cfg(feature = "client")]
impl NotifyTask {
    /// Creates a NotifyTask reminding the recipient of an upcoming meeting
    pub fn meeting_reminder<R, E, P>(
        recipient: R,
        event: E,
        minutes_before: u32,
        push_subscriptions: Vec<P>,
    ) -> NotifyTask
    where
        R: Into<v1::Employee>,
        E: Into<v1::Event>,
        P: Into<v1::PushSubscription>,
    {
        Self::V1(v1::Message::MeetingReminder(v1::MeetingReminder {
            recipient: recipient.into(),
            event: event.into(),
            minutes_before,
            push_subscriptions: push_subscriptions.into_iter().map(Into::into).collect(),
        }))
    }

    /// Creates a NotifyTask summarizing a finished meeting
    pub fn meeting_summary<R, E, P>(
        recipient: R,
        event: E,
        push_subscriptions: Vec<P>,
    ) -> NotifyTask
    where
        R: Into<v1::Employee>,
        E: Into<v1::Event>,
        P: Into<v1::PushSubscription>,
    {
        Self::V1(v1::Message::MeetingSummary(v1::MeetingSummary {
            recipient: recipient.into(),
            event: event.into(),
            push_subscriptions: push_subscriptions.into_iter().map(Into::into).collect(),
        }))
    }

    pub fn as_kind_str(&self) -> &'static str {
        match self {
            NotifyTask::V1(message) => match message {
                v1::Message::MeetingReminder(_) => "reminder",
                v1::Message::MeetingSummary(_) => "summary",
            },
        }
    }
}

#[cfg(feature = "client")]
impl From<db_storage::employees::Employee> for v1::Employee {
    fn from(val: db_storage::employees::Employee) -> Self {
        Self {
            email: val.email.into(),
            name: val.name,
            surname: val.surname,
            patronymic: val.patronymic,
        }
    }
}

#[cfg(feature = "client")]
impl From<db_storage::employees::PushSubscription> for v1::PushSubscription {
    fn from(val: db_storage::employees::PushSubscription) -> Self {
        Self {
            endpoint: val.endpoint,
            p256dh_key: val.p256dh_key,
            auth_token: val.auth_token,
        }
    }
}

#[cfg(feature = "client")]
impl From<(chrono::DateTime<chrono::Utc>, i32)> for v1::Time {
    fn from((time, offset_hours): (chrono::DateTime<chrono::Utc>, i32)) -> Self {
        v1::Time { time, offset_hours }
    }
}

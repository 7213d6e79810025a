// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use super::{Employee, Event, PushSubscription};
use serde::{Deserialize, Serialize};

/// Reminder for an upcoming meeting
///
/// Sent `minutes_before` minutes ahead of the event start. The worker mails
/// the recipient and pushes to every listed subscription, push failures are
/// handled by the worker alone.
#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub struct MeetingReminder {
    pub recipient: Employee,
    pub event: Event,
    pub minutes_before: u32,
    pub push_subscriptions: Vec<PushSubscription>,
}

/// Summary for a finished meeting, sent at the event end
#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub struct MeetingSummary {
    pub recipient: Employee,
    pub event: Event,
    pub push_subscriptions: Vec<PushSubscription>,
}

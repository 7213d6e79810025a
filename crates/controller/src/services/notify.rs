// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! NotifyService
//!
//! Used to have a clean interface for the reminder and summary
//! notifications that are handed to the external notification worker.
use crate::services::calendar;
use crate::settings::SharedSettings;
use anyhow::{Context, Result};
use db_storage::employees::{Employee, PushSubscription};
use db_storage::events::Event;
use db_storage::offices::Office;
use db_storage::rooms::Room;
use notify_worker_protocol::{v1, NotifyTask};
use std::sync::Arc;

/// Everything the worker needs to render a notification for an event
#[derive(Debug, Clone)]
pub struct EventContext {
    pub event: Event,
    pub room: Room,
    pub office: Office,
    pub organizer: Employee,
}

fn to_event(ctx: &EventContext) -> v1::Event {
    let event = &ctx.event;

    let start_time = (
        crate::services::time::starts_at(event),
        ctx.office.time_zone,
    )
        .into();
    let end_time = (crate::services::time::ends_at(event), ctx.office.time_zone).into();

    v1::Event {
        id: *event.id.inner(),
        name: event.name.clone(),
        description: event.description.clone(),
        start_time,
        end_time,
        rrule: calendar::build_rrule(event),
        room: v1::Room {
            id: *ctx.room.id.inner(),
            name: ctx.room.name.clone(),
        },
        organizer: ctx.organizer.clone().into(),
    }
}

#[derive(Clone)]
pub struct NotifyService {
    settings: SharedSettings,
    rabbitmq_channel: Option<Arc<lapin::Channel>>,
}

impl NotifyService {
    pub fn new(settings: SharedSettings, rabbitmq_channel: Option<Arc<lapin::Channel>>) -> Self {
        Self {
            settings,
            rabbitmq_channel,
        }
    }

    async fn send_to_rabbitmq(&self, notify_task: NotifyTask) -> Result<()> {
        let channel = match &self.rabbitmq_channel {
            Some(channel) => channel,
            None => return Ok(()),
        };

        let settings = self.settings.load();

        let queue_name = settings
            .rabbit_mq
            .as_ref()
            .and_then(|rabbit_mq| rabbit_mq.notify_task_queue.as_ref());

        if let Some(queue_name) = queue_name {
            channel
                .basic_publish(
                    "",
                    queue_name,
                    Default::default(),
                    &serde_json::to_vec(&notify_task).context("Failed to serialize notify_task")?,
                    Default::default(),
                )
                .await?;

            log::debug!("published {} notify task", notify_task.as_kind_str());
        }

        Ok(())
    }

    /// Sends a meeting reminder task to the rabbit mq queue, if configured.
    pub async fn send_meeting_reminder(
        &self,
        recipient: Employee,
        push_subscriptions: Vec<PushSubscription>,
        ctx: &EventContext,
        minutes_before: u32,
    ) -> Result<()> {
        let notify_task = NotifyTask::meeting_reminder(
            recipient,
            to_event(ctx),
            minutes_before,
            push_subscriptions,
        );

        self.send_to_rabbitmq(notify_task).await?;
        Ok(())
    }

    /// Sends a meeting summary task to the rabbit mq queue, if configured.
    pub async fn send_meeting_summary(
        &self,
        recipient: Employee,
        push_subscriptions: Vec<PushSubscription>,
        ctx: &EventContext,
    ) -> Result<()> {
        let notify_task = NotifyTask::meeting_summary(recipient, to_event(ctx), push_subscriptions);

        self.send_to_rabbitmq(notify_task).await?;
        Ok(())
    }
}

// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Delivery loop for due notification tasks
//!
//! Periodically claims due tasks from the durable queue and fans the
//! notifications out to every attendee of the event. A task whose event was
//! deleted after scheduling resolves to a no-op, per-attendee delivery
//! failures are logged and never abort the batch.
use crate::services::notify::{EventContext, NotifyService};
use anyhow::Result;
use chrono::Utc;
use database::{Db, OptionalExt};
use db_storage::employees::{Employee, PushSubscription};
use db_storage::events::Event;
use db_storage::offices::Office;
use db_storage::scheduled_tasks::{ScheduledTask, TaskKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

pub struct NotificationWorker {
    db: Arc<Db>,
    notify: NotifyService,
    poll_interval: Duration,
}

struct DueTask {
    task: ScheduledTask,
    context: EventContext,
    attendees: Vec<(Employee, Vec<PushSubscription>)>,
}

impl NotificationWorker {
    pub fn new(db: Arc<Db>, notify: NotifyService, poll_interval: Duration) -> Self {
        Self {
            db,
            notify,
            poll_interval,
        }
    }

    /// Runs until the shutdown signal fires
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "Notification worker started, polling every {:?}",
            self.poll_interval
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.deliver_due_tasks().await {
                        log::error!("Failed to deliver due notification tasks, {:?}", e);
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        log::info!("Notification worker stopped");
    }

    async fn deliver_due_tasks(&self) -> Result<()> {
        let db = self.db.clone();

        let due = tokio::task::spawn_blocking(move || claim_due_with_context(&db)).await??;

        for due_task in due {
            self.deliver(&due_task).await;
        }

        Ok(())
    }

    async fn deliver(&self, due: &DueTask) {
        for (attendee, push_subscriptions) in &due.attendees {
            let result = match due.task.kind {
                TaskKind::Reminder => {
                    self.notify
                        .send_meeting_reminder(
                            attendee.clone(),
                            push_subscriptions.clone(),
                            &due.context,
                            due.task.lead_minutes.max(0) as u32,
                        )
                        .await
                }
                TaskKind::Summary => {
                    self.notify
                        .send_meeting_summary(
                            attendee.clone(),
                            push_subscriptions.clone(),
                            &due.context,
                        )
                        .await
                }
            };

            if let Err(e) = result {
                log::error!(
                    "Failed to notify {} about event {}, {:?}",
                    attendee.email,
                    due.task.event_id,
                    e
                );
            }
        }
    }
}

/// Atomically claims all due tasks and resolves their event context
///
/// Tasks whose event no longer exists are dropped, the claim already
/// removed them from the queue.
fn claim_due_with_context(db: &Db) -> Result<Vec<DueTask>> {
    let mut conn = db.get_conn()?;

    let tasks = ScheduledTask::claim_due(&mut conn, Utc::now())?;

    let mut due = Vec::with_capacity(tasks.len());

    for task in tasks {
        let event_with_room = Event::get_with_room(&mut conn, task.event_id).optional()?;

        let (event, room) = match event_with_room {
            Some(event_with_room) => event_with_room,
            None => {
                log::debug!(
                    "Dropping {:?} task for vanished event {}",
                    task.kind,
                    task.event_id
                );
                continue;
            }
        };

        let office = Office::get(&mut conn, room.office_id)?;
        let organizer = Employee::get(&mut conn, event.author_id)?;

        let mut attendees = Vec::new();
        for attendee in Event::get_attendees(&mut conn, event.id)? {
            let push_subscriptions = PushSubscription::get_all_for_employee(&mut conn, attendee.id)?;
            attendees.push((attendee, push_subscriptions));
        }

        due.push(DueTask {
            task,
            context: EventContext {
                event,
                room,
                office,
                organizer,
            },
            attendees,
        });
    }

    Ok(due)
}

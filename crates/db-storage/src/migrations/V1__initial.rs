// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use crate::migrations::type_polyfills::datetime;
use barrel::backend::Pg;
use barrel::{types, Migration};

pub fn migration() -> String {
    let mut migr = Migration::new();

    migr.inject_custom("CREATE EXTENSION IF NOT EXISTS pgcrypto");

    migr.inject_custom("CREATE TYPE status AS ENUM ('active', 'inactive')");
    migr.inject_custom(
        "CREATE TYPE recurrence_frequency AS ENUM ('day', 'week', 'month', 'year')",
    );
    migr.inject_custom("CREATE TYPE scheduled_task_kind AS ENUM ('reminder', 'summary')");

    migr.create_table("organizations", |table| {
        table.add_column(
            "id",
            types::custom("UUID PRIMARY KEY DEFAULT gen_random_uuid()"),
        );
        table.add_column("id_serial", types::custom("BIGSERIAL UNIQUE"));

        table.add_column("name", types::varchar(255));
        table.add_column("status", types::custom("status DEFAULT 'active'"));
    });

    migr.create_table("offices", |table| {
        table.add_column(
            "id",
            types::custom("UUID PRIMARY KEY DEFAULT gen_random_uuid()"),
        );
        table.add_column("id_serial", types::custom("BIGSERIAL UNIQUE"));

        table.add_column("name", types::varchar(255));
        table.add_column("city", types::varchar(255));

        // integer hour offset to UTC, -12..=14
        table.add_column("time_zone", types::integer());

        table.add_column(
            "organization_id",
            types::custom("UUID REFERENCES organizations(id) ON DELETE CASCADE"),
        );
    });

    migr.create_table("rooms", |table| {
        table.add_column(
            "id",
            types::custom("UUID PRIMARY KEY DEFAULT gen_random_uuid()"),
        );
        table.add_column("id_serial", types::custom("BIGSERIAL UNIQUE"));

        table.add_column("name", types::varchar(255).unique(true));
        table.add_column("description", types::text());
        table.add_column("size", types::integer());
        table.add_column("status", types::custom("status DEFAULT 'active'"));
        table.add_column("is_public", types::custom("BOOLEAN DEFAULT TRUE"));
        table.add_column("calendar_code", types::varchar(255).nullable(true));
        table.add_column("photo_paths", types::custom("TEXT[] DEFAULT '{}'"));

        table.add_column(
            "office_id",
            types::custom("UUID REFERENCES offices(id) ON DELETE CASCADE"),
        );
    });

    migr.create_table("employees", |table| {
        table.add_column(
            "id",
            types::custom("UUID PRIMARY KEY DEFAULT gen_random_uuid()"),
        );
        table.add_column("id_serial", types::custom("BIGSERIAL UNIQUE"));

        table.add_column("email", types::varchar(255).unique(true));
        table.add_column("name", types::varchar(255));
        table.add_column("surname", types::varchar(255));
        table.add_column("patronymic", types::varchar(255).nullable(true));

        table.add_column(
            "organization_id",
            types::custom("UUID REFERENCES organizations(id) ON DELETE CASCADE"),
        );
    });

    migr.create_table("room_members", |table| {
        table.add_column(
            "room_id",
            types::custom("UUID REFERENCES rooms(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "employee_id",
            types::custom("UUID REFERENCES employees(id) ON DELETE CASCADE"),
        );
    });

    migr.inject_custom("ALTER TABLE room_members ADD PRIMARY KEY (room_id, employee_id)");

    migr.create_table("push_subscriptions", |table| {
        table.add_column(
            "id",
            types::custom("UUID PRIMARY KEY DEFAULT gen_random_uuid()"),
        );
        table.add_column(
            "employee_id",
            types::custom("UUID REFERENCES employees(id) ON DELETE CASCADE"),
        );

        table.add_column("endpoint", types::varchar(2048).unique(true));
        table.add_column("p256dh_key", types::varchar(255));
        table.add_column("auth_token", types::varchar(255));

        table.add_column("created_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
    });

    migr.create_table("events", |table| {
        table.add_column(
            "id",
            types::custom("UUID PRIMARY KEY DEFAULT gen_random_uuid()"),
        );
        table.add_column("id_serial", types::custom("BIGSERIAL UNIQUE"));

        table.add_column("name", types::varchar(255));
        table.add_column("description", types::text());

        table.add_column("date", types::custom("DATE"));
        // time-of-day stored shifted to UTC by the office offset
        table.add_column("time_start", types::custom("TIME"));
        table.add_column("time_end", types::custom("TIME"));

        table.add_column(
            "author_id",
            types::custom("UUID REFERENCES employees(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "room_id",
            types::custom("UUID REFERENCES rooms(id) ON DELETE CASCADE"),
        );

        table.add_column("created_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
        table.add_column("updated_at", types::custom("TIMESTAMPTZ DEFAULT now()"));

        table.add_column(
            "recurrence_frequency",
            types::custom("recurrence_frequency").nullable(true),
        );
        table.add_column("recurrence_interval", types::integer().nullable(true));
        table.add_column("recurrence_end", types::custom("DATE").nullable(true));
        table.add_column(
            "recurrence_parent_id",
            types::custom("UUID REFERENCES events(id) ON DELETE CASCADE").nullable(true),
        );
    });

    migr.create_table("event_attendees", |table| {
        table.add_column(
            "event_id",
            types::custom("UUID REFERENCES events(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "employee_id",
            types::custom("UUID REFERENCES employees(id) ON DELETE CASCADE"),
        );
    });

    migr.inject_custom("ALTER TABLE event_attendees ADD PRIMARY KEY (event_id, employee_id)");

    migr.create_table("scheduled_tasks", |table| {
        table.add_column(
            "id",
            types::custom("UUID PRIMARY KEY DEFAULT gen_random_uuid()"),
        );
        table.add_column(
            "event_id",
            types::custom("UUID REFERENCES events(id) ON DELETE CASCADE"),
        );

        table.add_column("kind", types::custom("scheduled_task_kind"));
        table.add_column("lead_minutes", types::custom("INTEGER DEFAULT 0"));
        table.add_column("fire_at", datetime());
        table.add_column("created_at", types::custom("TIMESTAMPTZ DEFAULT now()"));
    });

    // conflict checks always scan a single room and date
    migr.inject_custom("CREATE INDEX events_room_date_idx ON events(room_id, date)");
    migr.inject_custom("CREATE INDEX events_recurrence_parent_idx ON events(recurrence_parent_id)");
    migr.inject_custom("CREATE INDEX scheduled_tasks_fire_at_idx ON scheduled_tasks(fire_at)");
    migr.inject_custom("CREATE INDEX scheduled_tasks_event_idx ON scheduled_tasks(event_id)");

    migr.make::<Pg>()
}

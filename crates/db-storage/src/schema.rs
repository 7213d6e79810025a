// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

diesel::table! {
    use crate::sql_types::*;

    organizations (id) {
        id -> Uuid,
        id_serial -> Int8,
        name -> Varchar,
        status -> Status,
    }
}

diesel::table! {
    use crate::sql_types::*;

    offices (id) {
        id -> Uuid,
        id_serial -> Int8,
        name -> Varchar,
        city -> Varchar,
        time_zone -> Int4,
        organization_id -> Uuid,
    }
}

diesel::table! {
    use crate::sql_types::*;

    rooms (id) {
        id -> Uuid,
        id_serial -> Int8,
        name -> Varchar,
        description -> Text,
        size -> Int4,
        status -> Status,
        is_public -> Bool,
        calendar_code -> Nullable<Varchar>,
        photo_paths -> Array<Text>,
        office_id -> Uuid,
    }
}

diesel::table! {
    use crate::sql_types::*;

    room_members (room_id, employee_id) {
        room_id -> Uuid,
        employee_id -> Uuid,
    }
}

diesel::table! {
    use crate::sql_types::*;

    employees (id) {
        id -> Uuid,
        id_serial -> Int8,
        email -> Varchar,
        name -> Varchar,
        surname -> Varchar,
        patronymic -> Nullable<Varchar>,
        organization_id -> Uuid,
    }
}

diesel::table! {
    use crate::sql_types::*;

    push_subscriptions (id) {
        id -> Uuid,
        employee_id -> Uuid,
        endpoint -> Varchar,
        p256dh_key -> Varchar,
        auth_token -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use crate::sql_types::*;

    events (id) {
        id -> Uuid,
        id_serial -> Int8,
        name -> Varchar,
        description -> Text,
        date -> Date,
        time_start -> Time,
        time_end -> Time,
        author_id -> Uuid,
        room_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        recurrence_frequency -> Nullable<RecurrenceFrequency>,
        recurrence_interval -> Nullable<Int4>,
        recurrence_end -> Nullable<Date>,
        recurrence_parent_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    use crate::sql_types::*;

    event_attendees (event_id, employee_id) {
        event_id -> Uuid,
        employee_id -> Uuid,
    }
}

diesel::table! {
    use crate::sql_types::*;

    scheduled_tasks (id) {
        id -> Uuid,
        event_id -> Uuid,
        kind -> ScheduledTaskKind,
        lead_minutes -> Int4,
        fire_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(offices -> organizations (organization_id));
diesel::joinable!(rooms -> offices (office_id));
diesel::joinable!(room_members -> rooms (room_id));
diesel::joinable!(room_members -> employees (employee_id));
diesel::joinable!(employees -> organizations (organization_id));
diesel::joinable!(push_subscriptions -> employees (employee_id));
diesel::joinable!(events -> rooms (room_id));
diesel::joinable!(events -> employees (author_id));
diesel::joinable!(event_attendees -> events (event_id));
diesel::joinable!(event_attendees -> employees (employee_id));
diesel::joinable!(scheduled_tasks -> events (event_id));

diesel::allow_tables_to_appear_in_same_query!(
    organizations,
    offices,
    rooms,
    room_members,
    employees,
    push_subscriptions,
    events,
    event_attendees,
    scheduled_tasks,
);

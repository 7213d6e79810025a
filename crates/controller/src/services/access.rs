// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Room visibility and event edit rules
use db_storage::employees::{Employee, EmployeeId};
use db_storage::events::Event;
use db_storage::rooms::Room;

/// An employee can access a public room or a private room listing them
pub fn room_accessible(room: &Room, members: &[EmployeeId], employee: EmployeeId) -> bool {
    room.is_public || members.contains(&employee)
}

/// Only the author may edit an event
pub fn can_edit(event: &Event, employee: &Employee) -> bool {
    event.author_id == employee.id
}

#[cfg(test)]
mod test {
    use super::*;
    use db_storage::offices::OfficeId;
    use db_storage::rooms::RoomId;
    use db_storage::Status;
    use uuid::Uuid;

    fn room(is_public: bool) -> Room {
        Room {
            id: RoomId::from(Uuid::from_u128(1)),
            id_serial: 1,
            name: "Blue Room".into(),
            description: "".into(),
            size: 5,
            status: Status::Active,
            is_public,
            calendar_code: None,
            photo_paths: vec![],
            office_id: OfficeId::from(Uuid::from_u128(2)),
        }
    }

    #[test]
    fn public_rooms_are_accessible_to_everyone() {
        let employee = EmployeeId::from(Uuid::from_u128(10));

        assert!(room_accessible(&room(true), &[], employee));
    }

    #[test]
    fn private_rooms_require_membership() {
        let member = EmployeeId::from(Uuid::from_u128(10));
        let stranger = EmployeeId::from(Uuid::from_u128(11));

        let room = room(false);

        assert!(room_accessible(&room, &[member], member));
        assert!(!room_accessible(&room, &[member], stranger));
    }
}

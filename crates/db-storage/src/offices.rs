// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Office specific database structs and queries
use crate::organizations::OrganizationId;
use crate::schema::offices;
use database::{DbConnection, Paginate, Result};
use diesel::prelude::*;

diesel_newtype! {
    #[derive(Copy)] OfficeId(uuid::Uuid)
}

/// An office of an organization
///
/// All events in rooms of this office are entered in the offices wall-clock
/// time, `time_zone` is the integer hour offset to UTC.
#[derive(Debug, Clone, Queryable, Identifiable, PartialEq)]
#[diesel(table_name = offices)]
pub struct Office {
    pub id: OfficeId,
    pub id_serial: i64,
    pub name: String,
    pub city: String,
    pub time_zone: i32,
    pub organization_id: OrganizationId,
}

impl Office {
    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, office_id: OfficeId) -> Result<Office> {
        let query = offices::table.filter(offices::id.eq(office_id));

        let office = query.first(conn)?;

        Ok(office)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_organization(
        conn: &mut DbConnection,
        organization_id: OrganizationId,
    ) -> Result<Vec<Office>> {
        let query = offices::table
            .filter(offices::organization_id.eq(organization_id))
            .order_by(offices::id_serial.desc());

        let offices = query.load(conn)?;

        Ok(offices)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_paginated(
        conn: &mut DbConnection,
        limit: i64,
        page: i64,
    ) -> Result<(Vec<Office>, i64)> {
        let query = offices::table
            .order_by(offices::id_serial.desc())
            .paginate_by(limit, page);

        let offices = query.load_and_count(conn)?;

        Ok(offices)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete_by_id(conn: &mut DbConnection, office_id: OfficeId) -> Result<()> {
        diesel::delete(offices::table)
            .filter(offices::id.eq(office_id))
            .execute(conn)?;

        Ok(())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = offices)]
pub struct NewOffice {
    pub name: String,
    pub city: String,
    pub time_zone: i32,
    pub organization_id: OrganizationId,
}

impl NewOffice {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Office> {
        let query = self.insert_into(offices::table);

        let office = query.get_result(conn)?;

        Ok(office)
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = offices)]
pub struct UpdateOffice {
    pub name: Option<String>,
    pub city: Option<String>,
    pub time_zone: Option<i32>,
    pub organization_id: Option<OrganizationId>,
}

impl UpdateOffice {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(self, conn: &mut DbConnection, office_id: OfficeId) -> Result<Office> {
        let query = diesel::update(offices::table)
            .filter(offices::id.eq(office_id))
            .set(self)
            .returning(offices::all_columns);

        let office = query.get_result(conn)?;

        Ok(office)
    }
}

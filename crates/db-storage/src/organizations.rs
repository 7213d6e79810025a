// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Organization specific database structs and queries
use crate::schema::{offices, organizations, rooms};
use crate::Status;
use database::{DbConnection, Paginate, Result};
use diesel::prelude::*;

diesel_newtype! {
    #[derive(Copy)] OrganizationId(uuid::Uuid)
}

#[derive(Debug, Clone, Queryable, Identifiable, PartialEq)]
#[diesel(table_name = organizations)]
pub struct Organization {
    pub id: OrganizationId,
    pub id_serial: i64,
    pub name: String,
    pub status: Status,
}

impl Organization {
    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, organization_id: OrganizationId) -> Result<Organization> {
        let query = organizations::table.filter(organizations::id.eq(organization_id));

        let organization = query.first(conn)?;

        Ok(organization)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_paginated(
        conn: &mut DbConnection,
        limit: i64,
        page: i64,
    ) -> Result<(Vec<Organization>, i64)> {
        let query = organizations::table
            .order_by(organizations::id_serial.desc())
            .paginate_by(limit, page);

        let organizations = query.load_and_count(conn)?;

        Ok(organizations)
    }

    /// Sets every room in every office of the organization inactive
    ///
    /// Used when an organization gets deactivated.
    #[tracing::instrument(err, skip_all)]
    pub fn deactivate_rooms(
        conn: &mut DbConnection,
        organization_id: OrganizationId,
    ) -> Result<usize> {
        let office_ids = offices::table
            .filter(offices::organization_id.eq(organization_id))
            .select(offices::id);

        let updated = diesel::update(rooms::table.filter(rooms::office_id.eq_any(office_ids)))
            .set(rooms::status.eq(Status::Inactive))
            .execute(conn)?;

        Ok(updated)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete_by_id(conn: &mut DbConnection, organization_id: OrganizationId) -> Result<()> {
        diesel::delete(organizations::table)
            .filter(organizations::id.eq(organization_id))
            .execute(conn)?;

        Ok(())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = organizations)]
pub struct NewOrganization {
    pub name: String,
    pub status: Status,
}

impl NewOrganization {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Organization> {
        let query = self.insert_into(organizations::table);

        let organization = query.get_result(conn)?;

        Ok(organization)
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = organizations)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub status: Option<Status>,
}

impl UpdateOrganization {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(
        self,
        conn: &mut DbConnection,
        organization_id: OrganizationId,
    ) -> Result<Organization> {
        let query = diesel::update(organizations::table)
            .filter(organizations::id.eq(organization_id))
            .set(self)
            .returning(organizations::all_columns);

        let organization = query.get_result(conn)?;

        Ok(organization)
    }
}

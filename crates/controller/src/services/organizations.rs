// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Organization management
//!
//! Deactivating an organization cascades onto its meeting rooms, every
//! room in every office of the organization is set inactive.
use crate::services::error::ServiceError;
use database::{Db, OptionalExt};
use db_storage::organizations::{NewOrganization, Organization, OrganizationId, UpdateOrganization};
use db_storage::Status;
use diesel::Connection;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default = "default_status")]
    pub status: Status,
}

fn default_status() -> Status {
    Status::Active
}

/// Sparse patch of an organization, absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchOrganizationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub status: Option<Status>,
}

#[derive(Clone)]
pub struct OrganizationService {
    db: Arc<Db>,
}

impl OrganizationService {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn create(
        &self,
        request: CreateOrganizationRequest,
    ) -> Result<Organization, ServiceError> {
        request.validate()?;

        let mut conn = self.db.get_conn()?;

        let organization = NewOrganization {
            name: request.name,
            status: request.status,
        }
        .insert(&mut conn)?;

        Ok(organization)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn update(
        &self,
        organization_id: OrganizationId,
        patch: PatchOrganizationRequest,
    ) -> Result<Organization, ServiceError> {
        patch.validate()?;

        let mut conn = self.db.get_conn()?;

        let organization = conn.transaction::<_, ServiceError, _>(|conn| {
            let organization = Organization::get(conn, organization_id)
                .optional()?
                .ok_or_else(|| {
                    ServiceError::not_found("organization", *organization_id.inner())
                })?;

            if patch.name.is_none() && patch.status.is_none() {
                return Ok(organization);
            }

            let deactivated =
                patch.status == Some(Status::Inactive) && organization.status == Status::Active;

            let organization = UpdateOrganization {
                name: patch.name,
                status: patch.status,
            }
            .apply(conn, organization_id)?;

            if deactivated {
                let rooms = Organization::deactivate_rooms(conn, organization.id)?;
                log::info!(
                    "organization {} deactivated, {rooms} meeting rooms set inactive",
                    organization.id
                );
            }

            Ok(organization)
        })?;

        Ok(organization)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(&self, organization_id: OrganizationId) -> Result<Organization, ServiceError> {
        let mut conn = self.db.get_conn()?;

        Organization::get(&mut conn, organization_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("organization", *organization_id.inner()))
    }

    #[tracing::instrument(err, skip_all)]
    pub fn list(&self, limit: i64, page: i64) -> Result<(Vec<Organization>, i64), ServiceError> {
        let mut conn = self.db.get_conn()?;

        Ok(Organization::get_all_paginated(&mut conn, limit, page)?)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete(&self, organization_id: OrganizationId) -> Result<(), ServiceError> {
        let mut conn = self.db.get_conn()?;

        Organization::get(&mut conn, organization_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("organization", *organization_id.inner()))?;

        Organization::delete_by_id(&mut conn, organization_id)?;

        Ok(())
    }
}

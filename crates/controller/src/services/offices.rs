// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Office management
use crate::services::error::ServiceError;
use database::{Db, OptionalExt};
use db_storage::offices::{NewOffice, Office, OfficeId, UpdateOffice};
use db_storage::organizations::{Organization, OrganizationId};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOfficeRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 255))]
    pub city: String,

    /// Integer hour offset of the office to UTC
    #[validate(range(min = -12, max = 14))]
    pub time_zone: i32,

    pub organization_id: OrganizationId,
}

/// Sparse patch of an office, absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchOfficeRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub city: Option<String>,

    #[validate(range(min = -12, max = 14))]
    pub time_zone: Option<i32>,

    pub organization_id: Option<OrganizationId>,
}

#[derive(Clone)]
pub struct OfficeService {
    db: Arc<Db>,
}

impl OfficeService {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn create(&self, request: CreateOfficeRequest) -> Result<Office, ServiceError> {
        request.validate()?;

        let mut conn = self.db.get_conn()?;

        Organization::get(&mut conn, request.organization_id)
            .optional()?
            .ok_or_else(|| {
                ServiceError::not_found("organization", *request.organization_id.inner())
            })?;

        let office = NewOffice {
            name: request.name,
            city: request.city,
            time_zone: request.time_zone,
            organization_id: request.organization_id,
        }
        .insert(&mut conn)?;

        Ok(office)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn update(
        &self,
        office_id: OfficeId,
        patch: PatchOfficeRequest,
    ) -> Result<Office, ServiceError> {
        patch.validate()?;

        let mut conn = self.db.get_conn()?;

        let office = Office::get(&mut conn, office_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("office", *office_id.inner()))?;

        if patch.name.is_none()
            && patch.city.is_none()
            && patch.time_zone.is_none()
            && patch.organization_id.is_none()
        {
            return Ok(office);
        }

        if let Some(organization_id) = patch.organization_id {
            Organization::get(&mut conn, organization_id)
                .optional()?
                .ok_or_else(|| {
                    ServiceError::not_found("organization", *organization_id.inner())
                })?;
        }

        let office = UpdateOffice {
            name: patch.name,
            city: patch.city,
            time_zone: patch.time_zone,
            organization_id: patch.organization_id,
        }
        .apply(&mut conn, office_id)?;

        Ok(office)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(&self, office_id: OfficeId) -> Result<Office, ServiceError> {
        let mut conn = self.db.get_conn()?;

        Office::get(&mut conn, office_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("office", *office_id.inner()))
    }

    #[tracing::instrument(err, skip_all)]
    pub fn list(&self, limit: i64, page: i64) -> Result<(Vec<Office>, i64), ServiceError> {
        let mut conn = self.db.get_conn()?;

        Ok(Office::get_all_paginated(&mut conn, limit, page)?)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete(&self, office_id: OfficeId) -> Result<(), ServiceError> {
        let mut conn = self.db.get_conn()?;

        Office::get(&mut conn, office_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("office", *office_id.inner()))?;

        Office::delete_by_id(&mut conn, office_id)?;

        Ok(())
    }
}

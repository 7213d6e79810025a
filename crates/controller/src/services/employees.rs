// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Employee management and push subscription registration
use crate::services::error::ServiceError;
use database::{Db, OptionalExt};
use db_storage::employees::{
    Employee, EmployeeId, NewEmployee, NewPushSubscription, PushSubscription, UpdateEmployee,
};
use db_storage::organizations::{Organization, OrganizationId};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 255))]
    pub surname: String,

    pub patronymic: Option<String>,

    pub organization_id: OrganizationId,
}

/// Sparse patch of an employee, absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchEmployeeRequest {
    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub surname: Option<String>,

    pub patronymic: Option<Option<String>>,

    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPushSubscriptionRequest {
    #[validate(url)]
    pub endpoint: String,

    #[validate(length(min = 1))]
    pub p256dh_key: String,

    #[validate(length(min = 1))]
    pub auth_token: String,
}

#[derive(Clone)]
pub struct EmployeeService {
    db: Arc<Db>,
}

impl EmployeeService {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn create(&self, request: CreateEmployeeRequest) -> Result<Employee, ServiceError> {
        request.validate()?;

        let mut conn = self.db.get_conn()?;

        Organization::get(&mut conn, request.organization_id)
            .optional()?
            .ok_or_else(|| {
                ServiceError::not_found("organization", *request.organization_id.inner())
            })?;

        let employee = NewEmployee {
            email: request.email,
            name: request.name,
            surname: request.surname,
            patronymic: request.patronymic,
            organization_id: request.organization_id,
        }
        .insert(&mut conn)?;

        Ok(employee)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn update(
        &self,
        employee_id: EmployeeId,
        patch: PatchEmployeeRequest,
    ) -> Result<Employee, ServiceError> {
        patch.validate()?;

        let mut conn = self.db.get_conn()?;

        let employee = Employee::get(&mut conn, employee_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("employee", *employee_id.inner()))?;

        if patch.email.is_none()
            && patch.name.is_none()
            && patch.surname.is_none()
            && patch.patronymic.is_none()
            && patch.organization_id.is_none()
        {
            return Ok(employee);
        }

        if let Some(organization_id) = patch.organization_id {
            Organization::get(&mut conn, organization_id)
                .optional()?
                .ok_or_else(|| {
                    ServiceError::not_found("organization", *organization_id.inner())
                })?;
        }

        let employee = UpdateEmployee {
            email: patch.email,
            name: patch.name,
            surname: patch.surname,
            patronymic: patch.patronymic,
            organization_id: patch.organization_id,
        }
        .apply(&mut conn, employee_id)?;

        Ok(employee)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(&self, employee_id: EmployeeId) -> Result<Employee, ServiceError> {
        let mut conn = self.db.get_conn()?;

        Employee::get(&mut conn, employee_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("employee", *employee_id.inner()))
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete(&self, employee_id: EmployeeId) -> Result<(), ServiceError> {
        let mut conn = self.db.get_conn()?;

        Employee::get(&mut conn, employee_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("employee", *employee_id.inner()))?;

        Employee::delete_by_id(&mut conn, employee_id)?;

        Ok(())
    }

    /// Registers a push endpoint for the employee
    ///
    /// Registering an already known endpoint is a no-op.
    #[tracing::instrument(err, skip_all)]
    pub fn register_push_subscription(
        &self,
        employee_id: EmployeeId,
        request: RegisterPushSubscriptionRequest,
    ) -> Result<Option<PushSubscription>, ServiceError> {
        request.validate()?;

        let mut conn = self.db.get_conn()?;

        Employee::get(&mut conn, employee_id)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("employee", *employee_id.inner()))?;

        let subscription = NewPushSubscription {
            employee_id,
            endpoint: request.endpoint,
            p256dh_key: request.p256dh_key,
            auth_token: request.auth_token,
        }
        .try_insert(&mut conn)?;

        Ok(subscription)
    }

    /// Removes a push endpoint, returns true when something was removed
    #[tracing::instrument(err, skip_all)]
    pub fn remove_push_subscription(
        &self,
        employee_id: EmployeeId,
        endpoint: &str,
    ) -> Result<bool, ServiceError> {
        let mut conn = self.db.get_conn()?;

        Ok(PushSubscription::delete_by_endpoint(
            &mut conn,
            employee_id,
            endpoint,
        )?)
    }
}

// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Employee specific database structs and queries
use crate::organizations::OrganizationId;
use crate::schema::{employees, push_subscriptions};
use chrono::{DateTime, Utc};
use database::{DbConnection, Result};
use diesel::prelude::*;

diesel_newtype! {
    #[derive(Copy)] EmployeeId(uuid::Uuid),
    #[derive(Copy)] PushSubscriptionId(uuid::Uuid)
}

#[derive(Debug, Clone, Queryable, Identifiable, PartialEq)]
#[diesel(table_name = employees)]
pub struct Employee {
    pub id: EmployeeId,
    pub id_serial: i64,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub organization_id: OrganizationId,
}

impl Employee {
    /// Full display name of the employee
    pub fn full_name(&self) -> String {
        match &self.patronymic {
            Some(patronymic) => format!("{} {} {}", self.surname, self.name, patronymic),
            None => format!("{} {}", self.surname, self.name),
        }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, employee_id: EmployeeId) -> Result<Employee> {
        let query = employees::table.filter(employees::id.eq(employee_id));

        let employee = query.first(conn)?;

        Ok(employee)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_by_ids(conn: &mut DbConnection, ids: &[EmployeeId]) -> Result<Vec<Employee>> {
        let query = employees::table.filter(employees::id.eq_any(ids));

        let employees = query.load(conn)?;

        Ok(employees)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_by_email(conn: &mut DbConnection, email: &str) -> Result<Employee> {
        let query = employees::table.filter(employees::email.eq(email));

        let employee = query.first(conn)?;

        Ok(employee)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete_by_id(conn: &mut DbConnection, employee_id: EmployeeId) -> Result<()> {
        diesel::delete(employees::table)
            .filter(employees::id.eq(employee_id))
            .execute(conn)?;

        Ok(())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = employees)]
pub struct NewEmployee {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub organization_id: OrganizationId,
}

impl NewEmployee {
    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Employee> {
        let query = self.insert_into(employees::table);

        let employee = query.get_result(conn)?;

        Ok(employee)
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = employees)]
pub struct UpdateEmployee {
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<Option<String>>,
    pub organization_id: Option<OrganizationId>,
}

impl UpdateEmployee {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(self, conn: &mut DbConnection, employee_id: EmployeeId) -> Result<Employee> {
        let query = diesel::update(employees::table)
            .filter(employees::id.eq(employee_id))
            .set(self)
            .returning(employees::all_columns);

        let employee = query.get_result(conn)?;

        Ok(employee)
    }
}

/// A registered web-push endpoint of an employee
///
/// Reminder and summary notifications fan out to every subscription of an
/// attendee, delivery itself is handled by the external notification worker.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, PartialEq)]
#[diesel(table_name = push_subscriptions, belongs_to(Employee, foreign_key = employee_id))]
pub struct PushSubscription {
    pub id: PushSubscriptionId,
    pub employee_id: EmployeeId,
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_token: String,
    pub created_at: DateTime<Utc>,
}

impl PushSubscription {
    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_employee(
        conn: &mut DbConnection,
        employee_id: EmployeeId,
    ) -> Result<Vec<PushSubscription>> {
        let query = push_subscriptions::table
            .filter(push_subscriptions::employee_id.eq(employee_id))
            .order_by(push_subscriptions::created_at.asc());

        let subscriptions = query.load(conn)?;

        Ok(subscriptions)
    }

    /// Deletes the subscription with the given endpoint
    ///
    /// Returns true if something was deleted
    #[tracing::instrument(err, skip_all)]
    pub fn delete_by_endpoint(
        conn: &mut DbConnection,
        employee_id: EmployeeId,
        endpoint: &str,
    ) -> Result<bool> {
        let lines_changed = diesel::delete(push_subscriptions::table)
            .filter(
                push_subscriptions::employee_id
                    .eq(employee_id)
                    .and(push_subscriptions::endpoint.eq(endpoint)),
            )
            .execute(conn)?;

        Ok(lines_changed > 0)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = push_subscriptions)]
pub struct NewPushSubscription {
    pub employee_id: EmployeeId,
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_token: String,
}

impl NewPushSubscription {
    /// Tries to insert the subscription into the database
    ///
    /// When yielding a unique key violation, None is returned.
    #[tracing::instrument(err, skip_all)]
    pub fn try_insert(self, conn: &mut DbConnection) -> Result<Option<PushSubscription>> {
        let query = self.insert_into(push_subscriptions::table);

        let result = query.get_result(conn);

        match result {
            Ok(subscription) => Ok(Some(subscription)),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                ..,
            )) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

/// Allows to create one or more typed uuid ids
///
/// Defines the type and implements a variety of traits for it to be usable with diesel.
/// See <https://stackoverflow.com/a/59948116> for more information.
#[macro_export]
macro_rules! diesel_newtype {
    ($($(#[$meta:meta])* $name:ident(uuid::Uuid)),+ $(,)?) => {
        $(
            pub use __newtype_impl::$name;
        )+

        mod __newtype_impl {
            use diesel::backend::Backend;
            use diesel::deserialize::{self, FromSql};
            use diesel::serialize::{self, Output, ToSql};
            use serde::{Deserialize, Serialize};
            use std::fmt;

            $(

            #[derive(
                Debug,
                Clone,
                PartialEq,
                Eq,
                PartialOrd,
                Ord,
                Hash,
                Serialize,
                Deserialize,
                diesel::AsExpression,
                diesel::FromSqlRow,
            )]
            $(#[$meta])*
            #[diesel(sql_type = diesel::sql_types::Uuid)]
            pub struct $name(uuid::Uuid);

            impl $name {
                pub const fn from(inner: uuid::Uuid) -> Self {
                    Self(inner)
                }

                /// Generate a new random id
                pub fn generate() -> Self {
                    Self(uuid::Uuid::new_v4())
                }

                pub fn inner(&self) -> &uuid::Uuid {
                    &self.0
                }

                pub fn into_inner(self) -> uuid::Uuid {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl<DB> ToSql<diesel::sql_types::Uuid, DB> for $name
            where
                DB: Backend,
                uuid::Uuid: ToSql<diesel::sql_types::Uuid, DB>,
            {
                fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
                    self.0.to_sql(out)
                }
            }

            impl<DB> FromSql<diesel::sql_types::Uuid, DB> for $name
            where
                DB: Backend,
                uuid::Uuid: FromSql<diesel::sql_types::Uuid, DB>,
            {
                fn from_sql(bytes: <DB as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                    <uuid::Uuid as FromSql<diesel::sql_types::Uuid, DB>>::from_sql(bytes).map(Self)
                }
            }

            )+
        }
    };
}

/// Defines a rust enum mapped to a postgres enum type
///
/// Generates the marker struct for the SQL type and the to/from sql
/// conversions for the given variant/value pairs.
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$enum_meta:meta])*
        $name:ident,
        $sql_type_name:literal,
        $type_name:ident,
        {
            $($variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, diesel::sql_types::SqlType)]
        #[diesel(postgres_type(name = $sql_type_name))]
        pub struct $type_name;

        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, diesel::AsExpression, diesel::FromSqlRow)]
        #[diesel(sql_type = $type_name)]
        pub enum $name {
            $($variant),+
        }

        impl diesel::serialize::ToSql<$type_name, diesel::pg::Pg> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                match *self {
                    $(
                        Self::$variant => std::io::Write::write_all(out, $value)?,
                    )+
                }

                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<$type_name, diesel::pg::Pg> for $name {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                match bytes.as_bytes() {
                    $(
                        $value => Ok(Self::$variant),
                    )+
                    _ => Err(concat!("unrecognized ", $sql_type_name, " variant").into()),
                }
            }
        }
    };
}

//! SeaORM-backed tenant and usage storage.
//!
//! Reads company records from the `users` table and counts rows in the
//! `packages` and `bookings` tables.
//!
//! # Example
//!
//! ```rust,ignore
//! use umrah_entitlements::subscription::{Plans, SeaOrmSubscriptionStore, SubscriptionEnforcer};
//!
//! let store = SeaOrmSubscriptionStore::new(db.clone());
//! let enforcer = SubscriptionEnforcer::new(store.clone(), store, Plans::standard());
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    entity::prelude::*, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

use super::storage::{SubscriptionStatus, Tenant, TenantStore, TenantUpdate, UsageStore};
use crate::error::Result;

mod entity {
    pub mod users {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "users")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub role: String,
            pub subscription_status: String,
            pub subscription_plan: Option<String>,
            pub subscription_end_date: Option<DateTimeWithTimeZone>,
            pub trial_end_date: Option<DateTimeWithTimeZone>,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod packages {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "packages")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub company_id: String,
            pub created_at: DateTimeWithTimeZone,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod bookings {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "bookings")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub company_id: String,
            pub created_at: DateTimeWithTimeZone,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

use entity::{bookings, packages, users};

fn model_to_tenant(model: users::Model) -> Tenant {
    Tenant {
        id: model.id,
        role: model.role,
        subscription_status: SubscriptionStatus::parse(&model.subscription_status),
        subscription_plan: model.subscription_plan,
        subscription_end_date: model.subscription_end_date.map(|d| d.with_timezone(&Utc)),
        trial_end_date: model.trial_end_date.map(|d| d.with_timezone(&Utc)),
    }
}

fn to_db_time(value: Option<DateTime<Utc>>) -> Option<DateTimeWithTimeZone> {
    value.map(|d| d.fixed_offset())
}

/// Build the UPDATE for a partial tenant update. `None` when nothing is set.
fn build_tenant_update(tenant_id: &str, update: &TenantUpdate) -> Option<sea_orm::UpdateMany<users::Entity>> {
    if *update == TenantUpdate::default() {
        return None;
    }

    let mut query = users::Entity::update_many();

    if let Some(status) = update.subscription_status {
        query = query.col_expr(users::Column::SubscriptionStatus, Expr::value(status.as_str()));
    }
    if let Some(plan) = &update.subscription_plan {
        query = query.col_expr(users::Column::SubscriptionPlan, Expr::value(plan.clone()));
    }
    if let Some(end) = update.subscription_end_date {
        query = query.col_expr(users::Column::SubscriptionEndDate, Expr::value(to_db_time(end)));
    }
    if let Some(end) = update.trial_end_date {
        query = query.col_expr(users::Column::TrialEndDate, Expr::value(to_db_time(end)));
    }

    Some(query.filter(users::Column::Id.eq(tenant_id)))
}

/// SeaORM-backed store implementing both [`TenantStore`] and [`UsageStore`].
///
/// Photo counts use the trait default of zero.
#[derive(Clone, Debug)]
pub struct SeaOrmSubscriptionStore {
    db: DatabaseConnection,
}

impl SeaOrmSubscriptionStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get a reference to the underlying database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl TenantStore for SeaOrmSubscriptionStore {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>> {
        tracing::debug!(tenant_id = %tenant_id, "fetching tenant");

        let model = users::Entity::find_by_id(tenant_id).one(&self.db).await?;
        Ok(model.map(model_to_tenant))
    }

    async fn update(&self, tenant_id: &str, update: &TenantUpdate) -> Result<()> {
        let Some(query) = build_tenant_update(tenant_id, update) else {
            return Ok(());
        };

        let result = query.exec(&self.db).await?;
        tracing::debug!(
            tenant_id = %tenant_id,
            rows_affected = result.rows_affected,
            "tenant updated"
        );

        Ok(())
    }
}

#[async_trait]
impl UsageStore for SeaOrmSubscriptionStore {
    async fn count_packages(&self, tenant_id: &str) -> Result<u64> {
        let count = packages::Entity::find()
            .filter(packages::Column::CompanyId.eq(tenant_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_bookings_since(&self, tenant_id: &str, since: DateTime<Utc>) -> Result<u64> {
        let count = bookings::Entity::find()
            .filter(bookings::Column::CompanyId.eq(tenant_id))
            .filter(bookings::Column::CreatedAt.gte(since.fixed_offset()))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

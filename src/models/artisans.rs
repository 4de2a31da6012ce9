use sea_orm::entity::prelude::*;
use serde::Serialize;

use super::account::{Account, AccountKind, AccountTable, PaymentStatus, SubscriptionStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "artisans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub artisan_type: Option<String>,
    pub experience: Option<String>,
    pub certification: Option<String>,
    /// Créneaux de disponibilité stockés en JSON
    pub disponibilite: Option<Json>,
    pub image: Option<String>,
    pub image_proof_of_work: Option<String>,
    pub role: String,
    pub email_verified: bool,
    pub subscription_plan: String,
    pub subscription_status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub subscription_start_date: Option<DateTimeUtc>,
    pub subscription_end_date: Option<DateTimeUtc>,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::artisan_offers::Entity")]
    Offers,

    #[sea_orm(has_many = "super::artisan_reviews::Entity")]
    Reviews,
}

impl Related<super::artisan_offers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offers.def()
    }
}

impl Related<super::artisan_reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl AccountTable for Entity {
    const KIND: AccountKind = AccountKind::Artisan;

    fn id_column() -> Column {
        Column::Id
    }
    fn email_column() -> Column {
        Column::Email
    }
    fn password_column() -> Column {
        Column::PasswordHash
    }
    fn email_verified_column() -> Column {
        Column::EmailVerified
    }
    fn plan_column() -> Column {
        Column::SubscriptionPlan
    }
    fn status_column() -> Column {
        Column::SubscriptionStatus
    }
    fn payment_column() -> Column {
        Column::PaymentStatus
    }
    fn start_column() -> Column {
        Column::SubscriptionStartDate
    }
    fn end_column() -> Column {
        Column::SubscriptionEndDate
    }
    fn wrap(model: Model) -> Account {
        Account::Artisan(model)
    }
}

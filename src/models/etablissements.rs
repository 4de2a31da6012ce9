use sea_orm::entity::prelude::*;
use serde::Serialize;

use super::account::{Account, AccountKind, AccountTable, PaymentStatus, SubscriptionStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "etablissements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name_of_etablissement: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Startup, Agence ou Societe
    pub type_of_etablissement: String,
    pub since: Option<String>,
    pub employees_count: Option<i32>,
    pub localisation: Option<String>,
    pub secteur: Option<String>,
    pub image: Option<String>,
    pub image_of_status_proof: Option<String>,
    pub has_new_postulant: bool,
    pub role: String,
    pub email_verified: bool,
    pub subscription_plan: String,
    pub subscription_status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub subscription_start_date: Option<DateTimeUtc>,
    pub subscription_end_date: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::etablissement_offers::Entity")]
    Offers,

    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::etablissement_offers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offers.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl AccountTable for Entity {
    const KIND: AccountKind = AccountKind::Etablissement;

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
        Account::Etablissement(model)
    }
}

/// Normalise le type d'établissement saisi ("agence", "SOCIÉTÉ"...)
pub fn normalize_type(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "startup" => Some("Startup"),
        "agence" => Some("Agence"),
        "societe" | "société" => Some("Societe"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type(" startup "), Some("Startup"));
        assert_eq!(normalize_type("AGENCE"), Some("Agence"));
        assert_eq!(normalize_type("Société"), Some("Societe"));
        assert_eq!(normalize_type("cooperative"), None);
    }
}

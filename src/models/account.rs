// ============================================================================
// COMPTES : USER / ARTISAN / ETABLISSEMENT
// ============================================================================
//
// Les trois types de comptes partagent l'e-mail (unique tous types confondus),
// le mot de passe haché et la fenêtre d'abonnement. `AccountTable` expose ces
// colonnes communes pour écrire une seule fois les requêtes génériques, et
// `Account` porte le compte résolu une fois à la frontière HTTP.
//
// Ordre de résolution d'un e-mail : user, puis artisan, puis etablissement.
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{artisans, etablissements, users};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "artisan")]
    Artisan,
    #[sea_orm(string_value = "etablissement")]
    Etablissement,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::User => "user",
            AccountKind::Artisan => "artisan",
            AccountKind::Etablissement => "etablissement",
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "payed")]
    Payed,
    #[sea_orm(string_value = "non_payed")]
    NonPayed,
}

impl PaymentStatus {
    /// Accepte les variantes envoyées par le front et par le webhook de paiement
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "payed" | "paid" | "payer" => Some(PaymentStatus::Payed),
            "non_payed" | "non-payed" | "unpaid" | "non_payer" | "nonpayer" => {
                Some(PaymentStatus::NonPayed)
            }
            _ => None,
        }
    }
}

/// Référence typée vers un compte, sans le charger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub kind: AccountKind,
    pub id: i32,
}

impl AccountRef {
    pub fn new(kind: AccountKind, id: i32) -> Self {
        Self { kind, id }
    }
}

/// Compte chargé depuis l'une des trois tables
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Account {
    User(users::Model),
    Artisan(artisans::Model),
    Etablissement(etablissements::Model),
}

impl Account {
    pub fn kind(&self) -> AccountKind {
        match self {
            Account::User(_) => AccountKind::User,
            Account::Artisan(_) => AccountKind::Artisan,
            Account::Etablissement(_) => AccountKind::Etablissement,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Account::User(u) => u.id,
            Account::Artisan(a) => a.id,
            Account::Etablissement(e) => e.id,
        }
    }

    pub fn reference(&self) -> AccountRef {
        AccountRef::new(self.kind(), self.id())
    }

    pub fn email(&self) -> &str {
        match self {
            Account::User(u) => &u.email,
            Account::Artisan(a) => &a.email,
            Account::Etablissement(e) => &e.email,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Account::User(u) => &u.password_hash,
            Account::Artisan(a) => &a.password_hash,
            Account::Etablissement(e) => &e.password_hash,
        }
    }

    pub fn email_verified(&self) -> bool {
        match self {
            Account::User(u) => u.email_verified,
            Account::Artisan(a) => a.email_verified,
            Account::Etablissement(e) => e.email_verified,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Account::User(u) => u.full_name(),
            Account::Artisan(a) => a.full_name(),
            Account::Etablissement(e) => e.name_of_etablissement.clone(),
        }
    }

    pub fn subscription(&self) -> SubscriptionSnapshot {
        match self {
            Account::User(u) => SubscriptionSnapshot {
                plan: u.subscription_plan.clone(),
                status: u.subscription_status,
                payment_status: u.payment_status,
                start_date: u.subscription_start_date,
                end_date: u.subscription_end_date,
            },
            Account::Artisan(a) => SubscriptionSnapshot {
                plan: a.subscription_plan.clone(),
                status: a.subscription_status,
                payment_status: a.payment_status,
                start_date: a.subscription_start_date,
                end_date: a.subscription_end_date,
            },
            Account::Etablissement(e) => SubscriptionSnapshot {
                plan: e.subscription_plan.clone(),
                status: e.subscription_status,
                payment_status: e.payment_status,
                start_date: e.subscription_start_date,
                end_date: e.subscription_end_date,
            },
        }
    }
}

/// Champs d'abonnement communs aux trois types de comptes
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSnapshot {
    pub plan: String,
    pub status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
}

/// Colonnes partagées par les tables de comptes
pub trait AccountTable: EntityTrait {
    const KIND: AccountKind;

    fn id_column() -> Self::Column;
    fn email_column() -> Self::Column;
    fn password_column() -> Self::Column;
    fn email_verified_column() -> Self::Column;
    fn plan_column() -> Self::Column;
    fn status_column() -> Self::Column;
    fn payment_column() -> Self::Column;
    fn start_column() -> Self::Column;
    fn end_column() -> Self::Column;
    fn wrap(model: Self::Model) -> Account;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_lenient_parsing() {
        assert_eq!(PaymentStatus::parse_lenient("PAID"), Some(PaymentStatus::Payed));
        assert_eq!(PaymentStatus::parse_lenient(" payer "), Some(PaymentStatus::Payed));
        assert_eq!(PaymentStatus::parse_lenient("non-payed"), Some(PaymentStatus::NonPayed));
        assert_eq!(PaymentStatus::parse_lenient("nonpayer"), Some(PaymentStatus::NonPayed));
        assert_eq!(PaymentStatus::parse_lenient("refunded"), None);
    }

    #[test]
    fn test_enum_json_representation() {
        assert_eq!(serde_json::to_value(SubscriptionStatus::Active).unwrap(), "ACTIVE");
        assert_eq!(serde_json::to_value(PaymentStatus::NonPayed).unwrap(), "non_payed");
        assert_eq!(serde_json::to_value(AccountKind::Etablissement).unwrap(), "etablissement");
        let kind: AccountKind = serde_json::from_value(serde_json::json!("artisan")).unwrap();
        assert_eq!(kind, AccountKind::Artisan);
    }
}

// Codes de vérification d'e-mail envoyés à l'inscription (valables 24h,
// usage unique, invalidés par un renvoi).

use sea_orm::entity::prelude::*;
use serde::Serialize;

use super::account::AccountKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "email_verification_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_kind: AccountKind,
    pub account_id: i32,
    pub email: String,
    pub code: String,
    pub expires_at: DateTimeUtc,
    pub used: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// ============================================================================
// MODÈLE : PASSWORD RESET TOKENS
// ============================================================================
//
// Codes de réinitialisation de mot de passe (6 chiffres) persistés.
//
// Workflow:
//   1. POST /auth/reset-password/request : un code est généré, les codes
//      précédents non utilisés du compte sont invalidés, le code est envoyé
//   2. POST /auth/reset-password/verify : vérifie code + e-mail, non expiré,
//      non utilisé
//   3. POST /auth/reset-password : change le mot de passe et passe used = true
//
// Points d'attention:
//   - Un code ne peut être utilisé qu'une fois (used = true)
//   - Expire 15 minutes après sa création
//   - Pas de clé étrangère : le compte est référencé par (account_kind, account_id)
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::Serialize;

use super::account::AccountKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "password_reset_tokens")]
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

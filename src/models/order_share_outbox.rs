// ============================================================================
// MODÈLE : ORDER SHARE OUTBOX
// ============================================================================
//
// Une ligne est écrite dans la même transaction que l'acceptation d'une
// demande d'embauche. Elle est supprimée dès que les ordres de l'établissement
// ont été partagés avec le compte embauché ; en cas d'échec elle reste avec
// `attempts` et `last_error` et sera rejouée par
// POST /embauche-requests/process-pending-shares.
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::Serialize;

use super::account::AccountKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "order_share_outbox")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub embauche_request_id: i32,
    pub etablissement_id: i32,
    pub account_kind: AccountKind,
    pub account_id: i32,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::embauche_requests::Entity",
        from = "Column::EmbaucheRequestId",
        to = "super::embauche_requests::Column::Id"
    )]
    EmbaucheRequest,
}

impl ActiveModelBehavior for ActiveModel {}

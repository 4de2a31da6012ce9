use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::account::{AccountKind, AccountRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EmbaucheStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "refused")]
    Refused,
}

impl EmbaucheStatus {
    /// pending -> accepted | refused, les deux autres états sont terminaux
    pub fn can_transition_to(self, next: EmbaucheStatus) -> bool {
        matches!(
            (self, next),
            (EmbaucheStatus::Pending, EmbaucheStatus::Accepted)
                | (EmbaucheStatus::Pending, EmbaucheStatus::Refused)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbaucheStatus::Pending => "pending",
            EmbaucheStatus::Accepted => "accepted",
            EmbaucheStatus::Refused => "refused",
        }
    }
}

/// Demande d'embauche d'un user OU d'un artisan auprès d'un établissement
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "embauche_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Option<i32>,
    pub artisan_id: Option<i32>,
    pub etablissement_id: i32,
    pub offer_id: Option<i32>,
    pub status: EmbaucheStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Le demandeur (exactement un de user_id / artisan_id est renseigné)
    pub fn requester(&self) -> Option<AccountRef> {
        match (self.user_id, self.artisan_id) {
            (Some(id), None) => Some(AccountRef::new(AccountKind::User, id)),
            (None, Some(id)) => Some(AccountRef::new(AccountKind::Artisan, id)),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::artisans::Entity",
        from = "Column::ArtisanId",
        to = "super::artisans::Column::Id"
    )]
    Artisan,

    #[sea_orm(
        belongs_to = "super::etablissements::Entity",
        from = "Column::EtablissementId",
        to = "super::etablissements::Column::Id"
    )]
    Etablissement,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::artisans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artisan.def()
    }
}

impl Related<super::etablissements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Etablissement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "a_faire")]
    AFaire,
    #[sea_orm(string_value = "en_cours")]
    EnCours,
    #[sea_orm(string_value = "termine")]
    Termine,
}

impl OrderStatus {
    /// `termine` est terminal ; a_faire et en_cours peuvent s'échanger
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::AFaire, OrderStatus::EnCours)
                | (OrderStatus::AFaire, OrderStatus::Termine)
                | (OrderStatus::EnCours, OrderStatus::Termine)
                | (OrderStatus::EnCours, OrderStatus::AFaire)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AFaire => "a_faire",
            OrderStatus::EnCours => "en_cours",
            OrderStatus::Termine => "termine",
        }
    }
}

/// Ordre de travail d'un établissement
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub etablissement_id: i32,
    #[sea_orm(column_type = "Text")]
    pub demande: String,
    pub priorite: String,
    pub date: Date,
    pub deadline: Option<Date>,
    pub status: OrderStatus,
    pub shared_with_accepted_users: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::etablissements::Entity",
        from = "Column::EtablissementId",
        to = "super::etablissements::Column::Id"
    )]
    Etablissement,

    #[sea_orm(has_many = "super::user_shared_orders::Entity")]
    SharedOrders,
}

impl Related<super::etablissements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Etablissement.def()
    }
}

impl Related<super::user_shared_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SharedOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

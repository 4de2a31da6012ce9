use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Offre d'emploi publiée par un établissement (etoffre)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "etablissement_offers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub etablissement_id: i32,
    pub titre: String,
    pub description: String,
    pub type_contrat: String,
    pub skills: String,
    pub budget: f64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::etablissements::Entity",
        from = "Column::EtablissementId",
        to = "super::etablissements::Column::Id"
    )]
    Etablissement,
}

impl Related<super::etablissements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Etablissement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

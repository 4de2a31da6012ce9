use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Relation d'emploi créée à l'acceptation d'une demande d'embauche
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "artisan_embauche")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub artisan_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub etablissement_id: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
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

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Preuve de travail soumise par un artisan
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "artisan_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub artisan_id: i32,
    pub title: String,
    pub description: String,
    pub prix: f64,
    pub image_proof_of_work: Option<String>,
    pub images: Json,
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
}

impl Related<super::artisans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artisan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

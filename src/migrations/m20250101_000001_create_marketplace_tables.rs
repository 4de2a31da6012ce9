use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::models::{
    artisan_applications, artisan_embauche, artisan_offers, artisan_reviews, artisans,
    email_verification_tokens, embauche_requests, etablissement_offers, etablissements,
    order_share_outbox, orders, password_reset_tokens, user_applications, user_embauche,
    user_reviews, user_shared_orders, users,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create<E: EntityTrait>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr> {
    let schema = Schema::new(manager.get_database_backend());
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}

async fn drop_table<E: EntityTrait>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Tables référencées d'abord (clés étrangères)
        create(manager, users::Entity).await?;
        create(manager, artisans::Entity).await?;
        create(manager, etablissements::Entity).await?;
        create(manager, etablissement_offers::Entity).await?;
        create(manager, artisan_offers::Entity).await?;
        create(manager, user_applications::Entity).await?;
        create(manager, artisan_applications::Entity).await?;
        create(manager, embauche_requests::Entity).await?;
        create(manager, user_embauche::Entity).await?;
        create(manager, artisan_embauche::Entity).await?;
        create(manager, orders::Entity).await?;
        create(manager, user_shared_orders::Entity).await?;
        create(manager, order_share_outbox::Entity).await?;
        create(manager, artisan_reviews::Entity).await?;
        create(manager, user_reviews::Entity).await?;
        create(manager, password_reset_tokens::Entity).await?;
        create(manager, email_verification_tokens::Entity).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, email_verification_tokens::Entity).await?;
        drop_table(manager, password_reset_tokens::Entity).await?;
        drop_table(manager, user_reviews::Entity).await?;
        drop_table(manager, artisan_reviews::Entity).await?;
        drop_table(manager, order_share_outbox::Entity).await?;
        drop_table(manager, user_shared_orders::Entity).await?;
        drop_table(manager, orders::Entity).await?;
        drop_table(manager, artisan_embauche::Entity).await?;
        drop_table(manager, user_embauche::Entity).await?;
        drop_table(manager, embauche_requests::Entity).await?;
        drop_table(manager, artisan_applications::Entity).await?;
        drop_table(manager, user_applications::Entity).await?;
        drop_table(manager, artisan_offers::Entity).await?;
        drop_table(manager, etablissement_offers::Entity).await?;
        drop_table(manager, etablissements::Entity).await?;
        drop_table(manager, artisans::Entity).await?;
        drop_table(manager, users::Entity).await
    }
}

use sea_orm_migration::prelude::*;

use crate::models::{user_applications, user_shared_orders};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_user_shared_orders_order_account")
                    .table(user_shared_orders::Entity)
                    .col(user_shared_orders::Column::OrderId)
                    .col(user_shared_orders::Column::AccountKind)
                    .col(user_shared_orders::Column::AccountId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_applications_user_etab_offer")
                    .table(user_applications::Entity)
                    .col(user_applications::Column::UserId)
                    .col(user_applications::Column::EtablissementId)
                    .col(user_applications::Column::OfferId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_user_applications_user_etab_offer")
                    .table(user_applications::Entity)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_user_shared_orders_order_account")
                    .table(user_shared_orders::Entity)
                    .to_owned(),
            )
            .await
    }
}

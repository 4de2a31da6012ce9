//! Migrations de la base (PostgreSQL en production, SQLite en tests)

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_marketplace_tables;
mod m20250101_000002_create_unique_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_marketplace_tables::Migration),
            Box::new(m20250101_000002_create_unique_indexes::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::db::test_connection;

    #[test]
    fn test_migration_names_are_unique() {
        let names: Vec<String> = Migrator::migrations().iter().map(|m| m.name().to_string()).collect();
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names[0], "m20250101_000001_create_marketplace_tables");
    }

    #[tokio::test]
    async fn test_migrations_apply_on_fresh_database_and_rerun() {
        let db = test_connection().await;
        let applied = Migrator::get_applied_migrations(&db).await.unwrap();
        assert_eq!(applied.len(), Migrator::migrations().len());

        Migrator::up(&db, None).await.unwrap();
        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
    }
}

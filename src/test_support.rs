// Jeux de données pour les tests (base SQLite en mémoire)

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::models::account::{PaymentStatus, SubscriptionStatus};
use crate::models::orders::OrderStatus;
use crate::models::{artisans, etablissement_offers, etablissements, orders, users};
use crate::utils::password;

pub const PASSWORD: &str = "secret1";

pub async fn seed_user(db: &DatabaseConnection, email: &str) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        first_name: Set(Some("Test".into())),
        last_name: Set(Some("User".into())),
        email: Set(email.to_string()),
        password_hash: Set(password::hash_password(PASSWORD).unwrap()),
        role: Set("user".into()),
        email_verified: Set(false),
        subscription_plan: Set("standard".into()),
        subscription_status: Set(SubscriptionStatus::Active),
        payment_status: Set(PaymentStatus::NonPayed),
        subscription_start_date: Set(Some(now)),
        subscription_end_date: Set(Some(now + Duration::days(30))),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_artisan(db: &DatabaseConnection, email: &str) -> artisans::Model {
    seed_artisan_of_type(db, email, "Plombier", PaymentStatus::NonPayed).await
}

pub async fn seed_artisan_of_type(
    db: &DatabaseConnection,
    email: &str,
    artisan_type: &str,
    payment: PaymentStatus,
) -> artisans::Model {
    let now = Utc::now();
    artisans::ActiveModel {
        first_name: Set(Some("Test".into())),
        last_name: Set(Some("Artisan".into())),
        email: Set(email.to_string()),
        password_hash: Set(password::hash_password(PASSWORD).unwrap()),
        artisan_type: Set(Some(artisan_type.to_string())),
        role: Set("artisan".into()),
        email_verified: Set(false),
        subscription_plan: Set("standard".into()),
        subscription_status: Set(SubscriptionStatus::Active),
        payment_status: Set(payment),
        subscription_start_date: Set(Some(now)),
        subscription_end_date: Set(Some(now + Duration::days(30))),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_etablissement(db: &DatabaseConnection, email: &str) -> etablissements::Model {
    let now = Utc::now();
    etablissements::ActiveModel {
        name_of_etablissement: Set("Acme".into()),
        email: Set(email.to_string()),
        password_hash: Set(password::hash_password(PASSWORD).unwrap()),
        type_of_etablissement: Set("Startup".into()),
        has_new_postulant: Set(false),
        role: Set("etablissement".into()),
        email_verified: Set(false),
        subscription_plan: Set("standard".into()),
        subscription_status: Set(SubscriptionStatus::Active),
        payment_status: Set(PaymentStatus::Payed),
        subscription_start_date: Set(Some(now)),
        subscription_end_date: Set(Some(now + Duration::days(30))),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_offer(db: &DatabaseConnection, etablissement_id: i32, titre: &str) -> etablissement_offers::Model {
    etablissement_offers::ActiveModel {
        etablissement_id: Set(etablissement_id),
        titre: Set(titre.to_string()),
        description: Set("Poste ouvert".into()),
        type_contrat: Set("CDI".into()),
        skills: Set("Aucune".into()),
        budget: Set(1200.0),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_order(
    db: &DatabaseConnection,
    etablissement_id: i32,
    status: OrderStatus,
    deadline: Option<NaiveDate>,
) -> orders::Model {
    let now = Utc::now();
    orders::ActiveModel {
        etablissement_id: Set(etablissement_id),
        demande: Set("Réparer la vitrine".into()),
        priorite: Set("normale".into()),
        date: Set(now.date_naive()),
        deadline: Set(deadline),
        status: Set(status),
        shared_with_accepted_users: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub mod applications;
pub mod auth;
pub mod directory;
pub mod embauche;
pub mod health;
pub mod offers;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod subscription;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Un seul scope /auth : actix ne passe pas d'un scope à l'autre
    cfg.service(health::health_check)
        .service(
            web::scope("/auth")
                .configure(auth::auth_routes)
                .configure(directory::directory_routes)
                .configure(subscription::subscription_auth_routes)
                .configure(embauche::embauche_auth_routes),
        )
        .configure(subscription::subscription_routes)
        .configure(payments::payment_routes)
        .configure(embauche::embauche_routes)
        .configure(orders::order_routes)
        .configure(offers::offer_routes)
        .configure(reviews::review_routes)
        .configure(applications::application_routes);
}

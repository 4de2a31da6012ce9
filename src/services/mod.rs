// ============================================================================
// SERVICES - logique métier
// ============================================================================
//
//   - account_service : résolution des comptes (user -> artisan -> etablissement)
//   - auth_service : inscription, connexion, codes de vérification / reset
//   - subscription_service : règles d'accès et cycle de l'abonnement
//   - embauche_service : demandes d'embauche et outbox de partage
//   - order_service : ordres de travail, partage, échéances
//   - application_service : candidatures users et artisans
//   - offer_service : offres des établissements et des artisans
//   - review_service : avis
//   - directory_service : annuaire et vues du tableau de bord
//   - mail_service / payment_service : collaborateurs externes (traits)
//
// ============================================================================

pub mod account_service;
pub mod application_service;
pub mod auth_service;
pub mod directory_service;
pub mod embauche_service;
pub mod mail_service;
pub mod offer_service;
pub mod order_service;
pub mod payment_service;
pub mod review_service;
pub mod subscription_service;

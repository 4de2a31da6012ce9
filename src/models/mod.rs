// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table SQL avec SeaORM.
//
// Liste des modules:
//   - account : types communs aux comptes (AccountKind, Account, AccountTable)
//   - users / artisans / etablissements : les trois types de comptes
//   - etablissement_offers / artisan_offers : offres (etoffres / artoffres)
//   - user_applications / artisan_applications : candidatures (postuler)
//   - embauche_requests : demandes d'embauche (pending/accepted/refused)
//   - user_embauche / artisan_embauche : relations d'emploi acceptées
//   - orders : ordres de travail des établissements
//   - user_shared_orders : partage des ordres avec les comptes embauchés
//   - order_share_outbox : partages en attente après acceptation
//   - artisan_reviews / user_reviews : avis (artavis / useravis)
//   - password_reset_tokens / email_verification_tokens : codes à 6 chiffres
//   - dto : requêtes et réponses de l'API
//   - health : Health check API
//
// ============================================================================

pub mod account;
pub mod artisan_applications;
pub mod artisan_embauche;
pub mod artisan_offers;
pub mod artisan_reviews;
pub mod artisans;
pub mod dto;
pub mod email_verification_tokens;
pub mod embauche_requests;
pub mod etablissement_offers;
pub mod etablissements;
pub mod health;
pub mod order_share_outbox;
pub mod orders;
pub mod password_reset_tokens;
pub mod user_applications;
pub mod user_embauche;
pub mod user_reviews;
pub mod user_shared_orders;
pub mod users;

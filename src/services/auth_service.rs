// ============================================================================
// SERVICE : AUTHENTIFICATION
// ============================================================================
//
// Inscription des trois types de comptes, connexion, changement de mot de
// passe / e-mail, vérification d'e-mail et réinitialisation du mot de passe.
//
// Points d'attention:
//   - L'e-mail est unique tous types confondus (vérifié avant insertion)
//   - L'inscription ouvre une fenêtre d'abonnement de 30 jours (ACTIVE, non payée)
//   - L'envoi du code de vérification ne fait jamais échouer l'inscription
//   - Les codes (vérification, reset) sont persistés, expirent et sont à usage unique
//
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use sea_orm::*;
use serde::Serialize;
use validator::Validate;

use crate::error::AppError;
use crate::models::account::{Account, AccountKind, AccountRef, PaymentStatus, SubscriptionStatus};
use crate::models::dto::{
    LoginRequest, RegisterArtisanRequest, RegisterEtablissementRequest, RegisterUserRequest,
    ResetPasswordRequest, UpdateEmailRequest, UpdatePasswordRequest,
};
use crate::models::{
    artisans, email_verification_tokens, etablissements, password_reset_tokens, users,
};
use crate::services::account_service::{AccountChanges, AccountService, normalize_email};
use crate::services::mail_service::{MailMessage, Mailer};
use crate::services::subscription_service::SUBSCRIPTION_DAYS;
use crate::utils::{codes, jwt, password};

const VERIFICATION_CODE_HOURS: i64 = 24;
const RESET_CODE_MINUTES: i64 = 15;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_type: AccountKind,
    pub user: Account,
}

pub struct AuthService;

impl AuthService {
    // ------------------------------------------------------------------
    // Inscription
    // ------------------------------------------------------------------

    pub async fn register_user(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        dto: RegisterUserRequest,
        now: DateTime<Utc>,
    ) -> Result<users::Model, AppError> {
        dto.validate()?;
        let email = Self::ensure_email_available(db, &dto.email).await?;
        let password_hash = password::hash_password(&dto.password)?;

        let user = users::ActiveModel {
            first_name: Set(Some(dto.first_name)),
            last_name: Set(Some(dto.last_name)),
            email: Set(email),
            phone: Set(dto.phone),
            date_of_birth: Set(dto.date_of_birth),
            password_hash: Set(password_hash),
            image: Set(dto.image),
            image_proof_of_work: Set(dto.image_proof_of_work),
            cv: Set(dto.cv),
            github: Set(dto.github),
            portfolio: Set(dto.portfolio),
            linkdin: Set(dto.linkdin),
            role: Set("user".to_string()),
            email_verified: Set(false),
            subscription_plan: Set("standard".to_string()),
            subscription_status: Set(SubscriptionStatus::Active),
            payment_status: Set(PaymentStatus::NonPayed),
            subscription_start_date: Set(Some(now)),
            subscription_end_date: Set(Some(now + Duration::days(SUBSCRIPTION_DAYS))),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(user_id = user.id, "user registered");
        Self::send_verification_code(db, mailer, AccountRef::new(AccountKind::User, user.id), &user.email, now).await;
        Ok(user)
    }

    pub async fn register_artisan(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        dto: RegisterArtisanRequest,
        now: DateTime<Utc>,
    ) -> Result<artisans::Model, AppError> {
        dto.validate()?;
        let email = Self::ensure_email_available(db, &dto.email).await?;
        let password_hash = password::hash_password(&dto.password)?;

        let artisan = artisans::ActiveModel {
            first_name: Set(Some(dto.first_name)),
            last_name: Set(Some(dto.last_name)),
            email: Set(email),
            phone: Set(dto.phone),
            password_hash: Set(password_hash),
            artisan_type: Set(dto.artisan_type),
            experience: Set(dto.experience),
            certification: Set(dto.certification),
            disponibilite: Set(dto.disponibilite),
            image: Set(dto.image),
            image_proof_of_work: Set(dto.image_proof_of_work),
            role: Set("artisan".to_string()),
            email_verified: Set(false),
            subscription_plan: Set("standard".to_string()),
            subscription_status: Set(SubscriptionStatus::Active),
            payment_status: Set(PaymentStatus::NonPayed),
            subscription_start_date: Set(Some(now)),
            subscription_end_date: Set(Some(now + Duration::days(SUBSCRIPTION_DAYS))),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(artisan_id = artisan.id, "artisan registered");
        Self::send_verification_code(db, mailer, AccountRef::new(AccountKind::Artisan, artisan.id), &artisan.email, now)
            .await;
        Ok(artisan)
    }

    pub async fn register_etablissement(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        dto: RegisterEtablissementRequest,
        now: DateTime<Utc>,
    ) -> Result<etablissements::Model, AppError> {
        dto.validate()?;
        let kind = etablissements::normalize_type(&dto.type_of_etablissement).ok_or_else(|| {
            AppError::Validation("Type must be one of Startup, Agence, Societe".into())
        })?;
        let email = Self::ensure_email_available(db, &dto.email).await?;
        let password_hash = password::hash_password(&dto.password)?;

        let etab = etablissements::ActiveModel {
            name_of_etablissement: Set(dto.name_of_etablissement),
            email: Set(email),
            phone: Set(dto.phone),
            password_hash: Set(password_hash),
            type_of_etablissement: Set(kind.to_string()),
            since: Set(dto.since),
            employees_count: Set(dto.employees_count),
            localisation: Set(dto.localisation),
            secteur: Set(dto.secteur),
            image: Set(dto.image),
            image_of_status_proof: Set(dto.image_of_status_proof),
            has_new_postulant: Set(false),
            role: Set("etablissement".to_string()),
            email_verified: Set(false),
            subscription_plan: Set("standard".to_string()),
            subscription_status: Set(SubscriptionStatus::Active),
            payment_status: Set(PaymentStatus::NonPayed),
            subscription_start_date: Set(Some(now)),
            subscription_end_date: Set(Some(now + Duration::days(SUBSCRIPTION_DAYS))),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(etablissement_id = etab.id, "etablissement registered");
        Self::send_verification_code(
            db,
            mailer,
            AccountRef::new(AccountKind::Etablissement, etab.id),
            &etab.email,
            now,
        )
        .await;
        Ok(etab)
    }

    /// Retourne l'e-mail normalisé s'il n'est utilisé par aucun type de compte
    async fn ensure_email_available(db: &DatabaseConnection, email: &str) -> Result<String, AppError> {
        let email = normalize_email(email);
        if AccountService::email_exists(db, &email).await? {
            return Err(AppError::Conflict("Email already exists".into()));
        }
        Ok(email)
    }

    // ------------------------------------------------------------------
    // Connexion
    // ------------------------------------------------------------------

    pub async fn login(db: &DatabaseConnection, dto: LoginRequest, jwt_secret: &str) -> Result<LoginResponse, AppError> {
        dto.validate()?;

        // 1. Résoudre le compte (user, artisan, etablissement)
        let account = AccountService::find_by_email(db, &dto.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // 2. Vérifier le mot de passe, même erreur que pour un e-mail inconnu
        if !password::verify_password(&dto.password, account.password_hash())? {
            return Err(AppError::InvalidCredentials);
        }

        // 3. Générer le JWT
        let token = jwt::generate_token(account.reference(), account.email(), jwt_secret)
            .map_err(AppError::Internal)?;

        tracing::info!(kind = %account.kind(), account_id = account.id(), "login");
        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user_type: account.kind(),
            user: account,
        })
    }

    pub async fn update_password(db: &DatabaseConnection, dto: UpdatePasswordRequest) -> Result<(), AppError> {
        dto.validate()?;
        let account = AccountService::find_by_email(db, &dto.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !password::verify_password(&dto.current_password, account.password_hash())? {
            return Err(AppError::Unauthorized("Current password is incorrect".into()));
        }

        let hash = password::hash_password(&dto.new_password)?;
        AccountService::update(
            db,
            account.reference(),
            &AccountChanges { password_hash: Some(hash), ..Default::default() },
        )
        .await
    }

    pub async fn update_email(db: &DatabaseConnection, dto: UpdateEmailRequest) -> Result<Account, AppError> {
        dto.validate()?;
        let account = AccountService::find_by_email(db, &dto.current_email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !password::verify_password(&dto.password, account.password_hash())? {
            return Err(AppError::InvalidCredentials);
        }

        let new_email = Self::ensure_email_available(db, &dto.new_email).await?;
        AccountService::update(
            db,
            account.reference(),
            &AccountChanges { email: Some(new_email), email_verified: Some(false), ..Default::default() },
        )
        .await?;
        AccountService::require_ref(db, account.reference()).await
    }

    // ------------------------------------------------------------------
    // Vérification d'e-mail
    // ------------------------------------------------------------------

    /// Crée un code (les précédents non utilisés sont invalidés) puis l'envoie.
    /// Un échec d'envoi ou d'écriture est journalisé, jamais propagé.
    async fn send_verification_code(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        account: AccountRef,
        email: &str,
        now: DateTime<Utc>,
    ) {
        let code = match Self::issue_verification_code(db, account, email, now).await {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(kind = %account.kind, account_id = account.id, error = %e, "could not store verification code");
                return;
            }
        };
        if let Err(e) = mailer.send(MailMessage::verification_code(email, &code)).await {
            tracing::warn!(kind = %account.kind, account_id = account.id, error = %e, "verification mail not sent");
        }
    }

    async fn issue_verification_code(
        db: &DatabaseConnection,
        account: AccountRef,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, DbErr> {
        email_verification_tokens::Entity::update_many()
            .col_expr(email_verification_tokens::Column::Used, sea_query::Expr::value(true))
            .filter(email_verification_tokens::Column::AccountKind.eq(account.kind))
            .filter(email_verification_tokens::Column::AccountId.eq(account.id))
            .filter(email_verification_tokens::Column::Used.eq(false))
            .exec(db)
            .await?;

        let code = codes::six_digit_code();
        email_verification_tokens::ActiveModel {
            account_kind: Set(account.kind),
            account_id: Set(account.id),
            email: Set(email.to_string()),
            code: Set(code.clone()),
            expires_at: Set(now + Duration::hours(VERIFICATION_CODE_HOURS)),
            used: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(code)
    }

    pub async fn verify_email(
        db: &DatabaseConnection,
        kind: AccountKind,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let account = AccountService::require(db, kind, email).await?;
        if account.email_verified() {
            return Ok(());
        }

        let token = email_verification_tokens::Entity::find()
            .filter(email_verification_tokens::Column::AccountKind.eq(kind))
            .filter(email_verification_tokens::Column::AccountId.eq(account.id()))
            .filter(email_verification_tokens::Column::Code.eq(code.trim()))
            .filter(email_verification_tokens::Column::Used.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid verification code".into()))?;
        if token.expires_at <= now {
            return Err(AppError::Validation("Verification code has expired".into()));
        }

        let txn = db.begin().await?;
        let mut token: email_verification_tokens::ActiveModel = token.into();
        token.used = Set(true);
        token.update(&txn).await?;
        AccountService::update(
            &txn,
            account.reference(),
            &AccountChanges { email_verified: Some(true), ..Default::default() },
        )
        .await?;
        txn.commit().await?;

        tracing::info!(kind = %kind, account_id = account.id(), "email verified");
        Ok(())
    }

    pub async fn resend_verification(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        kind: AccountKind,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let account = AccountService::require(db, kind, email).await?;
        if account.email_verified() {
            return Err(AppError::Validation("Email is already verified".into()));
        }
        let code = Self::issue_verification_code(db, account.reference(), account.email(), now).await?;
        mailer.send(MailMessage::verification_code(account.email(), &code)).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Réinitialisation du mot de passe
    // ------------------------------------------------------------------

    pub async fn request_password_reset(
        db: &DatabaseConnection,
        mailer: &dyn Mailer,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let account = AccountService::find_by_email(db, email)
            .await?
            .ok_or_else(|| AppError::NotFound("No account found with this email".into()))?;
        let reference = account.reference();

        password_reset_tokens::Entity::update_many()
            .col_expr(password_reset_tokens::Column::Used, sea_query::Expr::value(true))
            .filter(password_reset_tokens::Column::AccountKind.eq(reference.kind))
            .filter(password_reset_tokens::Column::AccountId.eq(reference.id))
            .filter(password_reset_tokens::Column::Used.eq(false))
            .exec(db)
            .await?;

        let code = codes::six_digit_code();
        password_reset_tokens::ActiveModel {
            account_kind: Set(reference.kind),
            account_id: Set(reference.id),
            email: Set(account.email().to_string()),
            code: Set(code.clone()),
            expires_at: Set(now + Duration::minutes(RESET_CODE_MINUTES)),
            used: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        mailer.send(MailMessage::password_reset_code(account.email(), &code)).await?;
        tracing::info!(kind = %reference.kind, account_id = reference.id, "password reset requested");
        Ok(())
    }

    async fn find_valid_reset_code(
        db: &DatabaseConnection,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<password_reset_tokens::Model, AppError> {
        let token = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Email.eq(normalize_email(email)))
            .filter(password_reset_tokens::Column::Code.eq(code.trim()))
            .filter(password_reset_tokens::Column::Used.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid reset code".into()))?;
        if token.expires_at <= now {
            return Err(AppError::Validation("Reset code has expired".into()));
        }
        Ok(token)
    }

    pub async fn verify_reset_code(
        db: &DatabaseConnection,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        Self::find_valid_reset_code(db, email, code, now).await.map(|_| ())
    }

    pub async fn reset_password(
        db: &DatabaseConnection,
        dto: ResetPasswordRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        dto.validate()?;
        let token = Self::find_valid_reset_code(db, &dto.email, &dto.code, now).await?;
        let hash = password::hash_password(&dto.new_password)?;
        let account = AccountRef::new(token.account_kind, token.account_id);

        let txn = db.begin().await?;
        let mut token: password_reset_tokens::ActiveModel = token.into();
        token.used = Set(true);
        token.update(&txn).await?;
        AccountService::update(&txn, account, &AccountChanges { password_hash: Some(hash), ..Default::default() })
            .await?;
        txn.commit().await?;

        tracing::info!(kind = %account.kind, account_id = account.id, "password reset");
        Ok(())
    }
}

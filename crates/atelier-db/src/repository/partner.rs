//! # Partner Repository
//!
//! Registration, approval and login for wholesalers, resellers and retailers.
//!
//! ## One Repository, Three Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PartnerType::Wholesaler ──► wholesalers (company_name, gst_number)    │
//! │  PartnerType::Reseller   ──► resellers   (store_name)                  │
//! │  PartnerType::Retailer   ──► retailers   (shop_name, city)             │
//! │                                                                         │
//! │  Shared columns are read into PartnerAccount:                          │
//! │    SELECT id, '<type>' AS partner_type, ..., <name> AS display_name    │
//! │                                                                         │
//! │  Transitions come from atelier_core::registration; this module only    │
//! │  loads the current state and writes the result.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::password::{decoy_hash, hash_password, verify_password};
use crate::pool::WriteGate;
use atelier_core::registration::{self, RegistrationTransition};
use atelier_core::slug;
use atelier_core::validation::{
    validate_email, validate_name, validate_password, validate_phone, validate_username,
};
use atelier_core::{
    AccountStatus, CoreError, CoreResult, PartnerAccount, PartnerIdentity, PartnerProfile,
    PartnerType, RegistrationStatus, ValidationError,
};

/// Table a partner tier lives in.
pub(crate) fn table(partner_type: PartnerType) -> &'static str {
    match partner_type {
        PartnerType::Wholesaler => "wholesalers",
        PartnerType::Reseller => "resellers",
        PartnerType::Retailer => "retailers",
    }
}

fn name_column(partner_type: PartnerType) -> &'static str {
    match partner_type {
        PartnerType::Wholesaler => "company_name",
        PartnerType::Reseller => "store_name",
        PartnerType::Retailer => "shop_name",
    }
}

/// `SELECT` over the shared columns of one partner table.
pub(crate) fn select_account(partner_type: PartnerType) -> String {
    format!(
        r#"
        SELECT
            id,
            '{kind}' AS partner_type,
            username, email, phone, password_hash,
            {name} AS display_name,
            status, registration_status, created_at, updated_at
        FROM {table}
        "#,
        kind = partner_type.as_str(),
        name = name_column(partner_type),
        table = table(partner_type),
    )
}

/// Input for [`PartnerRepository::register`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPartner {
    pub profile: PartnerProfile,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    /// Plaintext; hashed before it reaches the database.
    pub password: String,
}

/// Repository for channel-partner accounts.
#[derive(Debug, Clone)]
pub struct PartnerRepository {
    pool: SqlitePool,
    gate: WriteGate,
}

impl PartnerRepository {
    /// Creates a new PartnerRepository.
    pub fn new(pool: SqlitePool, gate: WriteGate) -> Self {
        PartnerRepository { pool, gate }
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Self-registration. The account starts inactive and pending approval.
    ///
    /// ## Errors
    /// - `Validation` for a bad username, email, phone, password or name
    /// - `Validation(Duplicate)` if the username, email or phone is taken in that tier
    pub async fn register(&self, input: NewPartner) -> DbResult<PartnerAccount> {
        let partner_type = input.profile.partner_type();
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();

        validate_username(&username)?;
        validate_email(&email)?;
        if let Some(phone) = &input.phone {
            validate_phone(phone)?;
        }
        validate_password(&input.password)?;
        validate_name(name_column(partner_type), input.profile.display_name())?;

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let _gate = self.gate.acquire().await;

        let taken_sql = format!(
            "SELECT username, email, phone FROM {} \
             WHERE username = ?1 OR lower(email) = lower(?2) OR (?3 IS NOT NULL AND phone = ?3)",
            table(partner_type)
        );
        let taken: Option<(String, String, Option<String>)> = sqlx::query_as(&taken_sql)
            .bind(&username)
            .bind(&email)
            .bind(&input.phone)
            .fetch_optional(&self.pool)
            .await?;
        if let Some((existing_username, existing_email, _)) = taken {
            let (field, value) = if existing_username == username {
                ("username", username.clone())
            } else if existing_email.eq_ignore_ascii_case(&email) {
                ("email", email.clone())
            } else {
                ("phone", input.phone.clone().unwrap_or_default())
            };
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value,
            }
            .into());
        }

        debug!(partner_type = %partner_type, id = %id, username = %username, "Registering partner");

        let insert = match &input.profile {
            PartnerProfile::Wholesaler {
                company_name,
                gst_number,
            } => sqlx::query(
                r#"
                INSERT INTO wholesalers (
                    id, username, email, phone, password_hash,
                    company_name, gst_number,
                    status, registration_status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
                "#,
            )
            .bind(&id)
            .bind(&username)
            .bind(&email)
            .bind(&input.phone)
            .bind(&password_hash)
            .bind(company_name.trim())
            .bind(gst_number),
            PartnerProfile::Reseller { store_name } => sqlx::query(
                r#"
                INSERT INTO resellers (
                    id, username, email, phone, password_hash,
                    store_name,
                    status, registration_status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                "#,
            )
            .bind(&id)
            .bind(&username)
            .bind(&email)
            .bind(&input.phone)
            .bind(&password_hash)
            .bind(store_name.trim()),
            PartnerProfile::Retailer { shop_name, city } => sqlx::query(
                r#"
                INSERT INTO retailers (
                    id, username, email, phone, password_hash,
                    shop_name, city,
                    status, registration_status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
                "#,
            )
            .bind(&id)
            .bind(&username)
            .bind(&email)
            .bind(&input.phone)
            .bind(&password_hash)
            .bind(shop_name.trim())
            .bind(city),
        };

        insert
            .bind(AccountStatus::Inactive)
            .bind(RegistrationStatus::Pending)
            .bind(now)
            .execute(&self.pool)
            .await?;

        info!(partner_type = %partner_type, id = %id, "Partner registered, awaiting approval");

        Ok(PartnerAccount {
            id,
            partner_type,
            username,
            email,
            phone: input.phone,
            password_hash,
            display_name: input.profile.display_name().trim().to_string(),
            status: AccountStatus::Inactive,
            registration_status: RegistrationStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// First free username derived from `seed` (a name or email):
    /// `base`, then `base1`, `base2`, ….
    pub async fn suggest_username(&self, partner_type: PartnerType, seed: &str) -> DbResult<String> {
        let base = slug::username_base(seed);
        let sql = format!(
            "SELECT username FROM {} WHERE substr(username, 1, ?1) = ?2",
            table(partner_type)
        );

        let existing: HashSet<String> = sqlx::query_scalar::<_, String>(&sql)
            .bind(base.len() as i64)
            .bind(&base)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .collect();

        Ok(slug::suggest_username(seed, |candidate| existing.contains(candidate)))
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn get_by_id(&self, partner_type: PartnerType, id: &str) -> DbResult<Option<PartnerAccount>> {
        let sql = format!("{} WHERE id = ?1", select_account(partner_type));
        let account = sqlx::query_as::<_, PartnerAccount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    pub async fn get(&self, partner_type: PartnerType, id: &str) -> DbResult<PartnerAccount> {
        self.get_by_id(partner_type, id).await?.ok_or_else(|| {
            CoreError::PartnerNotFound {
                partner_type,
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Registrations awaiting a decision, oldest first. `None` lists all tiers.
    pub async fn list_pending(&self, partner_type: Option<PartnerType>) -> DbResult<Vec<PartnerAccount>> {
        let tiers: Vec<PartnerType> = match partner_type {
            Some(partner_type) => vec![partner_type],
            None => PartnerType::ALL.to_vec(),
        };

        let mut pending = Vec::new();
        for partner_type in tiers {
            let sql = format!(
                "{} WHERE registration_status = 'pending' ORDER BY created_at, rowid",
                select_account(partner_type)
            );
            let accounts = sqlx::query_as::<_, PartnerAccount>(&sql)
                .fetch_all(&self.pool)
                .await?;
            pending.extend(accounts);
        }

        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }

    // -------------------------------------------------------------------------
    // Approval
    // -------------------------------------------------------------------------

    /// pending → approved; the account becomes active.
    ///
    /// ## Errors
    /// - `PartnerNotFound`
    /// - `InvalidRegistrationTransition` if not pending
    pub async fn approve(&self, partner_type: PartnerType, id: &str) -> DbResult<PartnerAccount> {
        self.transition(partner_type, id, "approve", registration::approve)
            .await
    }

    /// pending → rejected; the account becomes inactive.
    pub async fn reject(&self, partner_type: PartnerType, id: &str) -> DbResult<PartnerAccount> {
        self.transition(partner_type, id, "reject", registration::reject)
            .await
    }

    async fn transition(
        &self,
        partner_type: PartnerType,
        id: &str,
        action: &'static str,
        decide: fn(RegistrationStatus) -> CoreResult<RegistrationTransition>,
    ) -> DbResult<PartnerAccount> {
        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let sql = format!("{} WHERE id = ?1", select_account(partner_type));
        let account = sqlx::query_as::<_, PartnerAccount>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::PartnerNotFound {
                partner_type,
                id: id.to_string(),
            })?;

        let next = decide(account.registration_status)?;
        let now = Utc::now();

        let update = format!(
            r#"
            UPDATE {} SET
                registration_status = ?2,
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND registration_status = ?5
            "#,
            table(partner_type)
        );
        let result = sqlx::query(&update)
            .bind(id)
            .bind(next.registration_status)
            .bind(next.status)
            .bind(now)
            .bind(account.registration_status)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(partner_type.as_str(), id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            partner_type = %partner_type,
            id = %id,
            action = action,
            registration_status = %next.registration_status,
            "Registration decided"
        );

        Ok(PartnerAccount {
            registration_status: next.registration_status,
            status: next.status,
            updated_at: now,
            ..account
        })
    }

    /// Activates or deactivates an approved partner.
    ///
    /// ## Errors
    /// - `PartnerNotFound`
    /// - `InvalidRegistrationTransition` unless the partner is approved
    pub async fn set_active(
        &self,
        partner_type: PartnerType,
        id: &str,
        active: bool,
    ) -> DbResult<PartnerAccount> {
        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let sql = format!("{} WHERE id = ?1", select_account(partner_type));
        let account = sqlx::query_as::<_, PartnerAccount>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::PartnerNotFound {
                partner_type,
                id: id.to_string(),
            })?;

        registration::ensure_can_toggle(&account)?;

        let status = if active {
            AccountStatus::Active
        } else {
            AccountStatus::Inactive
        };
        let now = Utc::now();

        let update = format!(
            "UPDATE {} SET status = ?2, updated_at = ?3 WHERE id = ?1",
            table(partner_type)
        );
        sqlx::query(&update)
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(partner_type = %partner_type, id = %id, active = active, "Partner status changed");

        Ok(PartnerAccount {
            status,
            updated_at: now,
            ..account
        })
    }

    // -------------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------------

    /// Checks credentials and the registration gate.
    ///
    /// `identifier` may be the username, the email or the phone number.
    ///
    /// ## Errors (in this order)
    /// - `InvalidCredentials` for an unknown identifier or a wrong password
    /// - `PendingApproval` / `Rejected`
    /// - `AccountInactive` for an approved but deactivated partner
    pub async fn authenticate(
        &self,
        partner_type: PartnerType,
        identifier: &str,
        password: &str,
    ) -> DbResult<PartnerIdentity> {
        let identifier = identifier.trim();

        // A digits-only username can equal another partner's phone, so every
        // match is tried; username beats email beats phone when none verifies.
        let sql = format!(
            "{} WHERE username = ?1 OR lower(email) = lower(?1) OR phone = ?1 \
             ORDER BY CASE WHEN username = ?1 THEN 0 WHEN lower(email) = lower(?1) THEN 1 ELSE 2 END",
            select_account(partner_type)
        );
        let candidates = sqlx::query_as::<_, PartnerAccount>(&sql)
            .bind(identifier)
            .fetch_all(&self.pool)
            .await?;

        if candidates.is_empty() {
            verify_password(password, decoy_hash());
        }
        let verified = candidates
            .iter()
            .find(|candidate| verify_password(password, &candidate.password_hash));
        let (account, password_ok) = match verified {
            Some(account) => (Some(account), true),
            None => (candidates.first(), false),
        };

        match registration::authorize_login(account, password_ok) {
            Ok(identity) => {
                info!(partner_type = %partner_type, id = %identity.id, "Partner authenticated");
                Ok(identity)
            }
            Err(err) => {
                warn!(partner_type = %partner_type, reason = %err, "Partner authentication refused");
                Err(err.into())
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

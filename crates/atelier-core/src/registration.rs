//! # Registration Workflow
//!
//! The approval state machine shared by wholesalers, resellers and retailers,
//! and the gate every login passes through.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                  approve                                                │
//! │     ┌─────────┐ ────────► ┌──────────┐   status = active               │
//! │     │ pending │           │ approved │                                 │
//! │     └─────────┘ ────────► └──────────┘                                 │
//! │          │       reject   ┌──────────┐   status = inactive             │
//! │          └──────────────► │ rejected │                                 │
//! │                           └──────────┘                                 │
//! │                                                                         │
//! │  approved and rejected are terminal. Anything else → InvalidState.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Login Gate
//! ```text
//! credentials ok? ──no──► InvalidCredentials
//!      │yes
//! registration? ── pending ──► PendingApproval
//!      │         ── rejected ─► Rejected
//!      │approved
//! status? ── inactive ──► AccountInactive
//!      │active
//!      ▼
//!  PartnerIdentity
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{AccountStatus, PartnerAccount, PartnerIdentity, PartnerType, RegistrationStatus};

/// The new state a successful transition writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationTransition {
    pub registration_status: RegistrationStatus,
    pub status: AccountStatus,
}

/// pending → approved, account becomes active.
pub fn approve(current: RegistrationStatus) -> CoreResult<RegistrationTransition> {
    match current {
        RegistrationStatus::Pending => Ok(RegistrationTransition {
            registration_status: RegistrationStatus::Approved,
            status: AccountStatus::Active,
        }),
        other => Err(CoreError::InvalidRegistrationTransition {
            action: "approve",
            current: other,
        }),
    }
}

/// pending → rejected, account becomes inactive.
pub fn reject(current: RegistrationStatus) -> CoreResult<RegistrationTransition> {
    match current {
        RegistrationStatus::Pending => Ok(RegistrationTransition {
            registration_status: RegistrationStatus::Rejected,
            status: AccountStatus::Inactive,
        }),
        other => Err(CoreError::InvalidRegistrationTransition {
            action: "reject",
            current: other,
        }),
    }
}

/// Anything that goes through partner onboarding.
///
/// The three partner tiers share this capability; storage decides which
/// table a record lives in.
pub trait Approvable {
    fn partner_type(&self) -> PartnerType;
    fn partner_id(&self) -> &str;
    fn registration_status(&self) -> RegistrationStatus;
    fn account_status(&self) -> AccountStatus;

    fn is_approved(&self) -> bool {
        self.registration_status() == RegistrationStatus::Approved
    }

    /// Fails unless the partner has been approved.
    fn ensure_approved(&self) -> CoreResult<()> {
        if self.is_approved() {
            Ok(())
        } else {
            Err(CoreError::PartnerNotApproved {
                partner_type: self.partner_type(),
                id: self.partner_id().to_string(),
                current: self.registration_status(),
            })
        }
    }

    /// Registration and status gates, run after the credentials checked out.
    fn login_gate(&self) -> CoreResult<()> {
        match self.registration_status() {
            RegistrationStatus::Pending => return Err(CoreError::PendingApproval),
            RegistrationStatus::Rejected => return Err(CoreError::Rejected),
            RegistrationStatus::Approved => {}
        }

        match self.account_status() {
            AccountStatus::Active => Ok(()),
            AccountStatus::Inactive => Err(CoreError::AccountInactive),
        }
    }
}

impl Approvable for PartnerAccount {
    fn partner_type(&self) -> PartnerType {
        self.partner_type
    }

    fn partner_id(&self) -> &str {
        &self.id
    }

    fn registration_status(&self) -> RegistrationStatus {
        self.registration_status
    }

    fn account_status(&self) -> AccountStatus {
        self.status
    }
}

/// Full login decision for an account the identifier resolved to.
///
/// `account` is `None` when no partner matched the identifier. Both that and
/// a failed password check produce the same `InvalidCredentials`.
pub fn authorize_login(
    account: Option<&PartnerAccount>,
    password_ok: bool,
) -> CoreResult<PartnerIdentity> {
    let account = match account {
        Some(account) if password_ok => account,
        _ => return Err(CoreError::InvalidCredentials),
    };

    account.login_gate()?;

    Ok(PartnerIdentity {
        partner_type: account.partner_type,
        id: account.id.clone(),
        username: account.username.clone(),
        display_name: account.display_name.clone(),
    })
}

/// Guard for `setActive`: only approved partners can be toggled.
pub fn ensure_can_toggle(partner: &impl Approvable) -> CoreResult<()> {
    partner.ensure_approved().map_err(|_| CoreError::InvalidRegistrationTransition {
        action: "change the status of",
        current: partner.registration_status(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Utc;

    fn account(registration: RegistrationStatus, status: AccountStatus) -> PartnerAccount {
        PartnerAccount {
            id: "w-1".to_string(),
            partner_type: PartnerType::Wholesaler,
            username: "maison".to_string(),
            email: "buyer@maison.example".to_string(),
            phone: None,
            password_hash: String::new(),
            display_name: "Maison".to_string(),
            status,
            registration_status: registration,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_approve_from_pending() {
        let t = approve(RegistrationStatus::Pending).unwrap();
        assert_eq!(t.registration_status, RegistrationStatus::Approved);
        assert_eq!(t.status, AccountStatus::Active);
    }

    #[test]
    fn test_reject_from_pending() {
        let t = reject(RegistrationStatus::Pending).unwrap();
        assert_eq!(t.registration_status, RegistrationStatus::Rejected);
        assert_eq!(t.status, AccountStatus::Inactive);
    }

    #[test]
    fn test_terminal_states_refuse_transitions() {
        for current in [RegistrationStatus::Approved, RegistrationStatus::Rejected] {
            assert_eq!(approve(current).unwrap_err().kind(), ErrorKind::InvalidState);
            assert_eq!(reject(current).unwrap_err().kind(), ErrorKind::InvalidState);
        }
    }

    #[test]
    fn test_pending_partner_never_logs_in() {
        let acct = account(RegistrationStatus::Pending, AccountStatus::Inactive);
        assert!(matches!(
            authorize_login(Some(&acct), true),
            Err(CoreError::PendingApproval)
        ));

        // Even with a wrong password the credential check comes first
        assert!(matches!(
            authorize_login(Some(&acct), false),
            Err(CoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_rejected_partner_gets_distinct_reason() {
        let acct = account(RegistrationStatus::Rejected, AccountStatus::Inactive);
        assert!(matches!(authorize_login(Some(&acct), true), Err(CoreError::Rejected)));
    }

    #[test]
    fn test_unknown_identifier_matches_bad_password() {
        let unknown = authorize_login(None, true).unwrap_err();
        let acct = account(RegistrationStatus::Approved, AccountStatus::Active);
        let bad_password = authorize_login(Some(&acct), false).unwrap_err();
        assert_eq!(unknown.to_string(), bad_password.to_string());
    }

    #[test]
    fn test_approved_active_partner_logs_in() {
        let acct = account(RegistrationStatus::Approved, AccountStatus::Active);
        let identity = authorize_login(Some(&acct), true).unwrap();
        assert_eq!(identity.id, "w-1");
        assert_eq!(identity.partner_type, PartnerType::Wholesaler);
        assert_eq!(identity.display_name, "Maison");
    }

    #[test]
    fn test_deactivated_partner_blocked() {
        let acct = account(RegistrationStatus::Approved, AccountStatus::Inactive);
        assert!(matches!(
            authorize_login(Some(&acct), true),
            Err(CoreError::AccountInactive)
        ));
    }

    #[test]
    fn test_toggle_requires_approval() {
        let pending = account(RegistrationStatus::Pending, AccountStatus::Inactive);
        assert_eq!(ensure_can_toggle(&pending).unwrap_err().kind(), ErrorKind::InvalidState);

        let approved = account(RegistrationStatus::Approved, AccountStatus::Active);
        assert!(ensure_can_toggle(&approved).is_ok());
    }
}

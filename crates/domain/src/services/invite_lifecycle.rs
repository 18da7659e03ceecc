//! Invite state machine.
//!
//! ```text
//! PENDING --expiry--> EXPIRED
//! PENDING --approve--> APPROVED
//! PENDING --reject--> REJECTED
//! ```
//!
//! Expiry is applied lazily: an invite whose deadline passed while still
//! `PENDING` is flipped to `EXPIRED` the first time it is read.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::invite::{AffiliateInvite, InviteStatus};
use crate::models::partner::RegistrationState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InviteError {
    #[error("Invite has expired")]
    Expired,

    #[error("Invite is no longer pending (status {0})")]
    NotPending(InviteStatus),

    #[error("Invalid invite transition from {from} to {to}")]
    InvalidTransition { from: InviteStatus, to: InviteStatus },
}

/// Whether `from -> to` is allowed. Re-applying the current state is a no-op.
pub fn can_transition(from: InviteStatus, to: InviteStatus) -> bool {
    from == to || from == InviteStatus::Pending
}

pub fn transition(from: InviteStatus, to: InviteStatus) -> Result<InviteStatus, InviteError> {
    if can_transition(from, to) {
        Ok(to)
    } else {
        Err(InviteError::InvalidTransition { from, to })
    }
}

/// A pending invite whose deadline has passed.
pub fn is_lapsed(invite: &AffiliateInvite, now: DateTime<Utc>) -> bool {
    invite.status == InviteStatus::Pending && now > invite.expires_at
}

/// Status an invite should have when read at `now`.
pub fn effective_status(invite: &AffiliateInvite, now: DateTime<Utc>) -> InviteStatus {
    if is_lapsed(invite, now) {
        InviteStatus::Expired
    } else {
        invite.status
    }
}

/// Rejects registration against an expired or already-settled invite.
pub fn check_registrable(invite: &AffiliateInvite, now: DateTime<Utc>) -> Result<(), InviteError> {
    match effective_status(invite, now) {
        InviteStatus::Pending => Ok(()),
        InviteStatus::Expired => Err(InviteError::Expired),
        other => Err(InviteError::NotPending(other)),
    }
}

pub fn expiry_from(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now + Duration::days(days)
}

/// Invite status corresponding to a partner registration state.
pub fn status_for(state: RegistrationState) -> InviteStatus {
    match state {
        RegistrationState::Pending => InviteStatus::Pending,
        RegistrationState::Approved => InviteStatus::Approved,
        RegistrationState::Rejected => InviteStatus::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn invite(status: InviteStatus, expires_in: Duration) -> AffiliateInvite {
        let now = Utc::now();
        AffiliateInvite {
            id: Uuid::new_v4(),
            code: "A1B2C3D4E5F60718".into(),
            email: "convidado@example.com".into(),
            name: "Convidado".into(),
            status,
            expires_at: now + expires_in,
            superbet_request_id: None,
            affiliate_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_can_reach_every_terminal_state() {
        for to in [
            InviteStatus::Approved,
            InviteStatus::Rejected,
            InviteStatus::Expired,
        ] {
            assert_eq!(transition(InviteStatus::Pending, to), Ok(to));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [
            InviteStatus::Approved,
            InviteStatus::Rejected,
            InviteStatus::Expired,
        ] {
            assert!(transition(from, InviteStatus::Pending).is_err());
        }
        assert!(transition(InviteStatus::Expired, InviteStatus::Approved).is_err());
        assert!(transition(InviteStatus::Approved, InviteStatus::Rejected).is_err());
    }

    #[test]
    fn test_reapplying_same_state_is_allowed() {
        assert_eq!(
            transition(InviteStatus::Approved, InviteStatus::Approved),
            Ok(InviteStatus::Approved)
        );
    }

    #[test]
    fn test_lapsed_pending_invite_reads_as_expired() {
        let lapsed = invite(InviteStatus::Pending, Duration::hours(-1));
        assert!(is_lapsed(&lapsed, Utc::now()));
        assert_eq!(effective_status(&lapsed, Utc::now()), InviteStatus::Expired);
        assert_eq!(check_registrable(&lapsed, Utc::now()), Err(InviteError::Expired));
    }

    #[test]
    fn test_already_expired_invite_rejects_registration() {
        let expired = invite(InviteStatus::Expired, Duration::days(3));
        assert_eq!(check_registrable(&expired, Utc::now()), Err(InviteError::Expired));
    }

    #[test]
    fn test_settled_invite_is_not_registrable() {
        let approved = invite(InviteStatus::Approved, Duration::hours(-1));
        assert!(!is_lapsed(&approved, Utc::now()));
        assert_eq!(
            check_registrable(&approved, Utc::now()),
            Err(InviteError::NotPending(InviteStatus::Approved))
        );
    }

    #[test]
    fn test_fresh_pending_invite_is_registrable() {
        let fresh = invite(InviteStatus::Pending, Duration::days(7));
        assert!(check_registrable(&fresh, Utc::now()).is_ok());
    }

    #[test]
    fn test_status_for_registration_state() {
        assert_eq!(status_for(RegistrationState::Approved), InviteStatus::Approved);
        assert_eq!(status_for(RegistrationState::Pending), InviteStatus::Pending);
    }
}

// ── Status transition rules ──
//
// Client-side gates over the backend's status machines. The server
// re-validates every transition; these rules exist so screens can grey
// out actions and fail fast with a field-attributed message.

use chrono::Utc;

use propflow_api::types::{
    AgreementStatus, BookingStatus, PaymentRaiseStatus, VerifyAgreementRequest,
};

/// Transition graph for a status enum.
pub trait StatusTransitions: Sized + Copy + PartialEq + 'static {
    /// Statuses reachable from `self` in one step.
    fn allowed_targets(self) -> &'static [Self];

    fn can_transition_to(self, target: Self) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// No outgoing transitions.
    fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }
}

impl StatusTransitions for BookingStatus {
    fn allowed_targets(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            // Confirmed and cancelled bookings are settled; reversing
            // either goes through allotment or a new booking.
            Self::Confirmed | Self::Cancelled => &[],
        }
    }
}

impl StatusTransitions for AgreementStatus {
    /// Agreements move freely between drafting statuses in both
    /// directions; the back office corrects mis-keyed statuses all the
    /// time. Only self-transitions are excluded.
    fn allowed_targets(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Completed],
            Self::InProgress => &[Self::Pending, Self::Completed],
            Self::Completed => &[Self::Pending, Self::InProgress],
        }
    }
}

impl StatusTransitions for PaymentRaiseStatus {
    fn allowed_targets(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Paid],
            Self::Rejected | Self::Paid => &[],
        }
    }
}

// ── Agreement verification ───────────────────────────────────────────

/// Input for the agreement verification action.
///
/// Verification is an axis orthogonal to [`AgreementStatus`]: an
/// agreement can be completed and unverified, or pending and verified.
#[derive(Debug, Clone, Default)]
pub struct VerificationForm {
    /// The operator's explicit confirmation checkbox.
    pub is_verified: bool,
    pub verified_by: String,
    pub verification_notes: String,
}

impl VerificationForm {
    /// Build the wire request, or `None` when the form is incomplete.
    ///
    /// All three inputs gate together: unchecked confirmation, a blank
    /// verifier, or blank notes each veto the request, so callers that
    /// get `None` know no network call should happen. `verified_date`
    /// is stamped here, at submission time.
    pub fn request(&self) -> Option<VerifyAgreementRequest> {
        let verified_by = self.verified_by.trim();
        let notes = self.verification_notes.trim();
        if !self.is_verified || verified_by.is_empty() || notes.is_empty() {
            return None;
        }
        Some(VerifyAgreementRequest {
            verified_by: verified_by.to_owned(),
            verification_notes: notes.to_owned(),
            verified_date: Utc::now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pending_booking_can_confirm_or_cancel() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn settled_bookings_are_terminal() {
        assert!(BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn agreements_move_in_both_directions() {
        assert!(AgreementStatus::Completed.can_transition_to(AgreementStatus::Pending));
        assert!(AgreementStatus::Pending.can_transition_to(AgreementStatus::Completed));
        assert!(!AgreementStatus::InProgress.can_transition_to(AgreementStatus::InProgress));
        assert!(!AgreementStatus::Completed.is_terminal());
    }

    #[test]
    fn payment_raise_approval_chain() {
        assert!(PaymentRaiseStatus::Pending.can_transition_to(PaymentRaiseStatus::Approved));
        assert!(PaymentRaiseStatus::Approved.can_transition_to(PaymentRaiseStatus::Paid));
        assert!(!PaymentRaiseStatus::Pending.can_transition_to(PaymentRaiseStatus::Paid));
        assert!(PaymentRaiseStatus::Rejected.is_terminal());
        assert!(PaymentRaiseStatus::Paid.is_terminal());
    }

    #[test]
    fn verification_requires_all_inputs() {
        let mut form = VerificationForm {
            is_verified: false,
            verified_by: "A. Auditor".into(),
            verification_notes: "All cheques cleared".into(),
        };
        assert!(form.request().is_none());

        form.is_verified = true;
        form.verified_by = "   ".into();
        assert!(form.request().is_none());

        form.verified_by = "A. Auditor".into();
        form.verification_notes = String::new();
        assert!(form.request().is_none());
    }

    #[test]
    fn verification_request_trims_and_stamps_date() {
        let form = VerificationForm {
            is_verified: true,
            verified_by: "  A. Auditor ".into(),
            verification_notes: " Spot-checked ledger ".into(),
        };
        let req = form.request().unwrap();
        assert_eq!(req.verified_by, "A. Auditor");
        assert_eq!(req.verification_notes, "Spot-checked ledger");
        assert!(req.verified_date <= Utc::now());
    }
}

//! Access gate shared by every box and item operation.
//!
//! Ownership denials collapse into the same not-found error used for missing
//! rows, so callers cannot discover other users' ids. The status gate is the
//! one place a distinct forbidden error is returned.

use tracing::warn;
use uuid::Uuid;

use super::Principal;
use crate::entities::BoxStatus;
use crate::errors::ServiceError;

/// Employees may act on any box; everyone else only on their own.
pub fn can_access(principal: &Principal, owner_id: Uuid) -> bool {
    principal.is_employee() || principal.user_id == owner_id
}

pub fn authorize_box(
    principal: &Principal,
    box_id: Uuid,
    owner_id: Uuid,
) -> Result<(), ServiceError> {
    if can_access(principal, owner_id) {
        return Ok(());
    }
    warn!(user_id = %principal.user_id, %box_id, "box access denied");
    Err(ServiceError::box_not_found())
}

pub fn authorize_item(
    principal: &Principal,
    item_id: Uuid,
    owner_id: Uuid,
) -> Result<(), ServiceError> {
    if can_access(principal, owner_id) {
        return Ok(());
    }
    warn!(user_id = %principal.user_id, %item_id, "item access denied");
    Err(ServiceError::item_not_found())
}

/// Runs before any ownership lookup.
pub fn authorize_status_change(
    principal: &Principal,
    status: BoxStatus,
) -> Result<(), ServiceError> {
    if status.requires_employee() && !principal.is_employee() {
        warn!(user_id = %principal.user_id, %status, "privileged status change denied");
        return Err(ServiceError::Forbidden(format!(
            "only employees may set status '{}'",
            status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_case::test_case;

    #[test]
    fn owner_and_employee_pass_stranger_gets_not_found() {
        let owner = Uuid::new_v4();
        let box_id = Uuid::new_v4();

        assert!(authorize_box(&Principal::customer(owner), box_id, owner).is_ok());
        assert!(authorize_box(&Principal::employee(Uuid::new_v4()), box_id, owner).is_ok());
        assert_matches!(
            authorize_box(&Principal::customer(Uuid::new_v4()), box_id, owner),
            Err(ServiceError::NotFound(msg)) if msg == "box not found or not accessible"
        );
    }

    #[test]
    fn item_denial_uses_item_message() {
        assert_matches!(
            authorize_item(
                &Principal::customer(Uuid::new_v4()),
                Uuid::new_v4(),
                Uuid::new_v4()
            ),
            Err(ServiceError::NotFound(msg)) if msg == "item not found or not accessible"
        );
    }

    #[test_case(BoxStatus::Stored, false ; "stored needs employee")]
    #[test_case(BoxStatus::Returned, false ; "returned needs employee")]
    #[test_case(BoxStatus::PendingPickup, true ; "pending pickup open")]
    #[test_case(BoxStatus::PendingPack, true ; "pending pack open")]
    #[test_case(BoxStatus::InTransit, true ; "in transit open")]
    #[test_case(BoxStatus::Disposed, true ; "disposed open")]
    fn customer_status_gate(status: BoxStatus, allowed: bool) {
        let result = authorize_status_change(&Principal::customer(Uuid::new_v4()), status);
        assert_eq!(result.is_ok(), allowed);
        if !allowed {
            assert_matches!(result, Err(ServiceError::Forbidden(_)));
        }
    }

    #[test]
    fn employee_may_set_any_status() {
        let staff = Principal::employee(Uuid::new_v4());
        for status in [BoxStatus::Stored, BoxStatus::Returned, BoxStatus::Disposed] {
            assert!(authorize_status_change(&staff, status).is_ok());
        }
    }
}

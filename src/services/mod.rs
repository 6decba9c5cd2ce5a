pub mod boxes;
pub mod items;

pub use boxes::BoxService;
pub use items::{ItemService, NewItemInput};

use crate::errors::ServiceError;

/// Longest item name the store accepts.
pub const MAX_ITEM_NAME_LEN: usize = 100;

/// Shared rule for item names: present, not blank, bounded.
pub(crate) fn check_item_name(name: &str, field: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::ValidationError(format!("{} is required", field)));
    }
    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(ServiceError::ValidationError(format!(
            "{} must be at most {} characters",
            field, MAX_ITEM_NAME_LEN
        )));
    }
    Ok(())
}

pub(crate) fn check_quantity(quantity: i32) -> Result<(), ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::ValidationError(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

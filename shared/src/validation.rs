//! Validation utilities for the Stockbook inventory & billing system
//!
//! Input is validated at the ledger boundary, before anything is persisted.

use rust_decimal::Decimal;

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate an item name (non-empty after trimming)
pub fn validate_item_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Item name must not be empty");
    }
    Ok(())
}

/// Validate a monetary amount is not negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price must not be negative");
    }
    Ok(())
}

/// Selling below cost is rejected at creation time only; later price edits
/// are unchecked.
pub fn validate_creation_prices(
    purchase_price: Decimal,
    selling_price: Decimal,
) -> Result<(), &'static str> {
    validate_price(purchase_price)?;
    validate_price(selling_price)?;
    if selling_price < purchase_price {
        return Err("Selling price must not be less than purchase price");
    }
    Ok(())
}

/// Validate the opening quantity of a new item
pub fn validate_initial_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

// ============================================================================
// Billing Validations
// ============================================================================

/// Validate a bill line quantity
pub fn validate_line_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Line quantity must be at least 1");
    }
    Ok(())
}

/// Validate the final sell price of a bill
pub fn validate_total_sell_price(total: Decimal) -> Result<(), &'static str> {
    if total <= Decimal::ZERO {
        return Err("Total sell price must be positive");
    }
    Ok(())
}

// ============================================================================
// User Validations
// ============================================================================

/// Validate a username (non-empty, no surrounding whitespace)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.trim().is_empty() {
        return Err("Username must not be empty");
    }
    if username != username.trim() {
        return Err("Username must not contain surrounding whitespace");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters long");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn blank_item_names_rejected() {
        assert!(validate_item_name("Laptop").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name("   ").is_err());
    }

    #[test]
    fn price_inversion_rejected_at_creation() {
        assert!(validate_creation_prices(dec("50"), dec("80")).is_ok());
        assert!(validate_creation_prices(dec("50"), dec("50")).is_ok());
        assert!(validate_creation_prices(dec("80"), dec("50")).is_err());
        assert!(validate_creation_prices(dec("-1"), dec("50")).is_err());
    }

    #[test]
    fn short_passwords_rejected() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("12345").is_err());
    }

    #[test]
    fn email_basic_shape() {
        assert!(validate_email("staff@shop.example").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }
}

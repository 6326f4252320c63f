//! Checked fixed-point helpers. Overflow and division by zero surface as
//! `ArithmeticFault` instead of wrapping or panicking.

use alloy::primitives::U256;
use pegvault_common::error::EngineError;
use pegvault_oracle::PriceQuote;

use crate::constants::{PRECISION, PRECISION_DECIMALS};

/// `a * b / denominator`, rounding down.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, EngineError> {
    if denominator.is_zero() {
        return Err(EngineError::ArithmeticFault("division by zero".to_string()));
    }
    let product = a
        .checked_mul(b)
        .ok_or_else(|| EngineError::ArithmeticFault(format!("{a} * {b} overflows")))?;
    Ok(product / denominator)
}

pub fn checked_add(a: U256, b: U256) -> Result<U256, EngineError> {
    a.checked_add(b)
        .ok_or_else(|| EngineError::ArithmeticFault(format!("{a} + {b} overflows")))
}

fn pow10(exp: u8) -> Result<U256, EngineError> {
    U256::from(10u64)
        .checked_pow(U256::from(exp))
        .ok_or_else(|| EngineError::ArithmeticFault(format!("10^{exp} overflows")))
}

/// Feed answer rescaled to [`PRECISION`]. Non-positive answers are faults.
pub fn normalized_price(quote: &PriceQuote) -> Result<U256, EngineError> {
    if !quote.price.is_positive() {
        return Err(EngineError::ArithmeticFault(format!(
            "non-positive price {}",
            quote.price
        )));
    }
    let raw = quote.price.into_raw();

    if quote.decimals <= PRECISION_DECIMALS {
        let factor = pow10(PRECISION_DECIMALS - quote.decimals)?;
        raw.checked_mul(factor)
            .ok_or_else(|| EngineError::ArithmeticFault(format!("price {raw} overflows")))
    } else {
        Ok(raw / pow10(quote.decimals - PRECISION_DECIMALS)?)
    }
}

/// USD value (18 decimals) of `amount` at a normalized price.
pub fn usd_value(price: U256, amount: U256) -> Result<U256, EngineError> {
    mul_div(price, amount, PRECISION)
}

/// Asset amount worth `usd_amount` at a normalized price.
pub fn asset_amount(price: U256, usd_amount: U256) -> Result<U256, EngineError> {
    mul_div(usd_amount, PRECISION, price)
}

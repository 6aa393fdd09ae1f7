use ethereum_types::U256;
use thiserror::Error;

/// Number of decimals of the network's native token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Length in bytes of every hash the network hands out (block, call,
/// statement and leaf hashes).
pub const HASH_LEN: usize = 32;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum FeeConversionError {
    #[error("fee `{0}` is not a decimal integer")]
    InvalidFee(String),

    #[error("{0} decimals do not fit in a 256-bit fee")]
    TooManyDecimals(u32),
}

/// Converts a fee in the smallest on-chain unit to a decimal token amount
/// with exactly `decimals` fractional digits.
///
/// ```rust
/// # use zkv_common::convert_fee_to_token;
/// assert_eq!(
///     convert_fee_to_token("1000000000000000000", 18).unwrap(),
///     "1.000000000000000000"
/// );
/// ```
pub fn convert_fee_to_token(fee: &str, decimals: u32) -> Result<String, FeeConversionError> {
    let fee = fee.trim();
    if fee.is_empty() || !fee.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FeeConversionError::InvalidFee(fee.to_owned()));
    }
    let amount =
        U256::from_dec_str(fee).map_err(|_| FeeConversionError::InvalidFee(fee.to_owned()))?;
    let (unit, overflow) = U256::from(10).overflowing_pow(decimals.into());
    if overflow {
        return Err(FeeConversionError::TooManyDecimals(decimals));
    }

    let whole = amount / unit;
    if decimals == 0 {
        return Ok(whole.to_string());
    }
    let fraction = amount % unit;
    Ok(format!(
        "{whole}.{fraction:0>width$}",
        fraction = fraction.to_string(),
        width = decimals as usize
    ))
}

/// Returns the input without its leading `0x`, if any.
pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// `true` if `s` is `0x` followed by an even number of hex digits.
pub fn is_prefixed_hex(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(rest) => rest.len() % 2 == 0 && rest.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Decodes a `0x`-prefixed hex string.
pub fn decode_prefixed_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    match s.strip_prefix("0x") {
        Some(rest) => hex::decode(rest),
        None => Err(hex::FromHexError::InvalidHexCharacter { c: 'x', index: 1 }),
    }
}

/// Encodes bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_prefixed_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

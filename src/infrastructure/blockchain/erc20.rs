//! # ERC-20 Codec
//!
//! Call-data encoding and return-data decoding for the ERC-20 methods the
//! probe uses, plus `Error(string)` revert payloads.

use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Bytes, U256};

/// `symbol()`
pub const SYMBOL: &str = "symbol()";
/// `decimals()`
pub const DECIMALS: &str = "decimals()";
/// `balanceOf(address)`
pub const BALANCE_OF: &str = "balanceOf(address)";
/// `transfer(address,uint256)`
pub const TRANSFER: &str = "transfer(address,uint256)";
/// Solidity's `Error(string)` revert payload.
pub const ERROR_STRING: &str = "Error(string)";

/// Returns the 4-byte selector of a canonical function signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    ethers::utils::id(signature)
}

/// Encodes `selector(signature) ++ abi.encode(args)`.
#[must_use]
pub fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend(abi::encode(args));
    Bytes::from(data)
}

/// Call data for `symbol()`.
#[must_use]
pub fn symbol_call() -> Bytes {
    encode_call(SYMBOL, &[])
}

/// Call data for `decimals()`.
#[must_use]
pub fn decimals_call() -> Bytes {
    encode_call(DECIMALS, &[])
}

/// Call data for `balanceOf(holder)`.
#[must_use]
pub fn balance_of_call(holder: Address) -> Bytes {
    encode_call(BALANCE_OF, &[Token::Address(holder)])
}

/// Call data for `transfer(to, amount)`.
#[must_use]
pub fn transfer_call(to: Address, amount: U256) -> Bytes {
    encode_call(TRANSFER, &[Token::Address(to), Token::Uint(amount)])
}

/// Splits call data into its selector and argument bytes.
#[must_use]
pub fn split_selector(data: &[u8]) -> Option<([u8; 4], &[u8])> {
    let head = data.get(..4)?;
    let rest = data.get(4..)?;
    let mut selector = [0u8; 4];
    selector.copy_from_slice(head);
    Some((selector, rest))
}

/// Decodes `transfer(address,uint256)` call data into `(to, amount)`.
#[must_use]
pub fn decode_transfer_call(data: &[u8]) -> Option<(Address, U256)> {
    let (sel, args) = split_selector(data)?;
    if sel != selector(TRANSFER) {
        return None;
    }
    let mut tokens = abi::decode(&[ParamType::Address, ParamType::Uint(256)], args)
        .ok()?
        .into_iter();
    match (tokens.next()?, tokens.next()?) {
        (Token::Address(to), Token::Uint(amount)) => Some((to, amount)),
        _ => None,
    }
}

/// Decodes an ABI `string` return value.
///
/// Some older tokens return `bytes32` for `symbol()`; those are accepted
/// and trimmed of trailing zero bytes.
#[must_use]
pub fn decode_string_or_bytes32(data: &[u8]) -> Option<String> {
    if let Ok(tokens) = abi::decode(&[ParamType::String], data)
        && let Some(Token::String(s)) = tokens.into_iter().next()
    {
        return Some(s);
    }
    if data.len() == 32 {
        let trimmed: Vec<u8> = data.iter().copied().take_while(|b| *b != 0).collect();
        return String::from_utf8(trimmed).ok();
    }
    None
}

/// Decodes an `Error(string)` revert payload.
#[must_use]
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let (sel, args) = split_selector(data)?;
    if sel != selector(ERROR_STRING) {
        return None;
    }
    match abi::decode(&[ParamType::String], args).ok()?.into_iter().next()? {
        Token::String(reason) => Some(reason),
        _ => None,
    }
}

/// Encodes an `Error(string)` revert payload.
#[must_use]
pub fn encode_revert_reason(reason: &str) -> Vec<u8> {
    encode_call(ERROR_STRING, &[Token::String(reason.to_string())]).to_vec()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn well_known_selectors() {
        assert_eq!(selector(TRANSFER), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(selector(BALANCE_OF), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(selector(DECIMALS), [0x31, 0x3c, 0xe5, 0x67]);
        assert_eq!(selector(SYMBOL), [0x95, 0xd8, 0x9b, 0x41]);
        assert_eq!(selector(ERROR_STRING), [0x08, 0xc3, 0x79, 0xa0]);
    }

    #[test]
    fn transfer_call_layout() {
        let to = Address::repeat_byte(0xab);
        let data = transfer_call(to, U256::from(10_000u64));
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(decode_transfer_call(&data), Some((to, U256::from(10_000u64))));
    }

    #[test]
    fn decode_transfer_rejects_other_selectors() {
        let data = balance_of_call(Address::zero());
        assert_eq!(decode_transfer_call(&data), None);
        assert_eq!(decode_transfer_call(&[0xa9, 0x05]), None);
    }

    #[test]
    fn string_return_decodes() {
        let encoded = abi::encode(&[Token::String("USDC".into())]);
        assert_eq!(decode_string_or_bytes32(&encoded).as_deref(), Some("USDC"));
    }

    #[test]
    fn bytes32_symbol_decodes() {
        let mut word = [0u8; 32];
        word[..3].copy_from_slice(b"MKR");
        assert_eq!(decode_string_or_bytes32(&word).as_deref(), Some("MKR"));
    }

    #[test]
    fn revert_reason_round_trip() {
        let payload = encode_revert_reason("ERC20: transfer amount exceeds balance");
        assert_eq!(
            decode_revert_reason(&payload).as_deref(),
            Some("ERC20: transfer amount exceeds balance")
        );
        assert_eq!(decode_revert_reason(&[0xde, 0xad]), None);
    }
}

//! EIP-7702 delegation designator parsing.

use alloy_primitives::Address;

use crate::errors::UnrecognizedCode;

/// Prefix of a delegation designator stored as account code.
pub const DELEGATION_MARKER: [u8; 3] = [0xef, 0x01, 0x00];

/// Length of a full designator: marker followed by a 20-byte address.
pub const DELEGATION_CODE_LEN: usize = DELEGATION_MARKER.len() + 20;

/// Read the delegate of an account from its raw code.
///
/// Returns `Ok(None)` for empty code and `Ok(Some(delegate))` for `0xef0100 || delegate`. Any other
/// code (a regular contract, a truncated designator) is an error rather than "not delegated".
pub fn read_delegation(code: &[u8]) -> Result<Option<Address>, UnrecognizedCode> {
    if code.is_empty() {
        return Ok(None);
    }
    if code.len() == DELEGATION_CODE_LEN && code.starts_with(&DELEGATION_MARKER) {
        return Ok(Some(Address::from_slice(&code[DELEGATION_MARKER.len()..])));
    }
    Err(UnrecognizedCode { len: code.len() })
}

/// Whether `code` delegates to exactly `expected`.
pub fn is_delegated_to(code: &[u8], expected: Address) -> bool {
    matches!(read_delegation(code), Ok(Some(delegate)) if delegate == expected)
}

/// Designator bytes an account carries after delegating to `delegate`.
pub fn delegation_code(delegate: Address) -> [u8; DELEGATION_CODE_LEN] {
    let mut code = [0u8; DELEGATION_CODE_LEN];
    code[..3].copy_from_slice(&DELEGATION_MARKER);
    code[3..].copy_from_slice(delegate.as_slice());
    code
}

//! Voucher data shapes.

use alloy_primitives::Bytes;
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

sol!(
    /// Solidity-compatible definition of a receipt aggregate voucher.
    ///
    /// `valueAggregate` is cumulative: a later voucher for the same allocation
    /// supersedes, and includes, every earlier one. `timestampNs` is carried as
    /// signed but is not checked for freshness or monotonicity on redemption.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct ReceiptAggregateVoucher {
        address allocationId;
        uint64 timestampNs;
        uint128 valueAggregate;
    }
);

/// A voucher together with the signature over its EIP-712 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedRav {
    pub message: ReceiptAggregateVoucher,
    /// 65-byte `r || s || v` or 64-byte EIP-2098 signature.
    pub signature: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_signed_rav_json_shape() {
        let signed = SignedRav {
            message: ReceiptAggregateVoucher {
                allocationId: address!("0x1111111111111111111111111111111111111111"),
                timestampNs: 1_700_000_000_000_000_000,
                valueAggregate: 400,
            },
            signature: Bytes::from(vec![0xab; 65]),
        };
        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(
            json["message"]["allocationId"],
            "0x1111111111111111111111111111111111111111"
        );
        assert_eq!(json["message"]["valueAggregate"], 400);
        assert!(json["signature"].as_str().unwrap().starts_with("0xabab"));
        let parsed: SignedRav = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, signed);
    }
}

//! Observable escrow events.
//!
//! Events are not consumed by the escrow itself. Every successful state-changing call
//! appends its events to the escrow's log, where indexers and accounting read them.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use tap_types::timestamp::UnixTimestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all_fields = "camelCase")]
pub enum EscrowEvent {
    Deposit {
        sender: Address,
        receiver: Address,
        amount: U256,
    },
    Thaw {
        sender: Address,
        receiver: Address,
        amount: U256,
        total_amount_thawing: U256,
        thaw_end_timestamp: UnixTimestamp,
    },
    CancelThaw {
        sender: Address,
        receiver: Address,
    },
    Withdraw {
        sender: Address,
        receiver: Address,
        amount: U256,
    },
    AuthorizeSigner {
        signer: Address,
        sender: Address,
    },
    ThawSigner {
        sender: Address,
        signer: Address,
        thaw_end_timestamp: UnixTimestamp,
    },
    CancelThawSigner {
        sender: Address,
        signer: Address,
        thaw_end_timestamp: UnixTimestamp,
    },
    RevokeAuthorizedSigner {
        sender: Address,
        signer: Address,
    },
    /// `actual_amount < expected_amount` means the voucher was only partially covered.
    Redeem {
        sender: Address,
        receiver: Address,
        allocation_id: Address,
        expected_amount: U256,
        actual_amount: U256,
    },
}

impl EscrowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EscrowEvent::Deposit { .. } => "Deposit",
            EscrowEvent::Thaw { .. } => "Thaw",
            EscrowEvent::CancelThaw { .. } => "CancelThaw",
            EscrowEvent::Withdraw { .. } => "Withdraw",
            EscrowEvent::AuthorizeSigner { .. } => "AuthorizeSigner",
            EscrowEvent::ThawSigner { .. } => "ThawSigner",
            EscrowEvent::CancelThawSigner { .. } => "CancelThawSigner",
            EscrowEvent::RevokeAuthorizedSigner { .. } => "RevokeAuthorizedSigner",
            EscrowEvent::Redeem { .. } => "Redeem",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_redeem_event_json() {
        let event = EscrowEvent::Redeem {
            sender: address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            receiver: address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
            allocation_id: address!("0x1111111111111111111111111111111111111111"),
            expected_amount: U256::from(400),
            actual_amount: U256::from(250),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["expectedAmount"], "0x190");
        assert_eq!(json["actualAmount"], "0xfa");
        assert_eq!(
            json["allocationId"],
            "0x1111111111111111111111111111111111111111"
        );
    }

    #[test]
    fn test_thaw_event_json() {
        let event = EscrowEvent::Thaw {
            sender: Address::ZERO,
            receiver: Address::ZERO,
            amount: U256::from(1),
            total_amount_thawing: U256::from(2),
            thaw_end_timestamp: UnixTimestamp::from_secs(99),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "Thaw");
        assert_eq!(json["thawEndTimestamp"], "99");
        assert_eq!(json["totalAmountThawing"], "0x2");
    }
}

//! Allocation proof signing for receivers.

use alloy_primitives::{Address, Bytes};
use tap_types::signature::SignerLike;

use crate::guard::allocation_proof_message;

/// Signs the proof that lets `sender`'s voucher for the allocation controlled by
/// `allocation_key` be redeemed through the guard at `guard`.
pub async fn sign_allocation_proof<S: SignerLike + Sync>(
    allocation_key: &S,
    chain_id: u64,
    guard: Address,
    sender: Address,
) -> Result<Bytes, alloy_signer::Error> {
    let message = allocation_proof_message(chain_id, guard, sender, allocation_key.address());
    let signature = allocation_key.sign_message(message.as_slice()).await?;
    Ok(Bytes::from(signature.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::AllocationReplayGuard;
    use alloy_primitives::address;
    use alloy_signer_local::PrivateKeySigner;

    #[tokio::test]
    async fn test_signed_proof_is_accepted() {
        let guard_address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
        let sender = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let mut guard = AllocationReplayGuard::new(31337, guard_address);
        let allocation = PrivateKeySigner::random();
        let proof = sign_allocation_proof(&allocation, 31337, guard_address, sender)
            .await
            .unwrap();
        let recovered = guard
            .use_allocation_id(sender, SignerLike::address(&allocation), &proof)
            .unwrap();
        assert_eq!(recovered, allocation.address());
    }
}

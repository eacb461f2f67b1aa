//! Voucher signing for the sender side.
//!
//! Signers hold a key delegated to them by a sender and sign each aggregate voucher
//! before handing it to the receiver. The signature is over the same EIP-712 digest
//! that [`VoucherVerifier::hash`](crate::VoucherVerifier::hash) reconstructs on redemption.

use alloy_primitives::Bytes;
use tap_types::signature::SignerLike;

use crate::rav::{ReceiptAggregateVoucher, SignedRav};
use crate::verifier::VoucherVerifier;

/// Signs `rav` under the domain of `verifier`.
pub async fn sign_rav<S: SignerLike + Sync>(
    signer: &S,
    verifier: &VoucherVerifier,
    rav: ReceiptAggregateVoucher,
) -> Result<SignedRav, alloy_signer::Error> {
    let digest = verifier.hash(&rav);
    let signature = signer.sign_hash(&digest).await?;
    Ok(SignedRav {
        message: rav,
        signature: Bytes::from(signature.as_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_signer_local::PrivateKeySigner;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_signed_rav_recovers_to_signer() {
        let verifier = VoucherVerifier::new(
            31337,
            address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
        );
        let signer = Arc::new(PrivateKeySigner::random());
        let rav = ReceiptAggregateVoucher {
            allocationId: address!("0x2222222222222222222222222222222222222222"),
            timestampNs: 10,
            valueAggregate: 42,
        };
        let signed = sign_rav(&signer, &verifier, rav).await.unwrap();
        assert_eq!(verifier.recover_signer(&signed).unwrap(), signer.address());
    }
}

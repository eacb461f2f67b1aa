//! Voucher redemption.

use alloy_primitives::{Address, U256};
use tap_verifier::SignedRav;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::CollateralEscrow;
use crate::clock::Clock;
use crate::collaborators::{CollectionSink, ValueTransfer};
use crate::error::EscrowError;
use crate::events::EscrowEvent;

/// Result of a successful redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redemption {
    pub sender: Address,
    pub signer: Address,
    /// Value the voucher claims.
    pub expected_amount: U256,
    /// Value actually paid: the claim clamped to the sender's collateral.
    pub actual_amount: U256,
}

impl<T, S, C> CollateralEscrow<T, S, C>
where
    T: ValueTransfer,
    S: CollectionSink,
    C: Clock,
{
    /// Redeems a signed voucher for the caller, the receiver.
    ///
    /// The voucher's signer is resolved to its sender, the claimed value is clamped to
    /// the sender's collateral for the caller, the allocation is consumed for that
    /// sender and the clamped value is forwarded to the collection sink. A voucher for
    /// an allocation already consumed fails whatever its value.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        receiver = %caller,
        allocation_id = %signed_rav.message.allocationId,
        value_aggregate = %signed_rav.message.valueAggregate
    )))]
    pub async fn redeem(
        &mut self,
        caller: Address,
        signed_rav: &SignedRav,
        allocation_id_proof: &[u8],
    ) -> Result<Redemption, EscrowError> {
        let signer = self.verifier.recover_signer(signed_rav)?;
        let sender = self
            .authorized_signers
            .get(&signer)
            .map(|authorization| authorization.sender)
            .ok_or(EscrowError::InvalidRavSigner { signer })?;
        let receiver = caller;
        let allocation_id = signed_rav.message.allocationId;

        let expected_amount = U256::from(signed_rav.message.valueAggregate);
        let balance = self.get_escrow_amount(sender, receiver);
        let actual_amount = expected_amount.min(balance);

        let claim =
            self.allocation_guard
                .check_allocation_id(sender, allocation_id, allocation_id_proof)?;
        self.staking.collect(actual_amount, allocation_id).await?;

        self.accounts.entry((sender, receiver)).or_default().balance = balance - actual_amount;
        self.allocation_guard.commit(claim);
        self.emit(EscrowEvent::Redeem {
            sender,
            receiver,
            allocation_id,
            expected_amount,
            actual_amount,
        });
        Ok(Redemption {
            sender,
            signer,
            expected_amount,
            actual_amount,
        })
    }
}

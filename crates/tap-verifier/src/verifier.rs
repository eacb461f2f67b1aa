//! The voucher verifier.

use alloy_primitives::{Address, B256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain};
use tap_types::signature::{SignatureFormatError, recover_from_prehash};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::rav::{ReceiptAggregateVoucher, SignedRav};

/// EIP-712 domain name shared by every TAP verifier deployment.
pub const EIP712_DOMAIN_NAME: &str = "TAP";
/// EIP-712 domain version of the voucher schema.
pub const EIP712_DOMAIN_VERSION: &str = "1";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VoucherError {
    /// The signature bytes could not be decoded into a canonical ECDSA signature.
    #[error("Malformed voucher signature: {0}")]
    MalformedSignature(SignatureFormatError),
    /// The signature decoded but no public key can be recovered from it.
    #[error("Voucher signer could not be recovered: {0}")]
    RecoveryFailed(String),
}

impl From<SignatureFormatError> for VoucherError {
    fn from(e: SignatureFormatError) -> Self {
        match e {
            SignatureFormatError::Recovery(reason) => Self::RecoveryFailed(reason),
            other => Self::MalformedSignature(other),
        }
    }
}

/// Computes voucher digests and recovers voucher signers.
///
/// Its only state is the immutable EIP-712 domain, bound to the chain and to the
/// address the verifier is deployed at.
#[derive(Debug, Clone)]
pub struct VoucherVerifier {
    domain: Eip712Domain,
}

impl VoucherVerifier {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        let domain = eip712_domain! {
            name: EIP712_DOMAIN_NAME,
            version: EIP712_DOMAIN_VERSION,
            chain_id: chain_id,
            verifying_contract: verifying_contract,
        };
        Self { domain }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// Domain separator that prefixes every voucher digest.
    pub fn domain_separator(&self) -> B256 {
        self.domain.separator()
    }

    /// EIP-712 signing hash of `rav` under this verifier's domain.
    pub fn hash(&self, rav: &ReceiptAggregateVoucher) -> B256 {
        rav.eip712_signing_hash(&self.domain)
    }

    /// Recovers the address whose key produced `signed_rav.signature`.
    ///
    /// A malformed or unrecoverable signature is reported as an error, never as an
    /// arbitrary address.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        allocation_id = %signed_rav.message.allocationId,
        value_aggregate = %signed_rav.message.valueAggregate
    )))]
    pub fn recover_signer(&self, signed_rav: &SignedRav) -> Result<Address, VoucherError> {
        let digest = self.hash(&signed_rav.message);
        let signer = recover_from_prehash(&signed_rav.signature, &digest)?;
        Ok(signer)
    }

    /// Returns whether `signed_rav` was signed by `expected`.
    pub fn verify_signature(
        &self,
        signed_rav: &SignedRav,
        expected: Address,
    ) -> Result<bool, VoucherError> {
        let signer = self.recover_signer(signed_rav)?;
        Ok(signer == expected)
    }
}

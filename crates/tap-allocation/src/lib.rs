#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Allocation replay protection for voucher redemption.
//!
//! An allocation identifier denotes a single usage channel between a sender and a
//! receiver. Vouchers are cumulative, so once the aggregate voucher of a channel has
//! been redeemed any further voucher for the same channel would pay twice. The
//! [`AllocationReplayGuard`] records which allocations have been consumed for each
//! sender and rejects every later attempt, whatever its amount.
//!
//! Consuming an allocation requires a proof signed by the allocation's own key
//! (the allocation identifier is the address of that key), over a message binding
//! the chain, the sender, the allocation and the guard itself.

pub mod guard;

#[cfg(feature = "client")]
pub mod client;

pub use guard::*;

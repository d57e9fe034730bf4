// SPDX-License-Identifier: Apache-2.0

//! Record types and store interfaces shared by the coupon pallets.
//!
//! The two store pallets persist [`CouponMaster`] and [`CouponRelation`]
//! records and expose them to the orchestrator through the [`MasterStore`]
//! and [`RelationStore`] traits. Both stores hand out the *zero record* for
//! ids that were never allocated or have been deleted, so the record types
//! implement `Default` with the null identity (`None`) in the slot that
//! decides liveness.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use codec::{Decode, Encode};
use scale_info::TypeInfo;
use sp_runtime::{DispatchError, DispatchResult, RuntimeDebug};

/// Identifier of a coupon master record. Allocated sequentially, never reused.
pub type MasterId = u64;

/// Identifier of a coupon relation record. Allocated sequentially, never reused.
pub type RelationId = u64;

/// One coupon offer: who issued it, what a claim costs, how many claims are
/// still exchangeable and an opaque metadata blob the stores never interpret.
///
/// A master is live iff `issuer` is `Some`. Deleting a master overwrites it
/// with the default value, which keeps ids stable and lets the by-issuer
/// index drop the entry deterministically.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug)]
pub struct CouponMaster<AccountId, Balance> {
	pub issuer: Option<AccountId>,
	pub price: Balance,
	pub remaining: u32,
	pub metadata: Vec<u8>,
}

impl<AccountId, Balance: Default> Default for CouponMaster<AccountId, Balance> {
	fn default() -> Self {
		Self { issuer: None, price: Balance::default(), remaining: 0, metadata: Vec::new() }
	}
}

impl<AccountId, Balance> CouponMaster<AccountId, Balance> {
	pub fn is_live(&self) -> bool {
		self.issuer.is_some()
	}
}

/// One buyer's claim against a coupon master.
///
/// A relation is live iff `holder` is `Some`; `used` flips to `true` exactly
/// once, when the claim is redeemed.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug)]
pub struct CouponRelation<AccountId> {
	pub coupon_id: MasterId,
	pub holder: Option<AccountId>,
	pub used: bool,
}

impl<AccountId> Default for CouponRelation<AccountId> {
	fn default() -> Self {
		Self { coupon_id: 0, holder: None, used: false }
	}
}

impl<AccountId> CouponRelation<AccountId> {
	pub fn is_live(&self) -> bool {
		self.holder.is_some()
	}
}

/// Orchestrator-level view of one live coupon.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug)]
pub struct Coupon<AccountId, Balance> {
	pub id: MasterId,
	pub issuer: AccountId,
	pub price: Balance,
	pub remaining: u32,
	pub metadata: Vec<u8>,
}

/// Selector for the coupons an issuer has created.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub enum IssuedFilter {
	All,
	HasRemaining,
	NoRemaining,
}

/// Selector for the claims a holder owns.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub enum OwnedFilter {
	All,
	Unused,
	Used,
}

/// Store of [`CouponMaster`] records, operable only by its authorized
/// delegate.
///
/// Every operation takes the calling identity explicitly and fails with the
/// store's AccessDenied error when the caller is not the current delegate.
/// Reads of unknown or deleted ids yield the zero record, never an error:
/// deciding whether an id refers to something real is the caller's job.
pub trait MasterStore<AccountId, Balance> {
	/// Allocate the next id and store a live record under it.
	fn create(
		caller: &AccountId,
		issuer: AccountId,
		price: Balance,
		remaining: u32,
		metadata: Vec<u8>,
	) -> Result<MasterId, DispatchError>;

	fn get(caller: &AccountId, id: MasterId) -> Result<CouponMaster<AccountId, Balance>, DispatchError>;

	/// Overwrite every field of the record, moving its by-issuer index entry
	/// if the issuer changed.
	fn update(
		caller: &AccountId,
		id: MasterId,
		issuer: AccountId,
		price: Balance,
		remaining: u32,
		metadata: Vec<u8>,
	) -> DispatchResult;

	/// Overwrite the record with the zero record, dropping it from the
	/// by-issuer index. Removing an already-removed id changes nothing.
	fn remove(caller: &AccountId, id: MasterId) -> DispatchResult;

	/// Every record from id 0 up to the allocation watermark, in id order,
	/// zeroed ones included.
	fn all(caller: &AccountId) -> Result<Vec<CouponMaster<AccountId, Balance>>, DispatchError>;

	/// Ids of the live records issued by `issuer`, in insertion order.
	fn ids_by_issuer(caller: &AccountId, issuer: &AccountId) -> Result<Vec<MasterId>, DispatchError>;

	fn update_issuer(caller: &AccountId, id: MasterId, issuer: AccountId) -> DispatchResult;

	fn update_price(caller: &AccountId, id: MasterId, price: Balance) -> DispatchResult;

	/// Apply a signed delta to the remaining count, saturating at zero and
	/// at `u32::MAX`.
	fn adjust_remaining(caller: &AccountId, id: MasterId, delta: i32) -> DispatchResult;

	fn update_metadata(caller: &AccountId, id: MasterId, metadata: Vec<u8>) -> DispatchResult;
}

/// Store of [`CouponRelation`] records, operable only by its authorized
/// delegate. Same access and zero-record semantics as [`MasterStore`], with
/// two indices: by holder and by coupon id.
pub trait RelationStore<AccountId> {
	/// Allocate the next id and store a live, unused claim under it.
	fn create(caller: &AccountId, coupon_id: MasterId, holder: AccountId) -> Result<RelationId, DispatchError>;

	fn get(caller: &AccountId, id: RelationId) -> Result<CouponRelation<AccountId>, DispatchError>;

	/// Overwrite every field of the record, moving its index entries where
	/// the keyed fields changed.
	fn update(
		caller: &AccountId,
		id: RelationId,
		coupon_id: MasterId,
		holder: AccountId,
		used: bool,
	) -> DispatchResult;

	/// Overwrite the record with the zero record, dropping it from both
	/// indices. Removing an already-removed id changes nothing.
	fn remove(caller: &AccountId, id: RelationId) -> DispatchResult;

	/// Every record from id 0 up to the allocation watermark, in id order,
	/// zeroed ones included.
	fn all(caller: &AccountId) -> Result<Vec<CouponRelation<AccountId>>, DispatchError>;

	/// Ids of the live claims held by `holder`, in insertion order.
	fn ids_by_holder(caller: &AccountId, holder: &AccountId) -> Result<Vec<RelationId>, DispatchError>;

	/// Ids of the live claims against `coupon_id`, in insertion order.
	fn ids_by_coupon(caller: &AccountId, coupon_id: MasterId) -> Result<Vec<RelationId>, DispatchError>;

	fn update_coupon_id(caller: &AccountId, id: RelationId, coupon_id: MasterId) -> DispatchResult;

	fn update_holder(caller: &AccountId, id: RelationId, holder: AccountId) -> DispatchResult;

	fn set_used(caller: &AccountId, id: RelationId, used: bool) -> DispatchResult;
}

/// Append `id` to an index sequence unless it is already a member.
pub fn index_insert(seq: &mut Vec<u64>, id: u64) {
	if !seq.contains(&id) {
		seq.push(id);
	}
}

/// Splice `id` out of an index sequence, keeping the order of the rest.
pub fn index_remove(seq: &mut Vec<u64>, id: u64) {
	seq.retain(|&entry| entry != id);
}

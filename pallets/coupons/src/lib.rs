// SPDX-License-Identifier: Apache-2.0

//! # Coupons
//!
//! The coupon marketplace orchestrator. Issuers create coupons with a price
//! and a supply; buyers pay the exact price for a redeemable claim; claims
//! settle to the issuer when used; deleting a coupon refunds every unused
//! claim holder.
//!
//! ## Overview
//!
//! The pallet owns no records itself. Masters and claims live in the two
//! store pallets reached through [`MasterStore`] and [`RelationStore`], with
//! this pallet's sovereign account (derived from [`Config::PalletId`]) wired
//! as their sole delegate. Every store access passes that account as the
//! caller, so a runtime that has not authorized this pallet gets the store's
//! AccessDenied back unchanged.
//!
//! ## Escrow
//!
//! A buyer's payment is not forwarded to the issuer on exchange. It sits in
//! the pallet account until the claim is used (paid to the issuer) or the
//! coupon is deleted (refunded to the holder). `delete_coupon` computes the
//! full refund set up front and verifies the escrow covers it before
//! touching any record; a shortfall means the bookkeeping is broken and the
//! call fails with `InternalError` rather than refunding partially. Dispatch
//! is transactional, so a failure anywhere in settlement unwinds record
//! writes and transfers together.
//!
//! A coupon is *active* while its master has remaining supply, *exhausted*
//! when the supply is zero and *deleted* once the master is zeroed; only
//! deletion is irreversible.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use coupon_primitives::{
	Coupon, IssuedFilter, MasterId, MasterStore, OwnedFilter, RelationId, RelationStore,
};
use frame_support::{
	pallet_prelude::*,
	traits::{
		fungible::{Inspect, Mutate},
		tokens::Preservation,
	},
	PalletId,
};
use sp_runtime::traits::{AccountIdConversion, CheckedMul};

pub use pallet::*;

#[cfg(test)]
mod mock;


const LOG_TARGET: &str = "runtime::coupons";

pub type BalanceOf<T> =
	<<T as Config>::Currency as Inspect<<T as frame_system::Config>::AccountId>>::Balance;

pub trait WeightInfo {
	fn create_coupon() -> Weight;
	fn exchange_coupon() -> Weight;
	fn use_coupon() -> Weight;
	fn disable_coupon() -> Weight;
	fn delete_coupon() -> Weight;
}

impl WeightInfo for () {
	fn create_coupon() -> Weight {
		Weight::from_parts(10_000, 0)
	}
	fn exchange_coupon() -> Weight {
		Weight::from_parts(10_000, 0)
	}
	fn use_coupon() -> Weight {
		Weight::from_parts(10_000, 0)
	}
	fn disable_coupon() -> Weight {
		Weight::from_parts(10_000, 0)
	}
	fn delete_coupon() -> Weight {
		Weight::from_parts(10_000, 0)
	}
}

#[frame_support::pallet]
pub mod pallet {
	use super::*;
	use frame_system::pallet_prelude::*;

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	#[pallet::config]
	pub trait Config: frame_system::Config {
		/// The overarching event type.
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// The currency claims are paid and settled in.
		type Currency: Inspect<Self::AccountId> + Mutate<Self::AccountId>;

		/// The master store this pallet operates as delegate.
		type Masters: MasterStore<Self::AccountId, BalanceOf<Self>>;

		/// The relation store this pallet operates as delegate.
		type Relations: RelationStore<Self::AccountId>;

		/// The pallet id the escrow account is derived from.
		#[pallet::constant]
		type PalletId: Get<PalletId>;

		/// Weight information for extrinsics in this pallet.
		type WeightInfo: WeightInfo;
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		/// A new coupon is open for exchange.
		CouponCreated {
			coupon_id: MasterId,
			issuer: T::AccountId,
			price: BalanceOf<T>,
			remaining: u32,
		},
		/// A buyer paid the price into escrow for a claim.
		CouponExchanged { coupon_id: MasterId, relation_id: RelationId, holder: T::AccountId },
		/// A claim was redeemed and its escrowed price paid to the issuer.
		CouponUsed { coupon_id: MasterId, relation_id: RelationId, holder: T::AccountId },
		/// A coupon was closed for further exchange.
		CouponDisabled { coupon_id: MasterId },
		/// A coupon was deleted and its unused claims refunded.
		CouponDeleted { coupon_id: MasterId, refunded: u32 },
	}

	#[pallet::error]
	pub enum Error<T> {
		/// The coupon or claim does not exist or has been deleted.
		NotFound,
		/// The payment does not match the price, or the coupon has no
		/// supply left.
		BadRequest,
		/// The escrow does not cover a payout it must always cover. This is
		/// a bookkeeping failure, not a caller error.
		InternalError,
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Create a coupon issued by the caller. No value moves.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::create_coupon())]
		pub fn create_coupon(
			origin: OriginFor<T>,
			price: BalanceOf<T>,
			remaining: u32,
			metadata: Vec<u8>,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			let coupon_id =
				T::Masters::create(&Self::account_id(), who.clone(), price, remaining, metadata)?;
			Self::deposit_event(Event::CouponCreated { coupon_id, issuer: who, price, remaining });
			Ok(())
		}

		/// Pay exactly the coupon's price into escrow for a fresh claim.
		///
		/// The payment is held by the pallet account until the claim is used
		/// or the coupon is deleted.
		#[pallet::call_index(1)]
		#[pallet::weight(T::WeightInfo::exchange_coupon())]
		pub fn exchange_coupon(
			origin: OriginFor<T>,
			coupon_id: MasterId,
			payment: BalanceOf<T>,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			let escrow = Self::account_id();
			let coupon = Self::live_coupon(&escrow, coupon_id)?;
			ensure!(payment == coupon.price, Error::<T>::BadRequest);
			ensure!(coupon.remaining > 0, Error::<T>::BadRequest);

			T::Currency::transfer(&who, &escrow, payment, Preservation::Expendable)?;
			T::Masters::adjust_remaining(&escrow, coupon_id, -1)?;
			let relation_id = T::Relations::create(&escrow, coupon_id, who.clone())?;

			Self::deposit_event(Event::CouponExchanged { coupon_id, relation_id, holder: who });
			Ok(())
		}

		/// Redeem the caller's oldest unused claim on the coupon, paying the
		/// escrowed price out to the issuer.
		#[pallet::call_index(2)]
		#[pallet::weight(T::WeightInfo::use_coupon())]
		pub fn use_coupon(origin: OriginFor<T>, coupon_id: MasterId) -> DispatchResult {
			let who = ensure_signed(origin)?;
			let escrow = Self::account_id();
			let coupon = Self::live_coupon(&escrow, coupon_id)?;

			let mut claim = None;
			for id in T::Relations::ids_by_holder(&escrow, &who)? {
				let relation = T::Relations::get(&escrow, id)?;
				if relation.coupon_id == coupon_id && !relation.used {
					claim = Some(id);
					break;
				}
			}
			let relation_id = claim.ok_or(Error::<T>::NotFound)?;

			// Exchanges escrowed this amount; not holding it is a bug, not
			// a caller error.
			ensure!(
				T::Currency::balance(&escrow) >= coupon.price,
				Error::<T>::InternalError
			);

			T::Relations::set_used(&escrow, relation_id, true)?;
			T::Currency::transfer(&escrow, &coupon.issuer, coupon.price, Preservation::Expendable)?;

			log::debug!(
				target: LOG_TARGET,
				"claim {relation_id} on coupon {coupon_id} settled to issuer",
			);
			Self::deposit_event(Event::CouponUsed { coupon_id, relation_id, holder: who });
			Ok(())
		}

		/// Close a coupon for further exchange by zeroing its remaining
		/// supply. Existing claims are untouched and can still be used.
		#[pallet::call_index(3)]
		#[pallet::weight(T::WeightInfo::disable_coupon())]
		pub fn disable_coupon(origin: OriginFor<T>, coupon_id: MasterId) -> DispatchResult {
			ensure_signed(origin)?;
			let escrow = Self::account_id();
			let coupon = Self::live_coupon(&escrow, coupon_id)?;
			T::Masters::update(&escrow, coupon_id, coupon.issuer, coupon.price, 0, coupon.metadata)?;
			Self::deposit_event(Event::CouponDisabled { coupon_id });
			Ok(())
		}

		/// Delete a coupon: refund every unused claim holder the full price,
		/// then zero the master and all of its claims.
		///
		/// The refund set is computed and checked against the escrow before
		/// any record is touched, so the call either settles completely or
		/// not at all.
		#[pallet::call_index(4)]
		#[pallet::weight(T::WeightInfo::delete_coupon())]
		pub fn delete_coupon(origin: OriginFor<T>, coupon_id: MasterId) -> DispatchResult {
			ensure_signed(origin)?;
			let escrow = Self::account_id();
			let coupon = Self::live_coupon(&escrow, coupon_id)?;
			let relation_ids = T::Relations::ids_by_coupon(&escrow, coupon_id)?;

			let mut refunds = Vec::new();
			for id in &relation_ids {
				let relation = T::Relations::get(&escrow, *id)?;
				if !relation.used {
					if let Some(holder) = relation.holder {
						refunds.push(holder);
					}
				}
			}
			let total = coupon
				.price
				.checked_mul(&(refunds.len() as u32).into())
				.ok_or(Error::<T>::InternalError)?;
			ensure!(T::Currency::balance(&escrow) >= total, Error::<T>::InternalError);

			for id in relation_ids {
				T::Relations::remove(&escrow, id)?;
			}
			T::Masters::remove(&escrow, coupon_id)?;

			for holder in &refunds {
				T::Currency::transfer(&escrow, holder, coupon.price, Preservation::Expendable)?;
			}

			log::debug!(
				target: LOG_TARGET,
				"coupon {coupon_id} deleted, {} claims refunded",
				refunds.len(),
			);
			Self::deposit_event(Event::CouponDeleted {
				coupon_id,
				refunded: refunds.len() as u32,
			});
			Ok(())
		}
	}

	impl<T: Config> Pallet<T> {
		/// The escrow account holding every exchanged-but-unsettled payment.
		pub fn account_id() -> T::AccountId {
			T::PalletId::get().into_account_truncating()
		}

		/// The coupon behind `coupon_id`, if it has not been deleted.
		pub fn coupon(
			coupon_id: MasterId,
		) -> Result<Coupon<T::AccountId, BalanceOf<T>>, DispatchError> {
			Self::live_coupon(&Self::account_id(), coupon_id)
		}

		/// Ids of the coupons `who` issued, filtered on remaining supply.
		/// Deleted coupons leave the issuer index and never show up.
		pub fn issued_coupon_ids(
			who: &T::AccountId,
			filter: IssuedFilter,
		) -> Result<Vec<MasterId>, DispatchError> {
			let escrow = Self::account_id();
			let mut ids = Vec::new();
			for id in T::Masters::ids_by_issuer(&escrow, who)? {
				let master = T::Masters::get(&escrow, id)?;
				let keep = match filter {
					IssuedFilter::All => true,
					IssuedFilter::HasRemaining => master.remaining > 0,
					IssuedFilter::NoRemaining => master.remaining == 0,
				};
				if keep {
					ids.push(id);
				}
			}
			Ok(ids)
		}

		/// Ids of the claims `who` holds, filtered on whether they were
		/// redeemed. Claims of deleted coupons leave the holder index and
		/// never show up.
		pub fn owned_coupon_ids(
			who: &T::AccountId,
			filter: OwnedFilter,
		) -> Result<Vec<RelationId>, DispatchError> {
			let escrow = Self::account_id();
			let mut ids = Vec::new();
			for id in T::Relations::ids_by_holder(&escrow, who)? {
				let relation = T::Relations::get(&escrow, id)?;
				let keep = match filter {
					OwnedFilter::All => true,
					OwnedFilter::Unused => !relation.used,
					OwnedFilter::Used => relation.used,
				};
				if keep {
					ids.push(id);
				}
			}
			Ok(ids)
		}

		fn live_coupon(
			caller: &T::AccountId,
			coupon_id: MasterId,
		) -> Result<Coupon<T::AccountId, BalanceOf<T>>, DispatchError> {
			let master = T::Masters::get(caller, coupon_id)?;
			let issuer = master.issuer.ok_or(Error::<T>::NotFound)?;
			Ok(Coupon {
				id: coupon_id,
				issuer,
				price: master.price,
				remaining: master.remaining,
				metadata: master.metadata,
			})
		}
	}
}

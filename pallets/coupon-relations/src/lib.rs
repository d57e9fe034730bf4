// SPDX-License-Identifier: Apache-2.0

//! # Coupon Relation Store
//!
//! Keyed storage for [`CouponRelation`] records, the claims buyers hold
//! against coupon masters. Two secondary indices are maintained: claims by
//! holder and claims by coupon id.
//!
//! Access control is the same owner/delegate scheme as the master store:
//! the owner (fixed at genesis) can replace the delegate, and the delegate
//! is the only identity allowed to read or write records. Deleting a record
//! overwrites it with the zero record and drops it from both indices.
//!
//! A relation's coupon id is a foreign reference into the master store and
//! is stored as given. Whether it refers to a live master is for the
//! delegate to decide; this store only keeps its own records and indices
//! consistent.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use coupon_primitives::{index_insert, index_remove, CouponRelation, MasterId, RelationId, RelationStore};
use frame_support::pallet_prelude::*;

pub use pallet::*;

#[cfg(test)]
mod mock;


pub trait WeightInfo {
	fn set_authorized() -> Weight;
}

impl WeightInfo for () {
	fn set_authorized() -> Weight {
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

		/// Weight information for extrinsics in this pallet.
		type WeightInfo: WeightInfo;
	}

	/// The store's administrator. Set at genesis, never mutated afterwards.
	#[pallet::storage]
	pub type Owner<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

	/// The single delegate allowed to operate on the records.
	#[pallet::storage]
	pub type Authorized<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

	/// The next id to allocate. Ids are never reused.
	#[pallet::storage]
	pub type NextRelationId<T: Config> = StorageValue<_, RelationId, ValueQuery>;

	/// Relation records by id. Unallocated and deleted ids read back as the
	/// zero record.
	#[pallet::storage]
	#[pallet::unbounded]
	pub type Relations<T: Config> =
		StorageMap<_, Blake2_128Concat, RelationId, CouponRelation<T::AccountId>, ValueQuery>;

	/// Ids of the live claims held by each account, in exchange order.
	#[pallet::storage]
	#[pallet::unbounded]
	pub type RelationsByHolder<T: Config> =
		StorageMap<_, Blake2_128Concat, T::AccountId, Vec<RelationId>, ValueQuery>;

	/// Ids of the live claims against each coupon, in exchange order.
	#[pallet::storage]
	#[pallet::unbounded]
	pub type RelationsByCoupon<T: Config> =
		StorageMap<_, Blake2_128Concat, MasterId, Vec<RelationId>, ValueQuery>;

	#[pallet::genesis_config]
	#[derive(frame_support::DefaultNoBound)]
	pub struct GenesisConfig<T: Config> {
		pub owner: Option<T::AccountId>,
		pub authorized: Option<T::AccountId>,
	}

	#[pallet::genesis_build]
	impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
		fn build(&self) {
			if let Some(owner) = &self.owner {
				Owner::<T>::put(owner);
			}
			if let Some(authorized) = &self.authorized {
				Authorized::<T>::put(authorized);
			}
		}
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		/// The delegate allowed to operate on the store was replaced.
		AuthorizedChanged { old: Option<T::AccountId>, new: T::AccountId },
	}

	#[pallet::error]
	pub enum Error<T> {
		/// The caller does not hold the role this operation requires.
		AccessDenied,
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Replace the delegate. Only the owner may do this.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::set_authorized())]
		pub fn set_authorized(origin: OriginFor<T>, new: T::AccountId) -> DispatchResult {
			let who = ensure_signed(origin)?;
			ensure!(Owner::<T>::get().as_ref() == Some(&who), Error::<T>::AccessDenied);
			let old = Authorized::<T>::get();
			Authorized::<T>::put(&new);
			Self::deposit_event(Event::AuthorizedChanged { old, new });
			Ok(())
		}
	}

	impl<T: Config> Pallet<T> {
		/// The current delegate, if one has been set.
		pub fn authorized() -> Option<T::AccountId> {
			Authorized::<T>::get()
		}

		fn ensure_authorized(caller: &T::AccountId) -> DispatchResult {
			ensure!(Authorized::<T>::get().as_ref() == Some(caller), Error::<T>::AccessDenied);
			Ok(())
		}

		/// Write `new` under `id` and splice both indices to match.
		///
		/// The coupon index only tracks live records, so a record keeps its
		/// by-coupon entry exactly while its holder is set; the zero record
		/// (coupon id 0, no holder) is indexed nowhere.
		fn write(id: RelationId, new: CouponRelation<T::AccountId>) {
			let old = Relations::<T>::get(id);
			if old.holder != new.holder {
				if let Some(holder) = &old.holder {
					RelationsByHolder::<T>::mutate_exists(holder, |maybe| {
						if let Some(ids) = maybe {
							index_remove(ids, id);
							if ids.is_empty() {
								*maybe = None;
							}
						}
					});
				}
				if let Some(holder) = &new.holder {
					RelationsByHolder::<T>::mutate(holder, |ids| index_insert(ids, id));
				}
			}

			let old_coupon = old.holder.is_some().then_some(old.coupon_id);
			let new_coupon = new.holder.is_some().then_some(new.coupon_id);
			if old_coupon != new_coupon {
				if let Some(coupon_id) = old_coupon {
					RelationsByCoupon::<T>::mutate_exists(coupon_id, |maybe| {
						if let Some(ids) = maybe {
							index_remove(ids, id);
							if ids.is_empty() {
								*maybe = None;
							}
						}
					});
				}
				if let Some(coupon_id) = new_coupon {
					RelationsByCoupon::<T>::mutate(coupon_id, |ids| index_insert(ids, id));
				}
			}

			Relations::<T>::insert(id, new);
		}
	}

	impl<T: Config> RelationStore<T::AccountId> for Pallet<T> {
		fn create(
			caller: &T::AccountId,
			coupon_id: MasterId,
			holder: T::AccountId,
		) -> Result<RelationId, DispatchError> {
			Self::ensure_authorized(caller)?;
			let id = NextRelationId::<T>::get();
			NextRelationId::<T>::put(id.saturating_add(1));
			Self::write(id, CouponRelation { coupon_id, holder: Some(holder), used: false });
			Ok(id)
		}

		fn get(
			caller: &T::AccountId,
			id: RelationId,
		) -> Result<CouponRelation<T::AccountId>, DispatchError> {
			Self::ensure_authorized(caller)?;
			Ok(Relations::<T>::get(id))
		}

		fn update(
			caller: &T::AccountId,
			id: RelationId,
			coupon_id: MasterId,
			holder: T::AccountId,
			used: bool,
		) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			Self::write(id, CouponRelation { coupon_id, holder: Some(holder), used });
			Ok(())
		}

		fn remove(caller: &T::AccountId, id: RelationId) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			Self::write(id, CouponRelation::default());
			Ok(())
		}

		fn all(caller: &T::AccountId) -> Result<Vec<CouponRelation<T::AccountId>>, DispatchError> {
			Self::ensure_authorized(caller)?;
			Ok((0..NextRelationId::<T>::get()).map(Relations::<T>::get).collect())
		}

		fn ids_by_holder(
			caller: &T::AccountId,
			holder: &T::AccountId,
		) -> Result<Vec<RelationId>, DispatchError> {
			Self::ensure_authorized(caller)?;
			Ok(RelationsByHolder::<T>::get(holder))
		}

		fn ids_by_coupon(
			caller: &T::AccountId,
			coupon_id: MasterId,
		) -> Result<Vec<RelationId>, DispatchError> {
			Self::ensure_authorized(caller)?;
			Ok(RelationsByCoupon::<T>::get(coupon_id))
		}

		fn update_coupon_id(caller: &T::AccountId, id: RelationId, coupon_id: MasterId) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			let mut relation = Relations::<T>::get(id);
			relation.coupon_id = coupon_id;
			Self::write(id, relation);
			Ok(())
		}

		fn update_holder(caller: &T::AccountId, id: RelationId, holder: T::AccountId) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			let mut relation = Relations::<T>::get(id);
			relation.holder = Some(holder);
			Self::write(id, relation);
			Ok(())
		}

		fn set_used(caller: &T::AccountId, id: RelationId, used: bool) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			let mut relation = Relations::<T>::get(id);
			relation.used = used;
			Self::write(id, relation);
			Ok(())
		}
	}
}

// SPDX-License-Identifier: Apache-2.0

//! # Coupon Master Store
//!
//! Keyed storage for [`CouponMaster`] records with a by-issuer secondary
//! index.
//!
//! The store is administered by an owner fixed at genesis and operated by a
//! single delegate: every read and write of the records requires the caller
//! to be the current delegate, and only the owner can replace the delegate
//! through [`Call::set_authorized`]. In a full runtime the delegate is the
//! coupons pallet's escrow account, which makes that pallet the only party
//! able to touch the records.
//!
//! Records are never physically removed. Deleting one overwrites it with the
//! zero record (null issuer, zero price and supply, empty metadata), so ids
//! stay stable and the by-issuer index entry is dropped deterministically.
//! Reading an id that was never allocated yields that same zero record.
//!
//! All index bookkeeping funnels through one record writer that diffs the
//! old and new issuer, which keeps the index in lockstep with the records
//! for create, update and remove alike.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use coupon_primitives::{index_insert, index_remove, CouponMaster, MasterId, MasterStore};
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

		/// The unit master prices are denominated in.
		type Balance: Parameter + Member + Default + Copy + MaxEncodedLen;

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
	pub type NextMasterId<T: Config> = StorageValue<_, MasterId, ValueQuery>;

	/// Master records by id. Unallocated and deleted ids read back as the
	/// zero record.
	#[pallet::storage]
	#[pallet::unbounded]
	pub type Masters<T: Config> =
		StorageMap<_, Blake2_128Concat, MasterId, CouponMaster<T::AccountId, T::Balance>, ValueQuery>;

	/// Ids of the live masters created by each issuer, in creation order.
	#[pallet::storage]
	#[pallet::unbounded]
	pub type MastersByIssuer<T: Config> =
		StorageMap<_, Blake2_128Concat, T::AccountId, Vec<MasterId>, ValueQuery>;

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

		/// Write `new` under `id` and splice the by-issuer index to match.
		///
		/// Passing the zero record is what "delete" means: the old issuer's
		/// index entry is dropped and no new one is added.
		fn write(id: MasterId, new: CouponMaster<T::AccountId, T::Balance>) {
			let old = Masters::<T>::get(id);
			if old.issuer != new.issuer {
				if let Some(issuer) = &old.issuer {
					MastersByIssuer::<T>::mutate_exists(issuer, |maybe| {
						if let Some(ids) = maybe {
							index_remove(ids, id);
							if ids.is_empty() {
								*maybe = None;
							}
						}
					});
				}
				if let Some(issuer) = &new.issuer {
					MastersByIssuer::<T>::mutate(issuer, |ids| index_insert(ids, id));
				}
			}
			Masters::<T>::insert(id, new);
		}
	}

	impl<T: Config> MasterStore<T::AccountId, T::Balance> for Pallet<T> {
		fn create(
			caller: &T::AccountId,
			issuer: T::AccountId,
			price: T::Balance,
			remaining: u32,
			metadata: Vec<u8>,
		) -> Result<MasterId, DispatchError> {
			Self::ensure_authorized(caller)?;
			let id = NextMasterId::<T>::get();
			NextMasterId::<T>::put(id.saturating_add(1));
			Self::write(id, CouponMaster { issuer: Some(issuer), price, remaining, metadata });
			Ok(id)
		}

		fn get(
			caller: &T::AccountId,
			id: MasterId,
		) -> Result<CouponMaster<T::AccountId, T::Balance>, DispatchError> {
			Self::ensure_authorized(caller)?;
			Ok(Masters::<T>::get(id))
		}

		fn update(
			caller: &T::AccountId,
			id: MasterId,
			issuer: T::AccountId,
			price: T::Balance,
			remaining: u32,
			metadata: Vec<u8>,
		) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			Self::write(id, CouponMaster { issuer: Some(issuer), price, remaining, metadata });
			Ok(())
		}

		fn remove(caller: &T::AccountId, id: MasterId) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			Self::write(id, CouponMaster::default());
			Ok(())
		}

		fn all(
			caller: &T::AccountId,
		) -> Result<Vec<CouponMaster<T::AccountId, T::Balance>>, DispatchError> {
			Self::ensure_authorized(caller)?;
			Ok((0..NextMasterId::<T>::get()).map(Masters::<T>::get).collect())
		}

		fn ids_by_issuer(
			caller: &T::AccountId,
			issuer: &T::AccountId,
		) -> Result<Vec<MasterId>, DispatchError> {
			Self::ensure_authorized(caller)?;
			Ok(MastersByIssuer::<T>::get(issuer))
		}

		fn update_issuer(caller: &T::AccountId, id: MasterId, issuer: T::AccountId) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			let mut master = Masters::<T>::get(id);
			master.issuer = Some(issuer);
			Self::write(id, master);
			Ok(())
		}

		fn update_price(caller: &T::AccountId, id: MasterId, price: T::Balance) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			let mut master = Masters::<T>::get(id);
			master.price = price;
			Self::write(id, master);
			Ok(())
		}

		fn adjust_remaining(caller: &T::AccountId, id: MasterId, delta: i32) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			let mut master = Masters::<T>::get(id);
			master.remaining = master.remaining.saturating_add_signed(delta);
			Self::write(id, master);
			Ok(())
		}

		fn update_metadata(caller: &T::AccountId, id: MasterId, metadata: Vec<u8>) -> DispatchResult {
			Self::ensure_authorized(caller)?;
			let mut master = Masters::<T>::get(id);
			master.metadata = metadata;
			Self::write(id, master);
			Ok(())
		}
	}
}

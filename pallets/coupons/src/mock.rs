// SPDX-License-Identifier: Apache-2.0

//! Test runtime wiring both stores to the coupons pallet as delegate.

use crate as pallet_coupons;
use frame_support::{derive_impl, parameter_types, PalletId};
use sp_runtime::{traits::AccountIdConversion, BuildStorage};

type Block = frame_system::mocking::MockBlock<Test>;

frame_support::construct_runtime!(
	pub enum Test {
		System: frame_system,
		Balances: pallet_balances,
		CouponMasters: pallet_coupon_masters,
		CouponRelations: pallet_coupon_relations,
		Coupons: pallet_coupons,
	}
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
	type Block = Block;
	type AccountData = pallet_balances::AccountData<u64>;
}

#[derive_impl(pallet_balances::config_preludes::TestDefaultConfig)]
impl pallet_balances::Config for Test {
	type AccountStore = System;
}

impl pallet_coupon_masters::Config for Test {
	type RuntimeEvent = RuntimeEvent;
	type Balance = u64;
	type WeightInfo = ();
}

impl pallet_coupon_relations::Config for Test {
	type RuntimeEvent = RuntimeEvent;
	type WeightInfo = ();
}

parameter_types! {
	pub const CouponsPalletId: PalletId = PalletId(*b"py/coupn");
}

impl pallet_coupons::Config for Test {
	type RuntimeEvent = RuntimeEvent;
	type Currency = Balances;
	type Masters = CouponMasters;
	type Relations = CouponRelations;
	type PalletId = CouponsPalletId;
	type WeightInfo = ();
}

pub const ADMIN: u64 = 0;
pub const ISSUER: u64 = 1;
pub const HOLDER_A: u64 = 2;
pub const HOLDER_B: u64 = 3;

pub fn escrow_account() -> u64 {
	CouponsPalletId::get().into_account_truncating()
}

pub fn new_test_ext() -> sp_io::TestExternalities {
	let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
	pallet_balances::GenesisConfig::<Test> {
		balances: vec![(ISSUER, 100), (HOLDER_A, 100), (HOLDER_B, 100)],
		..Default::default()
	}
	.assimilate_storage(&mut t)
	.unwrap();
	pallet_coupon_masters::GenesisConfig::<Test> {
		owner: Some(ADMIN),
		authorized: Some(escrow_account()),
	}
	.assimilate_storage(&mut t)
	.unwrap();
	pallet_coupon_relations::GenesisConfig::<Test> {
		owner: Some(ADMIN),
		authorized: Some(escrow_account()),
	}
	.assimilate_storage(&mut t)
	.unwrap();
	let mut ext: sp_io::TestExternalities = t.into();
	ext.execute_with(|| System::set_block_number(1));
	ext
}

// SPDX-License-Identifier: Apache-2.0

//! Test runtime for the coupon master store.

use crate as pallet_coupon_masters;
use frame_support::derive_impl;
use sp_runtime::BuildStorage;

type Block = frame_system::mocking::MockBlock<Test>;

frame_support::construct_runtime!(
	pub enum Test {
		System: frame_system,
		CouponMasters: pallet_coupon_masters,
	}
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
	type Block = Block;
}

impl pallet_coupon_masters::Config for Test {
	type RuntimeEvent = RuntimeEvent;
	type Balance = u64;
	type WeightInfo = ();
}

pub const OWNER: u64 = 0;
pub const DELEGATE: u64 = 1;

pub fn new_test_ext() -> sp_io::TestExternalities {
	let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
	pallet_coupon_masters::GenesisConfig::<Test> {
		owner: Some(OWNER),
		authorized: Some(DELEGATE),
	}
	.assimilate_storage(&mut t)
	.unwrap();
	let mut ext: sp_io::TestExternalities = t.into();
	ext.execute_with(|| System::set_block_number(1));
	ext
}

pub mod asset_store;
pub mod naming;

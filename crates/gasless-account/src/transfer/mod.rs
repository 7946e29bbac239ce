mod build;
pub use build::TransferInstruction;

mod estimate;
pub use estimate::estimate_fee;

mod relay;
pub use relay::resolve_relay_address;

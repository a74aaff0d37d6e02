// Log targets, filter with e.g. RUST_LOG=hospital_store::fanout=debug
pub const STORE: &str = "hospital_store::store";
pub const FANOUT: &str = "hospital_store::fanout";
pub const TRANSPORT: &str = "hospital_store::transport";

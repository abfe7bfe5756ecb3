//! Shared primitive types used across the crate.

/// Row id of a persisted simulation.
pub type SimulationId = i64;

/// A drawn wheel number, always in `0..=36`.
pub type WheelNumber = u8;

/// Opaque JSON object stored alongside simulations and spins.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Highest number on a European wheel.
pub const MAX_WHEEL_NUMBER: WheelNumber = 36;

/// Numbers on the wheel, zero included.
pub const WHEEL_SIZE: usize = 37;

/// UTC timestamp in the `%Y-%m-%dT%H:%M:%fZ` shape the database stores.
pub fn utc_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

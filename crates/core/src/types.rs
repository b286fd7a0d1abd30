/// Shot identifiers are caller-assigned strings; the token before the first
/// `_` encodes the shot's scene group.
pub type ShotId = String;

/// Library asset identifiers are caller-assigned strings.
pub type AssetId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

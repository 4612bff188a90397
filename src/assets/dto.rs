use serde::Deserialize;

/// Body of add, sell and update requests. Other Asset fields the client
/// echoes back (id, name, currentPrice...) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRequest {
    pub stock_tag: String,
    pub exchange: String,
    pub price: f64,
    pub quantity: f64,
}

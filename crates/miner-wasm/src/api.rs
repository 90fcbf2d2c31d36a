//! Esplora API client for fetching the chain tip and mempool.
//!
//! This is the browser's block source: it turns explorer responses into the
//! [`PreviousBlock`] record the miner consumes.

use miner_core::PreviousBlock;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::state::to_js;

/// Base URL of the Esplora API for a network name.
pub fn base_url_for(network: &str) -> &'static str {
    match network {
        "testnet" | "testnet3" => "https://blockstream.info/testnet/api",
        "mempool" => "https://mempool.space/api",
        "testnet4" => "https://mempool.space/testnet4/api",
        _ => "https://blockstream.info/api",
    }
}

/// Blockchain API client for fetching block data.
#[wasm_bindgen]
pub struct BlockchainApi {
    /// Base URL for the API
    base_url: String,
}

#[wasm_bindgen]
impl BlockchainApi {
    /// Create a new API client for the specified network.
    #[wasm_bindgen(constructor)]
    pub fn new(network: &str) -> Self {
        BlockchainApi {
            base_url: base_url_for(network).to_string(),
        }
    }

    /// Get the current tip block hash.
    pub async fn get_tip_hash(&self) -> Result<String, JsValue> {
        let url = format!("{}/blocks/tip/hash", self.base_url);
        Ok(self.fetch_text(&url).await?.trim().to_string())
    }

    /// Get block data by hash.
    pub async fn get_block(&self, hash: &str) -> Result<JsValue, JsValue> {
        let url = format!("{}/block/{}", self.base_url, hash);
        self.fetch_json(&url).await
    }

    /// Fetch the tip and return it as a previous-block record.
    pub async fn get_previous_block(&self) -> Result<JsValue, JsValue> {
        let hash = self.get_tip_hash().await?;
        let block = self.get_block(&hash).await?;
        let previous = parse_previous_block(&block)?;
        to_js(&previous)
    }

    /// Get up to `limit` transaction ids from the mempool.
    pub async fn get_mempool_txids(&self, limit: usize) -> Result<JsValue, JsValue> {
        let url = format!("{}/mempool/txids", self.base_url);
        let all = self.fetch_json(&url).await?;
        let mut txids: Vec<String> = serde_wasm_bindgen::from_value(all)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse mempool txids: {:?}", e)))?;
        txids.truncate(limit);
        to_js(&txids)
    }

    /// Get the base URL.
    #[wasm_bindgen(getter)]
    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Fetch a response, failing on non-2xx status.
    async fn fetch(&self, url: &str) -> Result<Response, JsValue> {
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(url, &opts)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;

        if !resp.ok() {
            return Err(JsValue::from_str(&format!(
                "HTTP error: {}",
                resp.status()
            )));
        }

        Ok(resp)
    }

    /// Fetch text from a URL.
    async fn fetch_text(&self, url: &str) -> Result<String, JsValue> {
        let resp = self.fetch(url).await?;
        let text = JsFuture::from(resp.text()?).await?;
        text.as_string()
            .ok_or_else(|| JsValue::from_str("Response is not a string"))
    }

    /// Fetch JSON from a URL.
    async fn fetch_json(&self, url: &str) -> Result<JsValue, JsValue> {
        let resp = self.fetch(url).await?;
        JsFuture::from(resp.json()?).await
    }
}

/// Parse a previous-block record from a block API response.
pub fn parse_previous_block(js_value: &JsValue) -> Result<PreviousBlock, JsValue> {
    serde_wasm_bindgen::from_value(js_value.clone())
        .map_err(|e| JsValue::from_str(&format!("Failed to parse block data: {:?}", e)))
}

use crate::core::error::LookupError;
use crate::core::lookup::PriceLookup;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const LOCAL_FAKE_URL: &str = "http://127.0.0.1:5050";

const USER_AGENT: &str = "cryptoserver/1.0";
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Entry of the CoinGecko `/coins/list` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// Price lookup backed by the CoinGecko REST API (or anything speaking its dialect).
///
/// The coin list is fetched once on [`connect`](CoinGeckoClient::connect) and
/// indexed by lower-cased ticker symbol; names are answered from that index.
pub struct CoinGeckoClient {
    base_url: String,
    client: reqwest::Client,
    tickers: HashMap<String, CoinInfo>,
}

impl CoinGeckoClient {
    pub async fn connect(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::ServiceUnavailable(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let tickers = load_coin_list(&client, &base_url).await?;
        info!(coins = tickers.len(), %base_url, "Loaded CoinGecko coin list");

        Ok(CoinGeckoClient {
            base_url,
            client,
            tickers,
        })
    }

    /// Number of distinct ticker symbols known to the client.
    pub fn coin_count(&self) -> usize {
        self.tickers.len()
    }
}

async fn load_coin_list(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<HashMap<String, CoinInfo>, LookupError> {
    let url = format!("{base_url}/coins/list");
    debug!("Requesting coin list from {}", url);

    let response = client.get(&url).send().await.map_err(|e| {
        LookupError::ServiceUnavailable(format!("Request error: {e} for URL: {url}"))
    })?;

    if response.status().is_server_error() {
        return Err(LookupError::ServiceUnavailable(format!(
            "HTTP error: {} for URL: {}",
            response.status(),
            url
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| LookupError::ServiceUnavailable(format!("Failed to read coin list: {e}")))?;

    index_coins(&body)
}

/// Parses a `/coins/list` body into a symbol index. The first coin listed for a
/// symbol wins; later duplicates are skipped.
pub fn index_coins(body: &[u8]) -> Result<HashMap<String, CoinInfo>, LookupError> {
    if !starts_with_array(body) {
        return Err(LookupError::BadResponse(
            "unexpected response format".to_string(),
        ));
    }

    let coins: Vec<CoinInfo> = serde_json::from_slice(body)
        .map_err(|e| LookupError::BadResponse(format!("Failed to parse coin list: {e}")))?;

    let mut tickers = HashMap::with_capacity(coins.len());
    for coin in coins {
        match tickers.entry(coin.symbol.to_lowercase()) {
            Entry::Occupied(first) => {
                let first: &CoinInfo = first.get();
                debug!(
                    symbol = %coin.symbol,
                    id = %coin.id,
                    first_id = %first.id,
                    "Skipping duplicate symbol"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(coin);
            }
        }
    }
    Ok(tickers)
}

pub(crate) fn starts_with_array(body: &[u8]) -> bool {
    body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[')
}

/// Picks the CoinGecko base URL: the configured one, else a local fake server
/// if one answers, else the public API.
pub async fn resolve_base_url(configured: Option<&str>) -> String {
    if let Some(url) = configured.filter(|u| !u.trim().is_empty()) {
        return url.to_string();
    }
    if is_alive(LOCAL_FAKE_URL).await {
        info!("Using local fake CoinGecko at {}", LOCAL_FAKE_URL);
        return LOCAL_FAKE_URL.to_string();
    }
    COINGECKO_API_URL.to_string()
}

/// Returns true when `base_url` answers `/coins/list` with a JSON array.
pub async fn is_alive(base_url: &str) -> bool {
    let Ok(client) = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() else {
        return false;
    };
    let Ok(response) = client.get(format!("{base_url}/coins/list")).send().await else {
        return false;
    };
    if response.status() != reqwest::StatusCode::OK {
        return false;
    }
    match response.bytes().await {
        Ok(body) => starts_with_array(&body),
        Err(_) => false,
    }
}

#[async_trait]
impl PriceLookup for CoinGeckoClient {
    async fn lookup_name(&self, symbol: &str) -> Result<String, LookupError> {
        self.tickers
            .get(&symbol.to_lowercase())
            .map(|coin| coin.name.clone())
            .ok_or_else(|| LookupError::NotFound(format!("name not found for {symbol}")))
    }

    #[instrument(
        name = "CoinGeckoPriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn lookup_price(&self, symbol: &str) -> Result<f64, LookupError> {
        let key = symbol.to_lowercase();
        // Unknown tickers are tried as coin ids.
        let id = self
            .tickers
            .get(&key)
            .map_or(key.as_str(), |coin| coin.id.as_str());

        let url = reqwest::Url::parse_with_params(
            &format!("{}/simple/price", self.base_url),
            &[("ids", id), ("vs_currencies", "usd")],
        )
        .map_err(|e| LookupError::ServiceUnavailable(format!("Invalid price URL: {e}")))?;
        debug!("Requesting price data from {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            LookupError::ServiceUnavailable(format!("Request error: {e} for symbol: {symbol}"))
        })?;

        if response.status().is_server_error() {
            return Err(LookupError::ServiceUnavailable(format!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            )));
        }

        let text = response.text().await.map_err(|e| {
            LookupError::ServiceUnavailable(format!("Failed to read response for {symbol}: {e}"))
        })?;

        let data: HashMap<String, HashMap<String, f64>> =
            serde_json::from_str(&text).map_err(|e| {
                debug!(body = %text, "Unparseable price response");
                LookupError::BadResponse(format!(
                    "Failed to parse price response for {symbol}: {e}"
                ))
            })?;

        data.get(id)
            .and_then(|quotes| quotes.get("usd"))
            .copied()
            .ok_or_else(|| LookupError::NotFound(format!("price not found for {symbol}")))
    }
}

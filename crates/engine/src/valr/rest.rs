use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use tracing::debug;

use common::{Candle, Error, ExchangeClient, Fill, Order, OrderSide, Result};

const BASE_URL: &str = "https://api.valr.com";

/// REST API client for VALR. Every request is signed, public endpoints
/// included.
pub struct ValrClient {
    api_key: String,
    secret: String,
    http: Client,
    base_url: String,
}

/// Hex HMAC-SHA512 of `timestamp + VERB + path + body`, keyed by the API secret.
pub fn sign_request(
    secret: &str,
    timestamp: &str,
    verb: &str,
    path: &str,
    body: &str,
) -> Result<String> {
    type HmacSha512 = Hmac<Sha512>;
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Config(format!("invalid VALR secret: {e}")))?;
    mac.update(timestamp.as_bytes());
    mac.update(verb.to_uppercase().as_bytes());
    mac.update(path.as_bytes());
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

impl ValrClient {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            secret: secret.into(),
            http,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at another host, e.g. a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn timestamp_ms() -> String {
        Utc::now().timestamp_millis().to_string()
    }

    async fn signed_request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<String> {
        let ts = Self::timestamp_ms();
        let payload = body.unwrap_or_default();
        let signature = sign_request(&self.secret, &ts, method.as_str(), path, &payload)?;
        let url = format!("{}{path}", self.base_url);

        let mut request = self
            .http
            .request(method, &url)
            .header("X-VALR-API-KEY", &self.api_key)
            .header("X-VALR-API-SIGNATURE", signature)
            .header("X-VALR-API-TIMESTAMP", &ts)
            .header("Content-Type", "application/json");
        if !payload.is_empty() {
            request = request.body(payload);
        }

        let resp = request.send().await.map_err(|e| Error::Http(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {text}")));
        }
        Ok(text)
    }
}

#[async_trait]
impl ExchangeClient for ValrClient {
    async fn current_price(&self, pair: &str) -> Result<f64> {
        let body = self
            .signed_request(Method::GET, &format!("/v1/public/markets/{pair}/ticker"), None)
            .await?;
        parse_ticker(&body)
    }

    async fn candle_history(&self, pair: &str) -> Result<Vec<Candle>> {
        let body = self
            .signed_request(Method::GET, &format!("/v1/public/markets/{pair}/candles"), None)
            .await?;
        let candles = parse_candles(&body)?;
        debug!(pair, count = candles.len(), "Candle history fetched");
        Ok(candles)
    }

    async fn submit_order(&self, order: &Order) -> Result<Fill> {
        let request = MarketOrderRequest {
            side: order.side,
            quantity: order.quantity,
            pair: &order.pair,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            customer_order_id: &order.id,
        };
        let payload = serde_json::to_string(&request)?;

        debug!(pair = %order.pair, side = %order.side, "Submitting order to VALR");
        let body = self
            .signed_request(Method::POST, "/v1/account/orders/market", Some(payload))
            .await?;

        let resp: OrderResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Exchange(format!("malformed order response: {e}")))?;

        Ok(Fill {
            order_id: resp.id.unwrap_or_else(|| order.id.clone()),
            pair: order.pair.clone(),
            side: order.side,
            fill_price: None,
            quantity: order.quantity,
            timestamp: Utc::now(),
        })
    }
}

/// Latest traded price from a ticker payload.
pub(crate) fn parse_ticker(body: &str) -> Result<f64> {
    let ticker: Ticker = serde_json::from_str(body)
        .map_err(|e| Error::Exchange(format!("malformed ticker: {e}")))?;
    ticker.last_traded_price.value("lastTradedPrice")
}

/// Candle payload, either `{"data": [...]}` or a bare array, sorted oldest first.
pub(crate) fn parse_candles(body: &str) -> Result<Vec<Candle>> {
    let payload: CandlesPayload = serde_json::from_str(body)
        .map_err(|e| Error::Exchange(format!("malformed candle history: {e}")))?;
    let raw = match payload {
        CandlesPayload::Wrapped { data } => data,
        CandlesPayload::Bare(data) => data,
    };

    let mut candles = raw
        .into_iter()
        .map(|c| {
            Ok(Candle {
                timestamp: c.timestamp,
                open: c.open.value("open")?,
                high: c.high.value("high")?,
                low: c.low.value("low")?,
                close: c.close.value("close")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

// ─── Wire types ───────────────────────────────────────────────────────────────

/// VALR quotes decimals as strings; some endpoints use plain numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Decimal {
    Text(String),
    Number(f64),
}

impl Decimal {
    fn value(&self, field: &str) -> Result<f64> {
        match self {
            Decimal::Number(v) => Ok(*v),
            Decimal::Text(s) => s.trim().parse::<f64>().map_err(|e| {
                Error::Exchange(format!("field '{field}' is not a number ({s:?}): {e}"))
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    last_traded_price: Decimal,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandlesPayload {
    Wrapped { data: Vec<RawCandle> },
    Bare(Vec<RawCandle>),
}

#[derive(Deserialize)]
struct RawCandle {
    #[serde(alias = "startTime", alias = "time")]
    timestamp: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarketOrderRequest<'a> {
    #[serde(serialize_with = "upper_side")]
    side: OrderSide,
    quantity: f64,
    pair: &'a str,
    stop_loss: f64,
    take_profit: f64,
    customer_order_id: &'a str,
}

fn upper_side<S>(side: &OrderSide, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.collect_str(side)
}

#[derive(Deserialize)]
struct OrderResponse {
    #[serde(default)]
    id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "4961b74efac86b25cce8fbe4c9811c4c7a787b7a5996660afcc2e287ad864363";

    #[test]
    fn signs_get_request() {
        let sig = sign_request(SECRET, "1558014486185", "GET", "/v1/account/balances", "").unwrap();
        assert_eq!(
            sig,
            "9d52c181ed69460b49307b7891f04658e938b21181173844b5018b2fe783a6d4\
             c62b8e67a03de4d099e7437ebfabe12c56233b73c6a0cc0f7ae87e05f6289928"
        );
    }

    #[test]
    fn signs_post_body_and_uppercases_verb() {
        let body = r#"{"customerOrderId":"ORDER-000001","pair":"BTCZAR","side":"BUY","quoteAmount":"80000"}"#;
        let sig = sign_request(SECRET, "1558017528946", "post", "/v1/orders/market", body).unwrap();
        assert_eq!(
            sig,
            "be97d4cd9077a9eea7c4e199ddcfd87408cb638f2ec2f7f74dd44aef70a49fdc\
             49960fd5de9b8b2845dc4a38b4fc7e56ef08f042a3c78a3af9aed23ca80822e8"
        );
    }

    #[test]
    fn ticker_accepts_string_price() {
        assert_eq!(parse_ticker(r#"{"lastTradedPrice":"1234567.5"}"#).unwrap(), 1_234_567.5);
        assert_eq!(parse_ticker(r#"{"lastTradedPrice":99}"#).unwrap(), 99.0);
        assert!(parse_ticker(r#"{"price":"1"}"#).unwrap_err().is_transport());
        assert!(parse_ticker(r#"{"lastTradedPrice":"n/a"}"#).is_err());
    }

    #[test]
    fn candles_are_sorted_oldest_first() {
        let body = r#"{"data":[
            {"startTime":"2024-01-01T00:02:00Z","open":"3","high":"4","low":"2","close":"3.5"},
            {"startTime":"2024-01-01T00:01:00Z","open":2,"high":3,"low":1,"close":2.5}
        ]}"#;
        let candles = parse_candles(body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 2.5);
        assert_eq!(candles[1].close, 3.5);
        assert!(candles[0].timestamp < candles[1].timestamp);
    }

    #[test]
    fn bare_candle_array_is_accepted() {
        let body = r#"[{"timestamp":"2024-01-01T00:00:00Z","open":"1","high":"1","low":"1","close":"1"}]"#;
        assert_eq!(parse_candles(body).unwrap().len(), 1);
    }

    #[test]
    fn malformed_candles_are_transport_errors() {
        assert!(parse_candles("<html>").unwrap_err().is_transport());
        let bad = r#"{"data":[{"startTime":"2024-01-01T00:00:00Z","open":"1","high":"x","low":"1","close":"1"}]}"#;
        assert!(parse_candles(bad).unwrap_err().is_transport());
    }

    #[test]
    fn order_body_uses_valr_field_names() {
        let order = Order::market("BTCZAR", OrderSide::Sell, 0.25, 97.0, 104.0);
        let request = MarketOrderRequest {
            side: order.side,
            quantity: order.quantity,
            pair: &order.pair,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            customer_order_id: &order.id,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["side"], "SELL");
        assert_eq!(json["pair"], "BTCZAR");
        assert_eq!(json["stopLoss"], 97.0);
        assert_eq!(json["takeProfit"], 104.0);
        assert_eq!(json["customerOrderId"], order.id.as_str());
    }

    // ─── HTTP round trips against a local stub ────────────────────────────────

    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode, Uri},
        Router,
    };

    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path: String,
        headers: HeaderMap,
        body: String,
    }

    type SeenLog = Arc<Mutex<Vec<Seen>>>;

    async fn stub(
        State(log): State<SeenLog>,
        method: axum::http::Method,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        let path = uri.path().to_string();
        log.lock().unwrap().push(Seen {
            method: method.to_string(),
            path: path.clone(),
            headers,
            body,
        });
        match path.as_str() {
            "/v1/public/markets/BTCZAR/ticker" => {
                (StatusCode::OK, r#"{"lastTradedPrice":"1250000"}"#.into())
            }
            "/v1/account/orders/market" => (StatusCode::ACCEPTED, r#"{"id":"valr-42"}"#.into()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable".into()),
        }
    }

    async fn stub_client() -> (ValrClient, SeenLog) {
        let log = SeenLog::default();
        let app = Router::new().fallback(stub).with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = ValrClient::new("test-key", SECRET)
            .unwrap()
            .with_base_url(format!("http://{addr}/"));
        (client, log)
    }

    fn header<'a>(seen: &'a Seen, name: &str) -> &'a str {
        seen.headers.get(name).unwrap().to_str().unwrap()
    }

    fn assert_signed(seen: &Seen, verb: &str) {
        assert_eq!(header(seen, "x-valr-api-key"), "test-key");
        let ts = header(seen, "x-valr-api-timestamp");
        assert!(ts.parse::<i64>().is_ok(), "timestamp {ts:?} is not millis");
        let expected = sign_request(SECRET, ts, verb, &seen.path, &seen.body).unwrap();
        assert_eq!(header(seen, "x-valr-api-signature"), expected);
    }

    #[tokio::test]
    async fn ticker_request_is_signed() {
        let (client, log) = stub_client().await;

        assert_eq!(client.current_price("BTCZAR").await.unwrap(), 1_250_000.0);

        let seen = log.lock().unwrap()[0].clone();
        assert_eq!(seen.method, "GET");
        assert_eq!(seen.path, "/v1/public/markets/BTCZAR/ticker");
        assert!(seen.body.is_empty());
        assert_signed(&seen, "GET");
    }

    #[tokio::test]
    async fn server_error_is_a_transport_failure() {
        let (client, _) = stub_client().await;

        let err = client.candle_history("BTCZAR").await.unwrap_err();
        assert!(err.is_transport());
        match err {
            Error::Exchange(msg) => {
                assert!(msg.contains("500"), "{msg}");
                assert!(msg.contains("upstream unavailable"), "{msg}");
            }
            other => panic!("expected an exchange error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn market_order_posts_signed_body() {
        let (client, log) = stub_client().await;
        let order = Order::market("BTCZAR", OrderSide::Buy, 0.5, 97.0, 104.0);

        let fill = client.submit_order(&order).await.unwrap();
        assert_eq!(fill.order_id, "valr-42");
        assert_eq!(fill.side, OrderSide::Buy);
        assert_eq!(fill.fill_price, None);

        let seen = log.lock().unwrap()[0].clone();
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.path, "/v1/account/orders/market");
        assert_eq!(header(&seen, "content-type"), "application/json");
        assert_signed(&seen, "POST");

        let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(body["side"], "BUY");
        assert_eq!(body["quantity"], 0.5);
        assert_eq!(body["customerOrderId"], order.id.as_str());
    }
}

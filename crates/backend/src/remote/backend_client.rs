use async_trait::async_trait;
use common::{
    config::BackendSettings,
    models::{OrderRequest, Signal},
};
use reqwest::{
    Client, RequestBuilder, Response,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Serialize;
use tracing::{debug, error, info};
use url::Url;

use crate::{
    error::BackendError,
    remote::{Ack, GET_SIGNALS, PLACE_ORDER, TRACK_SIGNAL},
    traits::TradingBackend,
};

const USER_AGENT: &str = "algotrade_console/0.1.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackSignalBody<'a> {
    strategy_id: &'a str,
    active: bool,
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().map_err(BackendError::Build)?,
            base_url: with_trailing_slash(settings.base_url.clone()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &'static str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|source| BackendError::InvalidUrl { path, source })
    }

    async fn execute(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|source| {
            error!("API Error: request to /{} failed: {}", endpoint, source);
            BackendError::Request { endpoint, source }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("API Error: /{} returned {}: {}", endpoint, status, body);
            return Err(BackendError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        debug!("/{} -> {}", endpoint, status);
        Ok(response)
    }

    async fn read_body(endpoint: &'static str, response: Response) -> Result<String, BackendError> {
        response.text().await.map_err(|source| {
            error!("API Error: reading /{} body failed: {}", endpoint, source);
            BackendError::Request { endpoint, source }
        })
    }
}

#[async_trait]
impl TradingBackend for BackendClient {
    async fn place_order(&self, order: &OrderRequest) -> Result<Ack, BackendError> {
        let url = self.endpoint(PLACE_ORDER)?;

        info!(
            "Placing Order: {} {} {} @ {} ({}, {})",
            order.action, order.quantity, order.instrument, order.price, order.order_type, order.exchange
        );

        let response = self
            .execute(PLACE_ORDER, self.client.post(url).json(order))
            .await?;
        let body = Self::read_body(PLACE_ORDER, response).await?;
        Ok(Ack::from_body(&body))
    }

    async fn track_signal(&self, strategy_id: &str, active: bool) -> Result<Ack, BackendError> {
        let url = self.endpoint(TRACK_SIGNAL)?;
        let body = TrackSignalBody {
            strategy_id,
            active,
        };

        let response = self
            .execute(TRACK_SIGNAL, self.client.post(url).json(&body))
            .await?;
        let body = Self::read_body(TRACK_SIGNAL, response).await?;
        Ok(Ack::from_body(&body))
    }

    async fn get_signals(&self, strategy_id: &str) -> Result<Vec<Signal>, BackendError> {
        let url = self.endpoint(GET_SIGNALS)?;

        let response = self
            .execute(
                GET_SIGNALS,
                self.client.get(url).query(&[("strategyId", strategy_id)]),
            )
            .await?;
        let body = Self::read_body(GET_SIGNALS, response).await?;

        serde_json::from_str::<Vec<Signal>>(&body).map_err(|source| {
            error!("API Error: undecodable /{} body: {}", GET_SIGNALS, source);
            BackendError::Decode {
                endpoint: GET_SIGNALS,
                source,
            }
        })
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{Exchange, OrderAction, OrderType, SignalSide};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    /// Serves a single canned HTTP response and hands back the raw request.
    async fn serve_once(status_line: &str, body: &str) -> (Url, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&raw).to_string());
        });

        (Url::parse(&format!("http://{addr}")).unwrap(), rx)
    }

    fn client_for(base_url: Url) -> BackendClient {
        BackendClient::new(&BackendSettings {
            base_url,
            request_timeout: None,
        })
        .unwrap()
    }

    #[test]
    fn endpoints_join_under_base_path() {
        let client = client_for(Url::parse("https://signals.example.com/api/v1").unwrap());
        assert_eq!(
            client.endpoint(PLACE_ORDER).unwrap().as_str(),
            "https://signals.example.com/api/v1/place-order"
        );

        let client = client_for(Url::parse("http://localhost:5000").unwrap());
        assert_eq!(
            client.endpoint(GET_SIGNALS).unwrap().as_str(),
            "http://localhost:5000/get-signals"
        );
    }

    #[tokio::test]
    async fn get_signals_sends_strategy_id_query() {
        let body = r#"[{"id":"a","strategyId":"1","type":"BUY","instrument":"INFY","price":1520.5,"timestamp":"2026-03-02T04:00:00Z"}]"#;
        let (url, request) = serve_once("200 OK", body).await;

        let signals = client_for(url).get_signals("1").await.unwrap();
        let request = request.await.unwrap();

        assert!(request.starts_with("GET /get-signals?strategyId=1 HTTP/1.1"));
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].side, SignalSide::Buy);
    }

    #[tokio::test]
    async fn place_order_posts_json_payload() {
        let (url, request) = serve_once("200 OK", r#"{"status":"queued"}"#).await;
        let order = OrderRequest {
            instrument: "INFY".to_string(),
            quantity: 10,
            price: 0.0,
            exchange: Exchange::Nse,
            order_type: OrderType::Market,
            action: OrderAction::Buy,
        };

        let ack = client_for(url).place_order(&order).await.unwrap();
        let request = request.await.unwrap();

        assert!(request.starts_with("POST /place-order HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        let payload = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let sent: OrderRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(sent, order);
        assert_eq!(ack.0["status"], "queued");
    }

    #[tokio::test]
    async fn track_signal_body_is_camel_case() {
        let (url, request) = serve_once("200 OK", "").await;

        let ack = client_for(url).track_signal("3", true).await.unwrap();
        let request = request.await.unwrap();

        assert!(request.starts_with("POST /track-signal HTTP/1.1"));
        assert!(request.ends_with(r#"{"strategyId":"3","active":true}"#));
        assert_eq!(ack, Ack(serde_json::Value::Null));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (url, _request) = serve_once("500 Internal Server Error", "boom").await;

        let err = client_for(url).get_signals("2").await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Status { endpoint: GET_SIGNALS, status: 500, ref body } if body == "boom"
        ));
    }

    #[tokio::test]
    async fn malformed_signal_list_is_a_decode_error() {
        let (url, _request) = serve_once("200 OK", r#"{"signals": []}"#).await;

        let err = client_for(url).get_signals("2").await.unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
    }
}

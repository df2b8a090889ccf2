use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use server::{AppState, api::app_router};
use stock::{
    AddPolicy, CacheStore, GatewayError, HistoryRange, MemoryStorage, PointTime, PricePoint, Quote,
    QuoteGateway, SearchResult, Storage, WATCHLIST_KEY,
};
use tower::ServiceExt;

#[derive(Default)]
struct StubGateway {
    quotes: HashMap<String, Quote>,
    points: Vec<PricePoint>,
    results: Vec<SearchResult>,
    failing: AtomicBool,
    quote_calls: Mutex<Vec<Vec<String>>>,
    history_calls: Mutex<Vec<String>>,
}

impl StubGateway {
    fn calls(&self) -> Vec<Vec<String>> {
        self.quote_calls.lock().unwrap().clone()
    }

    fn history_calls(&self) -> Vec<String> {
        self.history_calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Upstream("provider down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteGateway for StubGateway {
    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, GatewayError> {
        self.quote_calls.lock().unwrap().push(symbols.to_vec());
        self.check()?;
        Ok(symbols
            .iter()
            .filter_map(|s| self.quotes.get(s).cloned())
            .collect())
    }

    async fn history(
        &self,
        symbol: &str,
        _range: &HistoryRange,
    ) -> Result<Vec<PricePoint>, GatewayError> {
        self.history_calls.lock().unwrap().push(symbol.to_string());
        self.check()?;
        Ok(self.points.clone())
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, GatewayError> {
        self.check()?;
        Ok(self.results.clone())
    }
}

fn stub() -> StubGateway {
    let quotes = [
        Quote::new("AAPL", 150.0, 1.5, 1.01),
        Quote::new("MSFT", 410.0, -2.0, -0.49),
        Quote::new("^GSPC", 5000.0, 10.0, 0.2),
        Quote::new("^DJI", 39000.0, -50.0, -0.13),
        Quote::new("^IXIC", 16000.0, 30.0, 0.19),
    ];

    StubGateway {
        quotes: quotes.into_iter().map(|q| (q.symbol.clone(), q)).collect(),
        points: vec![
            PricePoint {
                time: PointTime::Date("2024-03-01".into()),
                value: 100.0,
            },
            PricePoint {
                time: PointTime::Date("2024-03-04".into()),
                value: 105.0,
            },
        ],
        results: vec![
            SearchResult {
                symbol: "SHOP.TO".into(),
                name: "Shopify Inc.".into(),
                exchange: "TOR".into(),
                kind: "EQUITY".into(),
            },
            SearchResult {
                symbol: "SHOP".into(),
                name: "Shopify Inc.".into(),
                exchange: "NYQ".into(),
                kind: "EQUITY".into(),
            },
            SearchResult {
                symbol: "XSHOP".into(),
                name: "Shop ETF".into(),
                exchange: "PCX".into(),
                kind: "ETF".into(),
            },
        ],
        ..Default::default()
    }
}

fn build_app(gateway: Arc<StubGateway>, watchlist: &[&str]) -> (Router, Arc<AppState>) {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(WATCHLIST_KEY, serde_json::to_string(watchlist).unwrap())
        .unwrap();

    let state = Arc::new(AppState::new(
        gateway,
        CacheStore::new(storage),
        AddPolicy::Strict,
    ));
    (app_router(Arc::clone(&state)), state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

#[tokio::test]
async fn quotes_for_listed_symbols() {
    let (app, _) = build_app(Arc::new(stub()), &[]);

    let (status, body) = get(&app, "/api/stocks?symbols=AAPL").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{ "symbol": "AAPL", "price": 150.0, "change": 1.5, "changePercent": 1.01 }])
    );
}

#[tokio::test]
async fn quotes_without_symbols_is_bad_request() {
    let (app, _) = build_app(Arc::new(stub()), &[]);

    let (status, body) = get(&app, "/api/stocks").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No symbols provided" }));

    let (status, _) = get(&app, "/api/stocks?symbols=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quotes_gateway_failure_is_server_error() {
    let gateway = Arc::new(stub());
    gateway.failing.store(true, Ordering::SeqCst);
    let (app, _) = build_app(gateway, &[]);

    let (status, body) = get(&app, "/api/stocks?symbols=AAPL,MSFT").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch stock data" }));
}

#[tokio::test]
async fn history_unescapes_index_symbol() {
    let gateway = Arc::new(stub());
    let (app, _) = build_app(gateway.clone(), &[]);

    let (status, body) = get(
        &app,
        "/api/stocks/history?symbol=%255EGSPC&period1=2024-01-01T00:00:00.000Z",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0], json!({ "time": "2024-03-01", "value": 100.0 }));
    assert_eq!(gateway.history_calls(), ["^GSPC"]);
}

#[tokio::test]
async fn history_gateway_error_is_server_error() {
    let gateway = Arc::new(stub());
    gateway.failing.store(true, Ordering::SeqCst);
    let (app, _) = build_app(gateway.clone(), &[]);

    let (status, body) = get(
        &app,
        "/api/stocks/history?symbol=%5EGSPC&period1=2024-01-01T00:00:00.000Z",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch historical data" }));
    assert_eq!(gateway.history_calls(), ["^GSPC"]);
}

#[tokio::test]
async fn history_requires_symbol_and_valid_data() {
    let gateway = Arc::new(StubGateway::default());
    let (app, _) = build_app(gateway.clone(), &[]);

    let (status, _) = get(&app, "/api/stocks/history").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/stocks/history?symbol=AAPL&period1=not-a-date").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(gateway.history_calls().is_empty());

    // Provider answered with nothing.
    let (status, _) = get(&app, "/api/stocks/history?symbol=AAPL").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn history_range_is_cached_with_summary() {
    let gateway = Arc::new(stub());
    let (app, _) = build_app(gateway.clone(), &[]);

    let (status, body) = get(&app, "/api/stocks/history/1M?symbol=AAPL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["range"], "1M");
    assert_eq!(body["summary"]["latest"], 105.0);
    assert_eq!(body["summary"]["change"], 5.0);
    assert_eq!(body["summary"]["changePercent"], 5.0);

    let (status, _) = get(&app, "/api/stocks/history/1M?symbol=AAPL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gateway.history_calls().len(), 1);

    let (status, _) = get(&app, "/api/stocks/history/2W?symbol=AAPL").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_filters_and_orders_results() {
    let (app, _) = build_app(Arc::new(stub()), &[]);

    let (status, body) = get(&app, "/api/search?q=shop").await;

    assert_eq!(status, StatusCode::OK);
    let symbols: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["symbol"].as_str().unwrap())
        .collect();
    assert_eq!(symbols, ["SHOP", "SHOP.TO"]);
    assert_eq!(body[0]["type"], "EQUITY");
}

#[tokio::test]
async fn search_requires_query() {
    let (app, _) = build_app(Arc::new(stub()), &[]);

    let (status, body) = get(&app, "/api/search?q=%20").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Search query is required" }));
}

#[tokio::test]
async fn watchlist_add_and_remove() {
    let gateway = Arc::new(stub());
    let (app, _) = build_app(gateway.clone(), &["AAPL"]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/watchlist",
        Some(json!({ "symbol": "MSFT" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbols"], json!(["AAPL", "MSFT"]));
    assert_eq!(body["stocks"].as_array().unwrap().len(), 2);
    assert_eq!(gateway.calls(), vec![vec!["AAPL", "MSFT"]]);

    let (status, body) = send(&app, Method::DELETE, "/api/watchlist/AAPL", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbols"], json!(["MSFT"]));
    assert_eq!(body["stocks"][0]["symbol"], "MSFT");
    assert_eq!(gateway.calls().len(), 1);

    let (_, body) = get(&app, "/api/watchlist").await;
    assert_eq!(body["symbols"], json!(["MSFT"]));
    assert_eq!(body["isLoading"], false);
}

#[tokio::test]
async fn watchlist_rejects_unknown_symbol() {
    let (app, state) = build_app(Arc::new(stub()), &["AAPL"]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/watchlist",
        Some(json!({ "symbol": "NOPE" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Unknown symbol: NOPE" }));
    assert_eq!(state.watchlist.symbols(), ["AAPL"]);
}

#[tokio::test]
async fn watchlist_add_without_usable_body_is_bad_request() {
    let gateway = Arc::new(stub());
    let (app, state) = build_app(gateway.clone(), &["AAPL"]);

    let (status, body) = send(&app, Method::POST, "/api/watchlist", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Symbol is required" }));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/watchlist",
        Some(json!({ "ticker": "MSFT" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Symbol is required" }));

    assert_eq!(state.watchlist.symbols(), ["AAPL"]);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn watchlist_refresh_failure_keeps_quotes() {
    let gateway = Arc::new(stub());
    let (app, _) = build_app(gateway.clone(), &["AAPL"]);

    let (status, _) = send(&app, Method::POST, "/api/watchlist/refresh", None).await;
    assert_eq!(status, StatusCode::OK);

    gateway.failing.store(true, Ordering::SeqCst);
    let (status, _) = send(&app, Method::POST, "/api/watchlist/refresh", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, body) = get(&app, "/api/watchlist").await;
    assert_eq!(body["stocks"][0]["symbol"], "AAPL");
    assert_eq!(body["error"], "Failed to fetch stock data");
}

#[tokio::test]
async fn market_overview_lists_indices() {
    let (app, state) = build_app(Arc::new(stub()), &[]);
    state.market.load().await.unwrap();

    let (status, body) = get(&app, "/api/market").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["indices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["displayName"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["SPX", "DJI", "IXIC"]);
    assert_eq!(body["indices"][0]["path"], "%5EGSPC");
}

#[tokio::test]
async fn healthz_responds() {
    let (app, _) = build_app(Arc::new(stub()), &[]);
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

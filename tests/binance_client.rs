use mockito::{Matcher, Server};
use rust_decimal_macros::dec;
use token_flow::analysis::VenueClassifier;
use token_flow::data::{FlowDirection, TokenSnapshot};
use token_flow::{BinanceRestClient, CoinGeckoClient, LiveSource, MarketDataSource, RetryPolicy, SourceError};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        rate_limit_backoff_ms: 1,
        error_backoff_ms: 1,
    }
}

fn ticker_body(symbol: &str, bid_qty: &str, ask_qty: &str) -> String {
    format!(
        r#"{{
            "symbol": "{}",
            "priceChangePercent": "2.500",
            "lastPrice": "100.0",
            "bidPrice": "100.0",
            "bidQty": "{}",
            "askPrice": "100.0",
            "askQty": "{}",
            "volume": "5000.0",
            "quoteVolume": "500000.0"
        }}"#,
        symbol, bid_qty, ask_qty
    )
}

fn token(symbol: &str) -> TokenSnapshot {
    let mut token = TokenSnapshot::new(symbol, dec!(0), dec!(0), dec!(0), dec!(1000));
    token.symbol = symbol.to_string();
    token
}

#[tokio::test]
async fn test_24hr_ticker() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v3/ticker/24hr")
        .match_query(Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()))
        .with_status(200)
        .with_body(ticker_body("BTCUSDT", "3.0", "1.0"))
        .create_async()
        .await;

    let client = BinanceRestClient::new(&server.url(), fast_retry()).unwrap();
    let ticker = client.get_24hr_ticker("BTCUSDT").await.unwrap();

    mock.assert_async().await;
    assert_eq!(ticker.bid_notional(), dec!(300));
    assert_eq!(ticker.ask_notional(), dec!(100));
    assert_eq!(ticker.quote_volume(), dec!(500000));
}

#[tokio::test]
async fn test_connectivity_ping() {
    let mut server = Server::new_async().await;
    let ping = server
        .mock("GET", "/api/v3/ping")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let client = BinanceRestClient::new(&server.url(), fast_retry()).unwrap();
    client.test_connectivity().await.unwrap();
    ping.assert_async().await;
}

#[tokio::test]
async fn test_connectivity_reports_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v3/ping")
        .with_status(451)
        .with_body(r#"{"code": 0, "msg": "Service unavailable from a restricted location"}"#)
        .create_async()
        .await;

    let client = BinanceRestClient::new(&server.url(), fast_retry()).unwrap();
    let err = client.test_connectivity().await.unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 451, .. }));
}

#[tokio::test]
async fn test_klines_closes() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v3/klines")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("symbol".into(), "ETHUSDT".into()),
            Matcher::UrlEncoded("interval".into(), "1d".into()),
            Matcher::UrlEncoded("limit".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"[
                [1700000000000, "2000.0", "2100.0", "1950.0", "2050.5", "10.0", 1700086399999, "0", 1, "0", "0", "0"],
                [1700086400000, "2050.5", "2200.0", "2040.0", "2180.0", "12.0", 1700172799999, "0", 1, "0", "0", "0"]
            ]"#,
        )
        .create_async()
        .await;

    let client = BinanceRestClient::new(&server.url(), fast_retry()).unwrap();
    let closes = client.get_closes("ETHUSDT", "1d", 2).await.unwrap();

    mock.assert_async().await;
    assert_eq!(closes, vec![2050.5, 2180.0]);
}

#[tokio::test]
async fn test_kline_limit_validated_locally() {
    let client = BinanceRestClient::new("http://127.0.0.1:1", fast_retry()).unwrap();
    let err = client.get_closes("BTCUSDT", "1d", 0).await.unwrap_err();
    assert!(matches!(err, SourceError::Config(_)));
}

#[tokio::test]
async fn test_live_source_aggregates_binance_books() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v3/ticker/24hr")
        .match_query(Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()))
        .with_status(200)
        .with_body(ticker_body("BTCUSDT", "5.0", "1.0"))
        .create_async()
        .await;
    server
        .mock("GET", "/api/v3/ticker/24hr")
        .match_query(Matcher::UrlEncoded("symbol".into(), "ETHUSDT".into()))
        .with_status(200)
        .with_body(ticker_body("ETHUSDT", "2.0", "2.0"))
        .create_async()
        .await;
    // Unknown pair: skipped, not fatal
    server
        .mock("GET", "/api/v3/ticker/24hr")
        .match_query(Matcher::UrlEncoded("symbol".into(), "XYZUSDT".into()))
        .with_status(400)
        .with_body(r#"{"code": -1121, "msg": "Invalid symbol."}"#)
        .create_async()
        .await;

    let coingecko = CoinGeckoClient::new(&server.url(), None, fast_retry()).unwrap();
    let binance = BinanceRestClient::new(&server.url(), fast_retry()).unwrap();
    let source = LiveSource::new(coingecko, Some(binance), 5);

    // Stablecoins are never sampled
    let tokens = vec![token("BTC"), token("USDT"), token("ETH"), token("XYZ")];
    let tickers = source.fetch_exchange_tickers(&tokens).await.unwrap();

    assert_eq!(tickers.len(), 1);
    assert_eq!(tickers[0].venue, "binance");
    assert_eq!(tickers[0].bid_volume, dec!(700));
    assert_eq!(tickers[0].ask_volume, dec!(300));
    assert_eq!(tickers[0].volume, dec!(1000000));

    let flows = VenueClassifier::default().analyze_exchanges(&tickers);
    let record = &flows["binance"];
    assert_eq!(record.direction, FlowDirection::Inflow);
    assert!((record.buy_ratio - 0.7).abs() < 1e-12);
}

#[tokio::test]
async fn test_live_source_without_binance() {
    let coingecko = CoinGeckoClient::new("http://127.0.0.1:1", None, fast_retry()).unwrap();
    let source = LiveSource::new(coingecko, None, 5);

    let tickers = source.fetch_exchange_tickers(&[token("BTC")]).await.unwrap();
    assert!(tickers.is_empty());
}

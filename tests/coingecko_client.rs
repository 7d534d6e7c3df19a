use mockito::{Matcher, Server};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use token_flow::analysis::compose_flow;
use token_flow::data::Sentiment;
use token_flow::{CoinGeckoClient, RetryPolicy, SourceError};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        rate_limit_backoff_ms: 1,
        error_backoff_ms: 1,
    }
}

const MARKETS_BODY: &str = r#"[
    {
        "id": "bitcoin",
        "symbol": "btc",
        "name": "Bitcoin",
        "current_price": 43250.5,
        "market_cap": 845000000000,
        "market_cap_rank": 1,
        "total_volume": 1000000,
        "price_change_percentage_24h": 5.0,
        "price_change_percentage_1h_in_currency": 0.4,
        "price_change_percentage_24h_in_currency": 5.2,
        "price_change_percentage_7d_in_currency": 12.0
    },
    {
        "id": "ghost",
        "symbol": "gst",
        "name": "Ghost",
        "current_price": null,
        "market_cap": null,
        "market_cap_rank": null,
        "total_volume": null,
        "price_change_percentage_24h": null,
        "price_change_percentage_1h_in_currency": null,
        "price_change_percentage_24h_in_currency": null,
        "price_change_percentage_7d_in_currency": null
    }
]"#;

#[tokio::test]
async fn test_markets_are_normalized() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/coins/markets")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("vs_currency".into(), "usd".into()),
            Matcher::UrlEncoded("per_page".into(), "2".into()),
            Matcher::UrlEncoded("price_change_percentage".into(), "1h,24h,7d".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(MARKETS_BODY)
        .create_async()
        .await;

    let client = CoinGeckoClient::new(&server.url(), None, fast_retry()).unwrap();
    let coins = client.get_markets(2).await.unwrap();
    mock.assert_async().await;

    let bitcoin = coins[0].to_snapshot();
    assert_eq!(bitcoin.symbol, "BTC");
    assert_eq!(bitcoin.rank, Some(1));
    assert_eq!(bitcoin.change_24h, dec!(5.2));
    assert_eq!(compose_flow(&bitcoin).one_day.flow_amount, dec!(52000));

    // Nulls collapse to zero and the token still flows through the engine
    let ghost = coins[1].to_snapshot();
    assert_eq!(ghost.price, Decimal::ZERO);
    assert_eq!(ghost.volume_24h, Decimal::ZERO);
    assert_eq!(ghost.change_7d, Decimal::ZERO);
    assert_eq!(compose_flow(&ghost).overall_sentiment, Sentiment::Neutral);
}

#[tokio::test]
async fn test_retries_after_rate_limit() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("GET", "/global")
        .with_status(429)
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/global")
        .with_status(200)
        .with_body(
            r#"{"data": {
                "total_market_cap": {"usd": 1650000000000.0},
                "total_volume": {"usd": 52000000000.0},
                "market_cap_percentage": {"btc": 51.2, "eth": 16.8},
                "market_cap_change_percentage_24h_usd": -1.25,
                "active_cryptocurrencies": 12000,
                "markets": 900
            }}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let client = CoinGeckoClient::new(&server.url(), None, fast_retry()).unwrap();
    let global = client.get_global().await.unwrap();

    limited.assert_async().await;
    ok.assert_async().await;
    assert_eq!(global.total_market_cap, dec!(1650000000000));
    assert_eq!(global.active_exchanges, 900);
    assert_eq!(global.btc_dominance, 51.2);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("GET", "/search/trending")
        .with_status(429)
        .expect(3)
        .create_async()
        .await;

    let client = CoinGeckoClient::new(&server.url(), None, fast_retry()).unwrap();
    let err = client.get_trending().await.unwrap_err();

    limited.assert_async().await;
    assert!(matches!(err, SourceError::RateLimited { attempts: 3 }));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/global")
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;

    let client = CoinGeckoClient::new(&server.url(), None, fast_retry()).unwrap();
    let err = client.get_global().await.unwrap_err();

    failing.assert_async().await;
    match err {
        SourceError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_api_key_header_and_trending() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/search/trending")
        .match_header("x-cg-demo-api-key", "secret")
        .with_status(200)
        .with_body(
            r#"{"coins": [
                {"item": {"id": "pepe", "name": "Pepe", "symbol": "PEPE", "market_cap_rank": 30, "price_btc": 0.0000000002, "score": 0}},
                {"item": {"id": "new", "name": "Newcoin", "symbol": "NEW", "market_cap_rank": null, "price_btc": null, "score": 1}}
            ]}"#,
        )
        .create_async()
        .await;

    let client = CoinGeckoClient::new(&server.url(), Some("secret".to_string()), fast_retry()).unwrap();
    let trending = client.get_trending().await.unwrap();

    mock.assert_async().await;
    assert_eq!(trending.len(), 2);
    assert_eq!(trending[0].market_cap_rank, Some(30));
    assert_eq!(trending[1].market_cap_rank, None);
    assert_eq!(trending[1].price_btc, 0.0);
}

#[tokio::test]
async fn test_market_chart_volumes() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/coins/bitcoin/market_chart")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("days".into(), "3".into()),
            Matcher::UrlEncoded("interval".into(), "daily".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{
                "prices": [[1700000000000, 42000.0], [1700086400000, 43000.0], [1700172800000, 44000.0]],
                "total_volumes": [[1700000000000, 100.0], [1700086400000, 200.0], [1700172800000, 300.0]]
            }"#,
        )
        .create_async()
        .await;

    let client = CoinGeckoClient::new(&server.url(), None, fast_retry()).unwrap();
    let chart = client.get_market_chart("bitcoin", 3).await.unwrap();

    mock.assert_async().await;
    assert_eq!(chart.volumes(), vec![dec!(100), dec!(200), dec!(300)]);
    assert_eq!(chart.closes(), vec![42000.0, 43000.0, 44000.0]);
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/global")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = CoinGeckoClient::new(&server.url(), None, fast_retry()).unwrap();
    let err = client.get_global().await.unwrap_err();

    assert!(matches!(err, SourceError::Decode(_)));
}

#[tokio::test]
async fn test_exchanges() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/exchanges")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "2".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"[
                {"id": "binance", "name": "Binance", "year_established": 2017, "country": "Cayman Islands",
                 "url": "https://www.binance.com/", "trust_score": 10, "trust_score_rank": 1,
                 "trade_volume_24h_btc": 150000.5, "trade_volume_24h_btc_normalized": 90000.0},
                {"id": "mystery", "name": "Mystery", "year_established": null, "country": null,
                 "trust_score": null, "trade_volume_24h_btc": null}
            ]"#,
        )
        .create_async()
        .await;

    let client = CoinGeckoClient::new(&server.url(), None, fast_retry()).unwrap();
    let exchanges = client.get_exchanges(2).await.unwrap();

    mock.assert_async().await;
    assert_eq!(exchanges.len(), 2);
    assert_eq!(exchanges[0].name, "Binance");
    assert_eq!(exchanges[0].trust_score, Some(10));
    assert_eq!(exchanges[0].volume_24h_btc, dec!(150000.5));
    assert_eq!(exchanges[0].country.as_deref(), Some("Cayman Islands"));
    assert_eq!(exchanges[1].trust_score, None);
    assert_eq!(exchanges[1].volume_24h_btc, Decimal::ZERO);
}

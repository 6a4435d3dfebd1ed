use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sales_pipeline::app::ports::ProductLookupPort;
use sales_pipeline::config::EnrichmentConfig;
use sales_pipeline::domain::{EnrichmentSource, Transaction};
use sales_pipeline::error::LookupError;
use sales_pipeline::infra::HttpProductLookup;
use sales_pipeline::pipeline::processing::enrich::Enricher;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SEARCH_BODY: &str = r#"{"products":[
    {"id":1,"title":"Laptop","category":"laptops","price":1299.99,"brand":"Apple","rating":4.7},
    {"id":2,"title":"Laptop Sleeve","category":"accessories","price":19.5}
],"total":2,"skip":0,"limit":30}"#;

/// Serve one canned HTTP response per connection
async fn serve(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}")
}

/// Accept connections and never answer
async fn serve_nothing() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn widget() -> Transaction {
    Transaction {
        line: 2,
        transaction_id: None,
        date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        customer: "C001".to_string(),
        product_id: None,
        product: "Widget, Deluxe".to_string(),
        quantity: 3,
        unit_price: dec!(19.99),
        region: "East".to_string(),
    }
}

fn enricher_for(base_url: &str, timeout_ms: u64) -> Enricher {
    let config = EnrichmentConfig {
        base_url: base_url.to_string(),
        timeout_ms,
        ..EnrichmentConfig::default()
    };
    let lookup = HttpProductLookup::new(&config.base_url, Duration::from_millis(timeout_ms)).unwrap();
    Enricher::new(Box::new(lookup), &config)
}

#[tokio::test]
async fn test_http_lookup_matches_title() {
    let base_url = serve("200 OK", SEARCH_BODY).await;
    let lookup = HttpProductLookup::new(&base_url, Duration::from_secs(2)).unwrap();

    let info = lookup.lookup("laptop").await.unwrap();

    assert_eq!(info.category, "laptops");
    assert_eq!(info.price, dec!(1299.99));
    assert_eq!(info.brand.as_deref(), Some("Apple"));
}

#[tokio::test]
async fn test_http_lookup_unknown_product() {
    let base_url = serve("200 OK", SEARCH_BODY).await;
    let lookup = HttpProductLookup::new(&base_url, Duration::from_secs(2)).unwrap();

    assert_eq!(
        lookup.lookup("Widget, Deluxe").await,
        Err(LookupError::UnknownProduct("Widget, Deluxe".to_string()))
    );
}

#[tokio::test]
async fn test_http_error_status_and_bad_body() {
    let base_url = serve("503 Service Unavailable", "{}").await;
    let lookup = HttpProductLookup::new(&base_url, Duration::from_secs(2)).unwrap();
    assert_eq!(
        lookup.lookup("Laptop").await,
        Err(LookupError::Unavailable("HTTP 503".to_string()))
    );

    let base_url = serve("200 OK", "not json").await;
    let lookup = HttpProductLookup::new(&base_url, Duration::from_secs(2)).unwrap();
    assert!(matches!(
        lookup.lookup("Laptop").await,
        Err(LookupError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_unreachable_source_falls_back() {
    let base_url = unreachable_base_url().await;
    let enricher = enricher_for(&base_url, 2_000);

    let enriched = enricher.enrich_all(vec![widget()]).await;

    assert_eq!(enriched.len(), 1);
    assert_eq!(enriched[0].category, "Uncategorized");
    assert_eq!(enriched[0].current_price, dec!(19.99));
    assert!(matches!(enriched[0].source, EnrichmentSource::Fallback { .. }));
}

#[tokio::test]
async fn test_silent_source_times_out_and_falls_back() {
    let base_url = serve_nothing().await;
    let enricher = enricher_for(&base_url, 200);
    let started = Instant::now();

    let enriched = enricher.enrich_all(vec![widget()]).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(enriched[0].current_price, dec!(19.99));
    assert!(matches!(
        &enriched[0].source,
        EnrichmentSource::Fallback { reason } if reason.contains("timed out")
    ));
}

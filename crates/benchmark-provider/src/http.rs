use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use statement_core::{BenchmarkProvider, BenchmarkQuery, BenchmarkValue, ProviderError};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct BenchmarkResponse {
    #[serde(default)]
    benchmarks: Vec<BenchmarkValue>,
}

/// Benchmark service reached over HTTP.
///
/// `GET {base_url}/benchmarks/{analysis_id}?sector=..&industry=..&geography=..&period=..`
/// answering `{"benchmarks": [{"scope": "sector", "value": 1.8}, ...]}`.
/// A 404 means the service has no figures for that analysis.
#[derive(Clone)]
pub struct HttpBenchmarkProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBenchmarkProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, analysis_id: &str) -> String {
        format!("{}/benchmarks/{}", self.base_url, analysis_id)
    }

    fn query_params(query: &BenchmarkQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("period", query.period.to_string())];
        if let Some(sector) = &query.sector {
            params.push(("sector", sector.clone()));
        }
        if let Some(industry) = &query.industry {
            params.push(("industry", industry.clone()));
        }
        if let Some(geography) = &query.geography {
            params.push(("geography", geography.clone()));
        }
        params
    }
}

fn map_request_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::InvalidResponse(err.to_string())
    } else {
        ProviderError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl BenchmarkProvider for HttpBenchmarkProvider {
    async fn lookup(&self, query: &BenchmarkQuery) -> Result<Vec<BenchmarkValue>, ProviderError> {
        let response = self
            .client
            .get(self.endpoint(&query.analysis_id))
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(analysis = %query.analysis_id, "No benchmarks published");
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            warn!(analysis = %query.analysis_id, status = %response.status(), "Benchmark service error");
            return Err(ProviderError::Unavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body = response
            .json::<BenchmarkResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(body.benchmarks)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_core::BenchmarkScope;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single request on a local port with a canned response.
    async fn serve_once(status: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn query() -> BenchmarkQuery {
        BenchmarkQuery {
            analysis_id: "debt_to_equity".into(),
            sector: Some("Energy".into()),
            industry: None,
            geography: Some("SA".into()),
            period: 2023,
        }
    }

    #[test]
    fn test_endpoint_and_params() {
        let provider = HttpBenchmarkProvider::new("http://bench.local/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.base_url(), "http://bench.local/api");
        assert_eq!(
            provider.endpoint("debt_to_equity"),
            "http://bench.local/api/benchmarks/debt_to_equity"
        );

        let params = HttpBenchmarkProvider::query_params(&query());
        assert_eq!(params.len(), 3);
        assert!(params.contains(&("period", "2023".to_string())));
        assert!(params.contains(&("geography", "SA".to_string())));
    }

    #[test]
    fn test_response_shape() {
        let body: BenchmarkResponse =
            serde_json::from_str(r#"{"benchmarks": [{"scope": "industry", "value": 0.8}]}"#).unwrap();
        assert_eq!(body.benchmarks.len(), 1);
        let empty: BenchmarkResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.benchmarks.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_means_no_benchmarks() {
        let base = serve_once("404 Not Found", "").await;
        let provider = HttpBenchmarkProvider::new(base, Duration::from_secs(2)).unwrap();
        assert_eq!(provider.lookup(&query()).await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let base = serve_once("503 Service Unavailable", "").await;
        let provider = HttpBenchmarkProvider::new(base, Duration::from_secs(2)).unwrap();
        match provider.lookup(&query()).await {
            Err(ProviderError::Unavailable(msg)) => assert!(msg.contains("503")),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_body_is_decoded() {
        let base = serve_once("200 OK", r#"{"benchmarks": [{"scope": "sector", "value": 1.8}]}"#).await;
        let provider = HttpBenchmarkProvider::new(base, Duration::from_secs(2)).unwrap();
        let values = provider.lookup(&query()).await.unwrap();
        assert_eq!(values, vec![BenchmarkValue::new(BenchmarkScope::Sector, 1.8)]);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let provider = HttpBenchmarkProvider::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        assert!(provider.lookup(&query()).await.is_err());
    }
}

use std::time::Duration;

use serde_json::Value;

use crate::predict::error::FetchError;
use crate::predict::ground_station::GroundStation;
use crate::predict::types::PredictionRecord;

pub const DEFAULT_BASE_URL: &str = "https://sat.terrestre.ar";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const ATTEMPTS: usize = 2;

/// Source of pass predictions.
///
/// Implementations must swallow every failure and return `None`; callers treat
/// all causes the same way.
pub trait Fetcher {
    fn fetch(&self, norad_id: u32, station: &GroundStation) -> Option<PredictionRecord>;
}

/// Minimal blocking HTTP GET, so the passes client can be tested without a network.
pub trait HttpClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("satlight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().map_err(request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(request_error)
    }
}

fn request_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else {
        FetchError::Http(err.to_string())
    }
}

/// Client for the `/passes/{id}` endpoint of the prediction service.
pub struct PassesClient<C: HttpClient> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> PassesClient<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, norad_id: u32, station: &GroundStation) -> String {
        format!(
            "{}/passes/{}?lat={}&lon={}&limit=1",
            self.base_url, norad_id, station.latitude_deg, station.longitude_deg
        )
    }

    /// Fetches the next pass. `Ok(None)` means the service knows no upcoming pass.
    pub fn next_pass(
        &self,
        norad_id: u32,
        station: &GroundStation,
    ) -> Result<Option<PredictionRecord>, FetchError> {
        let url = self.url(norad_id, station);
        let body = self.get_with_retry(norad_id, &url)?;

        let data: Value = serde_json::from_slice(&body)?;
        let Some(first) = data.as_array().and_then(|passes| passes.first()) else {
            return Ok(None);
        };

        PredictionRecord::from_json(first)
            .map(Some)
            .ok_or_else(|| FetchError::Shape(first.to_string()))
    }

    fn get_with_retry(&self, norad_id: u32, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 1;
        loop {
            match self.client.get(url) {
                Err(FetchError::Timeout(e)) if attempt < ATTEMPTS => {
                    log::warn!(
                        "Timeout calling passes endpoint (id={}), retrying once: {}",
                        norad_id,
                        e
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl<C: HttpClient> Fetcher for PassesClient<C> {
    fn fetch(&self, norad_id: u32, station: &GroundStation) -> Option<PredictionRecord> {
        match self.next_pass(norad_id, station) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                log::info!("No upcoming pass for {}", norad_id);
                None
            }
            Err(e) => {
                log::error!("Failed to fetch pass for {}: {}", norad_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::types::PassPoint;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses in order and records requested URLs.
    pub struct MockHttpClient {
        pub responses: RefCell<VecDeque<Result<Vec<u8>, FetchError>>>,
        pub requests: RefCell<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new(responses: Vec<Result<Vec<u8>, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Http("no more responses".into())))
        }
    }

    const PASS_BODY: &str = r#"[{
        "rise": {"utc_timestamp": 1000, "alt": "10.00"},
        "culmination": {"utc_timestamp": 1100, "alt": "46.00"},
        "set": {"utc_timestamp": 1200, "alt": "10.00"},
        "norad_id": 25544,
        "visible": true
    }]"#;

    fn station() -> GroundStation {
        GroundStation::new(37.8, -122.4).unwrap()
    }

    fn expected() -> PredictionRecord {
        PredictionRecord::new(
            PassPoint::new(1000, 10.0),
            PassPoint::new(1100, 46.0),
            PassPoint::new(1200, 10.0),
        )
    }

    #[test]
    fn builds_passes_url() {
        let mock = MockHttpClient::new(vec![Ok(PASS_BODY.as_bytes().to_vec())]);
        let client = PassesClient::new(mock, "https://example.com/");

        let record = client.fetch(25544, &station());

        assert_eq!(record, Some(expected()));
        assert_eq!(
            client.client.requests.borrow().as_slice(),
            ["https://example.com/passes/25544?lat=37.8&lon=-122.4&limit=1"]
        );
    }

    #[test]
    fn retries_once_on_timeout() {
        let mock = MockHttpClient::new(vec![
            Err(FetchError::Timeout("slow".into())),
            Ok(PASS_BODY.as_bytes().to_vec()),
        ]);
        let client = PassesClient::new(mock, DEFAULT_BASE_URL);

        assert_eq!(client.fetch(25544, &station()), Some(expected()));
        assert_eq!(client.client.requests.borrow().len(), 2);
    }

    #[test]
    fn gives_up_after_second_timeout() {
        let mock = MockHttpClient::new(vec![
            Err(FetchError::Timeout("slow".into())),
            Err(FetchError::Timeout("slower".into())),
            Ok(PASS_BODY.as_bytes().to_vec()),
        ]);
        let client = PassesClient::new(mock, DEFAULT_BASE_URL);

        assert!(matches!(
            client.next_pass(25544, &station()),
            Err(FetchError::Timeout(_))
        ));
        assert_eq!(client.client.requests.borrow().len(), 2);
    }

    #[test]
    fn does_not_retry_other_errors() {
        let mock = MockHttpClient::new(vec![
            Err(FetchError::Status {
                status: 500,
                url: "u".into(),
            }),
            Ok(PASS_BODY.as_bytes().to_vec()),
        ]);
        let client = PassesClient::new(mock, DEFAULT_BASE_URL);

        assert_eq!(client.fetch(25544, &station()), None);
        assert_eq!(client.client.requests.borrow().len(), 1);
    }

    #[test]
    fn empty_list_means_no_pass() {
        let client = PassesClient::new(MockHttpClient::new(vec![Ok(b"[]".to_vec())]), "x");
        assert!(matches!(client.next_pass(1, &station()), Ok(None)));

        let client = PassesClient::new(MockHttpClient::new(vec![Ok(b"{}".to_vec())]), "x");
        assert!(matches!(client.next_pass(1, &station()), Ok(None)));
    }

    #[test]
    fn bad_payloads_are_errors() {
        let client = PassesClient::new(MockHttpClient::new(vec![Ok(b"<html>".to_vec())]), "x");
        assert!(matches!(
            client.next_pass(1, &station()),
            Err(FetchError::Json(_))
        ));

        let client = PassesClient::new(MockHttpClient::new(vec![Ok(b"[42]".to_vec())]), "x");
        assert!(matches!(
            client.next_pass(1, &station()),
            Err(FetchError::Shape(_))
        ));
    }
}

//! Caller identity extractor.

use std::convert::Infallible;
use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};

/// The address a request is attributed to for throttling.
///
/// Resolved from `Forwarded` / `X-Forwarded-For` when present, otherwise the
/// peer address. Requests with no resolvable address share one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(String);

impl Caller {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for Caller {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        ready(Ok(Caller(addr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_rt::test]
    async fn test_uses_peer_address() {
        let req = TestRequest::default()
            .peer_addr("10.0.0.7:4100".parse().unwrap())
            .to_http_request();
        let caller = Caller::extract(&req).await.unwrap();
        assert_eq!(caller.as_str(), "10.0.0.7");
    }

    #[actix_rt::test]
    async fn test_prefers_forwarded_header() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.9"))
            .peer_addr("10.0.0.7:4100".parse().unwrap())
            .to_http_request();
        let caller = Caller::extract(&req).await.unwrap();
        assert_eq!(caller.as_str(), "203.0.113.9");
    }

    #[actix_rt::test]
    async fn test_unknown_without_address() {
        let req = TestRequest::default().to_http_request();
        let caller = Caller::extract(&req).await.unwrap();
        assert_eq!(caller.as_str(), "unknown");
    }
}

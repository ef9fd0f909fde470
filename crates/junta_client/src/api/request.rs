use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;

/// Descriptor for one call against the backend.
///
/// Owns everything needed to dispatch the call more than once: the refresh
/// protocol replays the original descriptor with a fresh credential. The
/// target is a path relative to the configured API base, or an absolute URL
/// for calls outside the protected API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    target: String,
    body: Option<serde_json::Value>,
    headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        ApiRequest {
            method,
            target: target.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach an already-built JSON body.
    pub fn body_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct NewReading {
        meter_id: u32,
        value_m3: f64,
    }

    #[test]
    fn builders_set_method_and_target() {
        let request = ApiRequest::get("/lecturas/pendientes");
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.target(), "/lecturas/pendientes");
        assert!(request.body().is_none());
    }

    #[test]
    fn json_body_is_captured() {
        let request = ApiRequest::post("/lecturas")
            .json(&NewReading {
                meter_id: 42,
                value_m3: 17.5,
            })
            .expect("serialize body");

        let body = request.body().expect("body");
        assert_eq!(body["meter_id"], 42);
    }

    #[test]
    fn extra_headers_are_kept() {
        let request = ApiRequest::get("/reportes/morosidad").header(
            HeaderName::from_static("accept"),
            HeaderValue::from_static("application/pdf"),
        );
        assert_eq!(
            request.headers().get("accept").map(|v| v.as_bytes()),
            Some("application/pdf".as_bytes())
        );
    }
}

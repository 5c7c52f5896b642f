use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::Result;
use reqwest::{Method, Response, StatusCode, Url};
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;

/// Backoff delays never exceed this, whatever the attempt count.
const BACKOFF_MAX_SECS: f64 = 120.0;

/// One HTTP request, built fresh per call and never mutated after dispatch.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub query: Option<Vec<(String, String)>>,
}

impl RequestDescriptor {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            query: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            query: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = Some(query);
        self
    }
}

/// Executes one HTTP request with bounded retries and a hard timeout,
/// independent of payload semantics.
///
/// Retries are restricted to the configured status-code set and method
/// allow-list; connection failures and timeouts count as retryable for
/// allow-listed methods. A completed response is returned whatever its
/// status — interpretation belongs to the caller.
#[derive(Debug)]
pub struct Transport {
    base_url: Url,
    pool: RwLock<Option<reqwest::Client>>,
    timeout: Duration,
    retries: u32,
    backoff_factor: f64,
    retry_statuses: Vec<StatusCode>,
    retry_methods: Vec<Method>,
}

impl Transport {
    /// Build a transport with its own pooled connection manager.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let pool = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| {
                ClientError::connection(format!("failed to build connection pool: {err}"))
            })?;
        Self::with_pool(config, pool)
    }

    /// Build a transport around a pre-built pool (reuse, testing).
    /// The configured timeout is still applied per request.
    pub fn with_pool(config: &ClientConfig, pool: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            ClientError::validation(format!("invalid base URL {:?}: {err}", config.base_url))
        })?;

        let mut retry_statuses = Vec::with_capacity(config.retry_statuses.len());
        for code in &config.retry_statuses {
            let status = StatusCode::from_u16(*code).map_err(|_| {
                ClientError::validation(format!("invalid retry status code: {code}"))
            })?;
            retry_statuses.push(status);
        }

        let mut retry_methods = Vec::with_capacity(config.retry_methods.len());
        for name in &config.retry_methods {
            let method: Method = name
                .parse()
                .map_err(|_| ClientError::validation(format!("invalid retry method: {name:?}")))?;
            retry_methods.push(method);
        }

        Ok(Self {
            base_url,
            pool: RwLock::new(Some(pool)),
            timeout: config.timeout(),
            retries: config.retries,
            backoff_factor: config.backoff_factor,
            retry_statuses,
            retry_methods,
        })
    }

    /// Execute a request, consuming retry attempts silently on transient
    /// failure. Returns the final response regardless of its status code.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Response> {
        let pool = self.checkout_pool()?;
        let url = self.target(&descriptor.path)?;
        let retry_allowed = self.retry_methods.contains(&descriptor.method);

        let mut attempt: u32 = 0;
        loop {
            let mut request = pool
                .request(descriptor.method.clone(), url.clone())
                .timeout(self.timeout);
            if let Some(body) = &descriptor.body {
                request = request.json(body);
            }
            if let Some(query) = &descriptor.query {
                request = request.query(query);
            }

            tracing::trace!(
                method = %descriptor.method,
                path = %descriptor.path,
                attempt,
                "dispatching request"
            );

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if retry_allowed
                        && attempt < self.retries
                        && self.retry_statuses.contains(&status)
                    {
                        let delay = self.backoff_delay(attempt);
                        tracing::debug!(
                            %status,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after retryable status"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    let transient = err.is_timeout() || err.is_connect();
                    if retry_allowed && transient && attempt < self.retries {
                        let delay = self.backoff_delay(attempt);
                        tracing::debug!(
                            error = %err,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after transport failure"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(self.classify(err, &descriptor.path));
                }
            }
        }
    }

    /// Release the pooled connections. Idempotent; requests issued after
    /// close fail with a connection error.
    pub fn close(&self) {
        if let Ok(mut guard) = self.pool.write() {
            if guard.take().is_some() {
                tracing::debug!("connection pool released");
            }
        }
    }

    /// Delay before the n-th retry: `backoff_factor * 2^attempt`, capped.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let secs = self.backoff_factor * 2f64.powi(attempt as i32);
        Duration::from_secs_f64(secs.clamp(0.0, BACKOFF_MAX_SECS))
    }

    /// Join the base URL with a request path. A leading-slash path replaces
    /// any path segment of the base address.
    fn target(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::validation(format!("invalid request path {path:?}: {err}")))
    }

    fn checkout_pool(&self) -> Result<reqwest::Client> {
        let guard = self
            .pool
            .read()
            .map_err(|_| ClientError::connection("connection pool lock poisoned"))?;
        guard
            .clone()
            .ok_or_else(|| ClientError::connection("client is closed"))
    }

    fn classify(&self, err: reqwest::Error, path: &str) -> ClientError {
        if err.is_timeout() {
            ClientError::timeout(format!(
                "request to {path} timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if err.is_connect() {
            ClientError::connection(format!("connection failed to {path}: {err}"))
        } else {
            ClientError::other(path, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;

    fn transport(config: &ClientConfig) -> Transport {
        Transport::new(config).unwrap()
    }

    #[test]
    fn backoff_schedule_doubles_per_retry() {
        let t = transport(&ClientConfig::default().with_backoff_factor(0.5));
        assert_eq!(t.backoff_delay(0), Duration::from_millis(500));
        assert_eq!(t.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(t.backoff_delay(2), Duration::from_secs(2));
    }

    #[test]
    fn backoff_is_capped() {
        let t = transport(&ClientConfig::default().with_backoff_factor(100.0));
        assert_eq!(t.backoff_delay(10), Duration::from_secs_f64(BACKOFF_MAX_SECS));
    }

    #[test]
    fn leading_slash_path_replaces_base_path() {
        let t = transport(&ClientConfig::new("http://localhost:8080/api"));
        assert_eq!(
            t.target("/health").unwrap().as_str(),
            "http://localhost:8080/health"
        );
    }

    #[test]
    fn invalid_base_url_is_a_validation_error() {
        let err = Transport::new(&ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ClientError::Validation { .. }));
    }

    #[test]
    fn delete_is_not_retry_allowed() {
        let t = transport(&ClientConfig::default());
        assert!(t.retry_methods.contains(&Method::POST));
        assert!(!t.retry_methods.contains(&Method::DELETE));
    }

    #[test]
    fn descriptors_carry_body_and_query() {
        let descriptor = RequestDescriptor::post("/graph/algorithms/bfs", serde_json::json!({}))
            .with_query(vec![("verbose".to_string(), "true".to_string())]);
        assert_eq!(descriptor.method, Method::POST);
        assert!(descriptor.body.is_some());
        assert_eq!(descriptor.query.unwrap().len(), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let t = transport(&ClientConfig::default());
        t.close();
        t.close();
        assert!(matches!(
            t.checkout_pool().unwrap_err(),
            ClientError::Connection { .. }
        ));
    }
}

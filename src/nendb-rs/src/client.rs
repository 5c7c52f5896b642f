use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{RequestDescriptor, Transport};
use crate::Result;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

const HEALTH: &str = "/health";
const GRAPH_STATS: &str = "/graph/stats";
const BFS: &str = "/graph/algorithms/bfs";
const DIJKSTRA: &str = "/graph/algorithms/dijkstra";
const PAGERANK: &str = "/graph/algorithms/pagerank";

/// NenDB graph service client.
///
/// Validates parameters before any network activity, dispatches through the
/// pooled [`Transport`], and maps outcomes into [`ClientError`] kinds.
/// Success bodies are returned verbatim as [`serde_json::Value`] — the
/// server's response shape is opaque to this layer.
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    transport: Transport,
}

#[derive(Serialize)]
struct BfsRequest {
    start_node: i64,
    max_depth: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<Value>,
}

#[derive(Serialize)]
struct DijkstraRequest {
    start_node: i64,
    end_node: i64,
    weight_property: String,
}

#[derive(Serialize)]
struct PageRankRequest {
    iterations: u32,
    damping_factor: f64,
    tolerance: f64,
}

impl Client {
    /// Connect to a NenDB server.
    ///
    /// Performs a `GET /health` probe unless `config.skip_health_probe` is
    /// set; probe failure fast-fails construction with a connection error.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let transport = Transport::new(&config)?;
        Self::finish_connect(config, transport).await
    }

    /// Connect using a pre-built connection pool (reuse, testing).
    pub async fn connect_with_pool(config: ClientConfig, pool: reqwest::Client) -> Result<Self> {
        let transport = Transport::with_pool(&config, pool)?;
        Self::finish_connect(config, transport).await
    }

    async fn finish_connect(config: ClientConfig, transport: Transport) -> Result<Self> {
        let client = Self { config, transport };
        if !client.config.skip_health_probe {
            if let Err(err) = client.health().await {
                return Err(ClientError::connection(format!(
                    "failed to connect to NenDB server at {}: {err}",
                    client.config.base_url
                )));
            }
        }
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    pub fn retries(&self) -> u32 {
        self.config.retries
    }

    /// Check server health.
    pub async fn health(&self) -> Result<Value> {
        self.request(RequestDescriptor::get(HEALTH)).await
    }

    /// Get graph statistics: node/edge counts and available algorithms.
    pub async fn graph_stats(&self) -> Result<Value> {
        self.request(RequestDescriptor::get(GRAPH_STATS)).await
    }

    /// Execute breadth-first search from `start_node` up to `max_depth`.
    pub async fn bfs(&self, start_node: i64, max_depth: i64) -> Result<Value> {
        self.bfs_with_filters(start_node, max_depth, None).await
    }

    /// Execute breadth-first search with optional node/edge filters.
    pub async fn bfs_with_filters(
        &self,
        start_node: i64,
        max_depth: i64,
        filters: Option<Value>,
    ) -> Result<Value> {
        if start_node < 0 {
            return Err(ClientError::validation(
                "start_node must be a non-negative integer",
            ));
        }
        if max_depth < 1 {
            return Err(ClientError::validation(
                "max_depth must be a positive integer",
            ));
        }

        let body = BfsRequest {
            start_node,
            max_depth,
            filters,
        };
        self.request(post_json(BFS, &body)?).await
    }

    /// Execute Dijkstra's shortest path weighted by the `weight` property.
    pub async fn dijkstra(&self, start_node: i64, end_node: i64) -> Result<Value> {
        self.dijkstra_with_weight(start_node, end_node, "weight")
            .await
    }

    /// Execute Dijkstra's shortest path weighted by an edge property.
    pub async fn dijkstra_with_weight(
        &self,
        start_node: i64,
        end_node: i64,
        weight_property: impl Into<String>,
    ) -> Result<Value> {
        if start_node < 0 {
            return Err(ClientError::validation(
                "start_node must be a non-negative integer",
            ));
        }
        if end_node < 0 {
            return Err(ClientError::validation(
                "end_node must be a non-negative integer",
            ));
        }
        let weight_property = weight_property.into();
        if weight_property.is_empty() {
            return Err(ClientError::validation(
                "weight_property must be a non-empty string",
            ));
        }

        let body = DijkstraRequest {
            start_node,
            end_node,
            weight_property,
        };
        self.request(post_json(DIJKSTRA, &body)?).await
    }

    /// Execute PageRank with the server's conventional defaults
    /// (100 iterations, 0.85 damping, 1e-6 tolerance).
    pub async fn pagerank(&self) -> Result<Value> {
        self.pagerank_with_options(100, 0.85, 1e-6).await
    }

    /// Execute PageRank with explicit parameters.
    pub async fn pagerank_with_options(
        &self,
        iterations: u32,
        damping_factor: f64,
        tolerance: f64,
    ) -> Result<Value> {
        if iterations < 1 {
            return Err(ClientError::validation(
                "iterations must be a positive integer",
            ));
        }
        if !(0.0..=1.0).contains(&damping_factor) {
            return Err(ClientError::validation(
                "damping_factor must be between 0.0 and 1.0",
            ));
        }
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(ClientError::validation("tolerance must be a positive float"));
        }

        let body = PageRankRequest {
            iterations,
            damping_factor,
            tolerance,
        };
        self.request(post_json(PAGERANK, &body)?).await
    }

    /// Release the connection pool. Idempotent; operations issued after
    /// close fail with a connection error. Dropping the client releases the
    /// pool as well, so calling this is optional.
    pub fn close(&self) {
        self.transport.close();
    }

    async fn request(&self, descriptor: RequestDescriptor) -> Result<Value> {
        let path = descriptor.path.clone();
        let response = self.transport.execute(&descriptor).await?;
        interpret(&path, response).await
    }
}

fn post_json<T: Serialize>(path: &str, body: &T) -> Result<RequestDescriptor> {
    let body = serde_json::to_value(body)
        .map_err(|err| ClientError::other(path, format!("failed to encode request body: {err}")))?;
    Ok(RequestDescriptor::post(path, body))
}

/// Map a completed response to a result: success bodies are decoded and
/// returned verbatim; error statuses and undecodable success bodies become
/// response errors carrying structured details.
async fn interpret(path: &str, response: Response) -> Result<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| ClientError::other(path, format!("failed to read response body: {err}")))?;

    if status.as_u16() >= 400 {
        return Err(error_from_status(path, status, &text));
    }

    serde_json::from_str(&text).map_err(|err| {
        ClientError::response(
            format!("invalid JSON response from server: {err}"),
            json!({"status_code": status.as_u16(), "response_text": text}),
        )
    })
}

fn error_from_status(path: &str, status: StatusCode, text: &str) -> ClientError {
    match serde_json::from_str::<Value>(text) {
        Ok(body) => {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or_else(|| status.as_str())
                .to_string();
            ClientError::response(
                format!("HTTP error on {path}: {message}"),
                json!({"status_code": status.as_u16(), "response": body}),
            )
        }
        Err(_) => ClientError::response(
            format!("HTTP error on {path}: {status}"),
            json!({"status_code": status.as_u16()}),
        ),
    }
}

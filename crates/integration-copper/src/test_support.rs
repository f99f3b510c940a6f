use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use copper_core::CoreError;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::cache::LookupCache;
use crate::client::CopperClient;
use crate::config::CopperConfig;
use crate::provider::CopperProvider;
use crate::transport::{ApiMethod, ApiRequest, ApiTransport};

type Route = (ApiMethod, String);

/// Answers by `(method, path)`. The last queued answer for a route repeats.
#[derive(Default)]
pub(crate) struct StubTransport {
    requests: Mutex<Vec<ApiRequest>>,
    routes: Mutex<HashMap<Route, VecDeque<Result<Value, CoreError>>>>,
}

impl StubTransport {
    pub(crate) async fn respond(&self, method: ApiMethod, path: &str, value: Value) {
        self.queue(method, path, Ok(value)).await;
    }

    pub(crate) async fn fail(&self, method: ApiMethod, path: &str, error: CoreError) {
        self.queue(method, path, Err(error)).await;
    }

    async fn queue(&self, method: ApiMethod, path: &str, answer: Result<Value, CoreError>) {
        self.routes
            .lock()
            .await
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(answer);
    }

    pub(crate) async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }

    pub(crate) async fn requests_to(&self, method: ApiMethod, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .cloned()
            .collect()
    }

    pub(crate) async fn count(&self, method: ApiMethod, path: &str) -> usize {
        self.requests_to(method, path).await.len()
    }
}

#[async_trait]
impl ApiTransport for StubTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value, CoreError> {
        let route = (request.method, request.path.clone());
        self.requests.lock().await.push(request);

        let mut routes = self.routes.lock().await;
        match routes.get_mut(&route) {
            Some(answers) if answers.len() > 1 => answers
                .pop_front()
                .unwrap_or_else(|| Err(unrouted(&route))),
            Some(answers) => answers.front().cloned().unwrap_or_else(|| Err(unrouted(&route))),
            None => Err(unrouted(&route)),
        }
    }
}

fn unrouted(route: &Route) -> CoreError {
    CoreError::DependencyUnavailable(format!(
        "stub transport has no response for {} {}",
        route.0.as_str(),
        route.1
    ))
}

pub(crate) fn test_config() -> CopperConfig {
    CopperConfig {
        api_key: "token".to_owned(),
        user_email: "ops@example.com".to_owned(),
        ..CopperConfig::default()
    }
}

pub(crate) fn client_with(stub: Arc<StubTransport>, ttl: Duration) -> CopperClient {
    CopperClient::new(stub, Arc::new(LookupCache::new(ttl)))
}

pub(crate) fn provider_with(stub: Arc<StubTransport>) -> CopperProvider {
    CopperProvider::with_transport(test_config(), stub)
}

/// Reference data shared by most provider tests.
pub(crate) async fn stub_lookups(stub: &StubTransport) {
    stub.respond(ApiMethod::Get, "account", json!({ "id": 77, "name": "Acme CRM" }))
        .await;
    stub.respond(
        ApiMethod::Post,
        "users/search",
        json!([
            { "id": 1, "name": "Ada Lovelace", "email": "ada@example.com" },
            { "id": 2, "name": "Grace Hopper", "email": "grace@example.com" }
        ]),
    )
    .await;
    stub.respond(
        ApiMethod::Get,
        "pipelines",
        json!([{
            "id": 10,
            "name": "Sales",
            "stages": [
                { "id": 100, "name": "Qualified", "win_probability": 10 },
                { "id": 101, "name": "Proposal", "win_probability": 50 }
            ]
        }]),
    )
    .await;
    stub.respond(
        ApiMethod::Get,
        "customer_sources",
        json!([{ "id": 20, "name": "Referral" }]),
    )
    .await;
    stub.respond(
        ApiMethod::Get,
        "loss_reasons",
        json!([{ "id": 30, "name": "Price" }, { "id": 31, "name": "Timing" }]),
    )
    .await;
    stub.respond(
        ApiMethod::Get,
        "contact_types",
        json!([{ "id": 40, "name": "Customer" }]),
    )
    .await;
    stub.respond(
        ApiMethod::Get,
        "custom_field_definitions",
        json!([
            {
                "id": 50,
                "name": "Renewal Date",
                "data_type": "Date",
                "available_on": ["opportunity", "company"]
            },
            {
                "id": 51,
                "name": "Tier",
                "data_type": "Dropdown",
                "available_on": ["opportunity"],
                "options": [
                    { "id": 510, "name": "Gold", "rank": 1 },
                    { "id": 511, "name": "Silver", "rank": 2 }
                ]
            },
            {
                "id": 52,
                "name": "Contract Value",
                "data_type": "Currency",
                "available_on": ["opportunity"]
            }
        ]),
    )
    .await;
}

/// Company and opportunity name indexes used to label project references.
pub(crate) async fn stub_reference_indexes(stub: &StubTransport) {
    stub.respond(
        ApiMethod::Post,
        "companies/search",
        json!([{ "id": 60, "name": "Initech" }]),
    )
    .await;
    stub.respond(
        ApiMethod::Post,
        "opportunities/search",
        json!([{ "id": 70, "name": "Initech renewal" }]),
    )
    .await;
}

pub(crate) fn opportunity_json() -> Value {
    json!({
        "id": 70,
        "name": "Initech renewal",
        "assignee_id": 1,
        "company_id": 60,
        "company_name": "Initech",
        "primary_contact_id": 80,
        "pipeline_id": 10,
        "pipeline_stage_id": 101,
        "customer_source_id": 20,
        "status": "Open",
        "monetary_value": 12000,
        "tags": ["vip", "beta"],
        "custom_fields": [
            { "custom_field_definition_id": 50, "value": 1705276800 },
            { "custom_field_definition_id": 51, "value": 510 }
        ]
    })
}

//! Model client adapters

pub mod http;

use std::collections::HashMap;
use std::sync::Arc;

use conclave_application::ModelClient;
use conclave_domain::CouncilConfig;

use http::HttpModelClient;

/// Build one HTTP model client per member from its model reference.
///
/// Endpoint and credentials come from the environment
/// (`CONCLAVE_API_BASE_URL`, `CONCLAVE_API_KEY`); the member's model name is
/// taken from the config.
pub fn build_clients(config: &CouncilConfig) -> HashMap<String, Arc<dyn ModelClient>> {
    let mut clients: HashMap<String, Arc<dyn ModelClient>> = HashMap::new();
    for member in &config.members {
        clients.insert(
            member.id.clone(),
            Arc::new(HttpModelClient::from_env(&member.model.model)),
        );
    }
    clients
}

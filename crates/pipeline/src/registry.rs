use crate::Result;
use dashmap::DashMap;
use log::{debug, info, warn};
use oasgen_har::{host_with_port, TaggedEntry};
use oasgen_spec::{GeneratorConfig, OpenApi, SpecGenerator};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Spec generators keyed by destination service.
pub struct ServiceRegistry {
    generators: DashMap<String, Arc<SpecGenerator>>,
    config: GeneratorConfig,
}

impl ServiceRegistry {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            generators: DashMap::new(),
            config,
        }
    }

    /// Generator for `destination`, created with server URL
    /// `http://<destination>` when missing.
    pub fn get_or_create(&self, destination: &str) -> Arc<SpecGenerator> {
        self.generator_for(destination, || format!("http://{destination}"))
    }

    fn generator_for(
        &self,
        destination: &str,
        server_url: impl FnOnce() -> String,
    ) -> Arc<SpecGenerator> {
        if let Some(existing) = self.generators.get(destination) {
            return existing.value().clone();
        }
        self.generators
            .entry(destination.to_string())
            .or_insert_with(|| {
                let server_url = server_url();
                info!("New service {destination} at {server_url}");
                Arc::new(SpecGenerator::with_config(server_url, self.config))
            })
            .value()
            .clone()
    }

    pub fn load_from_spec(&self, destination: &str, spec: OpenApi) {
        let server_url = spec
            .servers
            .first()
            .map(|server| server.url.clone())
            .unwrap_or_else(|| format!("http://{destination}"));
        self.generator_for(destination, || server_url)
            .load_from_spec(spec);
    }

    /// Hands `tagged` to its destination's generator. Entries whose URL
    /// cannot be resolved are dropped with a warning.
    pub fn route(&self, tagged: &TaggedEntry) -> Option<String> {
        let url = match tagged.request_url() {
            Ok(url) => url,
            Err(err) => {
                warn!("Dropping entry {:?}: {err}", tagged.sample_id);
                return None;
            }
        };
        let destination = tagged.destination_key();
        if destination.is_empty() {
            warn!("Dropping entry {:?}: no destination", tagged.sample_id);
            return None;
        }

        let generator = self.generator_for(&destination, || {
            format!("{}://{}", url.scheme(), host_with_port(&url))
        });
        let operation_id = generator.feed_entry(tagged);
        if operation_id.is_none() {
            debug!("Entry {:?} not attributed to an operation", tagged.sample_id);
        }
        operation_id
    }

    /// Destinations with admitted traffic or a loaded spec, sorted.
    pub fn list_services(&self) -> Vec<String> {
        let snapshot: Vec<(String, Arc<SpecGenerator>)> = self
            .generators
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut services: Vec<String> = snapshot
            .into_iter()
            .filter(|(_, generator)| generator.has_content())
            .map(|(destination, _)| destination)
            .collect();
        services.sort();
        services
    }

    /// `None` for destinations never seen.
    pub fn get_spec(&self, destination: &str) -> Result<Option<OpenApi>> {
        let Some(generator) = self
            .generators
            .get(destination)
            .map(|entry| entry.value().clone())
        else {
            return Ok(None);
        };
        Ok(Some(generator.get_spec()?))
    }

    pub fn get_all_specs(&self) -> Result<BTreeMap<String, OpenApi>> {
        let mut specs = BTreeMap::new();
        for destination in self.list_services() {
            if let Some(spec) = self.get_spec(&destination)? {
                specs.insert(destination, spec);
            }
        }
        Ok(specs)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasgen_har::{Entry, Peer, Request, Response};
    use pretty_assertions::assert_eq;

    fn tagged(method: &str, url: &str) -> TaggedEntry {
        TaggedEntry::new(Entry {
            started_date_time: "2021-02-03T07:48:12Z".to_string(),
            time: 1.0,
            request: Request {
                method: method.to_string(),
                url: url.to_string(),
                ..Request::default()
            },
            response: Response {
                status: 200,
                ..Response::default()
            },
        })
    }

    #[test]
    fn routes_by_url_host_and_port() {
        let registry = ServiceRegistry::default();
        assert!(registry.route(&tagged("GET", "http://users:8080/a")).is_some());
        assert!(registry.route(&tagged("GET", "https://orders/b")).is_some());

        assert_eq!(registry.list_services(), vec!["orders", "users:8080"]);
        let spec = registry.get_spec("users:8080").unwrap().unwrap();
        assert_eq!(spec.servers[0].url, "http://users:8080");
        let spec = registry.get_spec("orders").unwrap().unwrap();
        assert_eq!(spec.servers[0].url, "https://orders");
    }

    #[test]
    fn tagged_destination_wins_over_host() {
        let registry = ServiceRegistry::default();
        let entry = tagged("GET", "http://10.0.0.7/a").with_destination(Peer::named("users"));
        registry.route(&entry);
        assert_eq!(registry.list_services(), vec!["users"]);
    }

    #[test]
    fn idle_generators_are_not_listed() {
        let registry = ServiceRegistry::default();
        assert_eq!(registry.route(&tagged("OPTIONS", "http://users/a")), None);
        assert_eq!(registry.len(), 1);
        assert!(registry.list_services().is_empty());
        assert!(registry.get_all_specs().unwrap().is_empty());
    }

    #[test]
    fn unresolvable_urls_are_dropped() {
        let registry = ServiceRegistry::default();
        assert_eq!(registry.route(&tagged("GET", "::not a url::")), None);
        assert!(registry.is_empty());
        assert!(registry.get_spec("nowhere").unwrap().is_none());
    }

    #[test]
    fn loaded_specs_are_listed() {
        let registry = ServiceRegistry::default();
        registry.load_from_spec("users", OpenApi::skeleton("http://users"));
        assert_eq!(registry.list_services(), vec!["users"]);
        assert_eq!(registry.get_all_specs().unwrap().len(), 1);
    }
}

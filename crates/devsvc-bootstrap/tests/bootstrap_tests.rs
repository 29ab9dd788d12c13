//! End-to-end bootstrap runs against wiremock dependencies and registry,
//! plus client construction and endpoint resolution.

use std::time::Duration;

use devsvc_api::{Endpoint, ResourceKind};
use devsvc_bootstrap::clients::{DATA_RESOURCES, METADATA_RESOURCES};
use devsvc_bootstrap::{
    BootstrapContext, BootstrapError, Dependency, EndpointResolver, Probe, ProbeError,
    ReadinessGate, ServiceClients, bootstrap, bootstrap_with,
};
use devsvc_config::{CLIENT_DATA, CLIENT_METADATA, Config, ConfigError, DiscoveryMode};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEADLINE: Duration = Duration::from_secs(10);

fn point_at(config: &mut Config, key: &str, port: u16) {
    let client = config.clients.get_mut(key).unwrap();
    client.host = "127.0.0.1".into();
    client.port = port;
    client.timeout = 1000;
}

fn fast_config(metadata_port: u16, data_port: u16) -> Config {
    let mut config = Config::default();
    point_at(&mut config, CLIENT_METADATA, metadata_port);
    point_at(&mut config, CLIENT_DATA, data_port);
    config.readiness.retry_interval_ms = 50;
    config.readiness.verify_interval_ms = 20;
    config
}

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn mount_ping(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api/v1/ping"))
        .respond_with(ResponseTemplate::new(status).set_body_string("pong"))
        .mount(server)
        .await;
}

async fn mount_list(server: &MockServer, resource: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/{resource}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"name": "default"}])))
        .mount(server)
        .await;
}

async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

struct AlwaysHealthy;

impl Probe for AlwaysHealthy {
    async fn check(&self, _dependency: &Dependency) -> Result<(), ProbeError> {
        Ok(())
    }
}

struct NeverHealthy;

impl Probe for NeverHealthy {
    async fn check(&self, dependency: &Dependency) -> Result<(), ProbeError> {
        Err(ProbeError::DependencyNotRegistered {
            service: dependency.service_id().to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Direct-ping bootstrap
// ---------------------------------------------------------------------------

mod direct {
    use super::*;

    #[tokio::test]
    async fn ready_only_after_slow_dependency_recovers() {
        let metadata = MockServer::start().await;
        let data = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/ping"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(3)
            .with_priority(1)
            .mount(&metadata)
            .await;
        mount_ping(&metadata, 200).await;
        mount_list(&metadata, "schedule").await;
        mount_list(&metadata, "scheduleevent").await;
        mount_ping(&data, 200).await;

        let config = fast_config(metadata.address().port(), data.address().port());
        let ctx = BootstrapContext::new(config).unwrap();

        let clients = tokio::time::timeout(DEADLINE, bootstrap(&ctx))
            .await
            .expect("bootstrap did not finish")
            .unwrap();

        let metadata_paths = request_paths(&metadata).await;
        let pings = metadata_paths.iter().filter(|p| *p == "/api/v1/ping").count();
        assert_eq!(pings, 4, "requests: {metadata_paths:?}");
        // No resource call before the fourth (successful) ping.
        assert!(metadata_paths[..4].iter().all(|p| p == "/api/v1/ping"));
        assert_eq!(
            &metadata_paths[4..],
            &["/api/v1/schedule".to_string(), "/api/v1/scheduleevent".to_string()]
        );

        assert_eq!(request_paths(&data).await, vec!["/api/v1/ping".to_string()]);
        assert_eq!(
            clients.schedule.endpoint().configured_url().as_str(),
            format!("{}/api/v1/schedule", metadata.uri())
        );
    }

    #[tokio::test]
    async fn verifier_retries_until_list_succeeds() {
        let metadata = MockServer::start().await;
        let data = MockServer::start().await;
        mount_ping(&metadata, 200).await;
        mount_ping(&data, 200).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/schedule"))
            .respond_with(ResponseTemplate::new(500).set_body_string("not seeded"))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&metadata)
            .await;
        mount_list(&metadata, "schedule").await;
        mount_list(&metadata, "scheduleevent").await;

        let ctx =
            BootstrapContext::new(fast_config(metadata.address().port(), data.address().port()))
                .unwrap();
        tokio::time::timeout(DEADLINE, bootstrap(&ctx))
            .await
            .expect("bootstrap did not finish")
            .unwrap();

        let paths = request_paths(&metadata).await;
        assert_eq!(paths.iter().filter(|p| *p == "/api/v1/schedule").count(), 3);
        assert_eq!(paths.iter().filter(|p| *p == "/api/v1/scheduleevent").count(), 1);
        // Schedule events are only listed once schedules succeeded.
        assert_eq!(paths.last().map(String::as_str), Some("/api/v1/scheduleevent"));
    }

    #[tokio::test]
    async fn unhealthy_dependency_keeps_bootstrap_blocked() {
        let ctx = BootstrapContext::new(fast_config(closed_port(), closed_port())).unwrap();
        let result =
            tokio::time::timeout(Duration::from_millis(300), bootstrap_with(&ctx, &NeverHealthy))
                .await;
        assert!(result.is_err(), "bootstrap returned without healthy dependencies");
    }
}

// ---------------------------------------------------------------------------
// Registry bootstrap
// ---------------------------------------------------------------------------

mod registry {
    use super::*;

    async fn register(consul: &MockServer, service: &str, target: &MockServer) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/catalog/service/{service}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "ServiceName": service,
                "ServiceAddress": "127.0.0.1",
                "ServicePort": target.address().port()
            }])))
            .mount(consul)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/health/checks/{service}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"CheckID": format!("service:{service}"), "Status": "passing"}
            ])))
            .mount(consul)
            .await;
    }

    #[tokio::test]
    async fn clients_follow_registry_addresses() {
        let consul = MockServer::start().await;
        let metadata = MockServer::start().await;
        let data = MockServer::start().await;
        register(&consul, "edgex-core-metadata", &metadata).await;
        register(&consul, "edgex-core-data", &data).await;
        mount_list(&metadata, "schedule").await;
        mount_list(&metadata, "scheduleevent").await;

        // Configured addresses are dead; only registry lookups can succeed.
        let mut config = fast_config(closed_port(), closed_port());
        config.discovery = DiscoveryMode::Registry;
        config.registry.host = consul.address().ip().to_string();
        config.registry.port = consul.address().port();

        let ctx = BootstrapContext::new(config).unwrap();
        let clients = tokio::time::timeout(DEADLINE, bootstrap(&ctx))
            .await
            .expect("bootstrap did not finish")
            .unwrap();

        assert!(matches!(clients.event.endpoint(), Endpoint::Registry { .. }));
        assert_eq!(
            request_paths(&metadata).await,
            vec![
                "/api/v1/schedule".to_string(),
                "/api/v1/scheduleevent".to_string()
            ]
        );
    }

    #[test]
    fn empty_registry_host_fails_before_any_retry() {
        let mut config = Config::default();
        config.discovery = DiscoveryMode::Registry;
        config.registry.host = String::new();

        let result = BootstrapContext::new(config);
        assert!(matches!(
            result,
            Err(BootstrapError::Config(ConfigError::Invalid(_)))
        ));
    }
}

// ---------------------------------------------------------------------------
// Client construction
// ---------------------------------------------------------------------------

mod construction {
    use super::*;

    #[tokio::test]
    async fn one_client_per_resource_on_its_dependency() {
        let config = Config::default();
        let deps = Dependency::required(&config);
        let ready = ReadinessGate::new(&AlwaysHealthy, Duration::from_millis(1))
            .wait_all(&deps)
            .await;

        let clients = ServiceClients::build(&ready, &EndpointResolver::default()).unwrap();

        assert_eq!(clients.all().len(), METADATA_RESOURCES.len() + DATA_RESOURCES.len());
        for kind in METADATA_RESOURCES {
            let url = clients.get(kind).endpoint().configured_url().clone();
            assert_eq!(clients.get(kind).kind(), kind);
            assert_eq!(url.port(), Some(48081), "{kind} should live on core-metadata");
            assert_eq!(url.path(), kind.api_path());
        }
        for kind in DATA_RESOURCES {
            let url = clients.get(kind).endpoint().configured_url().clone();
            assert_eq!(url.port(), Some(48080), "{kind} should live on core-data");
        }
        assert!(matches!(clients.device.endpoint(), Endpoint::Fixed(_)));
    }

    #[tokio::test]
    async fn build_requires_every_dependency_to_be_ready() {
        let config = Config::default();
        let metadata_only: Vec<Dependency> = Dependency::required(&config)
            .into_iter()
            .filter(|d| d.key == CLIENT_METADATA)
            .collect();
        let ready = ReadinessGate::new(&AlwaysHealthy, Duration::from_millis(1))
            .wait_all(&metadata_only)
            .await;

        let result = ServiceClients::build(&ready, &EndpointResolver::default());
        match result {
            Err(BootstrapError::DependencyNotReady(key)) => assert_eq!(key, CLIENT_DATA),
            other => panic!("expected DependencyNotReady, got: {other:?}"),
        }
    }

    #[test]
    fn resolver_joins_address_prefix_and_path() {
        let config = Config::default();
        let metadata = Dependency::new(
            CLIENT_METADATA,
            config.client(CLIENT_METADATA).unwrap().clone(),
        );
        assert_eq!(
            EndpointResolver::resolve(&metadata, "deviceprofile"),
            "http://localhost:48081/api/v1/deviceprofile"
        );
        assert_eq!(
            EndpointResolver::resolve(&metadata, "/addressable"),
            "http://localhost:48081/api/v1/addressable"
        );
    }

    #[test]
    fn registry_resolver_builds_registry_endpoints() {
        let config = Config::default();
        let data = Dependency::new(CLIENT_DATA, config.client(CLIENT_DATA).unwrap().clone());
        let registry =
            devsvc_api::RegistryClient::new("http://localhost:8500", Duration::from_secs(1))
                .unwrap();
        let resolver = EndpointResolver::new(Some(registry));
        assert!(resolver.uses_registry());

        match resolver.endpoint(&data, ResourceKind::Event.path()).unwrap() {
            Endpoint::Registry {
                service_id,
                path,
                fallback,
                ..
            } => {
                assert_eq!(service_id, "edgex-core-data");
                assert_eq!(path, "/api/v1/event");
                assert_eq!(fallback.as_str(), "http://localhost:48080/api/v1/event");
            }
            other => panic!("expected registry endpoint, got: {other:?}"),
        }
    }
}

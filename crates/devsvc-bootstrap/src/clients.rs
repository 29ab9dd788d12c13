use devsvc_api::{ResourceClient, ResourceKind};
use devsvc_config::{CLIENT_DATA, CLIENT_METADATA};
use tracing::{debug, info};

use crate::dependency::Dependency;
use crate::endpoint::EndpointResolver;
use crate::error::BootstrapError;
use crate::gate::ReadyDependencies;

/// Resources served by core-metadata.
pub const METADATA_RESOURCES: [ResourceKind; 6] = [
    ResourceKind::Addressable,
    ResourceKind::Device,
    ResourceKind::DeviceService,
    ResourceKind::DeviceProfile,
    ResourceKind::Schedule,
    ResourceKind::ScheduleEvent,
];

/// Resources served by core-data.
pub const DATA_RESOURCES: [ResourceKind; 2] = [ResourceKind::Event, ResourceKind::ValueDescriptor];

/// One client per (dependency, resource) pair, kept for the life of the
/// process.
#[derive(Debug, Clone)]
pub struct ServiceClients {
    pub addressable: ResourceClient,
    pub device: ResourceClient,
    pub device_service: ResourceClient,
    pub device_profile: ResourceClient,
    pub schedule: ResourceClient,
    pub schedule_event: ResourceClient,
    pub event: ResourceClient,
    pub value_descriptor: ResourceClient,
}

impl ServiceClients {
    /// Build every resource client. Performs no network I/O.
    pub fn build(
        ready: &ReadyDependencies,
        resolver: &EndpointResolver,
    ) -> Result<Self, BootstrapError> {
        let metadata = required(ready, CLIENT_METADATA)?;
        let data = required(ready, CLIENT_DATA)?;

        let build = |dependency: &Dependency, kind: ResourceKind| -> Result<ResourceClient, BootstrapError> {
            let endpoint = resolver.endpoint(dependency, kind.path())?;
            debug!(dependency = %dependency.key, resource = %kind, url = %endpoint.configured_url(), "building resource client");
            Ok(ResourceClient::new(kind, endpoint, dependency.timeout())?)
        };

        let clients = Self {
            addressable: build(metadata, ResourceKind::Addressable)?,
            device: build(metadata, ResourceKind::Device)?,
            device_service: build(metadata, ResourceKind::DeviceService)?,
            device_profile: build(metadata, ResourceKind::DeviceProfile)?,
            schedule: build(metadata, ResourceKind::Schedule)?,
            schedule_event: build(metadata, ResourceKind::ScheduleEvent)?,
            event: build(data, ResourceKind::Event)?,
            value_descriptor: build(data, ResourceKind::ValueDescriptor)?,
        };

        info!(
            count = clients.all().len(),
            registry_aware = resolver.uses_registry(),
            "resource clients constructed"
        );
        Ok(clients)
    }

    /// Every client, metadata resources first.
    pub fn all(&self) -> [&ResourceClient; 8] {
        [
            &self.addressable,
            &self.device,
            &self.device_service,
            &self.device_profile,
            &self.schedule,
            &self.schedule_event,
            &self.event,
            &self.value_descriptor,
        ]
    }

    pub fn get(&self, kind: ResourceKind) -> &ResourceClient {
        match kind {
            ResourceKind::Addressable => &self.addressable,
            ResourceKind::Device => &self.device,
            ResourceKind::DeviceService => &self.device_service,
            ResourceKind::DeviceProfile => &self.device_profile,
            ResourceKind::Schedule => &self.schedule,
            ResourceKind::ScheduleEvent => &self.schedule_event,
            ResourceKind::Event => &self.event,
            ResourceKind::ValueDescriptor => &self.value_descriptor,
        }
    }
}

fn required<'a>(ready: &'a ReadyDependencies, key: &str) -> Result<&'a Dependency, BootstrapError> {
    ready
        .get(key)
        .ok_or_else(|| BootstrapError::DependencyNotReady(key.to_string()))
}

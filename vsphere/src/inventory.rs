/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use log::{debug, info, warn};

use crate::constants::{
    CLUSTER_COMPUTE_RESOURCE, DATACENTER, DISTRIBUTED_VIRTUAL_PORTGROUP,
    DISTRIBUTED_VIRTUAL_SWITCH, HOST_SYSTEM, VIRTUAL_MACHINE,
};
use crate::error::Result;
use crate::property_collector::PropertyCollector;
use crate::session::VimClient;
use crate::types::ManagedObjectReference;

/// Find inventory objects by name.
pub struct Inventory<'a> {
    client: &'a VimClient,
}

impl<'a> Inventory<'a> {
    pub fn new(client: &'a VimClient) -> Self {
        Self { client }
    }

    fn property_collector(&self) -> PropertyCollector<'a> {
        self.client.property_collector()
    }

    async fn find(
        &self,
        container: &ManagedObjectReference,
        r#type: &str,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        let mut objects = self
            .property_collector()
            .in_folder_by_type(container, r#type)
            .await?;
        Ok(found(r#type, name, objects.remove(name)))
    }

    pub async fn datacenter(
        &self,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        self.find(self.client.root_folder(), DATACENTER, name).await
    }

    pub async fn cluster(
        &self,
        datacenter: &ManagedObjectReference,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        self.find(datacenter, CLUSTER_COMPUTE_RESOURCE, name).await
    }

    pub async fn cluster_in(
        &self,
        datacenter: &str,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        match self.datacenter(datacenter).await? {
            Some(dc) => self.cluster(&dc, name).await,
            None => Ok(None),
        }
    }

    /// Host names are compared case-insensitively.
    pub async fn host(
        &self,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        let hosts = self
            .property_collector()
            .in_folder_by_type(self.client.root_folder(), HOST_SYSTEM)
            .await?;
        let name = name.to_lowercase();
        let host = hosts
            .into_iter()
            .find(|(host, _)| host.to_lowercase() == name)
            .map(|(_, mor)| mor);
        Ok(found(HOST_SYSTEM, &name, host))
    }

    pub async fn hosts_in_cluster(
        &self,
        cluster: &ManagedObjectReference,
    ) -> Result<Vec<ManagedObjectReference>> {
        let mut hosts = self
            .property_collector()
            .in_folder_by_type(cluster, HOST_SYSTEM)
            .await?
            .into_values()
            .collect::<Vec<_>>();
        hosts.sort_by(|a, b| a.value.cmp(&b.value));
        debug!("found {} hosts in {}", hosts.len(), cluster);
        Ok(hosts)
    }

    pub async fn distributed_switch(
        &self,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        self.find(self.client.root_folder(), DISTRIBUTED_VIRTUAL_SWITCH, name)
            .await
    }

    pub async fn portgroup(
        &self,
        datacenter: &ManagedObjectReference,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        self.find(datacenter, DISTRIBUTED_VIRTUAL_PORTGROUP, name)
            .await
    }

    pub async fn portgroup_in(
        &self,
        datacenter: &str,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        match self.datacenter(datacenter).await? {
            Some(dc) => self.portgroup(&dc, name).await,
            None => Ok(None),
        }
    }

    pub async fn virtual_machine(
        &self,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        let vm = self.property_collector().vm_by_name(name).await?;
        Ok(found(VIRTUAL_MACHINE, name, vm))
    }
}

fn found(
    r#type: &str,
    name: &str,
    mor: Option<ManagedObjectReference>,
) -> Option<ManagedObjectReference> {
    match &mor {
        Some(mor) => info!("found {} {}: {}", r#type, name, mor.value),
        None => warn!("{} {} not found", r#type, name),
    }
    mor
}

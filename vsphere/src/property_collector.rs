/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};

use crate::constants::{
    NAME_PROPERTY, RECENT_TASK_PROPERTY, TASK_INFO_PROPERTY, VIRTUAL_MACHINE,
};
use crate::error::{Error, Result};
use crate::requests::{
    ContinueRetrievePropertiesEx, CreateContainerView, CreateFilter,
    DestroyPropertyFilter, DestroyView, RetrievePropertiesEx,
    WaitForUpdatesEx,
};
use crate::session::VimClient;
use crate::spec::{
    container_view_traversal_spec, inventory_traversal_spec,
    vm_traversal_spec, ObjectSpec, PropertyFilterSpec, PropertySpec,
    SelectionSpec, WaitOptions,
};
use crate::types::{
    ManagedObjectReference, ObjectContent, TaskInfo, TaskInfoState,
    UpdateSet, Value,
};

pub type PropertyMap = HashMap<String, Value>;

/// How to reach objects of the requested type from the container.
#[derive(Clone, Debug)]
pub enum Traversal {
    /// Create a temporary container view over the container.
    ContainerView { recursive: bool },
    /// Walk the full inventory below the container.
    Inventory,
    Custom {
        select_set: Vec<SelectionSpec>,
        skip: bool,
    },
}

/// Read-only access to the server's property collector.
pub struct PropertyCollector<'a> {
    client: &'a VimClient,
}

impl<'a> PropertyCollector<'a> {
    pub fn new(client: &'a VimClient) -> Self {
        Self { client }
    }

    fn collector(&self) -> &'a ManagedObjectReference {
        &self.client.service_content().property_collector
    }

    /// Retrieve the objects matching the filter specs, following
    /// continuation tokens until the last page.
    pub async fn retrieve(
        &self,
        specs: &[PropertyFilterSpec],
    ) -> Result<Vec<ObjectContent>> {
        specs.iter().try_for_each(PropertyFilterSpec::validate)?;

        let mut objects = Vec::new();
        let mut page = self
            .client
            .call(&RetrievePropertiesEx {
                property_collector: self.collector(),
                spec_set: specs,
                options: self.client.retrieve_options(),
            })
            .await?;

        while let Some(result) = page {
            debug!("retrieved {} objects", result.objects.len());
            objects.extend(result.objects);
            page = match result.token.as_deref() {
                Some(token) if !token.is_empty() => {
                    self.client
                        .call(&ContinueRetrievePropertiesEx {
                            property_collector: self.collector(),
                            token,
                        })
                        .await?
                }
                _ => None,
            };
        }

        Ok(objects)
    }

    /// Retrieve `properties` of every object of type `type` reachable
    /// from `container`.
    pub async fn retrieve_by_type(
        &self,
        container: &ManagedObjectReference,
        r#type: &str,
        properties: &[&str],
        traversal: Traversal,
    ) -> Result<Vec<ObjectContent>> {
        let prop_set = vec![PropertySpec::new(r#type, properties)];
        match traversal {
            Traversal::ContainerView { recursive } => {
                let view =
                    self.create_view(container, r#type, recursive).await?;
                let spec = PropertyFilterSpec::new(
                    prop_set,
                    vec![ObjectSpec::new(view.clone())
                        .skip(true)
                        .select_set(container_view_traversal_spec())],
                );
                let res = self.retrieve(&[spec]).await;
                let destroyed =
                    self.client.call(&DestroyView { view: &view }).await;
                if let Err(e) = destroyed {
                    warn!("failed to destroy container view {}: {}", view, e);
                }
                res
            }
            Traversal::Inventory => {
                let spec = PropertyFilterSpec::new(
                    prop_set,
                    vec![ObjectSpec::new(container.clone())
                        .skip(true)
                        .select_set(inventory_traversal_spec())],
                );
                self.retrieve(&[spec]).await
            }
            Traversal::Custom { select_set, skip } => {
                let spec = PropertyFilterSpec::new(
                    prop_set,
                    vec![ObjectSpec::new(container.clone())
                        .skip(skip)
                        .select_set(select_set)],
                );
                self.retrieve(&[spec]).await
            }
        }
    }

    async fn create_view(
        &self,
        container: &ManagedObjectReference,
        r#type: &str,
        recursive: bool,
    ) -> Result<ManagedObjectReference> {
        let view_manager = self
            .client
            .service_content()
            .view_manager
            .as_ref()
            .ok_or(Error::MissingManager("viewManager"))?;
        let view = self
            .client
            .call(&CreateContainerView {
                view_manager,
                container,
                types: &[r#type],
                recursive,
            })
            .await?;
        debug!("created container view {} on {}", view, container);
        Ok(view)
    }

    /// Properties of every object of `type` below `container`, by object.
    pub async fn in_container_by_type(
        &self,
        container: &ManagedObjectReference,
        r#type: &str,
        properties: &[&str],
    ) -> Result<HashMap<ManagedObjectReference, PropertyMap>> {
        let objects = self
            .retrieve_by_type(
                container,
                r#type,
                properties,
                Traversal::ContainerView { recursive: true },
            )
            .await?;
        Ok(objects.into_iter().map(into_properties).collect())
    }

    /// Objects of `type` below `folder`, by name.
    pub async fn in_folder_by_type(
        &self,
        folder: &ManagedObjectReference,
        r#type: &str,
    ) -> Result<HashMap<String, ManagedObjectReference>> {
        let objects = self
            .retrieve_by_type(
                folder,
                r#type,
                &[NAME_PROPERTY],
                Traversal::ContainerView { recursive: true },
            )
            .await?;
        Ok(objects
            .into_iter()
            .filter_map(|object| {
                let name = object.get(NAME_PROPERTY)?.as_str()?.to_string();
                Some((name, object.obj))
            })
            .collect())
    }

    /// Selected properties of a single object.
    pub async fn entity_props(
        &self,
        entity: &ManagedObjectReference,
        properties: &[&str],
    ) -> Result<PropertyMap> {
        let spec = PropertyFilterSpec::new(
            vec![PropertySpec::new(&entity.r#type, properties)],
            vec![ObjectSpec::new(entity.clone())],
        );
        Ok(self
            .retrieve(&[spec])
            .await?
            .into_iter()
            .find(|object| &object.obj == entity)
            .map(|object| into_properties(object).1)
            .unwrap_or_default())
    }

    /// Selected properties of several objects, possibly of different types.
    pub async fn entity_props_many(
        &self,
        entities: &[ManagedObjectReference],
        properties: &[&str],
    ) -> Result<HashMap<ManagedObjectReference, PropertyMap>> {
        if entities.is_empty() {
            return Ok(HashMap::new());
        }
        let types = entities
            .iter()
            .map(|entity| entity.r#type.as_str())
            .collect::<BTreeSet<_>>();
        let spec = PropertyFilterSpec::new(
            types
                .into_iter()
                .map(|typ| PropertySpec::new(typ, properties))
                .collect(),
            entities.iter().cloned().map(ObjectSpec::new).collect(),
        )
        .report_missing_objects(true);
        let objects = self.retrieve(&[spec]).await?;
        Ok(objects.into_iter().map(into_properties).collect())
    }

    pub async fn dynamic_property(
        &self,
        entity: &ManagedObjectReference,
        name: &str,
    ) -> Result<Option<Value>> {
        Ok(self.entity_props(entity, &[name]).await?.remove(name))
    }

    pub async fn name(
        &self,
        entity: &ManagedObjectReference,
    ) -> Result<Option<String>> {
        Ok(self
            .dynamic_property(entity, NAME_PROPERTY)
            .await?
            .and_then(|val| val.as_str().map(String::from)))
    }

    /// Find a virtual machine anywhere below the root folder by name.
    pub async fn vm_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ManagedObjectReference>> {
        let objects = self
            .retrieve_by_type(
                self.client.root_folder(),
                VIRTUAL_MACHINE,
                &[NAME_PROPERTY],
                Traversal::Custom {
                    select_set: vm_traversal_spec(),
                    skip: true,
                },
            )
            .await?;
        Ok(objects
            .into_iter()
            .find(|object| {
                object.get(NAME_PROPERTY).and_then(Value::as_str) == Some(name)
            })
            .map(|object| object.obj))
    }

    /// Register a filter reporting full values of `property` on `entity`.
    pub async fn create_filter(
        &self,
        entity: &ManagedObjectReference,
        property: &str,
    ) -> Result<ManagedObjectReference> {
        let spec = PropertyFilterSpec::new(
            vec![PropertySpec::new(&entity.r#type, &[property])],
            vec![ObjectSpec::new(entity.clone())],
        );
        self.client
            .call(&CreateFilter {
                property_collector: self.collector(),
                spec: &spec,
                partial_updates: false,
            })
            .await
    }

    pub async fn wait_for_updates_ex(
        &self,
        version: &str,
        options: WaitOptions,
    ) -> Result<Option<UpdateSet>> {
        self.client
            .call(&WaitForUpdatesEx {
                property_collector: self.collector(),
                version,
                options,
            })
            .await
    }

    pub async fn destroy_property_filter(
        &self,
        filter: &ManagedObjectReference,
    ) -> Result<()> {
        self.client.call(&DestroyPropertyFilter { filter }).await
    }

    /// Tasks recently started on `entity` whose info is still available.
    pub async fn recent_active_tasks(
        &self,
        entity: &ManagedObjectReference,
    ) -> Result<Vec<ManagedObjectReference>> {
        let props = self
            .entity_props(entity, &[NAME_PROPERTY, RECENT_TASK_PROPERTY])
            .await?;
        let entity_name = props
            .get(NAME_PROPERTY)
            .and_then(Value::as_str)
            .unwrap_or(&entity.value);
        let tasks = match props
            .get(RECENT_TASK_PROPERTY)
            .and_then(Value::as_mors)
        {
            Some(tasks) => tasks,
            None => return Ok(Vec::new()),
        };

        let infos =
            self.entity_props_many(tasks, &[TASK_INFO_PROPERTY]).await?;
        let mut active = Vec::new();
        for task in tasks {
            let info: Option<&TaskInfo> = infos
                .get(task)
                .and_then(|props| props.get(TASK_INFO_PROPERTY))
                .and_then(Value::as_task_info);
            match info {
                Some(info) => {
                    if let TaskInfoState::Queued | TaskInfoState::Running =
                        info.state
                    {
                        info!(
                            "{} | active task {} ({}) is {}",
                            entity_name,
                            info.display_name(),
                            info.description_id.as_deref().unwrap_or("-"),
                            info.state
                        );
                    }
                    active.push(task.clone());
                }
                None => debug!("no info for task {}", task),
            }
        }
        Ok(active)
    }
}

fn into_properties(
    object: ObjectContent,
) -> (ManagedObjectReference, PropertyMap) {
    for missing in &object.missing_set {
        debug!("{}: missing property {}", object.obj, missing.path);
    }
    let props = object
        .prop_set
        .into_iter()
        .filter_map(|prop| Some((prop.name, prop.val?)))
        .collect();
    (object.obj, props)
}

/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Filter specifications for the property collector, and the traversal
//! graphs used to walk the inventory.

use std::collections::HashSet;
use std::io::Write;

use serde::{Deserialize, Serialize};
use xml::writer::{EventWriter, XmlEvent};

use crate::codec::writer::{bool_elem, mor, simple_elem};
use crate::error::{Error, Result};
use crate::types::ManagedObjectReference;

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct PropertySpec {
    pub r#type: String,
    pub all: bool,
    pub path_set: Vec<String>,
}

/// A reference by name to a traversal spec, or an inline traversal spec.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub enum SelectionSpec {
    Ref(String),
    Traversal(TraversalSpec),
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct TraversalSpec {
    pub name: String,
    pub r#type: String,
    pub path: String,
    pub skip: bool,
    pub select_set: Vec<SelectionSpec>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ObjectSpec {
    pub obj: ManagedObjectReference,
    pub skip: bool,
    pub select_set: Vec<SelectionSpec>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct PropertyFilterSpec {
    pub prop_set: Vec<PropertySpec>,
    pub object_set: Vec<ObjectSpec>,
    pub report_missing_objects_in_results: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct RetrieveOptions {
    pub max_objects: Option<u32>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct WaitOptions {
    pub max_wait_seconds: Option<u32>,
    pub max_object_updates: Option<u32>,
}

impl PropertySpec {
    pub fn new<S: AsRef<str>>(r#type: &str, paths: &[S]) -> Self {
        Self {
            r#type: r#type.to_string(),
            all: false,
            path_set: paths.iter().map(|p| p.as_ref().to_string()).collect(),
        }
    }

    /// Retrieve every property of the type.
    pub fn all(r#type: &str) -> Self {
        Self {
            r#type: r#type.to_string(),
            all: true,
            path_set: Vec::new(),
        }
    }

    fn write<W: Write>(
        &self,
        xml: &mut EventWriter<W>,
    ) -> xml::writer::Result<()> {
        xml.write(XmlEvent::start_element("ns1:propSet"))?;
        simple_elem(xml, "ns1:type", &self.r#type)?;
        bool_elem(xml, "ns1:all", self.all)?;
        for path in &self.path_set {
            simple_elem(xml, "ns1:pathSet", path)?;
        }
        xml.write(XmlEvent::end_element())
    }
}

impl SelectionSpec {
    pub fn reference(name: &str) -> Self {
        Self::Ref(name.to_string())
    }

    fn write<W: Write>(
        &self,
        xml: &mut EventWriter<W>,
    ) -> xml::writer::Result<()> {
        match self {
            Self::Ref(name) => {
                xml.write(XmlEvent::start_element("ns1:selectSet"))?;
                simple_elem(xml, "ns1:name", name)?;
                xml.write(XmlEvent::end_element())
            }
            Self::Traversal(spec) => spec.write(xml),
        }
    }

    fn collect_names<'a>(&'a self, names: &mut HashSet<&'a str>) {
        if let Self::Traversal(spec) = self {
            names.insert(&spec.name);
            spec.select_set.iter().for_each(|s| s.collect_names(names));
        }
    }

    fn check_refs(&self, names: &HashSet<&str>) -> Result<()> {
        match self {
            Self::Ref(name) => match names.contains(name.as_str()) {
                true => Ok(()),
                false => Err(Error::UnresolvedSelection(name.clone())),
            },
            Self::Traversal(spec) => spec
                .select_set
                .iter()
                .try_for_each(|s| s.check_refs(names)),
        }
    }
}

impl From<TraversalSpec> for SelectionSpec {
    fn from(spec: TraversalSpec) -> Self {
        Self::Traversal(spec)
    }
}

impl TraversalSpec {
    pub fn new(name: &str, r#type: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            r#type: r#type.to_string(),
            path: path.to_string(),
            skip: false,
            select_set: Vec::new(),
        }
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn select<S: Into<SelectionSpec>>(mut self, spec: S) -> Self {
        self.select_set.push(spec.into());
        self
    }

    /// Add references by name to other traversal specs.
    pub fn select_refs(mut self, names: &[&str]) -> Self {
        self.select_set
            .extend(names.iter().map(|name| SelectionSpec::reference(name)));
        self
    }

    fn write<W: Write>(
        &self,
        xml: &mut EventWriter<W>,
    ) -> xml::writer::Result<()> {
        xml.write(
            XmlEvent::start_element("ns1:selectSet")
                .attr("xsi:type", "ns1:TraversalSpec"),
        )?;
        simple_elem(xml, "ns1:name", &self.name)?;
        simple_elem(xml, "ns1:type", &self.r#type)?;
        simple_elem(xml, "ns1:path", &self.path)?;
        bool_elem(xml, "ns1:skip", self.skip)?;
        for spec in &self.select_set {
            spec.write(xml)?;
        }
        xml.write(XmlEvent::end_element())
    }
}

impl ObjectSpec {
    pub fn new(obj: ManagedObjectReference) -> Self {
        Self {
            obj,
            skip: false,
            select_set: Vec::new(),
        }
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn select_set(mut self, select_set: Vec<SelectionSpec>) -> Self {
        self.select_set = select_set;
        self
    }

    /// Every name reference must resolve to a traversal spec defined
    /// somewhere in this object spec's selection graph.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        self.select_set
            .iter()
            .for_each(|s| s.collect_names(&mut names));
        self.select_set
            .iter()
            .try_for_each(|s| s.check_refs(&names))
    }

    fn write<W: Write>(
        &self,
        xml: &mut EventWriter<W>,
    ) -> xml::writer::Result<()> {
        xml.write(XmlEvent::start_element("ns1:objectSet"))?;
        mor(xml, "ns1:obj", &self.obj)?;
        bool_elem(xml, "ns1:skip", self.skip)?;
        for spec in &self.select_set {
            spec.write(xml)?;
        }
        xml.write(XmlEvent::end_element())
    }
}

impl PropertyFilterSpec {
    pub fn new(
        prop_set: Vec<PropertySpec>,
        object_set: Vec<ObjectSpec>,
    ) -> Self {
        Self {
            prop_set,
            object_set,
            report_missing_objects_in_results: None,
        }
    }

    pub fn report_missing_objects(mut self, report: bool) -> Self {
        self.report_missing_objects_in_results = Some(report);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.object_set.iter().try_for_each(ObjectSpec::validate)
    }

    /// Write the spec as the element `name` (`specSet` or `spec`).
    pub(crate) fn write<W: Write>(
        &self,
        xml: &mut EventWriter<W>,
        name: &str,
    ) -> xml::writer::Result<()> {
        xml.write(XmlEvent::start_element(name))?;
        for prop in &self.prop_set {
            prop.write(xml)?;
        }
        for obj in &self.object_set {
            obj.write(xml)?;
        }
        if let Some(report) = self.report_missing_objects_in_results {
            bool_elem(xml, "ns1:reportMissingObjectsInResults", report)?;
        }
        xml.write(XmlEvent::end_element())
    }
}

impl RetrieveOptions {
    pub fn max_objects(max_objects: Option<u32>) -> Self {
        Self { max_objects }
    }

    pub(crate) fn write<W: Write>(
        &self,
        xml: &mut EventWriter<W>,
    ) -> xml::writer::Result<()> {
        xml.write(XmlEvent::start_element("ns1:options"))?;
        if let Some(max) = self.max_objects {
            simple_elem(xml, "ns1:maxObjects", &max.to_string())?;
        }
        xml.write(XmlEvent::end_element())
    }
}

impl WaitOptions {
    pub fn max_wait_seconds(seconds: u32) -> Self {
        Self {
            max_wait_seconds: Some(seconds),
            max_object_updates: None,
        }
    }
}

/* Traversal graphs. */

/// The traversal of a container view onto the objects it holds.
pub fn container_view_traversal_spec() -> Vec<SelectionSpec> {
    vec![TraversalSpec::new("view", "ContainerView", "view").into()]
}

/// Walk from the root folder to every virtual machine, through
/// datacenter vm folders and vApps.
pub fn vm_traversal_spec() -> Vec<SelectionSpec> {
    let vapp_to_vm = TraversalSpec::new("vAppToVM", "VirtualApp", "vm");
    let vapp_to_vapp =
        TraversalSpec::new("vAppToVApp", "VirtualApp", "resourcePool")
            .select_refs(&["vAppToVApp", "vAppToVM"]);
    let dc_to_vm_folder =
        TraversalSpec::new("DataCenterToVMFolder", "Datacenter", "vmFolder")
            .select_refs(&["VisitFolders"]);
    vec![TraversalSpec::new("VisitFolders", "Folder", "childEntity")
        .select_refs(&["VisitFolders"])
        .select(dc_to_vm_folder)
        .select(vapp_to_vm)
        .select(vapp_to_vapp)
        .into()]
}

/// Walk the full inventory from the root folder: folders, datacenters,
/// compute resources, resource pools, hosts and virtual machines.
pub fn inventory_traversal_spec() -> Vec<SelectionSpec> {
    vec![
        TraversalSpec::new("visitFolders", "Folder", "childEntity")
            .select_refs(&[
                "visitFolders",
                "dcToHf",
                "dcToVmf",
                "crToH",
                "crToRp",
                "dcToDs",
                "hToVm",
                "rpToVm",
            ])
            .into(),
        TraversalSpec::new("dcToVmf", "Datacenter", "vmFolder")
            .select_refs(&["visitFolders"])
            .into(),
        TraversalSpec::new("dcToDs", "Datacenter", "datastore")
            .select_refs(&["visitFolders"])
            .into(),
        TraversalSpec::new("dcToHf", "Datacenter", "hostFolder")
            .select_refs(&["visitFolders"])
            .into(),
        TraversalSpec::new("crToH", "ComputeResource", "host").into(),
        TraversalSpec::new("crToRp", "ComputeResource", "resourcePool")
            .select_refs(&["rpToRp", "rpToVm"])
            .into(),
        TraversalSpec::new("rpToRp", "ResourcePool", "resourcePool")
            .select_refs(&["rpToRp", "rpToVm"])
            .into(),
        TraversalSpec::new("hToVm", "HostSystem", "vm")
            .select_refs(&["visitFolders"])
            .into(),
        TraversalSpec::new("rpToVm", "ResourcePool", "vm").into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::writer::render;

    fn root() -> ManagedObjectReference {
        ManagedObjectReference::new("Folder", "group-d1")
    }

    #[test]
    fn canned_graphs_are_closed() {
        ObjectSpec::new(root())
            .skip(true)
            .select_set(vm_traversal_spec())
            .validate()
            .unwrap();
        ObjectSpec::new(root())
            .select_set(inventory_traversal_spec())
            .validate()
            .unwrap();
        ObjectSpec::new(root())
            .select_set(container_view_traversal_spec())
            .validate()
            .unwrap();
    }

    #[test]
    fn unresolved_reference_is_reported() {
        let spec = PropertyFilterSpec::new(
            vec![PropertySpec::new("HostSystem", &["name"])],
            vec![ObjectSpec::new(root()).select_set(vec![
                TraversalSpec::new("visitFolders", "Folder", "childEntity")
                    .select_refs(&["visitFolders", "dcToHf"])
                    .into(),
            ])],
        );
        match spec.validate() {
            Err(Error::UnresolvedSelection(name)) => assert_eq!(name, "dcToHf"),
            r => panic!("expected an unresolved selection, got {:?}", r),
        }
    }

    #[test]
    fn writes_elements_in_schema_order() {
        let spec = PropertyFilterSpec::new(
            vec![PropertySpec::new("VirtualMachine", &["name", "runtime"])],
            vec![ObjectSpec::new(root())
                .skip(true)
                .select_set(vec![TraversalSpec::new(
                    "vAppToVM",
                    "VirtualApp",
                    "vm",
                )
                .select_refs(&["vAppToVM"])
                .into()])],
        );
        let body = render(|xml| {
            xml.write(
                XmlEvent::start_element("ns1:Root").ns("ns1", "urn:vim25"),
            )?;
            spec.write(xml, "ns1:specSet")?;
            xml.write(XmlEvent::end_element())
        })
        .unwrap();
        let parts = [
            "<ns1:specSet><ns1:propSet><ns1:type>VirtualMachine</ns1:type>",
            "<ns1:all>false</ns1:all><ns1:pathSet>name</ns1:pathSet>",
            "<ns1:pathSet>runtime</ns1:pathSet></ns1:propSet>",
            r#"<ns1:objectSet><ns1:obj type="Folder">group-d1</ns1:obj>"#,
            "<ns1:skip>true</ns1:skip>",
            r#"<ns1:selectSet xsi:type="ns1:TraversalSpec">"#,
            "<ns1:name>vAppToVM</ns1:name><ns1:type>VirtualApp</ns1:type>",
            "<ns1:path>vm</ns1:path><ns1:skip>false</ns1:skip>",
            "<ns1:selectSet><ns1:name>vAppToVM</ns1:name></ns1:selectSet>",
            "</ns1:selectSet></ns1:objectSet></ns1:specSet>",
        ];
        let mut pos = 0;
        for part in parts {
            match body[pos..].find(part) {
                Some(i) => pos += i + part.len(),
                None => panic!("missing {} after {} in {}", part, pos, body),
            }
        }
    }
}

/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use xml::{attribute::OwnedAttribute, name::OwnedName};

use crate::codec::{
    bool_text, elements, parse_text, text, FromElement, ParseError,
    ParseResult, XmlInput,
};

use super::{value::property_value, ManagedObjectReference, Value};

/// Result of `WaitForUpdatesEx`. The version is passed back on the next
/// call to receive only later changes.
#[derive(Serialize, Deserialize, PartialEq, Clone, Default, Debug)]
pub struct UpdateSet {
    pub version: String,
    pub filter_set: Vec<PropertyFilterUpdate>,
    pub truncated: bool,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct PropertyFilterUpdate {
    pub filter: ManagedObjectReference,
    pub object_set: Vec<ObjectUpdate>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct ObjectUpdate {
    pub kind: ObjectUpdateKind,
    pub obj: ManagedObjectReference,
    pub change_set: Vec<PropertyChange>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ObjectUpdateKind {
    Modify,
    Enter,
    Leave,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct PropertyChange {
    pub name: String,
    pub op: PropertyChangeOp,
    pub val: Option<Value>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "lowercase")]
pub enum PropertyChangeOp {
    Add,
    Remove,
    Assign,
    IndirectRemove,
}

impl FromStr for ObjectUpdateKind {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "modify" => Ok(Self::Modify),
            "enter" => Ok(Self::Enter),
            "leave" => Ok(Self::Leave),
            _ => Err(ParseError::InvalidValue(
                "ObjectUpdateKind",
                s.to_string(),
            )),
        }
    }
}

impl FromStr for PropertyChangeOp {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "assign" => Ok(Self::Assign),
            "indirectRemove" => Ok(Self::IndirectRemove),
            _ => Err(ParseError::InvalidValue(
                "PropertyChangeOp",
                s.to_string(),
            )),
        }
    }
}

impl UpdateSet {
    /// All object updates for `obj`, across filters.
    pub fn updates_for<'a>(
        &'a self,
        obj: &'a ManagedObjectReference,
    ) -> impl Iterator<Item = &'a ObjectUpdate> + 'a {
        self.filter_set
            .iter()
            .flat_map(|filter| filter.object_set.iter())
            .filter(move |update| &update.obj == obj)
    }
}

impl FromElement for UpdateSet {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut update = UpdateSet::default();
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "version" => {
                    let (version, xml) = text(xml, name)?;
                    update.version = version;
                    Ok(Some(xml))
                }
                "filterSet" => {
                    let (filter, xml) =
                        PropertyFilterUpdate::from_element(xml, name, attrs)?;
                    update.filter_set.push(filter);
                    Ok(Some(xml))
                }
                "truncated" => {
                    let (truncated, xml) = bool_text(xml, name)?;
                    update.truncated = truncated;
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((update, xml))
    }
}

impl FromElement for PropertyFilterUpdate {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut filter = None;
        let mut object_set = Vec::new();
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "filter" => {
                    let (mor, xml) =
                        ManagedObjectReference::from_element(xml, name, attrs)?;
                    filter = Some(mor);
                    Ok(Some(xml))
                }
                "objectSet" => {
                    let (obj, xml) =
                        ObjectUpdate::from_element(xml, name, attrs)?;
                    object_set.push(obj);
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((
            PropertyFilterUpdate {
                filter: filter
                    .ok_or(ParseError::Syntax("missing filterSet filter"))?,
                object_set,
            },
            xml,
        ))
    }
}

impl FromElement for ObjectUpdate {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut kind: Option<ObjectUpdateKind> = None;
        let mut obj = None;
        let mut change_set = Vec::new();
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "kind" => {
                    let (k, xml) = parse_text(xml, name, "ObjectUpdateKind")?;
                    kind = Some(k);
                    Ok(Some(xml))
                }
                "obj" => {
                    let (mor, xml) =
                        ManagedObjectReference::from_element(xml, name, attrs)?;
                    obj = Some(mor);
                    Ok(Some(xml))
                }
                "changeSet" => {
                    let (change, xml) =
                        PropertyChange::from_element(xml, name, attrs)?;
                    change_set.push(change);
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((
            ObjectUpdate {
                kind: kind.ok_or(ParseError::Syntax("missing objectSet kind"))?,
                obj: obj.ok_or(ParseError::Syntax("missing objectSet obj"))?,
                change_set,
            },
            xml,
        ))
    }
}

impl FromElement for PropertyChange {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut prop_name = None;
        let mut op: Option<PropertyChangeOp> = None;
        let mut val = None;
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "name" => {
                    let (s, xml) = text(xml, name)?;
                    prop_name = Some(s);
                    Ok(Some(xml))
                }
                "op" => {
                    let (o, xml) = parse_text(xml, name, "PropertyChangeOp")?;
                    op = Some(o);
                    Ok(Some(xml))
                }
                "val" => {
                    let (v, xml) = property_value(xml, name, attrs)?;
                    val = Some(v);
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((
            PropertyChange {
                name: prop_name
                    .ok_or(ParseError::Syntax("missing changeSet name"))?,
                op: op.ok_or(ParseError::Syntax("missing changeSet op"))?,
                val,
            },
            xml,
        ))
    }
}

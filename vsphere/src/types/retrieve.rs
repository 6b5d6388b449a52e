/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::{Deserialize, Serialize};
use xml::{attribute::OwnedAttribute, name::OwnedName};

use crate::codec::{
    elements, text, FromElement, ParseError, ParseResult, XmlInput,
};

use super::{
    value::property_value, LocalizedMethodFault, ManagedObjectReference, Value,
};

/// One page of a `RetrievePropertiesEx` result. A token means more
/// pages are available through `ContinueRetrievePropertiesEx`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Default, Debug)]
pub struct RetrieveResult {
    pub token: Option<String>,
    pub objects: Vec<ObjectContent>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct ObjectContent {
    pub obj: ManagedObjectReference,
    pub prop_set: Vec<DynamicProperty>,
    pub missing_set: Vec<MissingProperty>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct DynamicProperty {
    pub name: String,
    pub val: Option<Value>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct MissingProperty {
    pub path: String,
    pub fault: LocalizedMethodFault,
}

impl ObjectContent {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.prop_set
            .iter()
            .find(|prop| prop.name == name)
            .and_then(|prop| prop.val.as_ref())
    }
}

impl FromElement for RetrieveResult {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut result = RetrieveResult::default();
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "token" => {
                    let (token, xml) = text(xml, name)?;
                    result.token = Some(token);
                    Ok(Some(xml))
                }
                "objects" => {
                    let (obj, xml) =
                        ObjectContent::from_element(xml, name, attrs)?;
                    result.objects.push(obj);
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((result, xml))
    }
}

impl FromElement for ObjectContent {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut obj = None;
        let mut prop_set = Vec::new();
        let mut missing_set = Vec::new();
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "obj" => {
                    let (mor, xml) =
                        ManagedObjectReference::from_element(xml, name, attrs)?;
                    obj = Some(mor);
                    Ok(Some(xml))
                }
                "propSet" => {
                    let (prop, xml) =
                        DynamicProperty::from_element(xml, name, attrs)?;
                    prop_set.push(prop);
                    Ok(Some(xml))
                }
                "missingSet" => {
                    let (missing, xml) =
                        MissingProperty::from_element(xml, name, attrs)?;
                    missing_set.push(missing);
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((
            ObjectContent {
                obj: obj
                    .ok_or(ParseError::Syntax("missing ObjectContent obj"))?,
                prop_set,
                missing_set,
            },
            xml,
        ))
    }
}

impl FromElement for DynamicProperty {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut prop_name = None;
        let mut val = None;
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "name" => {
                    let (s, xml) = text(xml, name)?;
                    prop_name = Some(s);
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
            DynamicProperty {
                name: prop_name
                    .ok_or(ParseError::Syntax("missing DynamicProperty name"))?,
                val,
            },
            xml,
        ))
    }
}

impl FromElement for MissingProperty {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut path = None;
        let mut fault = LocalizedMethodFault::default();
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "path" => {
                    let (s, xml) = text(xml, name)?;
                    path = Some(s);
                    Ok(Some(xml))
                }
                "fault" => {
                    let (f, xml) =
                        LocalizedMethodFault::from_element(xml, name, attrs)?;
                    fault = f;
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((
            MissingProperty {
                path: path
                    .ok_or(ParseError::Syntax("missing MissingProperty path"))?,
                fault,
            },
            xml,
        ))
    }
}

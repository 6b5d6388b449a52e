/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::{hash_map::Entry, HashMap};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use xml::{attribute::OwnedAttribute, name::OwnedName, reader::XmlEvent};

use crate::codec::{
    bool_text, elements, ignore_spaces, ignore_until_end_tag, next,
    parse_text, text, xsi_type, FromElement, ParseError, ParseResult,
    XmlInput,
};

use super::{LocalizedMethodFault, ManagedObjectReference, TaskInfo};

/// A property value as returned in a `propSet` or `changeSet`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    ArrayOfString(Vec<String>),
    ArrayOfManagedObjectReference(Vec<ManagedObjectReference>),
    ManagedObjectReference(ManagedObjectReference),
    TaskInfo(Box<TaskInfo>),
    LocalizedMethodFault(LocalizedMethodFault),
    Generic(GenericValue),
    Unimplemented(String),
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub enum GenericValue {
    Object(GenericObject),
    Array(GenericArray),
    String(String),
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct GenericObject(pub HashMap<String, GenericValue>);

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct GenericArray(pub Vec<GenericValue>);

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Generic(GenericValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_mor(&self) -> Option<&ManagedObjectReference> {
        match self {
            Self::ManagedObjectReference(mor) => Some(mor),
            _ => None,
        }
    }

    pub fn as_mors(&self) -> Option<&[ManagedObjectReference]> {
        match self {
            Self::ArrayOfManagedObjectReference(mors) => Some(mors),
            _ => None,
        }
    }

    pub fn as_task_info(&self) -> Option<&TaskInfo> {
        match self {
            Self::TaskInfo(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_fault(&self) -> Option<&LocalizedMethodFault> {
        match self {
            Self::LocalizedMethodFault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl GenericValue {
    pub fn get(&self, field: &str) -> Option<&GenericValue> {
        match self {
            Self::Object(GenericObject(fields)) => fields.get(field),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromElement for Value {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let r#type =
            xsi_type(attrs).ok_or(ParseError::Syntax("missing value type"))?;
        match r#type {
            "xsd:string" | "xsd:anyURI" => {
                let (s, xml) = text(xml, tag)?;
                Ok((Value::String(s), xml))
            }
            "xsd:int" | "xsd:short" | "xsd:long" | "xsd:byte" => {
                let (i, xml) = parse_text(xml, tag, "integer")?;
                Ok((Value::Integer(i), xml))
            }
            "xsd:float" | "xsd:double" => {
                let (f, xml) = parse_text(xml, tag, "float")?;
                Ok((Value::Float(f), xml))
            }
            "xsd:boolean" => {
                let (b, xml) = bool_text(xml, tag)?;
                Ok((Value::Boolean(b), xml))
            }
            "xsd:dateTime" => {
                let (s, xml) = text(xml, tag)?;
                let dt = DateTime::parse_from_rfc3339(s.trim())
                    .map_err(|_| ParseError::InvalidValue("dateTime", s))?;
                Ok((Value::DateTime(dt.into()), xml))
            }
            "ArrayOfString" => {
                let mut vals = Vec::new();
                let (_, xml) = elements(xml, tag, |name, _, xml| {
                    match name.local_name.as_str() {
                        "string" => {
                            let (s, xml) = text(xml, name)?;
                            vals.push(s);
                            Ok(Some(xml))
                        }
                        _ => Ok(None),
                    }
                })?;
                Ok((Value::ArrayOfString(vals), xml))
            }
            "ArrayOfManagedObjectReference" => {
                let mut refs = Vec::new();
                let (_, xml) = elements(xml, tag, |name, attrs, xml| {
                    match name.local_name.as_str() {
                        "ManagedObjectReference" => {
                            let (mor, xml) =
                                ManagedObjectReference::from_element(
                                    xml, name, attrs,
                                )?;
                            refs.push(mor);
                            Ok(Some(xml))
                        }
                        _ => Ok(None),
                    }
                })?;
                Ok((Value::ArrayOfManagedObjectReference(refs), xml))
            }
            "ManagedObjectReference" => {
                let (mor, xml) =
                    ManagedObjectReference::from_element(xml, tag, attrs)?;
                Ok((Value::ManagedObjectReference(mor), xml))
            }
            "TaskInfo" => {
                let (info, xml) = TaskInfo::from_element(xml, tag, attrs)?;
                Ok((Value::TaskInfo(Box::new(info)), xml))
            }
            "LocalizedMethodFault" => {
                let (fault, xml) =
                    LocalizedMethodFault::from_element(xml, tag, attrs)?;
                Ok((Value::LocalizedMethodFault(fault), xml))
            }
            _ => match GenericValue::from_element(xml, tag, attrs) {
                Ok((val, xml)) => Ok((Value::Generic(val), xml)),
                Err(_) => {
                    let (_, xml) =
                        ignore_until_end_tag(xml, tag).map_err(|_| {
                            ParseError::Syntax("missing value end tag")
                        })?;
                    debug!("unimplemented type: {}", r#type);
                    Ok((Value::Unimplemented(r#type.to_string()), xml))
                }
            },
        }
    }
}

/// Parse a `val` element. Values without an xsi:type are kept generic.
pub fn property_value<'a>(
    xml: XmlInput<'a>,
    tag: &'a OwnedName,
    attrs: &'a [OwnedAttribute],
) -> ParseResult<'a, Value> {
    match xsi_type(attrs) {
        Some(_) => Value::from_element(xml, tag, attrs),
        None => {
            let (val, xml) = GenericValue::from_element(xml, tag, attrs)?;
            Ok((Value::Generic(val), xml))
        }
    }
}

impl FromElement for GenericValue {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let (_, ixml) = ignore_spaces(xml)?;
        match next(ixml)? {
            // Child elements: an object, repeated names become arrays.
            (XmlEvent::StartElement { .. }, _) => {
                let mut vals = HashMap::new();
                let (_, xml) = elements(ixml, tag, |name, attrs, xml| {
                    let (val, xml) =
                        GenericValue::from_element(xml, name, attrs)?;
                    match vals.entry(name.local_name.to_string()) {
                        Entry::Occupied(mut ent) => {
                            if let GenericValue::Array(vals) = ent.get_mut() {
                                vals.0.push(val);
                            } else {
                                ent.insert(GenericValue::Array(GenericArray(
                                    vec![ent.get().clone(), val],
                                )));
                            }
                        }
                        Entry::Vacant(ent) => {
                            ent.insert(val);
                        }
                    }
                    Ok(Some(xml))
                })?;
                Ok((GenericValue::Object(GenericObject(vals)), xml))
            }
            // Text or empty content: keep as string.
            _ => {
                let (s, xml) = text(xml, tag)?;
                Ok((GenericValue::String(s), xml))
            }
        }
    }
}

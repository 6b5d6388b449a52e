/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;

use serde::{Deserialize, Serialize};
use xml::{attribute::OwnedAttribute, name::OwnedName};

use crate::codec::{
    attribute, ignore_spaces, start_tag, text, FromElement, FromXml,
    ParseError, ParseResult, XmlInput, VIM25_NS,
};

/// Reference to a managed object on the server, e.g. `HostSystem:host-10`.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Debug)]
pub struct ManagedObjectReference {
    pub r#type: String,
    pub value: String,
}

impl ManagedObjectReference {
    pub fn new<T: Into<String>, V: Into<String>>(r#type: T, value: V) -> Self {
        Self {
            r#type: r#type.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ManagedObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.r#type, self.value)
    }
}

impl FromElement for ManagedObjectReference {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let r#type = attribute(attrs, "type")
            .ok_or(ParseError::Syntax("missing ManagedObjectReference type"))?;
        let (value, xml) = text(xml, tag)?;
        Ok((
            ManagedObjectReference {
                r#type: r#type.to_string(),
                value: value.trim().to_string(),
            },
            xml,
        ))
    }
}

/// An element of an `ArrayOfManagedObjectReference`.
impl FromXml for ManagedObjectReference {
    fn from_xml(xml: XmlInput) -> ParseResult<Self> {
        let (_, xml) = ignore_spaces(xml)?;
        let ((tag, attrs), xml) =
            start_tag(xml, VIM25_NS, "ManagedObjectReference")?;
        Self::from_element(xml, tag, attrs)
    }
}

/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use log::debug;
use serde::de::DeserializeOwned;
use xml::{attribute::OwnedAttribute, name::OwnedName, reader::XmlEvent};

use crate::codec::{
    any_start_tag, elements, end_document, end_tag, ignore_spaces,
    ignore_until_end_tag, next, read_events, start_document, start_tag, text,
    xsi_type, FromElement, FromXml, ParseError, ParseResult, XmlInput,
    SOAP_ENV_NS,
};
use crate::error::{Error, Result};
use crate::soap::SoapFault;

#[derive(Debug)]
pub struct Document<T> {
    pub content: T,
}

#[derive(Debug)]
pub struct Envelope<T> {
    pub body: Body<T>,
}

#[derive(Debug)]
pub enum Body<T> {
    Response(T),
    Fault(SoapFault),
}

/// The `returnval` of a method response. Methods with an optional
/// result leave it out.
#[derive(Debug)]
pub struct Returnval<T>(pub Option<T>);

/// A method response without result.
#[derive(Debug)]
pub struct Void;

impl<T: FromXml> FromXml for Document<T> {
    fn from_xml(xml: XmlInput) -> ParseResult<Self> {
        let (_, xml) = ignore_spaces(xml)?;
        let (_, xml) = start_document(xml)?;
        let (content, xml) = T::from_xml(xml)?;
        let (_, xml) = ignore_spaces(xml)?;
        let (_, xml) = end_document(xml)?;
        Ok((Document { content }, xml))
    }
}

impl<T: FromXml> FromXml for Envelope<T> {
    fn from_xml(xml: XmlInput) -> ParseResult<Self> {
        let (_, xml) = ignore_spaces(xml)?;
        let ((envelope_tag, _attrs), xml) =
            start_tag(xml, SOAP_ENV_NS, "Envelope")?;
        let (_, mut xml) = ignore_spaces(xml)?;
        let header = start_tag(xml, SOAP_ENV_NS, "Header");
        if let Ok(((header_tag, _), rest)) = header {
            let (_, rest) = ignore_until_end_tag(rest, header_tag)?;
            let (_, rest) = ignore_spaces(rest)?;
            xml = rest;
        }
        let ((body_tag, _attrs), xml) = start_tag(xml, SOAP_ENV_NS, "Body")?;
        let (_, xml) = ignore_spaces(xml)?;
        let (body, xml) = match start_tag(xml, SOAP_ENV_NS, "Fault") {
            Ok(((fault_tag, attrs), xml)) => {
                let (fault, xml) =
                    SoapFault::from_element(xml, fault_tag, attrs)?;
                (Body::Fault(fault), xml)
            }
            Err(_) => {
                let (response, xml) = T::from_xml(xml)?;
                (Body::Response(response), xml)
            }
        };
        let (_, xml) = ignore_spaces(xml)?;
        let (_, xml) = end_tag(xml, body_tag)?;
        let (_, xml) = ignore_spaces(xml)?;
        let (_, xml) = end_tag(xml, envelope_tag)?;
        Ok((Envelope { body }, xml))
    }
}

impl FromElement for SoapFault {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        _attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self> {
        let mut code = String::new();
        let mut message = String::new();
        let mut fault_type = None;
        let (_, xml) = elements(xml, tag, |name, _, xml| {
            match name.local_name.as_str() {
                "faultcode" => {
                    let (s, xml) = text(xml, name)?;
                    code = s.trim().to_string();
                    Ok(Some(xml))
                }
                "faultstring" => {
                    let (s, xml) = text(xml, name)?;
                    message = s.trim().to_string();
                    Ok(Some(xml))
                }
                "detail" => {
                    let (_, xml) = elements(xml, name, |name, attrs, xml| {
                        if fault_type.is_none() {
                            fault_type = Some(match xsi_type(attrs) {
                                Some(typ) => typ.to_string(),
                                None => name
                                    .local_name
                                    .strip_suffix("Fault")
                                    .unwrap_or(&name.local_name)
                                    .to_string(),
                            });
                        }
                        let (_, xml) = ignore_until_end_tag(xml, name)?;
                        Ok(Some(xml))
                    })?;
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((
            SoapFault {
                code,
                message,
                fault_type,
            },
            xml,
        ))
    }
}

impl<T: FromElement> FromXml for Returnval<T> {
    fn from_xml(xml: XmlInput) -> ParseResult<Self> {
        let (_, xml) = ignore_spaces(xml)?;
        let ((tag, _attrs), xml) = any_start_tag(xml)?;
        let mut val = None;
        let (_, xml) = elements(xml, tag, |name, attrs, xml| {
            match name.local_name.as_str() {
                "returnval" if val.is_none() => {
                    let (v, xml) = T::from_element(xml, name, attrs)?;
                    val = Some(v);
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })?;
        Ok((Returnval(val), xml))
    }
}

impl FromXml for Void {
    fn from_xml(xml: XmlInput) -> ParseResult<Self> {
        let (_, xml) = ignore_spaces(xml)?;
        match next(xml)? {
            (XmlEvent::StartElement { name, .. }, xml) => {
                let (_, xml) = ignore_until_end_tag(xml, name)?;
                Ok((Void, xml))
            }
            (event, _) => Err(ParseError::Unexpected(event.clone())),
        }
    }
}

/// Parse a response document, turning a soap fault into `Error::Fault`.
pub(crate) fn parse<T: FromXml>(data: &str) -> Result<T> {
    let xml = read_events(xml::reader::EventReader::from_str(data))
        .map_err(Error::ParseResponseXml)?;
    match Document::<Envelope<T>>::from_xml(&xml) {
        Ok((doc, _rest)) => match doc.content.body {
            Body::Response(response) => Ok(response),
            Body::Fault(fault) => {
                debug!("server fault: {}", fault);
                Err(Error::Fault(fault))
            }
        },
        Err(e) => {
            debug!("failed to parse xml: {}", data);
            Err(Error::ParseResponse(e))
        }
    }
}

/// Deserialize a response with serde-xml-rs, after checking for faults.
pub(crate) fn deserialize<T: DeserializeOwned>(data: &str) -> Result<T> {
    parse::<Void>(data)?;
    Ok(serde_xml_rs::from_str(data)?)
}

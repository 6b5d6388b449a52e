/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Small parser combinators over a pre-read slice of xml-rs events, and
//! the helpers used to emit request bodies.

pub mod error;
pub mod writer;

pub use error::{ParseError, ParseResult};

use xml::{attribute::OwnedAttribute, name::OwnedName, reader::XmlEvent};

pub const VIM25_NS: &str = "urn:vim25";
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub type XmlInput<'a> = &'a [XmlEvent];

pub trait FromXml: Sized {
    fn from_xml(xml: XmlInput) -> ParseResult<Self>;
}

/// Parse the content of an element whose start tag was already consumed,
/// up to and including its end tag.
pub trait FromElement: Sized {
    fn from_element<'a>(
        xml: XmlInput<'a>,
        tag: &'a OwnedName,
        attrs: &'a [OwnedAttribute],
    ) -> ParseResult<'a, Self>;
}

pub fn read_events<R: std::io::Read>(
    mut xml: xml::reader::EventReader<R>,
) -> xml::reader::Result<Vec<XmlEvent>> {
    let mut elems = Vec::new();
    loop {
        let event = xml.next()?;
        match event {
            XmlEvent::EndDocument => {
                elems.push(event);
                break;
            }
            _ => {
                elems.push(event);
            }
        }
    }
    Ok(elems)
}

/* Parsers. */

pub fn start_document(xml: XmlInput) -> ParseResult<()> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::StartDocument { .. } => Ok(((), xml)),
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn end_document(xml: XmlInput) -> ParseResult<()> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::EndDocument => Ok(((), xml)),
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn start_tag<'a>(
    xml: XmlInput<'a>,
    ns: &str,
    local: &str,
) -> ParseResult<'a, (&'a OwnedName, &'a [OwnedAttribute])> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::StartElement {
            name, attributes, ..
        } => match name.namespace.as_deref() == Some(ns)
            && name.local_name == local
        {
            true => Ok(((name, attributes.as_slice()), xml)),
            false => Err(ParseError::UnexpectedTag(name.to_string())),
        },
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn any_start_tag(
    xml: XmlInput<'_>,
) -> ParseResult<'_, (&OwnedName, &[OwnedAttribute])> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::StartElement {
            name, attributes, ..
        } => Ok(((name, attributes.as_slice()), xml)),
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn end_tag<'a>(
    xml: XmlInput<'a>,
    start_tag: &OwnedName,
) -> ParseResult<'a, ()> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::EndElement { name } => match name == start_tag {
            true => Ok(((), xml)),
            false => Err(ParseError::UnexpectedEndTag(name.to_string())),
        },
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

pub fn characters(xml: XmlInput<'_>) -> ParseResult<'_, &str> {
    let (event, xml) = next(xml)?;
    match event {
        XmlEvent::Characters(s) => Ok((s.as_str(), xml)),
        _ => Err(ParseError::Unexpected(event.clone())),
    }
}

/// Text content of a leaf element, up to and including its end tag.
/// An empty element yields an empty string.
pub fn text<'a>(
    mut xml: XmlInput<'a>,
    tag: &OwnedName,
) -> ParseResult<'a, String> {
    let mut content = String::new();
    loop {
        let (event, next) = next(xml)?;
        xml = next;
        match event {
            XmlEvent::Characters(s)
            | XmlEvent::Whitespace(s)
            | XmlEvent::CData(s) => content.push_str(s),
            XmlEvent::Comment(_) | XmlEvent::ProcessingInstruction { .. } => {
            }
            XmlEvent::EndElement { name } => match name == tag {
                true => return Ok((content, xml)),
                false => {
                    return Err(ParseError::UnexpectedEndTag(name.to_string()))
                }
            },
            _ => return Err(ParseError::Unexpected(event.clone())),
        }
    }
}

/// Text content parsed with `FromStr`, ignoring surrounding whitespace.
pub fn parse_text<'a, T: std::str::FromStr>(
    xml: XmlInput<'a>,
    tag: &OwnedName,
    what: &'static str,
) -> ParseResult<'a, T> {
    let (s, xml) = text(xml, tag)?;
    match s.trim().parse() {
        Ok(v) => Ok((v, xml)),
        Err(_) => Err(ParseError::InvalidValue(what, s)),
    }
}

pub fn bool_text<'a>(
    xml: XmlInput<'a>,
    tag: &OwnedName,
) -> ParseResult<'a, bool> {
    let (s, xml) = text(xml, tag)?;
    match s.trim() {
        "true" | "1" => Ok((true, xml)),
        "false" | "0" => Ok((false, xml)),
        _ => Err(ParseError::InvalidValue("boolean", s)),
    }
}

/// Walk the child elements of `tag` until its end tag. The callback gets
/// each child's name, attributes and the input following its start tag.
/// It returns the input after the child's end tag, or `None` to skip
/// the child.
pub fn elements<'a, F>(
    mut xml: XmlInput<'a>,
    tag: &OwnedName,
    mut child: F,
) -> ParseResult<'a, ()>
where
    F: FnMut(
        &'a OwnedName,
        &'a [OwnedAttribute],
        XmlInput<'a>,
    ) -> Result<Option<XmlInput<'a>>, ParseError>,
{
    loop {
        let (_, ixml) = ignore_spaces(xml)?;
        let (event, rest) = next(ixml)?;
        match event {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                xml = match child(name, attributes.as_slice(), rest)? {
                    Some(rest) => rest,
                    None => ignore_until_end_tag(rest, name)?.1,
                };
            }
            XmlEvent::EndElement { name } => {
                return match name == tag {
                    true => Ok(((), rest)),
                    false => {
                        Err(ParseError::UnexpectedEndTag(name.to_string()))
                    }
                }
            }
            _ => return Err(ParseError::Unexpected(event.clone())),
        }
    }
}

pub fn ignore_until_end_tag<'a>(
    mut xml: XmlInput<'a>,
    tag: &OwnedName,
) -> ParseResult<'a, ()> {
    loop {
        let (event, next) = next(xml)?;
        xml = next;
        match event {
            XmlEvent::EndElement { name } => match name == tag {
                true => return Ok(((), xml)),
                false => {
                    return Err(ParseError::UnexpectedEndTag(name.to_string()))
                }
            },
            XmlEvent::EndDocument => return Err(ParseError::Eof),
            XmlEvent::StartElement { name, .. } => {
                let (_, next) = ignore_until_end_tag(next, name)?;
                xml = next;
            }
            _ => {}
        }
    }
}

pub fn ignore_spaces(mut xml: XmlInput) -> ParseResult<()> {
    while let Ok((event, next)) = next(xml) {
        match event {
            XmlEvent::ProcessingInstruction { .. }
            | XmlEvent::Comment(_)
            | XmlEvent::Whitespace(_) => {}
            _ => break,
        }
        xml = next;
    }
    Ok(((), xml))
}

pub fn next(xml: XmlInput) -> ParseResult<&XmlEvent> {
    match xml.first() {
        Some(event) => Ok((event, &xml[1..])),
        None => Err(ParseError::Eof),
    }
}

/* Attributes. */

/// Look up an unqualified attribute, like the `type` of a managed object
/// reference.
pub fn attribute<'a>(
    attrs: &'a [OwnedAttribute],
    local: &str,
) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| {
            attr.name.namespace.is_none() && attr.name.local_name == local
        })
        .map(|attr| attr.value.as_str())
}

pub fn xsi_type(attrs: &[OwnedAttribute]) -> Option<&str> {
    attrs
        .iter()
        .find(|attr| {
            attr.name.namespace.as_deref() == Some(XSI_NS)
                && attr.name.local_name == "type"
        })
        .map(|attr| attr.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(data: &str) -> Vec<XmlEvent> {
        read_events(xml::reader::EventReader::from_str(data)).unwrap()
    }

    #[test]
    fn walk_children_and_skip_unknown() {
        let xml = events(
            r#"<a xmlns="urn:vim25"><b>one</b><skip><x>1</x></skip><c/></a>"#,
        );
        let (_, rest) = start_document(&xml).unwrap();
        let ((tag, _), rest) = start_tag(rest, VIM25_NS, "a").unwrap();
        let mut b = None;
        let mut c = None;
        let (_, rest) = elements(rest, tag, |name, _, xml| {
            match name.local_name.as_str() {
                "b" => {
                    let (s, xml) = text(xml, name)?;
                    b = Some(s);
                    Ok(Some(xml))
                }
                "c" => {
                    let (s, xml) = text(xml, name)?;
                    c = Some(s);
                    Ok(Some(xml))
                }
                _ => Ok(None),
            }
        })
        .unwrap();
        end_document(rest).unwrap();
        assert_eq!(b.as_deref(), Some("one"));
        assert_eq!(c.as_deref(), Some(""));
    }

    #[test]
    fn text_rejects_nested_elements() {
        let xml = events(r#"<a><b>x</b></a>"#);
        let (_, rest) = start_document(&xml).unwrap();
        let ((tag, _), rest) = any_start_tag(rest).unwrap();
        assert!(text(rest, tag).is_err());
    }

    #[test]
    fn unqualified_and_xsi_attributes() {
        let xml = events(
            r#"<val xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" type="Folder" xsi:type="ManagedObjectReference">group-d1</val>"#,
        );
        let (_, rest) = start_document(&xml).unwrap();
        let ((_, attrs), _) = any_start_tag(rest).unwrap();
        assert_eq!(attribute(attrs, "type"), Some("Folder"));
        assert_eq!(xsi_type(attrs), Some("ManagedObjectReference"));
    }
}

/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::io::Write;

use xml::{
    writer::{EventWriter, XmlEvent},
    EmitterConfig,
};

use crate::types::ManagedObjectReference;

/// Render a request body with the event writer. The document declaration
/// is left out since the body is embedded in the soap envelope.
pub fn render<F>(body: F) -> xml::writer::Result<String>
where
    F: FnOnce(&mut EventWriter<Vec<u8>>) -> xml::writer::Result<()>,
{
    let mut xml = EventWriter::new_with_config(
        Vec::new(),
        EmitterConfig::new().write_document_declaration(false),
    );
    body(&mut xml)?;
    Ok(String::from_utf8_lossy(&xml.into_inner()).to_string())
}

/// Open `SOAP-ENV:Body` and the method element, with `_this` filled in.
pub fn start_method<W: Write>(
    xml: &mut EventWriter<W>,
    method: &str,
    this: &ManagedObjectReference,
) -> xml::writer::Result<()> {
    xml.write(
        XmlEvent::start_element("SOAP-ENV:Body").ns("ns1", "urn:vim25"),
    )?;
    let name = format!("ns1:{}", method);
    let typ = format!("ns1:{}RequestType", method);
    xml.write(
        XmlEvent::start_element(name.as_str()).attr("xsi:type", typ.as_str()),
    )?;
    mor(xml, "ns1:_this", this)
}

pub fn end_method<W: Write>(
    xml: &mut EventWriter<W>,
) -> xml::writer::Result<()> {
    xml.write(XmlEvent::end_element())?; // method
    xml.write(XmlEvent::end_element()) // SOAP-ENV:Body
}

pub fn mor<W: Write>(
    xml: &mut EventWriter<W>,
    name: &str,
    mor: &ManagedObjectReference,
) -> xml::writer::Result<()> {
    xml.write(
        XmlEvent::start_element(name).attr("type", mor.r#type.as_str()),
    )?;
    xml.write(XmlEvent::characters(&mor.value))?;
    xml.write(XmlEvent::end_element())
}

pub fn simple_elem<W: Write>(
    xml: &mut EventWriter<W>,
    name: &str,
    data: &str,
) -> xml::writer::Result<()> {
    xml.write(XmlEvent::start_element(name))?;
    xml.write(XmlEvent::characters(data))?;
    xml.write(XmlEvent::end_element())
}

pub fn bool_elem<W: Write>(
    xml: &mut EventWriter<W>,
    name: &str,
    data: bool,
) -> xml::writer::Result<()> {
    simple_elem(xml, name, if data { "true" } else { "false" })
}

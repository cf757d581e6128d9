use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::err::{CimException, Result};
use crate::internal_err;
use crate::model::{CimInstance, CimValue};

/// Which response wrapper a fault goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MethodKind {
    Intrinsic,
    Extrinsic,
}

impl MethodKind {
    fn response_tag(self) -> &'static str {
        match self {
            MethodKind::Intrinsic => "IMETHODRESPONSE",
            MethodKind::Extrinsic => "METHODRESPONSE",
        }
    }
}

struct ResponseWriter {
    writer: Writer<Vec<u8>>,
}

impl ResponseWriter {
    fn new() -> Self {
        ResponseWriter {
            writer: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| internal_err!("failed to write response XML: {}", e))
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for attr in attributes {
            start.push_attribute(*attr);
        }
        self.event(Event::Start(start))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for attr in attributes {
            start.push_attribute(*attr);
        }
        self.event(Event::Empty(start))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.event(Event::Text(BytesText::new(text)))
    }

    fn value(&mut self, text: &str) -> Result<()> {
        self.start("VALUE", &[])?;
        self.text(text)?;
        self.end("VALUE")
    }

    /// `<?xml?><CIM><MESSAGE><SIMPLERSP><{tag} NAME=..>`
    fn open_envelope(&mut self, message_id: &str, kind: MethodKind, method_name: &str) -> Result<()> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.start("CIM", &[("CIMVERSION", "2.0"), ("DTDVERSION", "2.0")])?;
        self.start("MESSAGE", &[("ID", message_id), ("PROTOCOLVERSION", "1.0")])?;
        self.start("SIMPLERSP", &[])?;
        self.start(kind.response_tag(), &[("NAME", method_name)])
    }

    fn close_envelope(mut self, kind: MethodKind) -> Result<Vec<u8>> {
        self.end(kind.response_tag())?;
        self.end("SIMPLERSP")?;
        self.end("MESSAGE")?;
        self.end("CIM")?;
        Ok(self.writer.into_inner())
    }

    fn instance(&mut self, instance: &CimInstance) -> Result<()> {
        self.start("INSTANCE", &[("CLASSNAME", instance.class_name.as_str())])?;
        for property in &instance.properties {
            let name = property.name.as_str();
            let ty = property.ty.as_xml_name();
            match &property.value {
                Some(CimValue::Scalar { value, .. }) => {
                    self.start("PROPERTY", &[("NAME", name), ("TYPE", ty)])?;
                    self.value(value)?;
                    self.end("PROPERTY")?;
                }
                Some(CimValue::Array { values, .. }) => {
                    self.start("PROPERTY.ARRAY", &[("NAME", name), ("TYPE", ty)])?;
                    self.start("VALUE.ARRAY", &[])?;
                    for value in values {
                        match value {
                            Some(value) => self.value(value)?,
                            None => self.empty("VALUE.NULL", &[])?,
                        }
                    }
                    self.end("VALUE.ARRAY")?;
                    self.end("PROPERTY.ARRAY")?;
                }
                // Error instances only carry scalar and array properties.
                _ => self.empty("PROPERTY", &[("NAME", name), ("TYPE", ty)])?,
            }
        }
        self.end("INSTANCE")
    }
}

/// A `SIMPLERSP` carrying `<ERROR CODE=.. DESCRIPTION=..>` for the given method.
pub(crate) fn format_error_response(
    message_id: &str,
    kind: MethodKind,
    method_name: &str,
    error: &CimException,
) -> Result<Vec<u8>> {
    let mut w = ResponseWriter::new();
    w.open_envelope(message_id, kind, method_name)?;

    let code = error.code.code().to_string();
    let attributes = [("CODE", code.as_str()), ("DESCRIPTION", error.message.as_str())];
    match &error.error_instance {
        Some(instance) => {
            w.start("ERROR", &attributes)?;
            w.instance(instance)?;
            w.end("ERROR")?;
        }
        None => w.empty("ERROR", &attributes)?,
    }

    w.close_envelope(kind)
}

/// A successful `METHODRESPONSE` holding only a `RETURNVALUE`.
pub(crate) fn format_return_value_response(
    message_id: &str,
    method_name: &str,
    ty: &str,
    value: &str,
) -> Result<Vec<u8>> {
    let mut w = ResponseWriter::new();
    w.open_envelope(message_id, MethodKind::Extrinsic, method_name)?;
    w.start("RETURNVALUE", &[("PARAMTYPE", ty)])?;
    w.value(value)?;
    w.end("RETURNVALUE")?;
    w.close_envelope(MethodKind::Extrinsic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CimName, CimProperty, CimType};
    use crate::status::CimStatusCode;

    #[test]
    fn test_error_response_shape() {
        let err = CimException::invalid_parameter("bad <thing>");
        let body = format_error_response("42", MethodKind::Intrinsic, "GetClass", &err).unwrap();
        let body = String::from_utf8(body).unwrap();

        assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(body.contains(r#"<MESSAGE ID="42" PROTOCOLVERSION="1.0">"#));
        assert!(body.contains(r#"<IMETHODRESPONSE NAME="GetClass">"#));
        assert!(body.contains(r#"<ERROR CODE="4" DESCRIPTION="bad &lt;thing&gt;"/>"#));
        assert!(body.ends_with("</IMETHODRESPONSE></SIMPLERSP></MESSAGE></CIM>"));
    }

    #[test]
    fn test_error_response_with_instance() {
        let mut instance = CimInstance::new(CimName::new("CIM_Error").unwrap());
        let mut property = CimProperty::new(CimName::new("ProbableCause").unwrap(), CimType::Uint16);
        property.value = Some(CimValue::Scalar {
            ty: CimType::Uint16,
            value: "3".to_owned(),
        });
        instance.properties.push(property);

        let err = CimException::new(CimStatusCode::Failed, "boom").with_error_instance(instance);
        let body = format_error_response("1", MethodKind::Extrinsic, "Reset", &err).unwrap();
        let body = String::from_utf8(body).unwrap();

        assert!(body.contains(r#"<METHODRESPONSE NAME="Reset">"#));
        assert!(body.contains(
            r#"<INSTANCE CLASSNAME="CIM_Error"><PROPERTY NAME="ProbableCause" TYPE="uint16"><VALUE>3</VALUE></PROPERTY></INSTANCE></ERROR>"#
        ));
    }

    #[test]
    fn test_return_value_response() {
        let body =
            format_return_value_response("7", "UpdateExpiredPassword", "uint32", "0").unwrap();
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains(r#"<RETURNVALUE PARAMTYPE="uint32"><VALUE>0</VALUE></RETURNVALUE>"#));
    }
}

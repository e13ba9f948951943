// SOAP 1.1 wire codec for the ReportService2010 endpoint.
//
// Requests are small enough to build with escaped string templates; responses
// are parsed with quick-xml event state machines. Binary report definitions
// travel as xsd:base64Binary.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::error::CatalogError;
use super::types::{CatalogItem, CreatedItem, DataSourceDefinition, Property, Warning};

/// Service namespace for every operation we issue.
pub const SERVICE_NS: &str =
    "http://schemas.microsoft.com/sqlserver/reporting/2010/03/01/ReportServer";

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAPAction header value for an operation name.
pub fn soap_action(operation: &str) -> String {
    format!("{}/{}", SERVICE_NS, operation)
}

fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn envelope(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="{env}">"#,
            "<soap:Body>{body}</soap:Body>",
            "</soap:Envelope>"
        ),
        env = SOAP_ENV_NS,
        body = body,
    )
}

fn properties_xml(properties: &[Property]) -> String {
    if properties.is_empty() {
        return String::new();
    }
    let mut out = String::from("<Properties>");
    for p in properties {
        out.push_str(&format!(
            "<Property><Name>{}</Name><Value>{}</Value></Property>",
            xml_escape(&p.name),
            xml_escape(&p.value)
        ));
    }
    out.push_str("</Properties>");
    out
}

/// `ListChildren(ItemPath, Recursive)`
pub fn list_children_request(item_path: &str, recursive: bool) -> String {
    envelope(&format!(
        r#"<ListChildren xmlns="{ns}"><ItemPath>{path}</ItemPath><Recursive>{rec}</Recursive></ListChildren>"#,
        ns = SERVICE_NS,
        path = xml_escape(item_path),
        rec = recursive,
    ))
}

/// `CreateFolder(Folder, Parent, Properties)`
pub fn create_folder_request(folder: &str, parent: &str, properties: &[Property]) -> String {
    envelope(&format!(
        r#"<CreateFolder xmlns="{ns}"><Folder>{folder}</Folder><Parent>{parent}</Parent>{props}</CreateFolder>"#,
        ns = SERVICE_NS,
        folder = xml_escape(folder),
        parent = xml_escape(parent),
        props = properties_xml(properties),
    ))
}

/// `CreateDataSource(DataSource, Parent, Overwrite, Definition, Properties)`
pub fn create_data_source_request(
    name: &str,
    parent: &str,
    overwrite: bool,
    definition: &DataSourceDefinition,
) -> String {
    let mut def = String::from("<Definition>");
    def.push_str(&format!(
        "<ConnectString>{}</ConnectString>",
        xml_escape(&definition.connect_string)
    ));
    def.push_str(&format!(
        "<CredentialRetrieval>{}</CredentialRetrieval>",
        definition.credential_retrieval.as_wire()
    ));
    def.push_str(&format!("<Enabled>{}</Enabled>", definition.enabled));
    def.push_str(&format!(
        "<Extension>{}</Extension>",
        xml_escape(&definition.extension)
    ));
    def.push_str(&format!(
        "<WindowsCredentials>{}</WindowsCredentials>",
        definition.windows_credentials
    ));
    if let Some(prompt) = &definition.prompt {
        def.push_str(&format!("<Prompt>{}</Prompt>", xml_escape(prompt)));
    }
    if let Some(impersonate) = definition.impersonate_user {
        def.push_str(&format!("<ImpersonateUser>{}</ImpersonateUser>", impersonate));
    }
    def.push_str("</Definition>");

    envelope(&format!(
        r#"<CreateDataSource xmlns="{ns}"><DataSource>{name}</DataSource><Parent>{parent}</Parent><Overwrite>{ow}</Overwrite>{def}</CreateDataSource>"#,
        ns = SERVICE_NS,
        name = xml_escape(name),
        parent = xml_escape(parent),
        ow = overwrite,
        def = def,
    ))
}

/// `CreateCatalogItem(ItemType, Name, Parent, Overwrite, Definition, Properties)`
pub fn create_catalog_item_request(
    item_type: &str,
    name: &str,
    parent: &str,
    overwrite: bool,
    definition: &[u8],
    properties: &[Property],
) -> String {
    envelope(&format!(
        r#"<CreateCatalogItem xmlns="{ns}"><ItemType>{ty}</ItemType><Name>{name}</Name><Parent>{parent}</Parent><Overwrite>{ow}</Overwrite><Definition>{def}</Definition>{props}</CreateCatalogItem>"#,
        ns = SERVICE_NS,
        ty = xml_escape(item_type),
        name = xml_escape(name),
        parent = xml_escape(parent),
        ow = overwrite,
        def = BASE64.encode(definition),
        props = properties_xml(properties),
    ))
}

// =============================================================================
// Response parsing
// =============================================================================

/// Local element name, with any namespace prefix stripped.
fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => s.to_string(),
    }
}

/// Parse a SOAP fault envelope, if the body holds one.
///
/// Returns `(fault_string, detail_inner_xml)`. The detail payload is passed
/// through verbatim so callers can log exactly what the server reported:
/// the element is resolved by the event parser (local name `detail`, inside
/// the fault), and its inner XML is sliced between the parser's positions
/// for its start and end tags.
pub fn parse_fault(xml: &str) -> Option<(String, String)> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut in_fault = false;
    let mut in_fault_string = false;
    let mut fault_string = String::new();
    let mut saw_fault = false;
    let mut detail = String::new();
    let mut detail_start: Option<usize> = None;
    let mut detail_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()).as_str() {
                "Fault" => {
                    in_fault = true;
                    saw_fault = true;
                }
                "faultstring" if in_fault => in_fault_string = true,
                "detail" if in_fault => {
                    if detail_depth == 0 {
                        // Inner content begins right after the start tag.
                        detail_start = Some(reader.buffer_position() as usize);
                    }
                    detail_depth += 1;
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_fault_string => {
                fault_string.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()).as_str() {
                "Fault" => in_fault = false,
                "faultstring" => in_fault_string = false,
                "detail" if detail_depth > 0 => {
                    detail_depth -= 1;
                    if detail_depth == 0 {
                        if let Some(start) = detail_start.take() {
                            // buffer_position is past the end tag; back up
                            // over `</name>`.
                            let end_tag_len = e.name().as_ref().len() + 3;
                            let end =
                                (reader.buffer_position() as usize).saturating_sub(end_tag_len);
                            if start <= end && end <= xml.len() {
                                detail = xml[start..end].trim().to_string();
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    if !saw_fault {
        return None;
    }

    Some((fault_string.trim().to_string(), detail))
}

/// Per-item accumulator for listing/creation responses.
#[derive(Default)]
struct ItemAccum {
    name: String,
    path: String,
    type_name: String,
}

impl ItemAccum {
    fn clear(&mut self) {
        self.name.clear();
        self.path.clear();
        self.type_name.clear();
    }

    fn push_text(&mut self, tag: &str, text: &str) {
        match tag {
            "Name" => self.name.push_str(text),
            "Path" => self.path.push_str(text),
            "TypeName" => self.type_name.push_str(text),
            _ => {}
        }
    }
}

/// Parse a `ListChildrenResponse` into catalog items.
pub fn parse_list_children(xml: &str) -> Result<Vec<CatalogItem>, CatalogError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut accum = ItemAccum::default();
    let mut in_item = false;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = local_name(e.name().as_ref());
                if tag == "CatalogItem" {
                    in_item = true;
                    accum.clear();
                } else if in_item {
                    current_tag = tag;
                }
            }
            Ok(Event::Text(ref e)) if in_item => {
                let text = e.unescape().unwrap_or_default();
                accum.push_text(&current_tag, &text);
            }
            Ok(Event::End(ref e)) => {
                let tag = local_name(e.name().as_ref());
                if tag == "CatalogItem" {
                    items.push(CatalogItem {
                        name: accum.name.clone(),
                        path: accum.path.clone(),
                        type_name: accum.type_name.clone(),
                    });
                    in_item = false;
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CatalogError::UnexpectedResponse(format!(
                    "malformed ListChildren response: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(items)
}

/// Per-warning accumulator.
#[derive(Default)]
struct WarningAccum {
    code: String,
    severity: String,
    message: String,
}

impl WarningAccum {
    fn clear(&mut self) {
        self.code.clear();
        self.severity.clear();
        self.message.clear();
    }

    fn push_text(&mut self, tag: &str, text: &str) {
        match tag {
            "Code" => self.code.push_str(text),
            "Severity" => self.severity.push_str(text),
            "Message" => self.message.push_str(text),
            _ => {}
        }
    }
}

/// Parse a `CreateCatalogItemResponse` into the created-item handle and any
/// warnings the server attached.
pub fn parse_create_item_response(
    xml: &str,
) -> Result<(Option<CreatedItem>, Vec<Warning>), CatalogError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut created: Option<CreatedItem> = None;
    let mut warnings = Vec::new();

    let mut item_accum = ItemAccum::default();
    let mut warning_accum = WarningAccum::default();
    let mut in_item_info = false;
    let mut in_warning = false;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = local_name(e.name().as_ref());
                match tag.as_str() {
                    "ItemInfo" => {
                        in_item_info = true;
                        item_accum.clear();
                    }
                    "Warning" => {
                        in_warning = true;
                        warning_accum.clear();
                    }
                    _ if in_item_info || in_warning => current_tag = tag,
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default();
                if in_warning {
                    warning_accum.push_text(&current_tag, &text);
                } else if in_item_info {
                    item_accum.push_text(&current_tag, &text);
                }
            }
            Ok(Event::End(ref e)) => {
                let tag = local_name(e.name().as_ref());
                match tag.as_str() {
                    "ItemInfo" => {
                        if !item_accum.name.is_empty() {
                            created = Some(CreatedItem {
                                name: item_accum.name.clone(),
                                path: item_accum.path.clone(),
                                type_name: item_accum.type_name.clone(),
                            });
                        }
                        in_item_info = false;
                    }
                    "Warning" => {
                        warnings.push(Warning {
                            code: warning_accum.code.clone(),
                            severity: warning_accum.severity.clone(),
                            message: warning_accum.message.clone(),
                        });
                        in_warning = false;
                    }
                    _ => {}
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CatalogError::UnexpectedResponse(format!(
                    "malformed CreateCatalogItem response: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok((created, warnings))
}

use crate::utils::eq_ignore_case;

/// First header named `name`, compared case-insensitively.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| eq_ignore_case(n, name))
        .map(|(_, v)| v.as_str())
}

/// Lookup for CIM extension headers.
///
/// M-POST requests declare the extension namespace through `Man:`/`Opt:` and then prefix every
/// extension header with its two-digit namespace id, e.g. `73-CIMMethod`.
pub fn find_cim_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| eq_ignore_case(strip_namespace_prefix(n), name))
        .map(|(_, v)| v.as_str())
}

fn strip_namespace_prefix(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() > 3 && bytes[0].is_ascii_digit() && bytes[1].is_ascii_digit() && bytes[2] == b'-' {
        &name[3..]
    } else {
        name
    }
}

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lower-cased `type/subtype`.
    pub media_type: String,
    /// Lower-cased, unquoted `charset` parameter.
    pub charset: Option<String>,
}

impl ContentType {
    pub fn parse(value: &str) -> Option<ContentType> {
        let mut parts = value.split(';');
        let media_type = parts.next()?.trim().to_ascii_lowercase();
        if media_type.is_empty() || !media_type.contains('/') {
            return None;
        }

        let mut charset = None;
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (name, value) = param.split_once('=')?;
            if name.trim().eq_ignore_ascii_case("charset") {
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                charset = Some(value.to_ascii_lowercase());
            }
        }

        Some(ContentType {
            media_type,
            charset,
        })
    }

    pub fn is_xml(&self) -> bool {
        self.media_type == "application/xml" || self.media_type == "text/xml"
    }

    pub fn is_binary(&self) -> bool {
        self.media_type == super::BINARY_MEDIA_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| ((*n).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_find_header_ignores_case() {
        let h = headers(&[("host", "a"), ("CIMMethod", "GetClass")]);
        assert_eq!(find_header(&h, "Host"), Some("a"));
        assert_eq!(find_header(&h, "cimmethod"), Some("GetClass"));
        assert_eq!(find_header(&h, "CIMObject"), None);
    }

    #[test]
    fn test_namespace_prefix() {
        let h = headers(&[("73-CIMMethod", "GetClass"), ("7-CIMObject", "x")]);
        assert_eq!(find_cim_header(&h, "CIMMethod"), Some("GetClass"));
        assert_eq!(find_cim_header(&h, "CIMObject"), None);
        assert_eq!(find_header(&h, "CIMMethod"), None);
    }

    #[test]
    fn test_content_type() {
        let ct = ContentType::parse("application/xml; charset=\"UTF-8\"").unwrap();
        assert!(ct.is_xml());
        assert_eq!(ct.charset.as_deref(), Some("utf-8"));

        let ct = ContentType::parse("Text/XML").unwrap();
        assert!(ct.is_xml());
        assert_eq!(ct.charset, None);

        assert!(ContentType::parse("application/x-openpegasus").unwrap().is_binary());
        assert_eq!(ContentType::parse("garbage"), None);
        assert_eq!(ContentType::parse("text/xml; charset"), None);
    }
}

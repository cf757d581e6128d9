use serde::Deserialize;

/// Tunables of the request decoder.
///
/// Built with chained setters, or deserialized from whatever configuration format the host
/// server uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecoderSettings {
    /// Upper bound on start tags in a single request body.
    max_elements: usize,
    /// Accept `application/x-openpegasus` payloads (requires a binary codec).
    binary_enabled: bool,
    /// Accepted major versions of the `CIMVERSION` attribute.
    cim_versions: Vec<String>,
    /// Accepted major versions of the `DTDVERSION` attribute.
    dtd_versions: Vec<String>,
    /// Accepted major versions of `PROTOCOLVERSION` / `CIMProtocolVersion`.
    protocol_versions: Vec<String>,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        DecoderSettings {
            max_elements: 100_000,
            binary_enabled: true,
            cim_versions: vec!["2".to_owned()],
            dtd_versions: vec!["2".to_owned()],
            protocol_versions: vec!["1".to_owned()],
        }
    }
}

impl DecoderSettings {
    pub fn new() -> Self {
        DecoderSettings::default()
    }

    pub fn max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn binary_enabled(mut self, binary_enabled: bool) -> Self {
        self.binary_enabled = binary_enabled;
        self
    }

    pub fn cim_versions(mut self, majors: &[&str]) -> Self {
        self.cim_versions = majors.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    pub fn dtd_versions(mut self, majors: &[&str]) -> Self {
        self.dtd_versions = majors.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    pub fn protocol_versions(mut self, majors: &[&str]) -> Self {
        self.protocol_versions = majors.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    pub fn get_max_elements(&self) -> usize {
        self.max_elements
    }

    pub fn is_binary_enabled(&self) -> bool {
        self.binary_enabled
    }

    pub fn supports_cim_version(&self, version: &str) -> bool {
        major_matches(&self.cim_versions, version)
    }

    pub fn supports_dtd_version(&self, version: &str) -> bool {
        major_matches(&self.dtd_versions, version)
    }

    pub fn supports_protocol_version(&self, version: &str) -> bool {
        major_matches(&self.protocol_versions, version)
    }
}

/// `version` is `major[.minor[...]]`; only the major component is compared.
fn major_matches(accepted: &[String], version: &str) -> bool {
    let major = version.trim().split('.').next().unwrap_or_default();
    !major.is_empty()
        && major.bytes().all(|b| b.is_ascii_digit())
        && accepted.iter().any(|a| a == major)
}

//! The SLURM-style overlay document: validation output filters and
//! locally added assertions over prefixes and BGPsec keys.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use serde::Deserialize;

use crate::base64url;
use crate::error::{OverlayError, OverlayResult};
use crate::prefix::{parse_prefix, validate_asn, validate_max_prefix_length};

#[derive(Debug, Clone)]
pub struct PrefixFilter {
    pub prefix: Option<(IpAddr, u8)>,
    pub asn: Option<u32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PrefixAssertion {
    pub prefix: (IpAddr, u8),
    pub asn: u32,
    pub max_prefix_length: Option<u8>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BgpsecFilter {
    pub asn: Option<u32>,
    pub ski: Option<Vec<u8>>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BgpsecAssertion {
    pub asn: u32,
    pub ski: Vec<u8>,
    pub router_public_key: Vec<u8>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayDocument {
    pub prefix_filters: Vec<PrefixFilter>,
    pub bgpsec_filters: Vec<BgpsecFilter>,
    pub prefix_assertions: Vec<PrefixAssertion>,
    pub bgpsec_assertions: Vec<BgpsecAssertion>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "slurmVersion")]
    slurm_version: u64,
    #[serde(rename = "validationOutputFilters")]
    validation_output_filters: RawFilters,
    #[serde(rename = "locallyAddedAssertions")]
    locally_added_assertions: RawAssertions,
}

#[derive(Debug, Deserialize)]
struct RawFilters {
    #[serde(rename = "prefixFilters")]
    prefix_filters: Vec<RawPrefixElement>,
    #[serde(rename = "bgpsecFilters")]
    bgpsec_filters: Vec<RawBgpsecElement>,
}

#[derive(Debug, Deserialize)]
struct RawAssertions {
    #[serde(rename = "prefixAssertions")]
    prefix_assertions: Vec<RawPrefixElement>,
    #[serde(rename = "bgpsecAssertions")]
    bgpsec_assertions: Vec<RawBgpsecElement>,
}

#[derive(Debug, Deserialize)]
struct RawPrefixElement {
    prefix: Option<String>,
    asn: Option<i64>,
    #[serde(rename = "maxPrefixLength")]
    max_prefix_length: Option<u32>,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBgpsecElement {
    asn: Option<i64>,
    #[serde(rename = "SKI")]
    ski: Option<String>,
    #[serde(rename = "routerPublicKey")]
    router_public_key: Option<String>,
    comment: Option<String>,
}

/// Load and validate an overlay document from disk. The top-level
/// shape and `slurmVersion` are hard-fail; individual filter/assertion
/// elements that don't validate are logged and dropped.
pub fn load(path: &Path) -> OverlayResult<OverlayDocument> {
    let text = fs::read_to_string(path)?;
    let raw: RawDocument = serde_json::from_str(&text)?;

    if raw.slurm_version != 1 {
        return Err(OverlayError::UnsupportedVersion(raw.slurm_version));
    }

    let mut doc = OverlayDocument::default();

    for element in raw.validation_output_filters.prefix_filters {
        if let Some(filter) = validate_prefix_filter(element) {
            doc.prefix_filters.push(filter);
        }
    }
    for element in raw.validation_output_filters.bgpsec_filters {
        if let Some(filter) = validate_bgpsec_filter(element) {
            doc.bgpsec_filters.push(filter);
        }
    }
    for element in raw.locally_added_assertions.prefix_assertions {
        if let Some(assertion) = validate_prefix_assertion(element) {
            doc.prefix_assertions.push(assertion);
        }
    }
    for element in raw.locally_added_assertions.bgpsec_assertions {
        if let Some(assertion) = validate_bgpsec_assertion(element) {
            doc.bgpsec_assertions.push(assertion);
        }
    }

    Ok(doc)
}

fn validate_prefix_filter(raw: RawPrefixElement) -> Option<PrefixFilter> {
    let prefix = match raw.prefix {
        Some(s) => match parse_prefix(&s) {
            Some(p) => Some(p),
            None => {
                log::warn!("overlay: dropping prefix filter with invalid prefix {s:?}");
                return None;
            }
        },
        None => None,
    };

    let asn = match raw.asn {
        Some(n) => match validate_asn(n) {
            Some(v) => Some(v),
            None => {
                log::warn!("overlay: dropping prefix filter with out-of-range asn {n}");
                return None;
            }
        },
        None => None,
    };

    Some(PrefixFilter { prefix, asn, comment: raw.comment })
}

fn validate_prefix_assertion(raw: RawPrefixElement) -> Option<PrefixAssertion> {
    let prefix = match raw.prefix.as_deref().and_then(parse_prefix) {
        Some(p) => p,
        None => {
            log::warn!("overlay: dropping prefix assertion with missing/invalid prefix");
            return None;
        }
    };

    let asn = match raw.asn.and_then(validate_asn) {
        Some(v) => v,
        None => {
            log::warn!("overlay: dropping prefix assertion with missing/invalid asn");
            return None;
        }
    };

    let max_prefix_length = match raw.max_prefix_length {
        Some(0) | None => None,
        Some(len) => match validate_max_prefix_length(&prefix.0, len) {
            Some(v) => Some(v),
            None => {
                log::warn!("overlay: dropping prefix assertion with invalid maxPrefixLength {len}");
                return None;
            }
        },
    };

    if let Some(max) = max_prefix_length {
        if prefix.1 > max {
            log::warn!("overlay: dropping prefix assertion where prefix length exceeds maxPrefixLength");
            return None;
        }
    }

    Some(PrefixAssertion { prefix, asn, max_prefix_length, comment: raw.comment })
}

fn validate_bgpsec_filter(raw: RawBgpsecElement) -> Option<BgpsecFilter> {
    let asn = match raw.asn {
        Some(n) => match validate_asn(n) {
            Some(v) => Some(v),
            None => {
                log::warn!("overlay: dropping bgpsec filter with out-of-range asn {n}");
                return None;
            }
        },
        None => None,
    };

    let ski = match raw.ski {
        Some(s) => match base64url::decode(&s) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("overlay: dropping bgpsec filter with invalid SKI: {e}");
                return None;
            }
        },
        None => None,
    };

    Some(BgpsecFilter { asn, ski, comment: raw.comment })
}

fn validate_bgpsec_assertion(raw: RawBgpsecElement) -> Option<BgpsecAssertion> {
    let asn = match raw.asn.and_then(validate_asn) {
        Some(v) => v,
        None => {
            log::warn!("overlay: dropping bgpsec assertion with missing/invalid asn");
            return None;
        }
    };

    let ski = match raw.ski.as_deref().map(base64url::decode) {
        Some(Ok(bytes)) => bytes,
        Some(Err(e)) => {
            log::warn!("overlay: dropping bgpsec assertion with invalid SKI: {e}");
            return None;
        }
        None => {
            log::warn!("overlay: dropping bgpsec assertion with missing SKI");
            return None;
        }
    };

    let router_public_key = match raw.router_public_key.as_deref().map(base64url::decode) {
        Some(Ok(bytes)) => bytes,
        Some(Err(e)) => {
            log::warn!("overlay: dropping bgpsec assertion with invalid routerPublicKey: {e}");
            return None;
        }
        None => {
            log::warn!("overlay: dropping bgpsec assertion with missing routerPublicKey");
            return None;
        }
    };

    Some(BgpsecAssertion { asn, ski, router_public_key, comment: raw.comment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_doc(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_minimal_empty_document() {
        let f = write_doc(
            r#"{ "slurmVersion": 1,
                "validationOutputFilters": { "prefixFilters": [], "bgpsecFilters": [] },
                "locallyAddedAssertions": { "prefixAssertions": [], "bgpsecAssertions": [] } }"#,
        );
        let doc = load(f.path()).unwrap();
        assert!(doc.prefix_filters.is_empty());
        assert!(doc.bgpsec_assertions.is_empty());
    }

    #[test]
    fn rejects_unsupported_version() {
        let f = write_doc(
            r#"{ "slurmVersion": 2,
                "validationOutputFilters": { "prefixFilters": [], "bgpsecFilters": [] },
                "locallyAddedAssertions": { "prefixAssertions": [], "bgpsecAssertions": [] } }"#,
        );
        assert!(matches!(load(f.path()), Err(OverlayError::UnsupportedVersion(2))));
    }

    #[test]
    fn drops_invalid_prefix_assertion_keeps_valid_ones() {
        let f = write_doc(
            r#"{ "slurmVersion": 1,
                "validationOutputFilters": { "prefixFilters": [], "bgpsecFilters": [] },
                "locallyAddedAssertions": { "prefixAssertions": [
                    { "prefix": "192.0.2.0/24", "asn": 65000 },
                    { "prefix": "192.0.2.1/24", "asn": 65000 },
                    { "prefix": "203.0.113.0/24", "asn": 0 }
                ], "bgpsecAssertions": [] } }"#,
        );
        let doc = load(f.path()).unwrap();
        assert_eq!(doc.prefix_assertions.len(), 1);
        assert_eq!(doc.prefix_assertions[0].asn, 65000);
    }

    #[test]
    fn accepts_prefix_assertion_with_max_prefix_length() {
        let f = write_doc(
            r#"{ "slurmVersion": 1,
                "validationOutputFilters": { "prefixFilters": [], "bgpsecFilters": [] },
                "locallyAddedAssertions": { "prefixAssertions": [
                    { "prefix": "192.0.2.0/24", "asn": 65000, "maxPrefixLength": 28 }
                ], "bgpsecAssertions": [] } }"#,
        );
        let doc = load(f.path()).unwrap();
        assert_eq!(doc.prefix_assertions[0].max_prefix_length, Some(28));
    }

    #[test]
    fn rejects_prefix_assertion_where_length_exceeds_max() {
        let f = write_doc(
            r#"{ "slurmVersion": 1,
                "validationOutputFilters": { "prefixFilters": [], "bgpsecFilters": [] },
                "locallyAddedAssertions": { "prefixAssertions": [
                    { "prefix": "192.0.2.0/24", "asn": 65000, "maxPrefixLength": 20 }
                ], "bgpsecAssertions": [] } }"#,
        );
        let doc = load(f.path()).unwrap();
        assert!(doc.prefix_assertions.is_empty());
    }

    #[test]
    fn loads_bgpsec_assertion_with_base64url_fields() {
        let f = write_doc(
            r#"{ "slurmVersion": 1,
                "validationOutputFilters": { "prefixFilters": [], "bgpsecFilters": [] },
                "locallyAddedAssertions": { "prefixAssertions": [], "bgpsecAssertions": [
                    { "asn": 65000, "SKI": "YWJjZA", "routerPublicKey": "YWJjZA" }
                ] } }"#,
        );
        let doc = load(f.path()).unwrap();
        assert_eq!(doc.bgpsec_assertions.len(), 1);
        assert_eq!(doc.bgpsec_assertions[0].ski, b"abcd");
    }
}

//! Filling missing cooperator ids in a collection file from an NWIS listing

use std::fs;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use tracing::info;

use crate::config::{FixConfig, NWIS_KEY, SITE_KEY};
use crate::model::field::site_fields;
use crate::model::{FieldTable, KeyedTable, SiteTable};
use crate::parser::{read_document, Header, RdbDocument, TableBuilder};

/// NWIS cooperator ids starting with this prefix are Klamath cooperator site numbers
pub const KLAMATH_PREFIX: &str = "KLAM";
/// NWIS cooperator ids starting with this prefix carry a CDWR well id
pub const CDWR_PREFIX: &str = "CDWR";

/// Ids to write into the collection file, keyed by site id
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionPatch {
    pub coop_site_no: IndexMap<String, String>,
    pub cdwr_id: IndexMap<String, String>,
}

impl CollectionPatch {
    pub fn is_empty(&self) -> bool {
        self.coop_site_no.is_empty() && self.cdwr_id.is_empty()
    }

    pub fn len(&self) -> usize {
        self.coop_site_no.len() + self.cdwr_id.len()
    }
}

/// Find sites whose cooperator or CDWR id is blank but known to NWIS
pub fn plan_patch(sites: &SiteTable, nwis: &KeyedTable) -> CollectionPatch {
    let mut patch = CollectionPatch::default();

    for (site_id, record) in &sites.sites {
        let site_no = record.text("site_no");
        if site_no.is_empty() {
            continue;
        }
        let Some(nwis_record) = nwis.get(site_no) else {
            continue;
        };

        let coop = nwis_record.text("coop_site_no");
        if coop.starts_with(KLAMATH_PREFIX) && record.text("coop_site_no").is_empty() {
            info!(site_no, coop_site_no = coop, "adding cooperator site number");
            patch.coop_site_no.insert(site_id.clone(), coop.to_string());
        } else if let Some(cdwr_id) = coop.strip_prefix(CDWR_PREFIX) {
            if record.text("cdwr_id").is_empty() {
                info!(site_no, cdwr_id, "adding CDWR id");
                patch.cdwr_id.insert(site_id.clone(), cdwr_id.to_string());
            }
        }
    }

    patch
}

/// Re-emit collection lines with the patch applied. Comment lines, blank lines,
/// the header and the format line pass through unchanged.
pub fn apply_patch<S: AsRef<str>>(lines: &[S], patch: &CollectionPatch) -> Vec<String> {
    let mut output = Vec::with_capacity(lines.len());
    let mut header: Option<Header> = None;
    let mut format_seen = false;

    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() || line.starts_with('#') {
            output.push(line.to_string());
            continue;
        }

        let Some(header) = header.as_ref() else {
            header = Some(Header::new(line.split('\t'), index as u64 + 1));
            output.push(line.to_string());
            continue;
        };

        if !format_seen {
            format_seen = true;
            output.push(line.to_string());
            continue;
        }

        let mut values: Vec<String> = line.split('\t').map(str::to_string).collect();
        let site_id = header
            .position(SITE_KEY)
            .and_then(|p| values.get(p))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let mut changed = false;
        for (column, ids) in [("coop_site_no", &patch.coop_site_no), ("cdwr_id", &patch.cdwr_id)] {
            if let (Some(id), Some(p)) = (ids.get(&site_id), header.position(column)) {
                if let Some(slot) = values.get_mut(p) {
                    *slot = id.clone();
                    changed = true;
                }
            }
        }

        if changed {
            output.push(values.join("\t"));
        } else {
            output.push(line.to_string());
        }
    }

    output
}

/// Outcome of a fix-collection run
#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub sites: usize,
    pub patch: CollectionPatch,
    /// Whether the patched file was written
    pub written: bool,
}

/// Load both files, plan the patch, and write the patched collection when anything changed
pub fn fix_collection(config: &FixConfig) -> Result<FixOutcome> {
    let collection_doc = read_document(&config.sites_file)
        .with_context(|| format!("Failed to parse collection file: {}", config.sites_file.display()))?;
    let sites = TableBuilder::new(SITE_KEY, site_fields()).build_sites(&collection_doc)?;

    let nwis_doc: RdbDocument = read_document(&config.nwis_file)
        .with_context(|| format!("Failed to parse NWIS file: {}", config.nwis_file.display()))?;
    let nwis_fields = FieldTable::from_names(nwis_doc.header.names().iter().cloned());
    let nwis = TableBuilder::new(NWIS_KEY, nwis_fields)
        .with_keep_first(true)
        .build_keyed(&nwis_doc)?;
    info!(sites = nwis.len(), "processed NWIS sites");

    let patch = plan_patch(&sites, &nwis);
    info!(sites = sites.len(), changes = patch.len(), "outputting sites");

    let mut written = false;
    if !patch.is_empty() {
        let text = fs::read_to_string(&config.sites_file)
            .with_context(|| format!("Failed to read collection file: {}", config.sites_file.display()))?;
        let lines: Vec<&str> = text.lines().collect();
        let patched = apply_patch(&lines, &patch);
        fs::write(&config.output_file, patched.join("\n"))
            .with_context(|| format!("Can not open output file {}", config.output_file.display()))?;
        written = true;
    }

    Ok(FixOutcome {
        sites: sites.len(),
        patch,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &[&str] = &[
        "# collection",
        "site_id\tagency_cd\tsite_no\tcoop_site_no\tcdwr_id\tstate_well_nmbr\tstation_nm\tdec_lat_va\tdec_long_va\talt_va\talt_acy_va\talt_datum_cd",
        "15s\t5s\t15s\t15s\t15s\t15s\t30s\t10n\t10n\t10n\t5s\t10s",
        "S1\tUSGS\t420000121000001\t\t\t\tWELL A\t42.0\t-121.0\t\t\t",
        "S2\tUSGS\t420000121000002\t\t\t\tWELL B\t42.1\t-121.1\t\t\t",
        "S3\tUSGS\t420000121000003\tKLAM0003\t\t\tWELL C\t42.2\t-121.2\t\t\t",
        "",
        "S4\tOWRD\t\t\t\t\tWELL D\t42.3\t-121.3\t\t\t",
    ];

    const NWIS: &[&str] = &[
        "# nwis",
        "agency_cd\tsite_no\tcoop_site_no",
        "5s\t15s\t15s",
        "USGS\t420000121000001\tKLAM0001",
        "USGS\t420000121000002\tCDWR41N04E01",
        "USGS\t420000121000003\tKLAM9999",
        "USGS\t420000121000001\tKLAM7777",
    ];

    fn tables() -> (SiteTable, KeyedTable) {
        let doc = RdbDocument::from_lines(COLLECTION, "collection").unwrap();
        let sites = TableBuilder::new(SITE_KEY, site_fields()).build_sites(&doc).unwrap();
        let doc = RdbDocument::from_lines(NWIS, "nwis").unwrap();
        let fields = FieldTable::from_names(doc.header.names().iter().cloned());
        let nwis = TableBuilder::new(NWIS_KEY, fields)
            .with_keep_first(true)
            .build_keyed(&doc)
            .unwrap();
        (sites, nwis)
    }

    #[test]
    fn test_plan_patch() {
        let (sites, nwis) = tables();
        let patch = plan_patch(&sites, &nwis);

        assert_eq!(patch.coop_site_no.get("S1").map(String::as_str), Some("KLAM0001"));
        assert_eq!(patch.cdwr_id.get("S2").map(String::as_str), Some("41N04E01"));
        assert!(!patch.coop_site_no.contains_key("S3"));
        assert_eq!(patch.len(), 2);
    }

    #[test]
    fn test_apply_patch_preserves_other_lines() {
        let (sites, nwis) = tables();
        let patch = plan_patch(&sites, &nwis);
        let output = apply_patch(COLLECTION, &patch);

        assert_eq!(output.len(), COLLECTION.len());
        assert_eq!(output[0], COLLECTION[0]);
        assert_eq!(output[1], COLLECTION[1]);
        assert_eq!(output[2], COLLECTION[2]);
        assert_eq!(
            output[3],
            "S1\tUSGS\t420000121000001\tKLAM0001\t\t\tWELL A\t42.0\t-121.0\t\t\t"
        );
        assert_eq!(
            output[4],
            "S2\tUSGS\t420000121000002\t\t41N04E01\t\tWELL B\t42.1\t-121.1\t\t\t"
        );
        assert_eq!(output[5], COLLECTION[5]);
        assert_eq!(output[6], "");
        assert_eq!(output[7], COLLECTION[7]);
    }

    #[test]
    fn test_apply_patch_finds_columns_by_header_name() {
        let lines = [
            "CDWR_ID\tStation_Nm\tSITE_ID\tCoop_Site_No",
            "15s\t30s\t15s\t15s",
            "\tWELL A\tS1\t",
            "\tWELL B\tS2\t",
        ];
        let mut patch = CollectionPatch::default();
        patch.cdwr_id.insert("S2".to_string(), "41N04E01".to_string());
        patch.coop_site_no.insert("S1".to_string(), "KLAM0001".to_string());

        let output = apply_patch(&lines[..], &patch);
        assert_eq!(output[2], "\tWELL A\tS1\tKLAM0001");
        assert_eq!(output[3], "41N04E01\tWELL B\tS2\t");
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let output = apply_patch(COLLECTION, &CollectionPatch::default());
        assert_eq!(output, COLLECTION);
    }
}

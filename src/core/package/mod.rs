//! Package builders
//!
//! A [`PackageBuilder`] turns one [`SipDefinition`] into one package on disk.
//! The variant is fixed per export run and chosen from the requested
//! [`PackageFormat`]:
//!
//! - [`BagitBuilder`] writes a BagIt directory with copied payload, tag files
//!   and an optional human-readable report
//! - [`EarkBuilder`] writes a zipped E-ARK-style container with a METS
//!   manifest and a single `rep1` representation
//!
//! Both variants share the naming policy, the metadata format mapping and the
//! tree walker, and report phases through a [`BuildObserver`].

pub mod bagit;
pub mod eark;
pub mod mets;

pub use bagit::BagitBuilder;
pub use eark::EarkBuilder;

use crate::core::export::progress::ExportPhase;
use crate::domain::{MetadataFormat, PackageError, Result, SipDefinition};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Package encoding selected for an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    /// BagIt directory
    Bagit,
    /// E-ARK-style zipped container
    Eark,
}

impl PackageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bagit => "bagit",
            Self::Eark => "eark",
        }
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bagit" => Ok(Self::Bagit),
            "eark" => Ok(Self::Eark),
            other => Err(format!(
                "Unknown package format '{other}', expected 'bagit' or 'eark'"
            )),
        }
    }
}

/// How a package is named in the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    /// The SIP's display name
    Title,
    /// The SIP's identifier
    #[default]
    Id,
    /// `"<id> - <name>"`
    IdTitle,
}

impl NamingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Id => "id",
            Self::IdTitle => "id_title",
        }
    }
}

impl fmt::Display for NamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "id" => Ok(Self::Id),
            "id_title" | "id-title" => Ok(Self::IdTitle),
            other => Err(format!(
                "Unknown naming policy '{other}', expected 'title', 'id' or 'id_title'"
            )),
        }
    }
}

/// Naming policy plus optional prefix
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageNaming {
    pub policy: NamingPolicy,
    pub prefix: Option<String>,
}

impl PackageNaming {
    pub fn new(policy: NamingPolicy, prefix: Option<String>) -> Self {
        let prefix = prefix.filter(|p| !p.trim().is_empty());
        Self { policy, prefix }
    }

    /// File name of the package for `sip`, without extension
    ///
    /// Pure function of the SIP, the policy and the prefix. Characters that
    /// are not allowed in file names are replaced with `_`; a name that ends
    /// up empty falls back to the sanitized id.
    ///
    /// # Examples
    ///
    /// ```
    /// use sipkit::core::package::{NamingPolicy, PackageNaming};
    /// use sipkit::domain::{SipDefinition, SipId};
    ///
    /// let sip = SipDefinition::builder()
    ///     .id(SipId::new("sip-1").unwrap())
    ///     .name("Letters: 1920/1930")
    ///     .build()
    ///     .unwrap();
    ///
    /// let naming = PackageNaming::new(NamingPolicy::IdTitle, Some("ACME".to_string()));
    /// assert_eq!(naming.package_name(&sip), "ACME - sip-1 - Letters_ 1920_1930");
    /// ```
    pub fn package_name(&self, sip: &SipDefinition) -> String {
        let base = match self.policy {
            NamingPolicy::Id => sip.id.to_string(),
            NamingPolicy::Title => sip.name.clone(),
            NamingPolicy::IdTitle => format!("{} - {}", sip.id, sip.name),
        };
        let name = match &self.prefix {
            Some(prefix) => format!("{prefix} - {base}"),
            None => base,
        };

        let sanitized = sanitize_file_name(&name);
        if is_usable_name(&sanitized) {
            sanitized
        } else {
            sanitize_file_name(sip.id.as_str())
        }
    }
}

fn is_usable_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed != "." && trimmed != ".."
}

/// Replaces characters that cannot appear in a file name with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Descriptive metadata type as recorded in the package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptiveMetadataKind {
    Dc,
    Ead,
    Other,
}

impl DescriptiveMetadataKind {
    /// Maps a SIP's metadata format tag; unset and unknown tags are `Other`
    pub fn from_format(format: Option<MetadataFormat>) -> Self {
        match format {
            Some(MetadataFormat::Dc) => Self::Dc,
            Some(MetadataFormat::Ead) => Self::Ead,
            Some(MetadataFormat::Custom) | None => Self::Other,
        }
    }

    /// File name the metadata is stored under
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Dc => "dc.xml",
            Self::Ead => "ead.xml",
            Self::Other => "custom.xml",
        }
    }

    /// METS `MDTYPE` value
    pub fn mets_type(&self) -> &'static str {
        match self {
            Self::Dc => "DC",
            Self::Ead => "EAD",
            Self::Other => "OTHER",
        }
    }
}

/// Receives phase and file progress from a builder while it works on one SIP
pub trait BuildObserver {
    /// The builder entered `phase`
    fn phase_changed(&self, phase: ExportPhase);

    /// `done` of `total` payload files have been written
    fn files_done(&self, done: usize, total: usize);
}

/// Observer that ignores all notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {
    fn phase_changed(&self, _phase: ExportPhase) {}

    fn files_done(&self, _done: usize, _total: usize) {}
}

/// Builds one package per SIP in the configured format
#[derive(Debug, Clone)]
pub enum PackageBuilder {
    Bagit(BagitBuilder),
    Eark(EarkBuilder),
}

impl PackageBuilder {
    /// Creates the builder variant for `format`
    pub fn new(
        format: PackageFormat,
        output_root: impl Into<PathBuf>,
        naming: PackageNaming,
        create_report: bool,
    ) -> Self {
        let output_root = output_root.into();
        match format {
            PackageFormat::Bagit => {
                Self::Bagit(BagitBuilder::new(output_root, naming, create_report))
            }
            PackageFormat::Eark => Self::Eark(EarkBuilder::new(output_root, naming)),
        }
    }

    pub fn format(&self) -> PackageFormat {
        match self {
            Self::Bagit(_) => PackageFormat::Bagit,
            Self::Eark(_) => PackageFormat::Eark,
        }
    }

    pub fn output_root(&self) -> &Path {
        match self {
            Self::Bagit(builder) => builder.output_root(),
            Self::Eark(builder) => builder.output_root(),
        }
    }

    /// Builds the package for `sip` and returns its path
    ///
    /// # Errors
    ///
    /// Any failure is scoped to this SIP. Nothing is left in the output
    /// directory when an error is returned.
    pub fn create(&self, sip: &SipDefinition, observer: &dyn BuildObserver) -> Result<PathBuf> {
        match self {
            Self::Bagit(builder) => builder.create(sip, observer),
            Self::Eark(builder) => builder.create(sip, observer),
        }
    }
}

/// Fails when `target` is already present
pub(crate) fn ensure_absent(target: &Path) -> Result<()> {
    match target.try_exists() {
        Ok(false) => Ok(()),
        Ok(true) => Err(PackageError::AlreadyExists(target.to_path_buf()).into()),
        Err(e) => Err(PackageError::destination_unwritable(target, e).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SipId;
    use test_case::test_case;

    fn sip(id: &str, name: &str) -> SipDefinition {
        SipDefinition::builder()
            .id(SipId::new(id).unwrap())
            .name(name)
            .build()
            .unwrap()
    }

    #[test_case(NamingPolicy::Id, None, "sip-1" ; "by id")]
    #[test_case(NamingPolicy::Title, None, "Annual report" ; "by title")]
    #[test_case(NamingPolicy::IdTitle, None, "sip-1 - Annual report" ; "by id and title")]
    #[test_case(NamingPolicy::Title, Some("ACME"), "ACME - Annual report" ; "prefixed title")]
    #[test_case(NamingPolicy::Id, Some("  "), "sip-1" ; "blank prefix ignored")]
    fn test_package_name(policy: NamingPolicy, prefix: Option<&str>, expected: &str) {
        let naming = PackageNaming::new(policy, prefix.map(str::to_string));
        assert_eq!(naming.package_name(&sip("sip-1", "Annual report")), expected);
    }

    #[test]
    fn test_package_name_is_stable() {
        let naming = PackageNaming::new(NamingPolicy::IdTitle, None);
        let s = sip("a", "b");
        assert_eq!(naming.package_name(&s), naming.package_name(&s));
    }

    #[test]
    fn test_package_name_sanitizes() {
        let naming = PackageNaming::new(NamingPolicy::Title, None);
        assert_eq!(
            naming.package_name(&sip("x", "a/b\\c:d*e?f\"g<h>i|j\tk")),
            "a_b_c_d_e_f_g_h_i_j_k"
        );
    }

    #[test]
    fn test_package_name_falls_back_to_id() {
        let naming = PackageNaming::new(NamingPolicy::Title, None);
        assert_eq!(naming.package_name(&sip("sip-3", "   ")), "sip-3");
        assert_eq!(naming.package_name(&sip("sip-4", "..")), "sip-4");
    }

    #[test_case(None, "custom.xml", "OTHER")]
    #[test_case(Some(MetadataFormat::Dc), "dc.xml", "DC")]
    #[test_case(Some(MetadataFormat::Ead), "ead.xml", "EAD")]
    #[test_case(Some(MetadataFormat::Custom), "custom.xml", "OTHER")]
    fn test_metadata_kind_mapping(format: Option<MetadataFormat>, file: &str, mdtype: &str) {
        let kind = DescriptiveMetadataKind::from_format(format);
        assert_eq!(kind.file_name(), file);
        assert_eq!(kind.mets_type(), mdtype);
    }

    #[test]
    fn test_format_and_policy_parsing() {
        assert_eq!("BagIt".parse::<PackageFormat>().unwrap(), PackageFormat::Bagit);
        assert_eq!("eark".parse::<PackageFormat>().unwrap(), PackageFormat::Eark);
        assert!("zip".parse::<PackageFormat>().is_err());
        assert_eq!("id_title".parse::<NamingPolicy>().unwrap(), NamingPolicy::IdTitle);
        assert!("uuid".parse::<NamingPolicy>().is_err());
    }

    #[test]
    fn test_builder_variant_matches_format() {
        let naming = PackageNaming::default();
        let bagit = PackageBuilder::new(PackageFormat::Bagit, "/out", naming.clone(), true);
        let eark = PackageBuilder::new(PackageFormat::Eark, "/out", naming, false);
        assert_eq!(bagit.format(), PackageFormat::Bagit);
        assert_eq!(eark.format(), PackageFormat::Eark);
        assert_eq!(eark.output_root(), Path::new("/out"));
    }
}

//! Catalog model: entries, language variants, market flags and upload drafts.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::EntryKey;
use crate::reference;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Which of the two blob locations a file lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Restricted,
}

impl Visibility {
    pub fn from_public_flag(public: bool) -> Self {
        if public {
            Visibility::Public
        } else {
            Visibility::Restricted
        }
    }

    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Restricted => "restricted",
        }
    }
}

/// Market region codes as stored in the `market` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketRegion {
    #[serde(rename = "EU")]
    Europe,
    #[serde(rename = "NA")]
    NorthAmerica,
    #[serde(rename = "SA")]
    SouthAmerica,
    #[serde(rename = "ME")]
    MiddleEast,
    #[serde(rename = "AS")]
    Asia,
    #[serde(rename = "AU")]
    Australia,
    #[serde(rename = "IN")]
    India,
}

impl MarketRegion {
    pub const ALL: [MarketRegion; 7] = [
        MarketRegion::Europe,
        MarketRegion::NorthAmerica,
        MarketRegion::SouthAmerica,
        MarketRegion::MiddleEast,
        MarketRegion::Asia,
        MarketRegion::Australia,
        MarketRegion::India,
    ];

    pub fn code(self) -> &'static str {
        match self {
            MarketRegion::Europe => "EU",
            MarketRegion::NorthAmerica => "NA",
            MarketRegion::SouthAmerica => "SA",
            MarketRegion::MiddleEast => "ME",
            MarketRegion::Asia => "AS",
            MarketRegion::Australia => "AU",
            MarketRegion::India => "IN",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MarketRegion::Europe => "Europe",
            MarketRegion::NorthAmerica => "North America",
            MarketRegion::SouthAmerica => "South America",
            MarketRegion::MiddleEast => "Middle East",
            MarketRegion::Asia => "Asia",
            MarketRegion::Australia => "Australia",
            MarketRegion::India => "India",
        }
    }
}

/// The full set of market-region flags.
///
/// All seven regions are always present; absent regions decode as `false` and
/// unknown region codes are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketFlags {
    #[serde(rename = "EU", default)]
    pub europe: bool,
    #[serde(rename = "NA", default)]
    pub north_america: bool,
    #[serde(rename = "SA", default)]
    pub south_america: bool,
    #[serde(rename = "ME", default)]
    pub middle_east: bool,
    #[serde(rename = "AS", default)]
    pub asia: bool,
    #[serde(rename = "AU", default)]
    pub australia: bool,
    #[serde(rename = "IN", default)]
    pub india: bool,
}

impl MarketFlags {
    pub fn get(&self, region: MarketRegion) -> bool {
        match region {
            MarketRegion::Europe => self.europe,
            MarketRegion::NorthAmerica => self.north_america,
            MarketRegion::SouthAmerica => self.south_america,
            MarketRegion::MiddleEast => self.middle_east,
            MarketRegion::Asia => self.asia,
            MarketRegion::Australia => self.australia,
            MarketRegion::India => self.india,
        }
    }

    pub fn set(&mut self, region: MarketRegion, enabled: bool) {
        let slot = match region {
            MarketRegion::Europe => &mut self.europe,
            MarketRegion::NorthAmerica => &mut self.north_america,
            MarketRegion::SouthAmerica => &mut self.south_america,
            MarketRegion::MiddleEast => &mut self.middle_east,
            MarketRegion::Asia => &mut self.asia,
            MarketRegion::Australia => &mut self.australia,
            MarketRegion::India => &mut self.india,
        };
        *slot = enabled;
    }

    pub fn with(mut self, region: MarketRegion) -> Self {
        self.set(region, true);
        self
    }

    /// Enabled regions in canonical order.
    pub fn selected(&self) -> Vec<MarketRegion> {
        MarketRegion::ALL
            .into_iter()
            .filter(|r| self.get(*r))
            .collect()
    }
}

/// One language/file combination of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageVariant {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "manualtype", default)]
    pub manual_types: Vec<String>,
    #[serde(rename = "releasedate", default)]
    pub release_date: Option<String>,
}

impl LanguageVariant {
    /// Object name of the referenced blob (final path segment of the URL).
    pub fn blob_name(&self) -> &str {
        blob_name_from(&self.url)
    }

    /// Display name of the language, or the raw code when it is not known.
    pub fn language_label(&self) -> &str {
        reference::language_name(&self.lang).unwrap_or(self.lang.as_str())
    }

    /// Release date as a calendar day.
    ///
    /// Accepts plain `YYYY-MM-DD` and full RFC 3339 timestamps.
    pub fn release_day(&self) -> Option<NaiveDate> {
        let raw = self.release_date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }
}

/// Storable object name for a blob identifier: the final path segment of a
/// full URL or of a bare name. Query strings and fragments are ignored.
pub fn blob_name_from(identifier: &str) -> &str {
    let path = identifier
        .split(['?', '#'])
        .next()
        .unwrap_or(identifier);
    path.rsplit('/').next().unwrap_or(path)
}

/// Check that `name` can be stored as a blob and found again from its URL.
///
/// Returns the trimmed name. Path separators, `?` and `#` are rejected since
/// `blob_name_from` would cut the name at them.
pub fn check_blob_name(name: &str) -> DomainResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("file name is required"));
    }
    if trimmed
        .chars()
        .any(|c| matches!(c, '/' | '\\' | '?' | '#') || c.is_control())
    {
        return Err(DomainError::validation(format!(
            "file name '{trimmed}' must not contain '/', '\\', '?' or '#'"
        )));
    }
    Ok(trimmed)
}

/// One document's full metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,
    #[serde(rename = "RowKey")]
    pub row_key: String,
    #[serde(rename = "documentno")]
    pub document_no: String,
    #[serde(rename = "familyname")]
    pub family_name: String,
    #[serde(rename = "manualtitle")]
    pub title: String,
    #[serde(rename = "productcategory")]
    pub product_category: String,
    #[serde(rename = "subcategory")]
    pub subcategory: String,
    #[serde(rename = "productgin")]
    pub product_gin: String,
    #[serde(rename = "serialno")]
    pub serial_no: String,
    /// Empty when the entry belongs to no project.
    #[serde(rename = "projectno")]
    pub project_no: String,
    pub public: bool,
    #[serde(rename = "languagevariants")]
    pub language_variants: Vec<LanguageVariant>,
    pub market: MarketFlags,
    /// Entry-level manual types written by older tooling.
    #[serde(rename = "manualtype")]
    pub manual_types: Vec<String>,
    /// Entry-level release date written by older tooling.
    #[serde(rename = "releasedate")]
    pub release_date: Option<String>,
}

impl CatalogEntry {
    /// Assemble a new entry from the wizard's document metadata.
    pub fn assemble(
        key: EntryKey,
        metadata: &DocumentMetadata,
        language_variants: Vec<LanguageVariant>,
        market: MarketFlags,
    ) -> Self {
        Self {
            partition_key: key.partition_key,
            row_key: key.row_key,
            document_no: metadata.document_no.clone(),
            family_name: metadata.family_name.clone(),
            title: metadata.title.clone(),
            product_category: metadata.product_category.clone(),
            subcategory: metadata.subcategory.clone(),
            product_gin: metadata.product_gin.clone(),
            serial_no: metadata.serial_no.clone(),
            project_no: metadata.project_no.clone(),
            public: metadata.public,
            language_variants,
            market,
            manual_types: Vec::new(),
            release_date: None,
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.partition_key.clone(), self.row_key.clone())
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from_public_flag(self.public)
    }

    pub fn project(&self) -> Option<&str> {
        let p = self.project_no.trim();
        (!p.is_empty()).then_some(p)
    }

    /// Checks that must hold before the entry is written back.
    pub fn validate(&self) -> DomainResult<()> {
        if self.document_no.trim().is_empty() {
            return Err(DomainError::validation("document number is required"));
        }
        if self.language_variants.is_empty() {
            return Err(DomainError::validation(
                "At least one language variant is required",
            ));
        }
        Ok(())
    }

    pub fn variant(&self, index: usize) -> DomainResult<&LanguageVariant> {
        self.language_variants
            .get(index)
            .ok_or_else(|| DomainError::not_found(format!("language variant {index}")))
    }

    /// Remove and return the variant at `index`.
    pub fn remove_variant(&mut self, index: usize) -> DomainResult<LanguageVariant> {
        self.variant(index)?;
        Ok(self.language_variants.remove(index))
    }
}

/// Entry-level draft collected before any file is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "documentno")]
    pub document_no: String,
    #[serde(rename = "familyname", default)]
    pub family_name: String,
    #[serde(rename = "manualtitle", default)]
    pub title: String,
    #[serde(rename = "productcategory", default)]
    pub product_category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(rename = "productgin", default)]
    pub product_gin: String,
    #[serde(rename = "serialno", default)]
    pub serial_no: String,
    #[serde(rename = "projectno", default)]
    pub project_no: String,
    #[serde(default = "default_public")]
    pub public: bool,
}

fn default_public() -> bool {
    true
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            document_no: String::new(),
            family_name: String::new(),
            title: String::new(),
            product_category: String::new(),
            subcategory: String::new(),
            product_gin: String::new(),
            serial_no: String::new(),
            project_no: String::new(),
            public: true,
        }
    }
}

impl DocumentMetadata {
    pub fn validate(&self) -> DomainResult<()> {
        if self.document_no.trim().is_empty() {
            return Err(DomainError::validation("document number is required"));
        }
        let category = self.product_category.trim();
        if !category.is_empty() && reference::product_category_name(category).is_none() {
            return Err(DomainError::validation(format!(
                "unknown product category '{category}'"
            )));
        }
        Ok(())
    }
}

/// Per-file annotation filled in before upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub lang: String,
    #[serde(rename = "manualtype")]
    pub manual_types: Vec<String>,
    #[serde(rename = "releasedate")]
    pub release_date: Option<String>,
    #[serde(rename = "regions")]
    pub market: MarketFlags,
}

impl FileMetadata {
    /// Language, at least one manual type and a release date are all set.
    pub fn is_complete(&self) -> bool {
        !self.lang.trim().is_empty()
            && !self.manual_types.is_empty()
            && self
                .release_date
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty())
    }

    /// Codes that are filled in must come from the reference lists.
    pub fn validate(&self) -> DomainResult<()> {
        let lang = self.lang.trim();
        if !lang.is_empty() && !reference::is_language(lang) {
            return Err(DomainError::validation(format!("unknown language '{lang}'")));
        }
        if let Some(code) = self
            .manual_types
            .iter()
            .find(|code| !reference::is_manual_type(code.as_str()))
        {
            return Err(DomainError::validation(format!("unknown manual type '{code}'")));
        }
        Ok(())
    }
}

/// Raw file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn pdf(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(name, PDF_CONTENT_TYPE, data)
    }

    /// Content type is `application/pdf`, ignoring case and parameters.
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .split(';')
            .next()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A file selected in the wizard but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file: UploadFile,
    pub public: bool,
    pub metadata: Option<FileMetadata>,
}

impl PendingUpload {
    pub fn new(file: UploadFile) -> Self {
        Self {
            file,
            public: true,
            metadata: None,
        }
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from_public_flag(self.public)
    }

    pub fn is_annotated(&self) -> bool {
        self.metadata.as_ref().is_some_and(FileMetadata::is_complete)
    }

    /// Convert into the persisted variant once the file lives at `url`.
    pub fn into_variant(self, url: String) -> LanguageVariant {
        let metadata = self.metadata.unwrap_or_default();
        LanguageVariant {
            lang: metadata.lang,
            url,
            manual_types: metadata.manual_types,
            release_date: metadata.release_date,
        }
    }
}

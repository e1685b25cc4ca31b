//! Store-boundary row shape and its normalization into `CatalogEntry`.
//!
//! Table rows arrive with every column optional, and the nested columns
//! (`languagevariants`, `market`, legacy `manualtype`) either as structured
//! JSON or as JSON encoded into a string column. `StoredField` tags which one
//! arrived; past `normalize` only the structured form exists.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::catalog::{CatalogEntry, LanguageVariant, MarketFlags};

/// A nested column as it came off (or goes onto) the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredField<T> {
    Structured(T),
    Encoded(String),
    /// Anything else; rejected by `normalize`.
    Invalid(JsonValue),
}

/// A raw table row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntity {
    #[serde(rename = "PartitionKey", default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(rename = "RowKey", default, skip_serializing_if = "Option::is_none")]
    pub row_key: Option<String>,
    #[serde(rename = "documentno", default, skip_serializing_if = "Option::is_none")]
    pub document_no: Option<String>,
    #[serde(rename = "familyname", default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(rename = "manualtitle", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "productcategory", default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
    #[serde(rename = "subcategory", default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(rename = "productgin", default, skip_serializing_if = "Option::is_none")]
    pub product_gin: Option<String>,
    #[serde(rename = "serialno", default, skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(rename = "projectno", default, skip_serializing_if = "Option::is_none")]
    pub project_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(rename = "releasedate", default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(rename = "manualtype", default, skip_serializing_if = "Option::is_none")]
    pub manual_types: Option<StoredField<Vec<String>>>,
    #[serde(rename = "languagevariants", default, skip_serializing_if = "Option::is_none")]
    pub language_variants: Option<StoredField<Vec<LanguageVariant>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<StoredField<MarketFlags>>,
}

impl TableEntity {
    pub fn row_key(&self) -> &str {
        self.row_key.as_deref().unwrap_or_default()
    }

    pub fn partition_key(&self) -> &str {
        self.partition_key.as_deref().unwrap_or_default()
    }
}

/// A nested column could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("row '{row_key}': column '{column}' {reason}")]
pub struct FormatError {
    pub row_key: String,
    pub column: &'static str,
    pub reason: String,
}

/// Normalize a raw row into the canonical in-memory shape.
///
/// Absent text columns become empty strings, absent flags `false`, absent
/// collections empty, absent market flags all-false. Encoded nested columns
/// are decoded; structured ones are taken as they are.
pub fn normalize(raw: TableEntity) -> Result<CatalogEntry, FormatError> {
    let row_key = raw.row_key.unwrap_or_default();

    let language_variants =
        decode_column(raw.language_variants, "languagevariants", &row_key)?.unwrap_or_default();
    let market = decode_column(raw.market, "market", &row_key)?.unwrap_or_default();
    let manual_types = decode_column(raw.manual_types, "manualtype", &row_key)?.unwrap_or_default();

    Ok(CatalogEntry {
        partition_key: raw.partition_key.unwrap_or_default(),
        row_key,
        document_no: raw.document_no.unwrap_or_default(),
        family_name: raw.family_name.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        product_category: raw.product_category.unwrap_or_default(),
        subcategory: raw.subcategory.unwrap_or_default(),
        product_gin: raw.product_gin.unwrap_or_default(),
        serial_no: raw.serial_no.unwrap_or_default(),
        project_no: raw.project_no.unwrap_or_default(),
        public: raw.public.unwrap_or(false),
        language_variants,
        market,
        manual_types,
        release_date: raw.release_date.filter(|d| !d.is_empty()),
    })
}

/// Decode listed rows one at a time. A row whose scalar columns have an
/// unexpected type (a numeric `documentno`, a textual `public`) is logged
/// and skipped.
pub fn decode_rows(values: Vec<JsonValue>) -> Vec<TableEntity> {
    values
        .into_iter()
        .filter_map(|value| {
            let row_key = value
                .get("RowKey")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string();
            match serde_json::from_value::<TableEntity>(value) {
                Ok(row) => Some(row),
                Err(err) => {
                    tracing::warn!(row = %row_key, "skipping undecodable catalog row: {err}");
                    None
                }
            }
        })
        .collect()
}

/// Normalize a whole listing, skipping rows whose nested columns are corrupt.
pub fn normalize_all(rows: Vec<TableEntity>) -> Vec<CatalogEntry> {
    rows.into_iter()
        .filter_map(|row| match normalize(row) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("skipping unreadable catalog row: {err}");
                None
            }
        })
        .collect()
}

/// Write-side shape: nested columns encoded as JSON text, as the table store
/// only holds scalar columns.
pub fn encode(entry: &CatalogEntry) -> Result<TableEntity, FormatError> {
    let row_key = entry.row_key.clone();
    Ok(TableEntity {
        manual_types: Some(encode_column(&entry.manual_types, "manualtype", &row_key)?),
        language_variants: Some(encode_column(
            &entry.language_variants,
            "languagevariants",
            &row_key,
        )?),
        market: Some(encode_column(&entry.market, "market", &row_key)?),
        ..scalar_columns(entry)
    })
}

impl From<CatalogEntry> for TableEntity {
    /// Structured form; `normalize` maps it straight back.
    fn from(entry: CatalogEntry) -> Self {
        let scalars = scalar_columns(&entry);
        TableEntity {
            manual_types: Some(StoredField::Structured(entry.manual_types)),
            language_variants: Some(StoredField::Structured(entry.language_variants)),
            market: Some(StoredField::Structured(entry.market)),
            ..scalars
        }
    }
}

fn scalar_columns(entry: &CatalogEntry) -> TableEntity {
    TableEntity {
        partition_key: Some(entry.partition_key.clone()),
        row_key: Some(entry.row_key.clone()),
        document_no: Some(entry.document_no.clone()),
        family_name: Some(entry.family_name.clone()),
        title: Some(entry.title.clone()),
        product_category: Some(entry.product_category.clone()),
        subcategory: Some(entry.subcategory.clone()),
        product_gin: Some(entry.product_gin.clone()),
        serial_no: Some(entry.serial_no.clone()),
        project_no: Some(entry.project_no.clone()),
        public: Some(entry.public),
        release_date: entry.release_date.clone(),
        manual_types: None,
        language_variants: None,
        market: None,
    }
}

fn decode_column<T: DeserializeOwned>(
    field: Option<StoredField<T>>,
    column: &'static str,
    row_key: &str,
) -> Result<Option<T>, FormatError> {
    match field {
        None => Ok(None),
        Some(StoredField::Structured(value)) => Ok(Some(value)),
        // An empty column is treated as absent.
        Some(StoredField::Encoded(text)) if text.trim().is_empty() => Ok(None),
        Some(StoredField::Encoded(text)) => {
            serde_json::from_str::<Option<T>>(&text).map_err(|e| FormatError {
                row_key: row_key.to_string(),
                column,
                reason: format!("is not valid encoded JSON: {e}"),
            })
        }
        Some(StoredField::Invalid(value)) => Err(FormatError {
            row_key: row_key.to_string(),
            column,
            reason: format!("has unexpected shape: {value}"),
        }),
    }
}

fn encode_column<T: Serialize>(
    value: &T,
    column: &'static str,
    row_key: &str,
) -> Result<StoredField<T>, FormatError> {
    serde_json::to_string(value)
        .map(StoredField::Encoded)
        .map_err(|e| FormatError {
            row_key: row_key.to_string(),
            column,
            reason: format!("could not be encoded: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MarketRegion;
    use serde_json::json;

    fn raw(value: JsonValue) -> TableEntity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_row_normalizes_to_defaults() {
        let entry = normalize(raw(json!({}))).unwrap();
        assert_eq!(entry.document_no, "");
        assert_eq!(entry.project_no, "");
        assert!(!entry.public);
        assert!(entry.language_variants.is_empty());
        assert_eq!(entry.market, MarketFlags::default());
        assert!(entry.manual_types.is_empty());
        assert_eq!(entry.release_date, None);
    }

    #[test]
    fn encoded_columns_are_decoded() {
        let entry = normalize(raw(json!({
            "PartitionKey": "arc",
            "RowKey": "r1",
            "documentno": "DOC-7",
            "public": true,
            "manualtype": "[\"IM\",\"SM\"]",
            "languagevariants": "[{\"lang\":\"en-GB\",\"url\":\"https://x/c/a.pdf\",\"manualtype\":[\"IM\"],\"releasedate\":null}]",
            "market": "{\"EU\":true,\"NA\":false,\"SA\":false,\"ME\":false,\"AS\":false,\"AU\":false,\"IN\":true}",
            "Timestamp": "2024-05-01T10:00:00Z"
        })))
        .unwrap();

        assert_eq!(entry.key().to_string(), "arc/r1");
        assert_eq!(entry.manual_types, vec!["IM", "SM"]);
        assert_eq!(entry.language_variants.len(), 1);
        assert_eq!(entry.language_variants[0].blob_name(), "a.pdf");
        assert_eq!(
            entry.market.selected(),
            vec![MarketRegion::Europe, MarketRegion::India]
        );
    }

    #[test]
    fn structured_columns_are_left_as_they_are() {
        let entry = normalize(raw(json!({
            "RowKey": "r2",
            "languagevariants": [{"lang": "sv-SE", "url": "b.pdf", "manualtype": ["PM"]}],
            "market": {"AS": true}
        })))
        .unwrap();
        assert_eq!(entry.language_variants[0].lang, "sv-SE");
        assert_eq!(entry.language_variants[0].release_date, None);
        assert!(entry.market.asia);
    }

    #[test]
    fn empty_and_null_encoded_columns_count_as_absent() {
        let entry = normalize(raw(json!({
            "languagevariants": "",
            "market": "null",
            "releasedate": ""
        })))
        .unwrap();
        assert!(entry.language_variants.is_empty());
        assert_eq!(entry.market, MarketFlags::default());
        assert_eq!(entry.release_date, None);
    }

    #[test]
    fn corrupt_encoded_column_is_an_error() {
        let err = normalize(raw(json!({"RowKey": "bad", "languagevariants": "[{"}))).unwrap_err();
        assert_eq!(err.row_key, "bad");
        assert_eq!(err.column, "languagevariants");

        let err = normalize(raw(json!({"RowKey": "bad", "market": 42}))).unwrap_err();
        assert_eq!(err.column, "market");
    }

    #[test]
    fn normalize_all_skips_corrupt_rows() {
        let rows = vec![
            raw(json!({"RowKey": "ok", "documentno": "A"})),
            raw(json!({"RowKey": "bad", "market": "{\"ZZ\":true}"})),
        ];
        let entries = normalize_all(rows);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].row_key, "ok");
    }

    #[test]
    fn decode_rows_skips_rows_with_mistyped_scalars() {
        let rows = decode_rows(vec![
            json!({"RowKey": "ok", "documentno": "0463 495 001"}),
            json!({"RowKey": "x", "documentno": 4631001}),
            json!({"RowKey": "y", "public": "true"}),
            json!({"RowKey": "ok2", "public": true}),
        ]);
        let keys: Vec<_> = rows.iter().map(TableEntity::row_key).collect();
        assert_eq!(keys, vec!["ok", "ok2"]);
    }

    #[test]
    fn encode_writes_nested_columns_as_text() {
        let entry = normalize(raw(json!({
            "RowKey": "r3",
            "languagevariants": [{"lang": "fr-FR", "url": "c.pdf", "manualtype": ["TI"]}]
        })))
        .unwrap();
        let stored = serde_json::to_value(encode(&entry).unwrap()).unwrap();
        assert!(stored["languagevariants"].is_string());
        assert!(stored["market"].is_string());
        assert!(stored["manualtype"].is_string());
        assert_eq!(stored["RowKey"], "r3");
        assert_eq!(stored["projectno"], "");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn text() -> impl Strategy<Value = String> {
            "[A-Za-z0-9 ._-]{0,12}"
        }

        fn market() -> impl Strategy<Value = MarketFlags> {
            proptest::collection::vec(any::<bool>(), 7).prop_map(|bits| {
                let mut flags = MarketFlags::default();
                for (region, on) in MarketRegion::ALL.into_iter().zip(bits) {
                    flags.set(region, on);
                }
                flags
            })
        }

        fn variant() -> impl Strategy<Value = LanguageVariant> {
            (
                text(),
                text(),
                proptest::collection::vec(text(), 1..3),
                proptest::option::of(text()),
            )
                .prop_map(|(lang, url, manual_types, release_date)| LanguageVariant {
                    lang,
                    url,
                    manual_types,
                    release_date,
                })
        }

        prop_compose! {
            fn entry()(
                keys in (text(), text(), text(), text()),
                details in (text(), text(), text(), text(), text(), text()),
                public in any::<bool>(),
                language_variants in proptest::collection::vec(variant(), 0..4),
                market in market(),
                manual_types in proptest::collection::vec(text(), 0..3),
                release_date in proptest::option::of("[0-9]{4}-[0-9]{2}-[0-9]{2}"),
            ) -> CatalogEntry {
                let (partition_key, row_key, document_no, project_no) = keys;
                let (family_name, title, product_category, subcategory, product_gin, serial_no) = details;
                CatalogEntry {
                    partition_key,
                    row_key,
                    document_no,
                    family_name,
                    title,
                    product_category,
                    subcategory,
                    product_gin,
                    serial_no,
                    project_no,
                    public,
                    language_variants,
                    market,
                    manual_types,
                    release_date,
                }
            }
        }

        proptest! {
            /// Property: the write-side encoding reads back to the same entry.
            #[test]
            fn encode_then_normalize_reproduces_entry(e in entry()) {
                let stored = encode(&e).unwrap();
                prop_assert!(matches!(stored.language_variants, Some(StoredField::Encoded(_))));
                prop_assert!(matches!(stored.market, Some(StoredField::Encoded(_))));

                // Through the wire, as the table store would hand it back.
                let wire = serde_json::to_string(&stored).unwrap();
                let back: TableEntity = serde_json::from_str(&wire).unwrap();
                prop_assert_eq!(normalize(back).unwrap(), e);
            }

            /// Property: normalizing an already-normalized entry is a no-op.
            #[test]
            fn normalize_is_idempotent_on_structured_entries(e in entry()) {
                let once = normalize(TableEntity::from(e.clone())).unwrap();
                prop_assert_eq!(&once, &e);
                let twice = normalize(TableEntity::from(once.clone())).unwrap();
                prop_assert_eq!(twice, once);
            }

            /// Property: encoded and structured inputs normalize identically.
            #[test]
            fn encoded_and_structured_inputs_agree(
                variants in proptest::collection::vec(variant(), 0..4),
                flags in market(),
            ) {
                let structured = TableEntity {
                    language_variants: Some(StoredField::Structured(variants.clone())),
                    market: Some(StoredField::Structured(flags)),
                    ..Default::default()
                };
                let encoded = TableEntity {
                    language_variants: Some(StoredField::Encoded(serde_json::to_string(&variants).unwrap())),
                    market: Some(StoredField::Encoded(serde_json::to_string(&flags).unwrap())),
                    ..Default::default()
                };
                let a = normalize(structured).unwrap();
                let b = normalize(encoded).unwrap();
                prop_assert_eq!(&a.language_variants, &variants);
                prop_assert_eq!(a.market, flags);
                prop_assert_eq!(a, b);
            }
        }
    }
}

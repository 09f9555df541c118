//! Input file discovery and loading.
//!
//! Reads pharmacy CSV files and claim/revert JSON files from their
//! directories, validates each record and returns the admitted records with a
//! [`LoadReport`]. A file that cannot be read or parsed is logged and skipped
//! as a whole; a missing directory aborts the stage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use claims_core::data_processors::RecordValidator;
use claims_core::error::{ClaimsError, Result};
use claims_core::models::{Claim, Pharmacy, PharmacyDirectory, Revert, RevertAdmission};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

// ── LoadReport ────────────────────────────────────────────────────────────────

/// Counters collected while loading one input directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Data files discovered in the directory.
    pub files_found: usize,
    /// Files skipped because they could not be read or parsed.
    pub files_skipped: usize,
    /// Records found in the files that were read.
    pub records_seen: usize,
    /// Records that passed validation.
    pub records_admitted: usize,
}

impl LoadReport {
    /// Records dropped by validation.
    pub fn records_rejected(&self) -> usize {
        self.records_seen - self.records_admitted
    }

    fn log(&self, kind: &str, dir: &Path) {
        info!(
            "Loaded {} {} from {} ({} of {} files read, {} records rejected)",
            self.records_admitted,
            kind,
            dir.display(),
            self.files_found - self.files_skipped,
            self.files_found,
            self.records_rejected(),
        );
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all files with the given extension directly inside `dir`, sorted by
/// path.
///
/// Fails with [`ClaimsError::DataPathNotFound`] when `dir` is not an existing
/// directory. An entry that cannot be inspected (a dangling symlink, a
/// permission error) is still returned when its name carries the extension,
/// so the loader reports it as a skipped file.
pub fn find_data_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ClaimsError::DataPathNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => match e.path() {
                Some(path) if has_extension(path, extension) => {
                    debug!("Cannot inspect {}: {}", path.display(), e);
                    files.push(path.to_path_buf());
                }
                _ => warn!("Ignoring unreadable entry in {}: {}", dir.display(), e),
            },
        }
    }

    files.sort();
    Ok(files)
}

/// Load every `*.csv` file in `dir` into a [`PharmacyDirectory`].
///
/// Files are applied in path order, so a later file overwrites the chain of
/// an NPI seen in an earlier one.
pub fn load_pharmacies(dir: &Path) -> Result<(PharmacyDirectory, LoadReport)> {
    info!("Loading pharmacies from {}", dir.display());
    let files = find_data_files(dir, "csv")?;
    if files.is_empty() {
        warn!("No CSV files found in {}", dir.display());
    }

    let mut directory = PharmacyDirectory::new();
    let mut report = LoadReport {
        files_found: files.len(),
        ..LoadReport::default()
    };

    for file_path in &files {
        debug!("Processing pharmacy file: {}", file_path.display());
        match read_pharmacy_file(file_path) {
            Ok((rows, seen)) => {
                report.records_seen += seen;
                report.records_admitted += rows.len();
                directory.extend(rows);
            }
            Err(e) if e.is_per_file() => {
                warn!("Skipping pharmacy file: {}", e);
                report.files_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    report.log("pharmacy rows", dir);
    Ok((directory, report))
}

/// Load every `*.json` file in `dir` as claims.
///
/// Claims that fail validation, or that reference a pharmacy missing from
/// `pharmacies`, are dropped.
pub fn load_claims(dir: &Path, pharmacies: &PharmacyDirectory) -> Result<(Vec<Claim>, LoadReport)> {
    info!("Loading claims from {}", dir.display());
    let (claims, report) = load_json_dir(dir, |record| {
        match RecordValidator::validate_claim(record) {
            Ok(claim) if pharmacies.contains(&claim.npi) => Some(claim),
            Ok(claim) => {
                debug!("Dropping claim {}: unknown pharmacy {}", claim.id, claim.npi);
                None
            }
            Err(reason) => {
                debug!("Dropping claim record: {}", reason);
                None
            }
        }
    })?;

    report.log("claims", dir);
    Ok((claims, report))
}

/// Load every `*.json` file in `dir` as reverts under `admission`.
pub fn load_reverts(dir: &Path, admission: RevertAdmission) -> Result<(Vec<Revert>, LoadReport)> {
    info!("Loading reverts from {}", dir.display());
    let (reverts, report) = load_json_dir(dir, |record| {
        match RecordValidator::validate_revert(record, admission) {
            Ok(revert) => Some(revert),
            Err(reason) => {
                debug!("Dropping revert record: {}", reason);
                None
            }
        }
    })?;

    report.log("reverts", dir);
    Ok((reverts, report))
}

/// Read a JSON file holding either one record object or an array of them.
///
/// Array elements are returned as-is; the validator rejects non-objects.
pub fn read_json_records(file_path: &Path) -> Result<Vec<Value>> {
    let bytes = std::fs::read(file_path).map_err(|source| ClaimsError::FileRead {
        path: file_path.to_path_buf(),
        source,
    })?;

    let document: Value =
        serde_json::from_slice(&bytes).map_err(|source| ClaimsError::JsonParse {
            path: file_path.to_path_buf(),
            source,
        })?;

    match document {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![document]),
        other => Err(ClaimsError::UnexpectedDocument {
            path: file_path.to_path_buf(),
            found: json_kind(&other),
        }),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Shared driver for the JSON directories. `admit` returns the typed record
/// for a raw value, or `None` to drop it.
fn load_json_dir<T>(
    dir: &Path,
    mut admit: impl FnMut(&Value) -> Option<T>,
) -> Result<(Vec<T>, LoadReport)> {
    let files = find_data_files(dir, "json")?;
    if files.is_empty() {
        warn!("No JSON files found in {}", dir.display());
    }

    let mut admitted: Vec<T> = Vec::new();
    let mut report = LoadReport {
        files_found: files.len(),
        ..LoadReport::default()
    };

    for file_path in &files {
        debug!("Processing file: {}", file_path.display());
        let records = match read_json_records(file_path) {
            Ok(records) => records,
            Err(e) if e.is_per_file() => {
                warn!("Skipping file: {}", e);
                report.files_skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        report.records_seen += records.len();
        let before = admitted.len();
        admitted.extend(records.iter().filter_map(&mut admit));
        report.records_admitted += admitted.len() - before;
    }

    Ok((admitted, report))
}

/// Parse one pharmacy CSV file. Returns the usable rows and the number of
/// data rows read.
fn read_pharmacy_file(file_path: &Path) -> Result<(Vec<Pharmacy>, usize)> {
    let csv_error = |source: csv::Error| ClaimsError::CsvParse {
        path: file_path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(file_path).map_err(|source| ClaimsError::FileRead {
        path: file_path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    let missing: Vec<&str> = ["npi", "chain"]
        .into_iter()
        .filter(|column| !header_map.contains_key(*column))
        .collect();
    if !missing.is_empty() {
        return Err(ClaimsError::MissingColumns {
            path: file_path.to_path_buf(),
            columns: missing.join(", "),
        });
    }
    let npi_idx = header_map["npi"];
    let chain_idx = header_map["chain"];

    let mut rows = Vec::new();
    let mut seen = 0usize;
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        seen += 1;

        let npi = record.get(npi_idx).map(str::trim).unwrap_or_default();
        let chain = record.get(chain_idx).map(str::trim).unwrap_or_default();
        if npi.is_empty() || chain.is_empty() {
            continue;
        }
        rows.push(Pharmacy {
            npi: npi.to_string(),
            chain: chain.to_string(),
        });
    }

    Ok((rows, seen))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().map(|ext| ext == extension).unwrap_or(false)
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn sample_claim(id: &str, npi: &str) -> Value {
        json!({
            "id": id,
            "npi": npi,
            "ndc": "d1",
            "price": 100.0,
            "quantity": 10.0,
            "timestamp": "2024-03-01T10:00:00",
        })
    }

    fn directory_with(npis: &[&str]) -> PharmacyDirectory {
        npis.iter()
            .map(|npi| Pharmacy {
                npi: npi.to_string(),
                chain: "CVS".to_string(),
            })
            .collect()
    }

    // ── find_data_files ───────────────────────────────────────────────────────

    #[test]
    fn test_find_data_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "c.json", "{}");
        write_file(dir.path(), "a.json", "{}");
        write_file(dir.path(), "b.csv", "npi,chain");
        write_file(dir.path(), "notes.txt", "");

        let files = find_data_files(dir.path(), "json").unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json", "c.json"]);
    }

    #[test]
    fn test_find_data_files_not_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir_all(&sub).unwrap();
        write_file(&sub, "deep.json", "{}");
        write_file(dir.path(), "top.json", "{}");

        let files = find_data_files(dir.path(), "json").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("top.json"));
    }

    #[test]
    fn test_find_data_files_missing_directory_is_fatal() {
        let err = find_data_files(Path::new("/tmp/does-not-exist-claims-xyz"), "json").unwrap_err();
        assert!(matches!(err, ClaimsError::DataPathNotFound(_)));
        assert!(!err.is_per_file());
    }

    #[test]
    fn test_find_data_files_file_instead_of_directory() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "claims.json", "{}");
        assert!(matches!(
            find_data_files(&file, "json"),
            Err(ClaimsError::DataPathNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_data_files_keeps_dangling_symlink() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.json", "{}");
        std::os::unix::fs::symlink(dir.path().join("missing.json"), dir.path().join("b.json"))
            .unwrap();

        let files = find_data_files(dir.path(), "json").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[1].ends_with("b.json"));
    }

    // ── read_json_records ─────────────────────────────────────────────────────

    #[test]
    fn test_read_json_records_single_object() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "one.json", &sample_claim("c1", "1").to_string());
        assert_eq!(read_json_records(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_read_json_records_array() {
        let dir = TempDir::new().unwrap();
        let body = json!([sample_claim("c1", "1"), sample_claim("c2", "1")]).to_string();
        let path = write_file(dir.path(), "many.json", &body);
        assert_eq!(read_json_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_read_json_records_scalar_document() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "scalar.json", "42");
        let err = read_json_records(&path).unwrap_err();
        assert!(matches!(
            err,
            ClaimsError::UnexpectedDocument { found: "number", .. }
        ));
        assert!(err.is_per_file());
    }

    #[test]
    fn test_read_json_records_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "bad.json", "{not valid json");
        assert!(matches!(
            read_json_records(&path),
            Err(ClaimsError::JsonParse { .. })
        ));
    }

    // ── load_pharmacies ───────────────────────────────────────────────────────

    #[test]
    fn test_load_pharmacies_basic() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "pharmacies.csv", "chain,npi\nCVS,1\nWalgreens,2\n");

        let (directory, report) = load_pharmacies(dir.path()).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.chain_for("1"), Some("CVS"));
        assert_eq!(directory.chain_for("2"), Some("Walgreens"));
        assert_eq!(report.records_admitted, 2);
    }

    #[test]
    fn test_load_pharmacies_last_file_wins() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.csv", "npi,chain\n1,CVS\n");
        write_file(dir.path(), "b.csv", "npi,chain\n1,Walgreens\n");

        let (directory, _) = load_pharmacies(dir.path()).unwrap();
        assert_eq!(directory.chain_for("1"), Some("Walgreens"));
    }

    #[test]
    fn test_load_pharmacies_trims_and_skips_empty_values() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "p.csv",
            "npi , chain\n  7 ,  health  \n8,\n,doctor\n",
        );

        let (directory, report) = load_pharmacies(dir.path()).unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.chain_for("7"), Some("health"));
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.records_rejected(), 2);
    }

    #[test]
    fn test_load_pharmacies_strips_bom_from_header() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "bom.csv", "\u{feff}npi,chain\n1,CVS\n");

        let (directory, _) = load_pharmacies(dir.path()).unwrap();
        assert_eq!(directory.chain_for("1"), Some("CVS"));
    }

    #[test]
    fn test_load_pharmacies_missing_column_skips_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.csv", "npi,name\n1,Store\n");
        write_file(dir.path(), "b.csv", "npi,chain\n2,CVS\n");

        let (directory, report) = load_pharmacies(dir.path()).unwrap();
        assert_eq!(directory.len(), 1);
        assert!(directory.contains("2"));
        assert_eq!(report.files_found, 2);
        assert_eq!(report.files_skipped, 1);
    }

    #[test]
    fn test_load_pharmacies_missing_directory() {
        let err = load_pharmacies(Path::new("/tmp/does-not-exist-pharmacies-xyz")).unwrap_err();
        assert!(matches!(err, ClaimsError::DataPathNotFound(_)));
    }

    #[test]
    fn test_load_pharmacies_empty_directory() {
        let dir = TempDir::new().unwrap();
        let (directory, report) = load_pharmacies(dir.path()).unwrap();
        assert!(directory.is_empty());
        assert_eq!(report, LoadReport::default());
    }

    // ── load_claims ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_claims_object_and_array_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.json", &sample_claim("c1", "1").to_string());
        write_file(
            dir.path(),
            "b.json",
            &json!([sample_claim("c2", "1"), sample_claim("c3", "1")]).to_string(),
        );

        let (claims, report) = load_claims(dir.path(), &directory_with(&["1"])).unwrap();
        let ids: Vec<&str> = claims.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.records_admitted, 3);
    }

    #[test]
    fn test_load_claims_numeric_id_and_ndc() {
        let dir = TempDir::new().unwrap();
        let mut numeric_id = sample_claim("c7", "1");
        numeric_id["id"] = json!(7);
        let mut numeric_ndc = sample_claim("c8", "1");
        numeric_ndc["ndc"] = json!(12345);
        write_file(
            dir.path(),
            "claims.json",
            &json!([numeric_id, numeric_ndc]).to_string(),
        );

        let (claims, report) = load_claims(dir.path(), &directory_with(&["1"])).unwrap();
        assert_eq!(report.records_seen, 2);
        assert_eq!(report.records_admitted, 2);
        assert_eq!(claims[0].id, "7");
        assert_eq!(claims[1].ndc, "12345");
    }

    #[cfg(unix)]
    #[test]
    fn test_load_claims_dangling_symlink_counted_as_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.json", &sample_claim("c1", "1").to_string());
        std::os::unix::fs::symlink(dir.path().join("missing.json"), dir.path().join("b.json"))
            .unwrap();

        let (claims, report) = load_claims(dir.path(), &directory_with(&["1"])).unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(report.files_found, 2);
        assert_eq!(report.files_skipped, 1);
    }

    #[test]
    fn test_load_claims_unknown_pharmacy_dropped() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "claims.json",
            &json!([sample_claim("c1", "1"), sample_claim("c2", "999")]).to_string(),
        );

        let (claims, report) = load_claims(dir.path(), &directory_with(&["1"])).unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].id, "c1");
        assert_eq!(report.records_rejected(), 1);
    }

    #[test]
    fn test_load_claims_invalid_records_dropped() {
        let dir = TempDir::new().unwrap();
        let mut no_price = sample_claim("c2", "1");
        no_price.as_object_mut().unwrap().remove("price");
        let mut bad_quantity = sample_claim("c3", "1");
        bad_quantity["quantity"] = json!("a few");
        write_file(
            dir.path(),
            "claims.json",
            &json!([sample_claim("c1", "1"), no_price, bad_quantity, "junk"]).to_string(),
        );

        let (claims, report) = load_claims(dir.path(), &directory_with(&["1"])).unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(report.records_seen, 4);
        assert_eq!(report.records_admitted, 1);
    }

    #[test]
    fn test_load_claims_malformed_file_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.json", "{broken");
        write_file(dir.path(), "b.json", &sample_claim("c1", "1").to_string());
        write_file(dir.path(), "c.json", "\"just a string\"");

        let (claims, report) = load_claims(dir.path(), &directory_with(&["1"])).unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(report.files_found, 3);
        assert_eq!(report.files_skipped, 2);
    }

    #[test]
    fn test_load_claims_missing_directory() {
        let err = load_claims(
            Path::new("/tmp/does-not-exist-claims-xyz"),
            &PharmacyDirectory::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ClaimsError::DataPathNotFound(_)));
    }

    // ── load_reverts ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_reverts_validate() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "reverts.json",
            &json!([
                {"id": "r1", "claim_id": "c1", "timestamp": "t"},
                {"id": "r2", "timestamp": "t"},
            ])
            .to_string(),
        );

        let (reverts, report) = load_reverts(dir.path(), RevertAdmission::Validate).unwrap();
        assert_eq!(reverts.len(), 1);
        assert_eq!(reverts[0].claim_id, "c1");
        assert_eq!(report.records_rejected(), 1);
    }

    #[test]
    fn test_load_reverts_legacy_admits_nothing() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "reverts.json",
            &json!({"id": "r1", "claim_id": "c1", "timestamp": "t"}).to_string(),
        );

        let (reverts, report) = load_reverts(dir.path(), RevertAdmission::Legacy).unwrap();
        assert!(reverts.is_empty());
        assert_eq!(report.records_seen, 1);
        assert_eq!(report.records_admitted, 0);
    }

    #[test]
    fn test_load_reverts_for_claims_never_admitted() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "reverts.json",
            &json!({"id": "r9", "claim_id": "never-seen", "timestamp": "t"}).to_string(),
        );

        let (reverts, _) = load_reverts(dir.path(), RevertAdmission::Validate).unwrap();
        assert_eq!(reverts.len(), 1);
    }
}

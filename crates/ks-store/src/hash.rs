//! Content-based case identity.

use ks_model::CaseSpec;
use sha1::{Digest, Sha1};

/// SHA-1 over the canonical JSON encoding of the identity fields.
///
/// Exactly these eight fields participate; display name and timestamps do
/// not. The encoding is compact with sorted keys (serde_json's default map
/// ordering), so two specs with equal field values always hash alike.
pub fn case_hash(spec: &CaseSpec) -> String {
    let canonical = serde_json::json!({
        "driver": spec.driver,
        "drivers": spec.drivers,
        "output": spec.output,
        "outputs": spec.outputs,
        "sweep": spec.sweep,
        "solver": spec.solver,
        "loads": spec.loads,
        "measurements": spec.measurements,
    });

    let mut hasher = Sha1::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Case ids are the first 12 hex characters of the content hash.
pub fn case_id_from_hash(hash: &str) -> String {
    hash.chars().take(12).collect()
}

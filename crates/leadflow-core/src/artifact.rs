//! Result artifact persistence.
//!
//! A completed [`PipelineResult`] is written to
//! `<dir>/<session_id>/result.json` with a companion `result.digest` holding
//! the SHA-256 of the JSON bytes. Reading re-hashes the file and rejects it
//! on mismatch.

use std::path::{Path, PathBuf};

use leadflow_state::{ContentDigest, SessionId};

use crate::domain::{PipelineError, PipelineResult, Result};

const RESULT_FILE: &str = "result.json";
const DIGEST_FILE: &str = "result.digest";

fn session_dir(dir: &Path, session_id: &SessionId) -> Result<PathBuf> {
    let id = session_id.as_str();
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(PipelineError::invalid(
            "session_id",
            format!("'{id}' is not usable as a directory name"),
        ));
    }
    Ok(dir.join(id))
}

/// Write `result` under `dir`. Returns the path to `result.json`.
pub fn write_result_artifact(result: &PipelineResult, dir: &Path) -> Result<PathBuf> {
    let session_dir = session_dir(dir, &result.session_id)?;
    std::fs::create_dir_all(&session_dir)?;

    let json = serde_json::to_vec_pretty(result)?;
    let digest = ContentDigest::from_bytes(&json);

    let result_path = session_dir.join(RESULT_FILE);
    std::fs::write(&result_path, &json)?;
    std::fs::write(session_dir.join(DIGEST_FILE), digest.as_str().as_bytes())?;

    tracing::debug!(
        session_id = %result.session_id,
        digest = %digest.short(),
        path = %result_path.display(),
        "result artifact written"
    );
    Ok(result_path)
}

/// Read and integrity-check the artifact for `session_id`.
///
/// Returns `PipelineError::DigestMismatch` if `result.json` no longer hashes
/// to the value in `result.digest`.
pub fn read_result_artifact(session_id: &SessionId, dir: &Path) -> Result<PipelineResult> {
    let session_dir = session_dir(dir, session_id)?;

    let json = std::fs::read(session_dir.join(RESULT_FILE))?;
    let expected = std::fs::read_to_string(session_dir.join(DIGEST_FILE))?
        .trim()
        .to_ascii_lowercase();
    let actual = ContentDigest::from_bytes(&json);

    if actual.as_str() != expected {
        return Err(PipelineError::DigestMismatch {
            expected,
            actual: actual.as_str().to_string(),
        });
    }

    Ok(serde_json::from_slice(&json)?)
}

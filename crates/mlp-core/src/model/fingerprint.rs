use serde::Serialize;
use serde_json::Value;

/// Insumos del fingerprint de un stage (modelo previo a canonicalizar).
///
/// Dos intentos con los mismos inputs, params y outputs producen el mismo
/// fingerprint; es lo que permite comprobar que un reintento fue idempotente.
#[derive(Serialize)]
pub struct StageFingerprintInput<'a> {
    pub engine_version: &'a str,
    pub definition_hash: &'a str,
    pub stage_index: usize,
    pub stage_id: &'a str,
    pub input_hashes: &'a [String],
    pub output_hashes: &'a [String],
    pub params: &'a Value,
}

use serde::{Deserialize, Serialize};

/// Estado de un stage dentro de una corrida.
///
/// Transiciones válidas por intento:
/// - `Pending` -> `Running`
/// - `Running` -> `Succeeded`
/// - `Running` -> `Failed`
///
/// Un reintento vuelve a `Running` desde un intento `Failed`; nunca se
/// retrocede desde `Succeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}


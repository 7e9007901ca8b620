//! Constantes del motor core.
//!
//! Valores estáticos que participan en el cálculo de fingerprints. Cambiar
//! `ENGINE_VERSION` invalida los fingerprints de corridas anteriores aunque la
//! definición y los datos no cambien.

/// Versión lógica del executor. Forma parte del input de cada fingerprint.
pub const ENGINE_VERSION: &str = "P1.0";

/// Nombre de la señal emitida cuando un entrenamiento no converge.
pub const SIGNAL_CONVERGENCE_WARNING: &str = "CONVERGENCE_WARNING";

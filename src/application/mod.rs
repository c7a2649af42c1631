// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Coordinates the data and infra layers to accomplish one goal
// per use case:
//
//   preprocess : corpus + vectors → artifact directory
//   inspect    : artifact directory → validated summary
//
// Rules for this layer:
//   - No tokenization, counting or sampling here (Layer 4)
//   - No printing here (Layer 1)
//   - File formats belong to Layer 5; this layer only says what
//     gets saved and when

/// Run configuration loaded from JSON
pub mod config;

/// The full preprocessing workflow
pub mod preprocess_use_case;

/// Loading and validating a finished run
pub mod inspect_use_case;

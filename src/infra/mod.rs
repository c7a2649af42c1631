// ============================================================
// Layer 5 — Infrastructure Layer
// ============================================================
// Everything that touches the target directory:
//
//   artifact_store.rs  : JSON persistence of the worddict,
//                        labeldict, indexed splits, embedding
//                        matrix and the effective config.
//                        Loading re-validates each artifact.
//
//   tokenizer_store.rs : Exports the worddict as a HuggingFace
//                        tokenizer.json and loads it back with
//                        the tokenizers crate.
//
//   report.rs          : Per-split coverage figures written to
//                        report.csv.
//
// The data layer never sees a file path of the target directory;
// it returns values and this layer decides where they live.

/// Run artifacts as JSON files
pub mod artifact_store;

/// tokenizer.json export
pub mod tokenizer_store;

/// Coverage CSV
pub mod report;

// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, errors and traits that define what the
// preprocessing pipeline talks about: raw sentence pairs,
// indexed sentence pairs, and the ways preprocessing can fail.
//
// Rules for this layer:
//   - NO burn or tokenizers types
//   - NO file I/O
//   - Only data definitions and the seams other layers implement
//
// Everything above this layer (data, infra, application) speaks
// in these types, so the vocabulary built from the training
// split and the records indexed with it always line up.

// Raw and indexed sentence-pair records
pub mod record;

// Typed error taxonomy for the preprocessing core
pub mod error;

// Seams implemented by the data layer
pub mod traits;

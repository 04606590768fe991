//! Query matching and scoring.
//!
//! - [`SequenceMatcher`](engine::SequenceMatcher): finds the references that
//!   share k-mers with each query
//! - [`scoring`]: Jaccard similarity, reference coverage, thresholds and
//!   best-hit selection
//!
//! ## Scores
//!
//! For a query k-mer set `Q`, a reference k-mer set `R` and `M = Q ∩ R`:
//!
//! | Score    | Formula                   |
//! |----------|---------------------------|
//! | Jaccard  | `|M| / (|Q| + |R| - |M|)` |
//! | Coverage | `|M| / |R|`               |

pub mod engine;
pub mod scoring;

// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per pipeline stage. Each owns a serialisable
// config and wires the data, ml and infra layers together.
//
// Rules for this layer:
//   - No ranking math here (that's Layer 5)
//   - No argument parsing or result printing (that's Layer 1)
//   - Only workflow coordination

// experiment tables → distance tables
pub mod distance_use_case;

// experiment tables + distance tables → merged datasets
pub mod merge_use_case;

// merged dataset → leave-one-language-out NDCG@3 report
pub mod rank_use_case;

// two score sets → Wilcoxon signed-rank test
pub mod significance_use_case;

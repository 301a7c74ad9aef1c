// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no model math, no argument
// parsing, no printing.

// The training workflow
pub mod train_use_case;

// Checkpoint-backed projection of a single file
pub mod project_use_case;

// ============================================================
// Layer 2 — Application / Run Orchestration
// ============================================================
// Drives a validated invocation to completion: generate or
// load the grid, advance it in increments, write a checkpoint
// after each one.
//
// Rules for this layer:
//   - No physics here (that's Layer 5, the kernel)
//   - No argument parsing or printing (that's Layer 1)
//   - File naming and timing live in Layer 6 (infra)
//   - Only workflow coordination

// The mode-driven simulation loop
pub mod run_loop;

// Settings that do not come from the command line
pub mod settings;

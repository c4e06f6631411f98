// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing a run:
//   - what the user asked for       (invocation)
//   - what can go wrong             (error)
//   - what the physics must provide (traits)
//
// Rules for this layer:
//   - NO file I/O
//   - NO simulation kernels
//   - NO logging setup

// The validated command line, dimension and step schedule
pub mod invocation;

// Usage / input / kernel error taxonomy
pub mod error;

// The simulation collaborator trait
pub mod traits;

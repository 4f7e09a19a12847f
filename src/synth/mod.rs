//! Case synthesis: structural model to abstract test cases.

pub mod cases;
pub mod security;
pub mod values;

pub use cases::{synthesize, CaseKind, Expected, MockBehavior, MockSpec, TestCaseSpec};
pub use values::{BaseType, Literal, ValueTables};


pub mod error;
pub mod implicit;
pub mod script;
pub mod session;
pub mod prelude;

pub use error::{ProofError, Failure, StepKind, ProofkitError};
pub use implicit::{Implicits, ImplicitSite};
pub use script::{By, Step, Script, Verdict, Outcome, proof, try_proof, try_example};
pub use session::{ProofSession, StepResult, State, CompletedProof, begin_proof, begin_example};

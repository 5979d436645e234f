pub mod check_in;
pub mod gate;
pub mod outcome;
pub mod publish;

pub use check_in::{CheckInPipeline, CheckInPipelineBuilder};
pub use gate::CheckInGate;
pub use outcome::{CheckInOutcome, FaultStage};
pub use publish::ResultSink;

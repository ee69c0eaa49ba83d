use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline has not been started")]
    NotStarted,

    #[error("Pipeline channel is closed")]
    Closed,

    #[error("Spec error: {0}")]
    Spec(#[from] oasgen_spec::SpecError),
}

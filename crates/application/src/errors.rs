use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("request carried no question")]
    NoQuestion,

    #[error("request carried {0} questions, expected exactly one")]
    MultipleQuestions(usize),

    #[error("forwarder pool is not accepting jobs (shut down or all workers gone)")]
    ForwarderUnavailable,

    #[error("forwarder dropped the job without a response")]
    JobAbandoned,
}

use hickory_proto::op::Message;
use tokio::sync::oneshot;

/// One in-flight forwarded query. Owned by exactly one pool worker between
/// submission and response; the response channel has capacity for a single
/// message (P5: at most one response is ever delivered).
pub struct Job {
    pub request: Message,
    response_tx: oneshot::Sender<Message>,
}

impl Job {
    /// Build a job and the single-shot receiver the caller awaits for the
    /// response.
    pub fn new(request: Message) -> (Self, oneshot::Receiver<Message>) {
        let (response_tx, response_rx) = oneshot::channel();
        (
            Self {
                request,
                response_tx,
            },
            response_rx,
        )
    }

    /// Deliver the response to whoever is awaiting this job. Consumes the
    /// job: a response can be delivered at most once.
    pub fn respond(self, response: Message) {
        // The receiving half may already have been dropped (listener gave up
        // on the deadline); that is not an error for the worker.
        let _ = self.response_tx.send(response);
    }
}

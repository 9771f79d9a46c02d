use crate::errors::ApplicationError;
use crate::job::Job;
use crate::ports::{BlocklistStore, Forwarder, MetricsRecorder, QueryLogger, QueryStatus};
use dnsward_domain::Config;
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::{rdata::TXT, RData, Record};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

/// What the handler decided to do with a query, returned alongside the reply
/// so callers (and tests) can assert on it without re-deriving it from the
/// reply's RCODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Forwarded,
    Blocklisted,
    RejectedByClient,
}

impl From<QueryOutcome> for QueryStatus {
    fn from(outcome: QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Forwarded => QueryStatus::Ok,
            QueryOutcome::Blocklisted => QueryStatus::Blocklisted,
            QueryOutcome::RejectedByClient => QueryStatus::RejectedByClient,
        }
    }
}

/// The DNS query handler use case: decides accept / reject-by-client /
/// reject-by-blocklist, synthesizes rejection responses, and otherwise hands
/// accepted queries to the forwarder and returns the upstream reply.
///
/// Holds no long-lived state beyond the current blocklist reference and the
/// immutable config; blocklist replacement is handled entirely by the
/// `BlocklistStore` it was built with.
pub struct QueryHandler {
    config: Arc<Config>,
    blocklist: Arc<dyn BlocklistStore>,
    forwarder: Arc<dyn Forwarder>,
    query_logger: Arc<dyn QueryLogger>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl QueryHandler {
    pub fn new(
        config: Arc<Config>,
        blocklist: Arc<dyn BlocklistStore>,
        forwarder: Arc<dyn Forwarder>,
        query_logger: Arc<dyn QueryLogger>,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Self {
            config,
            blocklist,
            forwarder,
            query_logger,
            metrics,
        }
    }

    /// Handle one request from `client_addr` (the textual form of the peer
    /// IP). Returns the reply to write back to the client.
    ///
    /// We don't have to support `request.queries().len() > 1`:
    /// https://serverfault.com/questions/742785/multi-query-multiple-dns-record-types-at-once
    pub async fn handle(
        &self,
        request: Message,
        client_addr: &str,
    ) -> Result<(Message, QueryOutcome), ApplicationError> {
        let started = Instant::now();
        self.metrics.record_request();

        let question_count = request.queries().len();
        if question_count == 0 {
            error!(client = client_addr, "dropping request with no question");
            return Err(ApplicationError::NoQuestion);
        }
        if question_count > 1 {
            error!(
                client = client_addr,
                questions = question_count,
                "dropping request with more than one question"
            );
            return Err(ApplicationError::MultipleQuestions(question_count));
        }

        let name = request.queries()[0].name().to_utf8();
        let policy = self.config.policy_for(client_addr);
        let blocklisted = self.blocklist.current().has(&name);

        let outcome = if policy.reject_all_queries {
            QueryOutcome::RejectedByClient
        } else if blocklisted && !policy.disable_blocklisting {
            QueryOutcome::Blocklisted
        } else {
            QueryOutcome::Forwarded
        };

        self.query_logger
            .log_query(outcome.into(), &name, client_addr);

        let reply = match outcome {
            QueryOutcome::RejectedByClient | QueryOutcome::Blocklisted => {
                reject_reply(&request)
            }
            QueryOutcome::Forwarded => self.forward(request).await?,
        };

        self.metrics
            .record_outcome(outcome.into(), started.elapsed());

        Ok((reply, outcome))
    }

    async fn forward(&self, request: Message) -> Result<Message, ApplicationError> {
        let (job, response_rx) = Job::new(request);
        self.forwarder.submit(job).await?;
        response_rx.await.map_err(|_| ApplicationError::JobAbandoned)
    }
}

/// Synthesize a rejection reply: RCODE NXDOMAIN, AA=1, RA=0, with a TXT
/// record in the authority section naming the matched filter.
fn reject_reply(request: &Message) -> Message {
    let question = request.queries()[0].clone();
    let name = question.name().clone();

    let mut reply = Message::new();
    reply.set_id(request.id());
    reply.set_message_type(MessageType::Response);
    reply.set_op_code(request.op_code());
    reply.add_query(question);
    reply.set_response_code(ResponseCode::NXDomain);
    reply.set_authoritative(true);
    reply.set_recursion_desired(request.recursion_desired());
    reply.set_recursion_available(false);

    let txt = RData::TXT(TXT::new(vec![
        "Rejected query based on matched filters".to_string()
    ]));
    reply.add_name_server(Record::from_rdata(name, 0, txt));

    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{BlocklistStore, Forwarder, QueryLogger};
    use dnsward_domain::Blocklist;
    use hickory_proto::op::{OpCode, Query};
    use hickory_proto::rr::{DNSClass, Name, RecordType};
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeBlocklistStore {
        blocklist: Mutex<Arc<Blocklist>>,
    }

    impl FakeBlocklistStore {
        fn new(blocklist: Blocklist) -> Self {
            Self {
                blocklist: Mutex::new(Arc::new(blocklist)),
            }
        }
    }

    impl BlocklistStore for FakeBlocklistStore {
        fn current(&self) -> Arc<Blocklist> {
            self.blocklist.lock().unwrap().clone()
        }

        fn replace(&self, new: Blocklist) {
            *self.blocklist.lock().unwrap() = Arc::new(new);
        }
    }

    struct EchoForwarder {
        calls: AtomicUsize,
    }

    impl EchoForwarder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Forwarder for EchoForwarder {
        async fn submit(&self, job: Job) -> Result<(), ApplicationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut response = job.request.clone();
            response.set_message_type(MessageType::Response);
            job.respond(response);
            Ok(())
        }
    }

    struct NilQueryLogger;
    impl QueryLogger for NilQueryLogger {
        fn log_query(&self, _status: QueryStatus, _name: &str, _client: &str) {}
    }

    struct NilMetrics;
    impl MetricsRecorder for NilMetrics {
        fn record_request(&self) {}
        fn record_outcome(&self, _status: QueryStatus, _duration: std::time::Duration) {}
        fn set_blocklist_items(&self, _count: usize) {}
    }

    fn request_for(domain: &str) -> Message {
        let name = Name::from_str(domain).unwrap();
        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordType::A);
        query.set_query_class(DNSClass::IN);

        let mut msg = Message::new();
        msg.set_id(42);
        msg.set_message_type(MessageType::Query);
        msg.set_op_code(OpCode::Query);
        msg.set_recursion_desired(true);
        msg.add_query(query);
        msg
    }

    fn handler_with(
        blocklist: Blocklist,
        config: Config,
    ) -> (QueryHandler, Arc<EchoForwarder>) {
        let forwarder = Arc::new(EchoForwarder::new());
        let handler = QueryHandler::new(
            Arc::new(config),
            Arc::new(FakeBlocklistStore::new(blocklist)),
            forwarder.clone(),
            Arc::new(NilQueryLogger),
            Arc::new(NilMetrics),
        );
        (handler, forwarder)
    }

    #[tokio::test]
    async fn blocked_domain_is_rejected_without_contacting_upstream() {
        let blocklist = Blocklist::parse(std::io::Cursor::new(b"ads.com\n".as_slice())).unwrap();
        let (handler, forwarder) = handler_with(blocklist, Config::default());

        let (reply, outcome) = handler
            .handle(request_for("ads.com."), "10.0.0.5")
            .await
            .unwrap();

        assert_eq!(outcome, QueryOutcome::Blocklisted);
        assert_eq!(reply.response_code(), ResponseCode::NXDomain);
        assert!(reply.authoritative());
        assert!(!reply.recursion_available());
        assert_eq!(reply.name_servers().len(), 1);
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn allowed_domain_is_forwarded() {
        let blocklist = Blocklist::parse(std::io::Cursor::new(b"ads.com\n".as_slice())).unwrap();
        let (handler, forwarder) = handler_with(blocklist, Config::default());

        let (reply, outcome) = handler
            .handle(request_for("example.org."), "10.0.0.5")
            .await
            .unwrap();

        assert_eq!(outcome, QueryOutcome::Forwarded);
        assert_eq!(reply.message_type(), MessageType::Response);
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn client_reject_override_short_circuits_blocklist() {
        let mut config = Config::default();
        config.overrides_by_client_addr.insert(
            "192.168.1.10".to_string(),
            dnsward_domain::OverridableConfig {
                reject_all_queries: true,
                disable_blocklisting: false,
            },
        );
        let (handler, forwarder) = handler_with(Blocklist::empty(), config);

        let (reply, outcome) = handler
            .handle(request_for("example.org."), "192.168.1.10")
            .await
            .unwrap();

        assert_eq!(outcome, QueryOutcome::RejectedByClient);
        assert_eq!(reply.response_code(), ResponseCode::NXDomain);
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disable_blocklisting_override_forwards_blocked_domain() {
        let mut config = Config::default();
        config.overrides_by_client_addr.insert(
            "192.168.1.11".to_string(),
            dnsward_domain::OverridableConfig {
                reject_all_queries: false,
                disable_blocklisting: true,
            },
        );
        let blocklist = Blocklist::parse(std::io::Cursor::new(b"ads.com\n".as_slice())).unwrap();
        let (handler, forwarder) = handler_with(blocklist, config);

        let (_reply, outcome) = handler
            .handle(request_for("ads.com."), "192.168.1.11")
            .await
            .unwrap();

        assert_eq!(outcome, QueryOutcome::Forwarded);
        assert_eq!(forwarder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn multi_question_request_is_rejected() {
        let (handler, _forwarder) = handler_with(Blocklist::empty(), Config::default());

        let mut request = request_for("example.org.");
        let second = request.queries()[0].clone();
        request.add_query(second);

        let result = handler.handle(request, "10.0.0.5").await;
        assert!(matches!(
            result,
            Err(ApplicationError::MultipleQuestions(2))
        ));
    }

    #[tokio::test]
    async fn zero_question_request_is_rejected() {
        let (handler, _forwarder) = handler_with(Blocklist::empty(), Config::default());

        let request = Message::new();
        let result = handler.handle(request, "10.0.0.5").await;
        assert!(matches!(result, Err(ApplicationError::NoQuestion)));
    }
}

use crosstalk::{find_last, has_envelope, Envelope};
use serde::{Deserialize, Serialize};
use surface_provider::{BlockSource, SourceUnavailable, Transport, TransportError};
use thiserror::Error;

/// Watch-state for one correlation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    Idle,
    Submitting,
    Watching,
    Matched,
    Cancelled,
}

/// Failures surfaced by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// A second submit arrived while an exchange was active. The original
    /// target session is untouched.
    #[error("an exchange is already in flight for session `{session}`")]
    AlreadyInFlight { session: String },

    /// The transport refused the request; the correlator returned to idle.
    #[error("transport rejected the request: {0}")]
    SubmitRejected(#[from] TransportError),

    /// Only request envelopes can be submitted.
    #[error("submit requires a request envelope")]
    NotARequest,
}

/// Outcome of one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A valid response with the watched session id arrived; polling stops.
    Matched(Envelope),
    StillWatching,
    /// The block source was unreachable this tick. The state stays at
    /// `Watching` so a recovered source can be polled again.
    SourceUnavailable(SourceUnavailable),
}

/// Response-watch state machine enforcing at most one exchange in flight.
///
/// Blocks that arrived before the watch began are never re-matched: the
/// block count recorded at acknowledgment is the baseline, and only growth
/// past it triggers a read of the newest block. Each tick re-reads the
/// *current* newest block rather than a queued diff, so blocks that arrive
/// between ticks cannot produce false negatives.
#[derive(Debug)]
pub struct Correlator {
    state: WatchState,
    target_session: Option<String>,
    baseline_blocks: usize,
    matched: Option<Envelope>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: WatchState::Idle,
            target_session: None,
            baseline_blocks: 0,
            matched: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Session id currently being watched for, if any.
    #[must_use]
    pub fn target_session(&self) -> Option<&str> {
        self.target_session.as_deref()
    }

    /// Begins a new exchange: records the request's session id as the watch
    /// target and hands its wire text to the transport.
    ///
    /// Rejected with [`RelayError::AlreadyInFlight`] while a previous
    /// exchange is submitting, watching, or matched-but-undrained. A
    /// cancelled correlator accepts a fresh submit directly. Transport
    /// rejection returns the correlator to idle — the exchange never went in
    /// flight.
    pub fn submit(
        &mut self,
        request: &Envelope,
        transport: &mut dyn Transport,
    ) -> Result<(), RelayError> {
        if !request.is_request() {
            return Err(RelayError::NotARequest);
        }
        match self.state {
            WatchState::Submitting | WatchState::Watching | WatchState::Matched => {
                return Err(RelayError::AlreadyInFlight {
                    session: self.target_session.clone().unwrap_or_default(),
                });
            }
            WatchState::Idle | WatchState::Cancelled => {}
        }

        self.target_session = Some(request.session.trim().to_string());
        self.baseline_blocks = 0;
        self.matched = None;
        self.state = WatchState::Submitting;

        if let Err(error) = transport.deliver(&request.raw) {
            self.reset();
            return Err(RelayError::SubmitRejected(error));
        }
        Ok(())
    }

    /// Confirms the transport accepted the request for delivery and records
    /// the number of blocks already on the surface; only blocks arriving
    /// after this point are candidates.
    pub fn acknowledge(&mut self, baseline_blocks: usize) {
        if self.state == WatchState::Submitting {
            self.baseline_blocks = baseline_blocks;
            self.state = WatchState::Watching;
        }
    }

    /// Runs one tick of the watch loop.
    ///
    /// Outside the `Watching` state this is a no-op reporting
    /// [`PollOutcome::StillWatching`].
    pub fn poll(&mut self, source: &dyn BlockSource) -> PollOutcome {
        if self.state != WatchState::Watching {
            return PollOutcome::StillWatching;
        }

        let count = match source.block_count() {
            Ok(count) => count,
            Err(error) => return PollOutcome::SourceUnavailable(error),
        };
        if count <= self.baseline_blocks {
            return PollOutcome::StillWatching;
        }

        let block = match source.latest_block() {
            Ok(Some(block)) => block,
            Ok(None) => {
                self.baseline_blocks = count;
                return PollOutcome::StillWatching;
            }
            Err(error) => return PollOutcome::SourceUnavailable(error),
        };

        if has_envelope(&block) {
            if let Some(Ok(envelope)) = find_last(&block) {
                if self.matches_target(&envelope) {
                    self.state = WatchState::Matched;
                    self.matched = Some(envelope.clone());
                    return PollOutcome::Matched(envelope);
                }
            }
        }

        self.baseline_blocks = count;
        PollOutcome::StillWatching
    }

    /// Cancels the exchange from any state. The in-flight flag clears
    /// immediately; a new submit may start a fresh correlation session.
    pub fn cancel(&mut self) {
        self.state = WatchState::Cancelled;
        self.matched = None;
    }

    /// The matched response, if polling has found one.
    #[must_use]
    pub fn matched(&self) -> Option<&Envelope> {
        self.matched.as_ref()
    }

    /// Consumes the matched response and returns the correlator to idle.
    #[must_use]
    pub fn take_matched(&mut self) -> Option<Envelope> {
        let matched = self.matched.take();
        if matched.is_some() {
            self.reset();
        }
        matched
    }

    fn matches_target(&self, envelope: &Envelope) -> bool {
        envelope.is_response()
            && !envelope.payload.is_empty()
            && Some(envelope.session.trim()) == self.target_session.as_deref()
    }

    fn reset(&mut self) {
        self.state = WatchState::Idle;
        self.target_session = None;
        self.baseline_blocks = 0;
    }
}

#[cfg(test)]
mod tests {
    use crosstalk::{decode, encode_request, encode_response, Intent, RequestFields};
    use surface_provider::{BlockSource, SourceUnavailable, Transport, TransportError};

    use super::{Correlator, PollOutcome, RelayError, WatchState};

    struct VecTransport {
        delivered: Vec<String>,
        reject: bool,
    }

    impl VecTransport {
        fn new() -> Self {
            Self {
                delivered: Vec::new(),
                reject: false,
            }
        }
    }

    impl Transport for VecTransport {
        fn deliver(&mut self, wire_text: &str) -> Result<(), TransportError> {
            if self.reject {
                return Err(TransportError::new("no submit control"));
            }
            self.delivered.push(wire_text.to_string());
            Ok(())
        }
    }

    struct VecSource {
        blocks: Vec<String>,
        unavailable: bool,
    }

    impl BlockSource for VecSource {
        fn block_count(&self) -> Result<usize, SourceUnavailable> {
            if self.unavailable {
                return Err(SourceUnavailable::new("gone"));
            }
            Ok(self.blocks.len())
        }

        fn latest_block(&self) -> Result<Option<String>, SourceUnavailable> {
            if self.unavailable {
                return Err(SourceUnavailable::new("gone"));
            }
            Ok(self.blocks.last().cloned())
        }
    }

    fn request() -> crosstalk::Envelope {
        let wire = encode_request(
            &RequestFields::new("A", "B", 1, "demo", Intent::Question, "Ping?\n")
                .with_session("2024-06-01T15:30Z a1b2c3"),
        )
        .expect("encodable request");
        decode(&wire).expect("decodable request")
    }

    fn response_block(session: &str, text: &str) -> String {
        encode_response("B", "A", 1, session, text).expect("encodable response")
    }

    #[test]
    fn submit_delivers_wire_text_and_enters_submitting() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        let request = request();

        correlator
            .submit(&request, &mut transport)
            .expect("first submit accepted");

        assert_eq!(correlator.state(), WatchState::Submitting);
        assert_eq!(correlator.target_session(), Some("2024-06-01T15:30Z a1b2c3"));
        assert_eq!(transport.delivered, vec![request.raw.clone()]);
    }

    #[test]
    fn second_submit_while_watching_is_rejected_and_keeps_the_target() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        let request = request();

        correlator
            .submit(&request, &mut transport)
            .expect("first submit accepted");
        correlator.acknowledge(0);

        let error = correlator
            .submit(&request, &mut transport)
            .expect_err("second submit must be rejected");
        assert_eq!(
            error,
            RelayError::AlreadyInFlight {
                session: "2024-06-01T15:30Z a1b2c3".to_string()
            }
        );
        assert_eq!(correlator.state(), WatchState::Watching);
        assert_eq!(correlator.target_session(), Some("2024-06-01T15:30Z a1b2c3"));
        assert_eq!(transport.delivered.len(), 1);
    }

    #[test]
    fn transport_rejection_returns_the_correlator_to_idle() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        transport.reject = true;

        let error = correlator
            .submit(&request(), &mut transport)
            .expect_err("delivery rejected");
        assert!(matches!(error, RelayError::SubmitRejected(_)));
        assert_eq!(correlator.state(), WatchState::Idle);
        assert_eq!(correlator.target_session(), None);
    }

    #[test]
    fn response_envelopes_cannot_be_submitted() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        let wire = response_block("2024-06-01T15:30Z a1b2c3", "Pong.");
        let response = decode(&wire).expect("decodable response");

        let error = correlator
            .submit(&response, &mut transport)
            .expect_err("responses are not submittable");
        assert_eq!(error, RelayError::NotARequest);
    }

    #[test]
    fn poll_matches_only_the_exact_session_id() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        correlator
            .submit(&request(), &mut transport)
            .expect("submit accepted");
        correlator.acknowledge(1);

        let mut source = VecSource {
            blocks: vec![
                "old chatter".to_string(),
                response_block("2024-06-01T15:30Z ffffff", "wrong exchange"),
            ],
            unavailable: false,
        };
        assert_eq!(correlator.poll(&source), PollOutcome::StillWatching);
        assert_eq!(correlator.state(), WatchState::Watching);

        source
            .blocks
            .push(response_block("2024-06-01T15:30Z a1b2c3", "Pong."));
        match correlator.poll(&source) {
            PollOutcome::Matched(envelope) => {
                assert_eq!(envelope.payload, "Pong.");
                assert_eq!(envelope.session, "2024-06-01T15:30Z a1b2c3");
            }
            other => panic!("expected a match, got {other:?}"),
        }
        assert_eq!(correlator.state(), WatchState::Matched);
    }

    #[test]
    fn stale_blocks_below_the_baseline_are_never_rematched() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        let source = VecSource {
            // A matching response already on the surface before the watch.
            blocks: vec![response_block("2024-06-01T15:30Z a1b2c3", "stale")],
            unavailable: false,
        };

        correlator
            .submit(&request(), &mut transport)
            .expect("submit accepted");
        correlator.acknowledge(1);

        assert_eq!(correlator.poll(&source), PollOutcome::StillWatching);
        assert_eq!(correlator.state(), WatchState::Watching);
    }

    #[test]
    fn unavailable_source_halts_without_cancelling() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        correlator
            .submit(&request(), &mut transport)
            .expect("submit accepted");
        correlator.acknowledge(0);

        let mut source = VecSource {
            blocks: vec![response_block("2024-06-01T15:30Z a1b2c3", "Pong.")],
            unavailable: true,
        };
        assert!(matches!(
            correlator.poll(&source),
            PollOutcome::SourceUnavailable(_)
        ));
        assert_eq!(correlator.state(), WatchState::Watching);

        // Recovery: the same correlation session keeps polling.
        source.unavailable = false;
        assert!(matches!(correlator.poll(&source), PollOutcome::Matched(_)));
    }

    #[test]
    fn cancel_clears_the_in_flight_flag_for_a_fresh_submit() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        correlator
            .submit(&request(), &mut transport)
            .expect("submit accepted");
        correlator.acknowledge(0);

        correlator.cancel();
        assert_eq!(correlator.state(), WatchState::Cancelled);

        correlator
            .submit(&request(), &mut transport)
            .expect("resubmit after cancel accepted");
        assert_eq!(correlator.state(), WatchState::Submitting);
    }

    #[test]
    fn matched_response_must_be_drained_before_the_next_submit() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        correlator
            .submit(&request(), &mut transport)
            .expect("submit accepted");
        correlator.acknowledge(0);

        let source = VecSource {
            blocks: vec![response_block("2024-06-01T15:30Z a1b2c3", "Pong.")],
            unavailable: false,
        };
        assert!(matches!(correlator.poll(&source), PollOutcome::Matched(_)));

        let error = correlator
            .submit(&request(), &mut transport)
            .expect_err("undrained match still counts as in flight");
        assert!(matches!(error, RelayError::AlreadyInFlight { .. }));

        let matched = correlator.take_matched().expect("match drained");
        assert_eq!(matched.payload, "Pong.");
        assert_eq!(correlator.state(), WatchState::Idle);

        correlator
            .submit(&request(), &mut transport)
            .expect("submit after drain accepted");
    }

    #[test]
    fn request_shaped_reply_does_not_match() {
        let mut correlator = Correlator::new();
        let mut transport = VecTransport::new();
        correlator
            .submit(&request(), &mut transport)
            .expect("submit accepted");
        correlator.acknowledge(0);

        // Same session id, but a body+intent block classifies as a request.
        let source = VecSource {
            blocks: vec![encode_request(
                &RequestFields::new("B", "A", 1, "demo", Intent::Answer, "Pong?\n")
                    .with_session("2024-06-01T15:30Z a1b2c3"),
            )
            .expect("encodable request")],
            unavailable: false,
        };
        assert_eq!(correlator.poll(&source), PollOutcome::StillWatching);
        assert_eq!(correlator.state(), WatchState::Watching);
    }
}

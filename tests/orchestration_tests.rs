use agentcrew::{
    Agent, BackendError, CancellationToken, ClientWrapper, CompletionOptions, ConversationHistory,
    CrewError, ModelContext, OrchestrationPolicy, Orchestrator, RetryPolicy, RunOutcome, RunState,
    SequenceStep, TerminationCondition, TerminationReason, Turn, UpstreamErrorKind,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Replies "ack:" + the last message. Fails for agents whose system turn contains `fail_marker`.
struct EchoClient {
    calls: AtomicUsize,
    fail_marker: Option<&'static str>,
    fail_kind: UpstreamErrorKind,
}

impl EchoClient {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_marker: None,
            fail_kind: UpstreamErrorKind::Unknown,
        }
    }

    fn failing_for(marker: &'static str, kind: UpstreamErrorKind) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_marker: Some(marker),
            fail_kind: kind,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientWrapper for EchoClient {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn send_message(
        &self,
        messages: &[Turn],
        _options: &CompletionOptions,
    ) -> Result<Turn, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = self.fail_marker {
            if messages.first().map_or(false, |t| t.content.contains(marker)) {
                return Err(BackendError::new(self.fail_kind, "stub failure"));
            }
        }
        let last = messages.last().map(|t| t.content.to_string()).unwrap_or_default();
        Ok(Turn::assistant(format!("ack:{}", last)))
    }
}

/// Replies with a fixed script, one entry per call.
struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ClientWrapper for ScriptedClient {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn send_message(
        &self,
        _messages: &[Turn],
        _options: &CompletionOptions,
    ) -> Result<Turn, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        Ok(Turn::assistant(next.unwrap_or_else(|| "...".to_string())))
    }
}

/// Fails the first `failures` calls with `kind`, then echoes.
struct FlakyClient {
    failures: usize,
    kind: UpstreamErrorKind,
    calls: AtomicUsize,
}

#[async_trait]
impl ClientWrapper for FlakyClient {
    fn model_name(&self) -> &str {
        "flaky"
    }

    async fn send_message(
        &self,
        messages: &[Turn],
        _options: &CompletionOptions,
    ) -> Result<Turn, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(BackendError::new(self.kind, format!("attempt {}", n + 1)));
        }
        let last = messages.last().map(|t| t.content.to_string()).unwrap_or_default();
        Ok(Turn::assistant(format!("ack:{}", last)))
    }
}

/// Sleeps before answering.
struct SlowClient {
    delay: Duration,
}

#[async_trait]
impl ClientWrapper for SlowClient {
    fn model_name(&self) -> &str {
        "slow"
    }

    async fn send_message(
        &self,
        _messages: &[Turn],
        _options: &CompletionOptions,
    ) -> Result<Turn, BackendError> {
        tokio::time::sleep(self.delay).await;
        Ok(Turn::assistant("late"))
    }
}

/// Cancels `token` while serving call number `cancel_on` (1-based), then still answers.
struct CancellingClient {
    token: CancellationToken,
    cancel_on: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl ClientWrapper for CancellingClient {
    fn model_name(&self) -> &str {
        "cancelling"
    }

    async fn send_message(
        &self,
        _messages: &[Turn],
        _options: &CompletionOptions,
    ) -> Result<Turn, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.cancel_on {
            self.token.cancel();
        }
        Ok(Turn::assistant(format!("reply {}", n)))
    }
}

fn crew(client: Arc<dyn ClientWrapper>, names: &[&str]) -> Orchestrator {
    let mut orchestrator =
        Orchestrator::new(ModelContext::new(client)).with_retry_policy(RetryPolicy::none());
    for name in names {
        orchestrator
            .add_agent(Agent::new(*name, format!("You are agent {}.", name)))
            .unwrap();
    }
    orchestrator
}

fn contents(turns: &[agentcrew::AgentTurn]) -> Vec<(String, String)> {
    turns
        .iter()
        .map(|t| (t.agent_name.clone(), t.turn.content.to_string()))
        .collect()
}

#[tokio::test]
async fn test_independent_yields_one_result_per_agent_in_roster_order() {
    let client = Arc::new(EchoClient::new());
    let orchestrator = crew(client.clone(), &["A", "B", "C", "D", "E"]);

    let outcome = orchestrator
        .run_independent(Turn::user("topic T"))
        .await
        .unwrap();

    let names: Vec<_> = outcome.results.iter().map(|r| r.agent_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(client.calls(), 5);
    for result in &outcome.results {
        assert_eq!(result.result.as_ref().unwrap().content.as_ref(), "ack:topic T");
    }
}

#[tokio::test]
async fn test_independent_failure_is_isolated_to_its_agent() {
    let client = Arc::new(EchoClient::failing_for(
        "agent C",
        UpstreamErrorKind::Unknown,
    ));
    let orchestrator = crew(client.clone(), &["A", "B", "C", "D"]);

    let outcome = orchestrator
        .run(
            OrchestrationPolicy::Independent,
            Turn::user("topic T"),
            TerminationCondition::new(1),
        )
        .await
        .unwrap()
        .into_independent()
        .unwrap();

    let succeeded: Vec<_> = outcome.successes().map(|(name, _)| name).collect();
    assert_eq!(succeeded, vec!["A", "B", "D"]);
    for (_, turn) in outcome.successes() {
        assert_eq!(turn.content.as_ref(), "ack:topic T");
    }

    let failure = outcome.get("C").unwrap().result.as_ref().unwrap_err();
    assert_eq!(failure.agent_name, "C");
    assert_eq!(failure.kind, UpstreamErrorKind::Unknown);
    assert_eq!(outcome.failures().count(), 1);
    // Unknown is never retried.
    assert_eq!(client.calls(), 4);
}

#[tokio::test]
async fn test_independent_agents_are_dispatched_concurrently() {
    let client = Arc::new(SlowClient {
        delay: Duration::from_millis(200),
    });
    let orchestrator = crew(client, &["A", "B", "C", "D"]);

    let started = Instant::now();
    let outcome = orchestrator
        .run_independent(Turn::user("topic T"))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(outcome.results.len(), 4);
    assert_eq!(outcome.successes().count(), 4);
    // Sequential dispatch would take at least 800ms.
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_round_robin_echo_scenario() {
    let client = Arc::new(EchoClient::new());
    let orchestrator = crew(client.clone(), &["A", "B"]);

    let outcome = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("let's discuss X"),
            TerminationCondition::new(4).with_stop_phrases(["goodbye"]),
        )
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(
        contents(&outcome.turns),
        vec![
            ("A".to_string(), "ack:let's discuss X".to_string()),
            ("B".to_string(), "ack:ack:let's discuss X".to_string()),
            ("A".to_string(), "ack:ack:ack:let's discuss X".to_string()),
            ("B".to_string(), "ack:ack:ack:ack:let's discuss X".to_string()),
        ]
    );
    assert_eq!(outcome.reason, TerminationReason::TurnLimit);
    assert_eq!(client.calls(), 4);
}

#[tokio::test]
async fn test_round_robin_never_exceeds_ceiling() {
    for ceiling in 1..=7 {
        let client = Arc::new(EchoClient::new());
        let orchestrator = crew(client.clone(), &["A", "B", "C"]);
        let outcome = orchestrator
            .start(
                OrchestrationPolicy::RoundRobin,
                Turn::user("go"),
                TerminationCondition::new(ceiling),
            )
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(outcome.turns.len(), ceiling);
        assert_eq!(client.calls(), ceiling);
        assert_eq!(outcome.reason, TerminationReason::TurnLimit);
    }
}

#[tokio::test]
async fn test_stop_phrase_in_turn_k_yields_exactly_k_turns() {
    let client = Arc::new(ScriptedClient::new(&[
        "first",
        "second",
        "well then, GOODBYE!",
        "never sent",
    ]));
    let orchestrator = crew(client.clone(), &["A", "B"]);

    let outcome = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("Hey Agent B, let's chat!"),
            TerminationCondition::new(10).with_stop_phrases(["goodbye"]),
        )
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(outcome.turns.len(), 3);
    assert_eq!(outcome.turns[2].agent_name, "A");
    assert_eq!(
        outcome.reason,
        TerminationReason::StopPhrase("goodbye".to_string())
    );
    assert_eq!(client.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_histories_are_append_only_and_relay_as_user_turns() {
    let client = Arc::new(EchoClient::new());
    let orchestrator = crew(client, &["A", "B"]);
    let mut run = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("seed"),
            TerminationCondition::new(6),
        )
        .unwrap();

    let mut previous: Vec<ConversationHistory> = run.histories().to_vec();
    let mut speaker = 0;
    while let Some(turn) = run.next_turn().await {
        turn.unwrap();
        let current = run.histories().to_vec();
        for (index, (before, after)) in previous.iter().zip(&current).enumerate() {
            assert!(before.is_prefix_of(after));
            if index == speaker {
                assert_eq!(after.len(), before.len() + 2);
            } else {
                assert_eq!(after, before);
            }
        }
        previous = current;
        speaker = (speaker + 1) % 2;
    }

    let b = &previous[1];
    assert_eq!(b.turns()[0], Turn::system("You are agent B."));
    assert_eq!(b.turns()[1], Turn::user("ack:seed"));
    assert_eq!(b.turns()[2], Turn::assistant("ack:ack:seed"));
    assert_eq!(b.len(), 7);
}

#[tokio::test]
async fn test_empty_roster_is_rejected_without_backend_calls() {
    let client = Arc::new(EchoClient::new());
    let orchestrator = Orchestrator::new(ModelContext::new(client.clone()));
    let termination = TerminationCondition::new(4);

    let err = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("x"),
            termination.clone(),
        )
        .err()
        .unwrap();
    assert!(err.is_configuration());

    for policy in [
        OrchestrationPolicy::Independent,
        OrchestrationPolicy::RoundRobin,
    ] {
        let err = orchestrator
            .run(policy, Turn::user("x"), termination.clone())
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }

    assert!(orchestrator
        .run_independent(Turn::user("x"))
        .await
        .unwrap_err()
        .is_configuration());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_invalid_setups_are_configuration_errors() {
    let client = Arc::new(EchoClient::new());
    let mut orchestrator = crew(client.clone(), &["A", "B"]);
    let ok = TerminationCondition::new(3);

    let duplicate = orchestrator.add_agent(Agent::new("A", "again"));
    assert!(duplicate.unwrap_err().is_configuration());
    assert_eq!(orchestrator.agents().len(), 2);

    let cases: Vec<(OrchestrationPolicy, Turn, TerminationCondition)> = vec![
        (OrchestrationPolicy::RoundRobin, Turn::assistant("x"), ok.clone()),
        (OrchestrationPolicy::RoundRobin, Turn::system("x"), ok.clone()),
        (OrchestrationPolicy::RoundRobin, Turn::user("x"), TerminationCondition::new(0)),
        (
            OrchestrationPolicy::FixedSequence { steps: vec![] },
            Turn::user("x"),
            ok.clone(),
        ),
        (
            OrchestrationPolicy::FixedSequence {
                steps: vec![SequenceStep::new(0, "{input}"), SequenceStep::new(2, "{input}")],
            },
            Turn::user("x"),
            ok.clone(),
        ),
        (OrchestrationPolicy::Independent, Turn::user("x"), ok.clone()),
    ];
    for (policy, seed, termination) in cases {
        let label = format!("{:?}", policy);
        let err = orchestrator.start(policy, seed, termination).err();
        assert!(
            err.map_or(false, |e| e.is_configuration()),
            "{} should be rejected",
            label
        );
    }

    let mismatch = orchestrator.start_with_histories(
        OrchestrationPolicy::RoundRobin,
        Turn::user("x"),
        ok.clone(),
        vec![ConversationHistory::new()],
    );
    assert!(mismatch.err().unwrap().is_configuration());

    let mut dangling = ConversationHistory::new();
    dangling.push(Turn::user("unanswered"));
    let dangling = orchestrator.start_with_histories(
        OrchestrationPolicy::RoundRobin,
        Turn::user("x"),
        ok,
        vec![dangling, ConversationHistory::new()],
    );
    assert!(dangling.err().unwrap().is_configuration());

    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_fixed_sequence_interpolates_previous_reply() {
    let client = Arc::new(EchoClient::new());
    let orchestrator = crew(client.clone(), &["Writer", "Critic"]);
    let steps = vec![
        SequenceStep::new(0, "Draft: {input}"),
        SequenceStep::new(1, "Critique: {input}"),
        SequenceStep::new(0, "Thanks for the notes."),
    ];

    let outcome = orchestrator
        .run(
            OrchestrationPolicy::FixedSequence { steps },
            Turn::user("a poem"),
            TerminationCondition::new(10),
        )
        .await
        .unwrap()
        .into_sequence()
        .unwrap();

    assert_eq!(
        contents(&outcome.turns),
        vec![
            ("Writer".to_string(), "ack:Draft: a poem".to_string()),
            ("Critic".to_string(), "ack:Critique: ack:Draft: a poem".to_string()),
            ("Writer".to_string(), "ack:Thanks for the notes.".to_string()),
        ]
    );
    assert_eq!(outcome.reason, TerminationReason::SequenceComplete);
    assert_eq!(outcome.histories[0].len(), 5);
    assert_eq!(outcome.histories[1].len(), 3);
    assert_eq!(
        outcome.histories[1].turns()[1],
        Turn::user("Critique: ack:Draft: a poem")
    );
}

#[tokio::test]
async fn test_fixed_sequence_still_honours_termination() {
    let client = Arc::new(ScriptedClient::new(&["done already", "unused"]));
    let orchestrator = crew(client.clone(), &["A", "B"]);
    let steps = vec![SequenceStep::new(0, "{input}"), SequenceStep::new(1, "{input}")];

    let outcome = orchestrator
        .start(
            OrchestrationPolicy::FixedSequence {
                steps: steps.clone(),
            },
            Turn::user("go"),
            TerminationCondition::new(10).with_stop_phrases(["done"]),
        )
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(outcome.turns.len(), 1);
    assert_eq!(outcome.reason, TerminationReason::StopPhrase("done".into()));

    let echo = Arc::new(EchoClient::new());
    let outcome = crew(echo, &["A", "B"])
        .start(
            OrchestrationPolicy::FixedSequence { steps },
            Turn::user("go"),
            TerminationCondition::new(1),
        )
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(outcome.turns.len(), 1);
    assert_eq!(outcome.reason, TerminationReason::TurnLimit);
}

#[tokio::test]
async fn test_upstream_failure_aborts_sequential_run() {
    let client = Arc::new(EchoClient::failing_for(
        "agent B",
        UpstreamErrorKind::Malformed,
    ));
    let orchestrator = crew(client.clone(), &["A", "B"]);
    let mut run = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("go"),
            TerminationCondition::new(10),
        )
        .unwrap();

    assert_eq!(run.state(), &RunState::Idle);
    let first = run.next_turn().await.unwrap().unwrap();
    assert_eq!(first.agent_name, "A");
    assert_eq!(run.state(), &RunState::AwaitingAgent(1));

    let second = run.next_turn().await.unwrap();
    match second {
        Err(CrewError::Upstream(err)) => {
            assert_eq!(err.agent_name, "B");
            assert_eq!(err.kind, UpstreamErrorKind::Malformed);
        }
        other => panic!("expected an upstream error, got {:?}", other),
    }
    assert!(matches!(
        run.state(),
        RunState::Terminated(TerminationReason::Failed(_))
    ));
    assert!(run.next_turn().await.is_none());
    // B's failed call left its history untouched
    assert_eq!(run.histories()[1].len(), 1);
    assert_eq!(client.calls(), 2);

    let err = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("go"),
            TerminationCondition::new(10),
        )
        .unwrap()
        .collect()
        .await
        .unwrap_err();
    assert!(matches!(err, CrewError::Upstream(_)));
}

#[tokio::test]
async fn test_retry_recovers_from_rate_limit() {
    let client = Arc::new(FlakyClient {
        failures: 1,
        kind: UpstreamErrorKind::RateLimited,
        calls: AtomicUsize::new(0),
    });
    let mut orchestrator = Orchestrator::new(ModelContext::new(client.clone())).with_retry_policy(
        RetryPolicy {
            max_retries: 1,
            backoff: Duration::from_millis(1),
        },
    );
    orchestrator.add_agent(Agent::new("A", "x")).unwrap();

    let outcome = orchestrator.run_independent(Turn::user("hi")).await.unwrap();
    assert_eq!(
        outcome.results[0].result.as_ref().unwrap().content.as_ref(),
        "ack:hi"
    );
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retry_budget_is_bounded_and_kind_specific() {
    let cases = [
        (UpstreamErrorKind::Timeout, 5, 2),
        (UpstreamErrorKind::RateLimited, 5, 2),
        (UpstreamErrorKind::Malformed, 5, 1),
        (UpstreamErrorKind::Unknown, 5, 1),
    ];
    for (kind, failures, expected_calls) in cases {
        let client = Arc::new(FlakyClient {
            failures,
            kind,
            calls: AtomicUsize::new(0),
        });
        let mut orchestrator = Orchestrator::new(ModelContext::new(client.clone()))
            .with_retry_policy(RetryPolicy {
                max_retries: 1,
                backoff: Duration::from_millis(1),
            });
        orchestrator.add_agent(Agent::new("A", "x")).unwrap();

        let err = orchestrator
            .start(
                OrchestrationPolicy::RoundRobin,
                Turn::user("hi"),
                TerminationCondition::new(1),
            )
            .unwrap()
            .collect()
            .await
            .unwrap_err();
        match err {
            CrewError::Upstream(e) => assert_eq!(e.kind, kind),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), expected_calls, "{:?}", kind);
    }
}

#[test]
fn test_retry_backoff_doubles() {
    let policy = RetryPolicy {
        max_retries: 3,
        backoff: Duration::from_millis(100),
    };
    assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    assert_eq!(RetryPolicy::default().max_retries, 1);
}

#[tokio::test]
async fn test_call_timeout_becomes_upstream_timeout() {
    let client = Arc::new(SlowClient {
        delay: Duration::from_secs(5),
    });
    let context = ModelContext::new(client).with_options(CompletionOptions {
        timeout: Duration::from_millis(20),
        ..CompletionOptions::default()
    });
    let mut orchestrator = Orchestrator::new(context).with_retry_policy(RetryPolicy::none());
    orchestrator.add_agent(Agent::new("Sloth", "x")).unwrap();

    let started = Instant::now();
    let outcome = orchestrator.run_independent(Turn::user("hi")).await.unwrap();
    let err = outcome.results[0].result.as_ref().unwrap_err();
    assert_eq!(err.kind, UpstreamErrorKind::Timeout);
    assert_eq!(err.agent_name, "Sloth");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();
    let client = Arc::new(EchoClient::new());
    let orchestrator = crew(client.clone(), &["A", "B"]).with_cancellation(token);

    let err = orchestrator
        .run_independent(Turn::user("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, CrewError::Cancelled));

    let outcome = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("x"),
            TerminationCondition::new(5),
        )
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert!(outcome.turns.is_empty());
    assert_eq!(outcome.reason, TerminationReason::Cancelled);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_cancellation_stops_further_turns_but_keeps_in_flight_one() {
    let token = CancellationToken::new();
    let client = Arc::new(CancellingClient {
        token: token.clone(),
        cancel_on: 2,
        calls: AtomicUsize::new(0),
    });
    let orchestrator = crew(client.clone(), &["A", "B"]).with_cancellation(token);

    let outcome = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("x"),
            TerminationCondition::new(10),
        )
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(outcome.turns.len(), 2);
    assert_eq!(outcome.turns[1].turn.content.as_ref(), "reply 2");
    assert_eq!(outcome.reason, TerminationReason::Cancelled);
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancellation_interrupts_retry_backoff() {
    let token = CancellationToken::new();
    let client = Arc::new(FlakyClient {
        failures: usize::MAX,
        kind: UpstreamErrorKind::RateLimited,
        calls: AtomicUsize::new(0),
    });
    let mut orchestrator = Orchestrator::new(ModelContext::new(client.clone()))
        .with_retry_policy(RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_secs(30),
        })
        .with_cancellation(token.clone());
    orchestrator.add_agent(Agent::new("A", "x")).unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let started = Instant::now();
    let outcome = orchestrator
        .start(
            OrchestrationPolicy::RoundRobin,
            Turn::user("x"),
            TerminationCondition::new(3),
        )
        .unwrap()
        .collect()
        .await
        .unwrap();
    canceller.await.unwrap();

    assert!(outcome.turns.is_empty());
    assert_eq!(outcome.reason, TerminationReason::Cancelled);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_histories_carry_over_between_topics() {
    let client = Arc::new(EchoClient::new());
    let orchestrator = crew(client, &["Agent A", "Agent B"]);
    let mut histories = orchestrator.fresh_histories();

    for topic in ["The future of AI", "Climate change solutions"] {
        let outcome = orchestrator
            .start_with_histories(
                OrchestrationPolicy::RoundRobin,
                Turn::user(format!("Let's discuss {}", topic)),
                TerminationCondition::new(2),
                histories,
            )
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(outcome.turns.len(), 2);
        histories = outcome.histories;
    }

    assert_eq!(histories[0].len(), 5);
    assert_eq!(
        histories[0].turns()[3],
        Turn::user("Let's discuss Climate change solutions")
    );
}

#[tokio::test]
async fn test_run_dispatches_on_policy() {
    let client = Arc::new(EchoClient::new());
    let orchestrator = crew(client, &["A", "B"]);

    let independent = orchestrator
        .run(
            OrchestrationPolicy::Independent,
            Turn::user("x"),
            TerminationCondition::new(1),
        )
        .await
        .unwrap();
    assert!(matches!(independent, RunOutcome::Independent(_)));

    let sequence = orchestrator
        .run(
            OrchestrationPolicy::RoundRobin,
            Turn::user("x"),
            TerminationCondition::new(3),
        )
        .await
        .unwrap();
    match sequence {
        RunOutcome::Sequence(outcome) => assert_eq!(outcome.turns.len(), 3),
        other => panic!("expected a sequence, got {:?}", other),
    }
}

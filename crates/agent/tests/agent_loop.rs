use async_trait::async_trait;
use codegraph_agent::{AgentError, ReasoningAgent};
use codegraph_graph::{CodeGraph, EdgeData, EdgeKind, NodeData, NodeKind};
use codegraph_oracle::{ChatOracle, Message, OracleError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

/// Replays a fixed list of replies and counts calls.
struct ScriptedOracle {
    replies: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatOracle for ScriptedOracle {
    async fn chat(&self, _messages: &[Message]) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .expect("lock")
            .pop()
            .ok_or_else(|| OracleError::Other("script exhausted".to_string()))
    }
}

struct FailingOracle;

#[async_trait]
impl ChatOracle for FailingOracle {
    async fn chat(&self, _messages: &[Message]) -> Result<String, OracleError> {
        Err(OracleError::RequestFailed("backend unavailable".to_string()))
    }
}

fn node(file: &str, name: &str, source: Option<&str>) -> NodeData {
    NodeData {
        id: codegraph_graph::node_id(file, name),
        kind: NodeKind::Function,
        name: name.to_string(),
        qualified_name: name.to_string(),
        file_path: file.to_string(),
        start_line: 1,
        end_line: 4,
        signature: Some(format!("def {name}()")),
        docstring: None,
        source: source.map(|s| s.to_string()),
        metadata: serde_json::Map::new(),
    }
}

/// alpha -> beta -> gamma -> delta, all Calls edges.
fn chain_graph() -> CodeGraph {
    let mut graph = CodeGraph::new();
    let alpha = graph.add_node(node("a.py", "alpha", Some("beta()")));
    let beta = graph.add_node(node("a.py", "beta", Some("gamma()")));
    let gamma = graph.add_node(node("a.py", "gamma", Some("delta()")));
    let delta = graph.add_node(node("a.py", "delta", None));
    graph.add_edge(alpha, beta, EdgeData::new(EdgeKind::Calls));
    graph.add_edge(beta, gamma, EdgeData::new(EdgeKind::Calls));
    graph.add_edge(gamma, delta, EdgeData::new(EdgeKind::Calls));
    graph
}

#[tokio::test]
async fn answer_marker_short_circuits_the_loop() {
    let graph = chain_graph();
    let oracle = ScriptedOracle::new(&["ANSWER: alpha calls beta."]);
    let agent = ReasoningAgent::new(oracle.clone());

    let response = agent.run(&graph, "alpha", None).await.expect("run");

    assert_eq!(response.answer, "alpha calls beta.");
    assert_eq!(response.confidence, 0.85);
    assert_eq!(oracle.calls(), 1);
    // Planning search step plus the answer step.
    assert_eq!(response.reasoning_steps.len(), 2);
    assert_eq!(response.reasoning_steps[0].action, "search");
    assert_eq!(response.reasoning_steps[1].action, "answer");
    assert_eq!(response.citations.len(), 1);
    assert_eq!(response.citations[0].node_name.as_deref(), Some("alpha"));
    assert_eq!(response.citations[0].content, "beta()");
}

#[tokio::test]
async fn navigation_gathers_citations_before_answering() {
    let graph = chain_graph();
    let oracle = ScriptedOracle::new(&["NAVIGATE: beta", "ANSWER: beta hands off to gamma."]);
    let agent = ReasoningAgent::new(oracle.clone());

    let response = agent.run(&graph, "alpha", None).await.expect("run");

    assert_eq!(response.answer, "beta hands off to gamma.");
    assert_eq!(oracle.calls(), 2);
    assert_eq!(response.citations.len(), 2);
    assert_eq!(response.citations[1].node_name.as_deref(), Some("beta"));

    let actions: Vec<_> = response
        .reasoning_steps
        .iter()
        .map(|s| s.action.as_str())
        .collect();
    assert_eq!(actions, vec!["search", "navigate", "answer"]);
}

#[tokio::test]
async fn iteration_cap_bounds_oracle_calls() {
    let graph = chain_graph();
    // Two navigations allowed, then the loop exhausts and one synthesis call
    // produces the final answer: max_iterations + 1 calls in total.
    let oracle = ScriptedOracle::new(&[
        "NAVIGATE: beta",
        "NAVIGATE: gamma",
        "Synthesis: the chain dispatches alpha through gamma.",
    ]);
    let agent = ReasoningAgent::new(oracle.clone()).with_max_iterations(2);

    let response = agent.run(&graph, "alpha", None).await.expect("run");

    assert_eq!(oracle.calls(), 3);
    assert_eq!(
        response.answer,
        "Synthesis: the chain dispatches alpha through gamma."
    );
    assert_eq!(response.confidence, 0.85);
    assert_eq!(response.citations.len(), 3);
}

#[tokio::test]
async fn navigating_to_a_visited_node_forces_synthesis() {
    let graph = chain_graph();
    let oracle = ScriptedOracle::new(&[
        "NAVIGATE: beta",
        // beta's only predecessor is alpha, already visited.
        "NAVIGATE: alpha",
        "Synthesis over what we saw.",
    ]);
    let agent = ReasoningAgent::new(oracle.clone());

    let response = agent.run(&graph, "alpha", None).await.expect("run");

    assert_eq!(oracle.calls(), 3);
    assert_eq!(response.answer, "Synthesis over what we saw.");
    // No citation was added for the revisit.
    assert_eq!(response.citations.len(), 2);
}

#[tokio::test]
async fn failed_lookup_is_recorded_and_ends_navigation() {
    let graph = chain_graph();
    let oracle = ScriptedOracle::new(&["NAVIGATE: quux", "Fallback synthesis."]);
    let agent = ReasoningAgent::new(oracle.clone());

    let response = agent.run(&graph, "alpha", None).await.expect("run");

    assert_eq!(oracle.calls(), 2);
    let lookup_step = response
        .reasoning_steps
        .iter()
        .find(|s| s.action == "done")
        .expect("done step");
    assert_eq!(
        lookup_step.observation.as_deref(),
        Some("Could not find node: quux")
    );
}

#[tokio::test]
async fn earlier_navigate_marker_beats_later_answer_marker() {
    let graph = chain_graph();
    let oracle = ScriptedOracle::new(&[
        "NAVIGATE: beta would help more than ANSWER: a guess",
        "ANSWER: confirmed via beta.",
    ]);
    let agent = ReasoningAgent::new(oracle.clone());

    let response = agent.run(&graph, "alpha", None).await.expect("run");

    assert_eq!(response.answer, "confirmed via beta.");
    assert_eq!(oracle.calls(), 2);
    assert_eq!(response.citations[1].node_name.as_deref(), Some("beta"));
}

#[tokio::test]
async fn no_search_match_goes_straight_to_synthesis() {
    let graph = chain_graph();
    let oracle = ScriptedOracle::new(&["Nothing in the graph matches."]);
    let agent = ReasoningAgent::new(oracle.clone());

    let response = agent
        .run(&graph, "zzz_not_present_zzz", None)
        .await
        .expect("run");

    assert_eq!(oracle.calls(), 1);
    assert_eq!(response.answer, "Nothing in the graph matches.");
    // No citations were gathered.
    assert_eq!(response.confidence, 0.5);
    assert!(response.citations.is_empty());
}

#[tokio::test]
async fn expired_deadline_aborts_before_any_oracle_call() {
    let graph = chain_graph();
    let oracle = ScriptedOracle::new(&["ANSWER: too late"]);
    let agent = ReasoningAgent::new(oracle.clone());

    let deadline = Instant::now() - Duration::from_secs(1);
    let err = agent
        .run(&graph, "alpha", Some(deadline))
        .await
        .expect_err("deadline error");

    assert!(matches!(err, AgentError::DeadlineExceeded));
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn oracle_failure_propagates_unmodified() {
    let graph = chain_graph();
    let agent = ReasoningAgent::new(Arc::new(FailingOracle));

    let err = agent.run(&graph, "alpha", None).await.expect_err("failure");
    assert!(matches!(err, AgentError::Oracle(_)));
}

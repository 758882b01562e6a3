use crate::error::{AgentError, Result};
use crate::prompts;
use codegraph_graph::{CodeGraph, GraphTraversal, NodeContext, NodeData};
use codegraph_oracle::{ChatOracle, Message};
use codegraph_protocol::{Citation, QueryResponse, ReasoningStep};
use std::sync::Arc;
use tokio::time::Instant;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Returned when the loop ends without the oracle ever producing an answer.
pub const NO_ANSWER_SENTINEL: &str = "Unable to find an answer.";

/// Bounded state machine: Planning -> Navigating (loop) -> Answering -> Done.
///
/// Strictly sequential: each oracle call depends on the node chosen by the
/// previous step, so at most one call is in flight per query.
pub struct ReasoningAgent {
    oracle: Arc<dyn ChatOracle>,
    max_iterations: usize,
}

#[derive(Default)]
struct AgentState {
    reasoning_steps: Vec<ReasoningStep>,
    citations: Vec<Citation>,
    /// Current focus node id; `None` forces a transition to Answering.
    focus: Option<String>,
    visited: Vec<String>,
    answer: Option<String>,
    confidence: f64,
    iterations: usize,
}

impl AgentState {
    fn push_step(
        &mut self,
        action: &str,
        node_visited: Option<String>,
        observation: Option<String>,
    ) {
        self.reasoning_steps.push(ReasoningStep {
            step_number: self.reasoning_steps.len() + 1,
            action: action.to_string(),
            node_visited,
            observation,
        });
    }

    fn cite(&mut self, node: &NodeData) {
        self.citations.push(Citation {
            file_path: node.file_path.clone(),
            start_line: node.start_line,
            end_line: node.end_line,
            content: node
                .source
                .clone()
                .or_else(|| node.signature.clone())
                .unwrap_or_default(),
            node_type: Some(node.kind),
            node_name: Some(node.name.clone()),
        });
    }
}

/// Parsed oracle navigation decision.
#[derive(Debug, PartialEq)]
enum Decision {
    Answer(String),
    Navigate(String),
    Done,
}

impl ReasoningAgent {
    pub fn new(oracle: Arc<dyn ChatOracle>) -> Self {
        Self {
            oracle,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Answer a question about `graph`, optionally bounded by a wall-clock
    /// deadline. The deadline is checked at the start of every Navigating
    /// pass and enforced around every oracle call.
    pub async fn run(
        &self,
        graph: &CodeGraph,
        question: &str,
        deadline: Option<Instant>,
    ) -> Result<QueryResponse> {
        let traversal = GraphTraversal::new(graph);
        let mut state = AgentState::default();

        self.plan(&traversal, question, &mut state);

        while state.iterations < self.max_iterations && state.answer.is_none() {
            check_deadline(deadline)?;
            match state.focus.clone() {
                Some(focus_id) => {
                    self.navigate(&traversal, question, &focus_id, &mut state, deadline)
                        .await?;
                }
                None => {
                    self.answer(question, &mut state, deadline).await?;
                }
            }
            state.iterations += 1;
        }

        if state.answer.is_none() {
            self.answer(question, &mut state, deadline).await?;
        }

        Ok(QueryResponse {
            answer: state
                .answer
                .unwrap_or_else(|| NO_ANSWER_SENTINEL.to_string()),
            citations: state.citations,
            reasoning_steps: state.reasoning_steps,
            confidence: state.confidence,
        })
    }

    /// Planning: keyword-search the question and pick the top match as the
    /// initial focus. No oracle involvement.
    fn plan(&self, traversal: &GraphTraversal<'_>, question: &str, state: &mut AgentState) {
        let hits = traversal.search_nodes(question, None, 10);
        state.push_step(
            "search",
            None,
            Some(format!(
                "Found {} potentially relevant code elements",
                hits.len()
            )),
        );

        if let Some(top) = hits.first() {
            log::debug!("Initial focus node: {} ({})", top.node.name, top.node_id);
            state.focus = Some(top.node_id.clone());
            state.visited.push(top.node_id.clone());
            state.cite(&top.node);
        }
    }

    /// One Navigating pass: show the oracle the focus node's one-hop context
    /// and act on its decision.
    async fn navigate(
        &self,
        traversal: &GraphTraversal<'_>,
        question: &str,
        focus_id: &str,
        state: &mut AgentState,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let Some(context) = traversal.node_context(focus_id, 1) else {
            // Focus id vanished from the graph; nothing left to explore.
            state.focus = None;
            return Ok(());
        };

        let prompt = prompts::navigation_prompt(question, &context);
        let reply = self
            .chat(
                &[
                    Message::system(prompts::SYSTEM_PROMPT),
                    Message::user(prompt),
                ],
                deadline,
            )
            .await?;

        match parse_decision(&reply) {
            Decision::Answer(text) => {
                state.push_step("answer", Some(focus_id.to_string()), None);
                state.answer = Some(text);
                state.confidence = 0.85;
            }
            Decision::Navigate(token) => match resolve_navigation(&context, &token) {
                Some(target) => {
                    state.push_step(
                        "navigate",
                        Some(focus_id.to_string()),
                        Some(format!("Navigating to {token}")),
                    );
                    if state.visited.contains(&target.id) {
                        // Already seen: force the Answering transition.
                        state.focus = None;
                    } else {
                        state.visited.push(target.id.clone());
                        state.cite(&target);
                        state.focus = Some(target.id);
                    }
                }
                None => {
                    state.push_step(
                        "done",
                        Some(focus_id.to_string()),
                        Some(format!("Could not find node: {token}")),
                    );
                    state.focus = None;
                }
            },
            Decision::Done => {
                state.push_step(
                    "done",
                    Some(focus_id.to_string()),
                    Some("Finished exploration".to_string()),
                );
                state.focus = None;
            }
        }
        Ok(())
    }

    /// Answering: one synthesis call over everything cited so far.
    async fn answer(
        &self,
        question: &str,
        state: &mut AgentState,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let prompt = prompts::synthesis_prompt(question, &state.citations);
        let reply = self
            .chat(
                &[
                    Message::system(prompts::SYSTEM_PROMPT),
                    Message::user(prompt),
                ],
                deadline,
            )
            .await?;

        state.answer = Some(reply);
        state.confidence = if state.citations.is_empty() { 0.5 } else { 0.85 };
        state.push_step(
            "answer",
            None,
            Some("Generated final answer from gathered context".to_string()),
        );
        Ok(())
    }

    async fn chat(&self, messages: &[Message], deadline: Option<Instant>) -> Result<String> {
        let reply = match deadline {
            Some(at) => tokio::time::timeout_at(at, self.oracle.chat(messages))
                .await
                .map_err(|_| AgentError::DeadlineExceeded)??,
            None => self.oracle.chat(messages).await?,
        };
        Ok(reply)
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<()> {
    if deadline.is_some_and(|at| Instant::now() >= at) {
        return Err(AgentError::DeadlineExceeded);
    }
    Ok(())
}

/// ASCII case-insensitive marker search. Returns the byte offset just past
/// the marker.
fn find_marker(reply: &str, marker: &str) -> Option<usize> {
    reply
        .as_bytes()
        .windows(marker.len())
        .position(|window| window.eq_ignore_ascii_case(marker.as_bytes()))
        .map(|at| at + marker.len())
}

/// Three literal markers, case-insensitive; the first one occurring in the
/// reply wins when several appear. Anything else (including a literal DONE)
/// ends exploration.
fn parse_decision(reply: &str) -> Decision {
    let answer_at = find_marker(reply, "ANSWER:");
    let navigate_at = find_marker(reply, "NAVIGATE:");

    match (answer_at, navigate_at) {
        (Some(answer), Some(navigate)) if navigate < answer => navigate_decision(reply, navigate),
        (Some(answer), _) => Decision::Answer(reply[answer..].trim().to_string()),
        (None, Some(navigate)) => navigate_decision(reply, navigate),
        (None, None) => Decision::Done,
    }
}

fn navigate_decision(reply: &str, after_marker: usize) -> Decision {
    match reply[after_marker..].split_whitespace().next() {
        Some(token) => Decision::Navigate(token.to_string()),
        None => Decision::Done,
    }
}

/// Successors first, then predecessors: first neighbor whose name contains
/// the token, case-insensitively.
fn resolve_navigation(context: &NodeContext, token: &str) -> Option<NodeData> {
    let token_lower = token.to_lowercase();
    context
        .successors
        .iter()
        .chain(context.predecessors.iter())
        .find(|neighbor| neighbor.node.name.to_lowercase().contains(&token_lower))
        .map(|neighbor| neighbor.node.clone())
}

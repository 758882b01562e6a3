use crate::error::{Result, ServiceError};
use codegraph_agent::ReasoningAgent;
use codegraph_graph::{CodeGraph, GraphBuilder, GraphStore};
use codegraph_oracle::ChatOracle;
use codegraph_protocol::{GraphPayload, GraphStats, ParsedElement, QueryResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepoStatus {
    Indexing,
    Ready,
}

/// Explicit service object: constructed once at startup, shared by
/// reference. No global registries.
pub struct CodeGraphService {
    builder: GraphBuilder,
    store: Arc<dyn GraphStore>,
    agent: ReasoningAgent,
    status: RwLock<HashMap<String, RepoStatus>>,
}

impl CodeGraphService {
    pub fn new(
        builder: GraphBuilder,
        store: Arc<dyn GraphStore>,
        oracle: Arc<dyn ChatOracle>,
    ) -> Self {
        Self {
            builder,
            store,
            agent: ReasoningAgent::new(oracle),
            status: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.agent = self.agent.with_max_iterations(max_iterations);
        self
    }

    /// Build (or rebuild) the graph for a repository from a parsed-element
    /// stream. The stored graph is replaced only after construction
    /// completes; a failed build leaves the previous graph, if any,
    /// untouched.
    pub async fn index_repository(
        &self,
        repo_id: &str,
        elements: Vec<ParsedElement>,
    ) -> Result<GraphStats> {
        self.status
            .write()
            .await
            .insert(repo_id.to_string(), RepoStatus::Indexing);

        let builder = self.builder.clone();
        let id = repo_id.to_string();
        let built = tokio::task::spawn_blocking(move || builder.build(&id, &elements)).await;

        match built {
            Ok(graph) => {
                let stats = graph.to_payload().stats;
                self.store.put(repo_id, graph);
                self.status
                    .write()
                    .await
                    .insert(repo_id.to_string(), RepoStatus::Ready);
                Ok(stats)
            }
            Err(join_err) => {
                log::error!("Graph build for {repo_id} did not complete: {join_err}");
                let mut status = self.status.write().await;
                if self.store.get(repo_id).is_some() {
                    status.insert(repo_id.to_string(), RepoStatus::Ready);
                } else {
                    status.remove(repo_id);
                }
                Err(ServiceError::BuildFailed {
                    repo_id: repo_id.to_string(),
                    reason: join_err.to_string(),
                })
            }
        }
    }

    /// Full inspection payload for a repository's graph.
    pub async fn graph(&self, repo_id: &str) -> Result<GraphPayload> {
        let graph = self.readable_graph(repo_id).await?;
        Ok(graph.to_payload())
    }

    /// Shared handle to a repository's graph, for callers that want to run
    /// traversal queries directly. The snapshot stays valid across a
    /// concurrent rebuild; it just won't see the replacement.
    pub async fn snapshot(&self, repo_id: &str) -> Result<Arc<CodeGraph>> {
        self.readable_graph(repo_id).await
    }

    /// Answer a natural-language question about a repository.
    pub async fn query(&self, repo_id: &str, question: &str) -> Result<QueryResponse> {
        self.query_with_deadline(repo_id, question, None).await
    }

    /// Same as [`query`](Self::query), bounded by a wall-clock deadline that
    /// is threaded through every oracle invocation.
    pub async fn query_with_deadline(
        &self,
        repo_id: &str,
        question: &str,
        deadline: Option<Instant>,
    ) -> Result<QueryResponse> {
        let graph = self.readable_graph(repo_id).await?;
        let response = self.agent.run(&graph, question, deadline).await?;
        Ok(response)
    }

    pub async fn delete_repository(&self, repo_id: &str) -> bool {
        self.status.write().await.remove(repo_id);
        self.store.delete(repo_id)
    }

    pub async fn list_repositories(&self) -> Vec<String> {
        self.store.list()
    }

    /// Status gate: no reads while a rebuild for the same id is in flight.
    async fn readable_graph(&self, repo_id: &str) -> Result<Arc<CodeGraph>> {
        if self.status.read().await.get(repo_id) == Some(&RepoStatus::Indexing) {
            return Err(ServiceError::RepositoryIndexing(repo_id.to_string()));
        }
        self.store
            .get(repo_id)
            .ok_or_else(|| ServiceError::NotFound(repo_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_graph::InMemoryGraphStore;
    use codegraph_oracle::{Message, OracleError};

    struct EchoOracle;

    #[async_trait::async_trait]
    impl ChatOracle for EchoOracle {
        async fn chat(
            &self,
            _messages: &[Message],
        ) -> std::result::Result<String, OracleError> {
            Ok("DONE".to_string())
        }
    }

    fn service() -> CodeGraphService {
        CodeGraphService::new(
            GraphBuilder::new(),
            Arc::new(InMemoryGraphStore::new()),
            Arc::new(EchoOracle),
        )
    }

    #[tokio::test]
    async fn queries_are_gated_while_indexing() {
        let service = service();
        service.store.put("repo", CodeGraph::new());
        service
            .status
            .write()
            .await
            .insert("repo".to_string(), RepoStatus::Indexing);

        let err = service.query("repo", "anything").await.expect_err("gated");
        assert!(matches!(err, ServiceError::RepositoryIndexing(_)));

        let err = service.graph("repo").await.expect_err("gated");
        assert!(matches!(err, ServiceError::RepositoryIndexing(_)));
    }

    #[tokio::test]
    async fn unknown_repository_is_not_found() {
        let service = service();
        let err = service.graph("missing").await.expect_err("not found");
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}

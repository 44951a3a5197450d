use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::graph::GraphSnapshot;

use super::topology::Topology;
use super::{LayoutRequest, LayoutResponse, relax};

/// Handle to the relaxation thread. Nothing is shared with it: requests go
/// in over one channel, positions come back over another, and only the
/// response echoing the most recently issued sequence number is accepted.
pub struct LayoutWorker {
    requests: Sender<LayoutRequest>,
    responses: Receiver<LayoutResponse>,
    latest: u64,
    applied: u64,
}

/// Newest request waiting on the channel, starting from one already
/// received. Everything older is superseded and never relaxed.
fn newest_pending(mut request: LayoutRequest, requests: &Receiver<LayoutRequest>) -> LayoutRequest {
    while let Ok(newer) = requests.try_recv() {
        debug!(
            skipped = request.sequence,
            newer = newer.sequence,
            "skipping superseded layout request"
        );
        request = newer;
    }
    request
}

/// Worker loop: relaxes only the newest queued request each round and exits
/// once either side of the channel pair is gone.
fn serve(requests: Receiver<LayoutRequest>, responses: Sender<LayoutResponse>) {
    while let Ok(request) = requests.recv() {
        let request = newest_pending(request, &requests);
        let sequence = request.sequence;
        if responses.send(relax(request)).is_err() {
            debug!(sequence, "layout receiver dropped; worker exiting");
            break;
        }
    }
}

impl LayoutWorker {
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = mpsc::channel::<LayoutRequest>();
        let (response_tx, response_rx) = mpsc::channel::<LayoutResponse>();

        thread::spawn(move || serve(request_rx, response_tx));

        Self {
            requests: request_tx,
            responses: response_rx,
            latest: 0,
            applied: 0,
        }
    }

    /// Issues a new relaxation and returns its sequence number. Any request
    /// still queued or running is superseded, not cancelled. The config is
    /// validated here so a malformed one never reaches the worker thread.
    pub fn submit(
        &mut self,
        graph: &GraphSnapshot,
        topology: &Topology,
        config: &LayoutConfig,
    ) -> Result<u64, LayoutError> {
        config.validate()?;
        self.latest += 1;
        let request = LayoutRequest::new(self.latest, graph, topology, config);
        debug!(
            sequence = self.latest,
            nodes = request.nodes.len(),
            "submitting layout request"
        );
        self.requests
            .send(request)
            .map_err(|_| LayoutError::WorkerDisconnected)?;
        Ok(self.latest)
    }

    pub fn is_pending(&self) -> bool {
        self.applied != self.latest
    }

    fn accept(&mut self, response: LayoutResponse) -> Option<LayoutResponse> {
        if response.sequence == self.latest {
            self.applied = response.sequence;
            Some(response)
        } else {
            debug!(
                sequence = response.sequence,
                latest = self.latest,
                "discarding stale layout result"
            );
            None
        }
    }

    /// Drains every finished result without blocking.
    pub fn poll(&mut self) -> Result<Option<LayoutResponse>, LayoutError> {
        let mut accepted = None;
        loop {
            match self.responses.try_recv() {
                Ok(response) => {
                    if let Some(response) = self.accept(response) {
                        accepted = Some(response);
                    }
                }
                Err(TryRecvError::Empty) => return Ok(accepted),
                Err(TryRecvError::Disconnected) => {
                    if accepted.is_some() {
                        return Ok(accepted);
                    }
                    warn!("layout worker disconnected");
                    return Err(LayoutError::WorkerDisconnected);
                }
            }
        }
    }

    /// Blocks until the latest request finishes or `timeout` elapses.
    pub fn wait_latest(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<LayoutResponse>, LayoutError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok(response) => {
                    if let Some(response) = self.accept(response) {
                        return Ok(Some(response));
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("layout worker disconnected");
                    return Err(LayoutError::WorkerDisconnected);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Adjacency, EdgeRecord, NodeRecord};
    use crate::layout::topology::{SiblingPages, TopologyParams, build_topology};

    fn topology_for(graph: &GraphSnapshot, max_depth: usize) -> Topology {
        let adjacency = Adjacency::from_graph(graph);
        let pages = SiblingPages::new();
        build_topology(
            graph,
            &adjacency,
            TopologyParams {
                root_id: "root",
                max_depth,
                page_size: 20,
                pages: &pages,
            },
        )
        .unwrap()
    }

    fn graph() -> GraphSnapshot {
        let mut graph = GraphSnapshot::default();
        graph.insert_node(NodeRecord::new("root", "root"));
        for index in 0..6 {
            let id = format!("n{index}");
            graph.insert_node(NodeRecord::new(&id, &id));
            graph.insert_edge(EdgeRecord::new(format!("e{index}"), "root", &id));
        }
        graph
    }

    #[test]
    fn only_latest_sequence_is_applied() {
        let graph = graph();
        let config = LayoutConfig::default();
        let shallow = topology_for(&graph, 0);
        let full = topology_for(&graph, 1);

        let mut worker = LayoutWorker::spawn();
        let first = worker.submit(&graph, &shallow, &config).unwrap();
        let second = worker.submit(&graph, &full, &config).unwrap();
        assert!(second > first);
        assert!(worker.is_pending());

        let response = worker
            .wait_latest(Duration::from_secs(30))
            .unwrap()
            .expect("latest layout should arrive");
        assert_eq!(response.sequence, second);
        assert_eq!(response.positions.len(), full.node_count());
        assert!(!worker.is_pending());
        assert_eq!(worker.poll().unwrap(), None);
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut worker = LayoutWorker::spawn();
        worker.latest = 3;
        let stale = LayoutResponse {
            sequence: 2,
            positions: Default::default(),
        };
        assert!(worker.accept(stale).is_none());
        let current = LayoutResponse {
            sequence: 3,
            positions: Default::default(),
        };
        assert_eq!(worker.accept(current).map(|r| r.sequence), Some(3));
    }

    #[test]
    fn queued_requests_collapse_to_the_newest() {
        let graph = graph();
        let config = LayoutConfig::default();
        let topology = topology_for(&graph, 1);

        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        for sequence in 1..=12 {
            request_tx
                .send(LayoutRequest::new(sequence, &graph, &topology, &config))
                .unwrap();
        }
        drop(request_tx);

        serve(request_rx, response_tx);
        let computed = response_rx.try_iter().map(|r| r.sequence).collect::<Vec<_>>();
        assert_eq!(computed, vec![12]);
    }

    #[test]
    fn malformed_config_is_rejected_before_queueing() {
        let graph = graph();
        let topology = topology_for(&graph, 1);
        let mut config = LayoutConfig::default();
        config.forces.min_ticks = 300;
        config.forces.max_ticks = 10;

        let mut worker = LayoutWorker::spawn();
        assert!(matches!(
            worker.submit(&graph, &topology, &config),
            Err(LayoutError::InvalidConfig(_))
        ));
        assert!(!worker.is_pending());

        let sequence = worker
            .submit(&graph, &topology, &LayoutConfig::default())
            .unwrap();
        assert_eq!(sequence, 1);
        assert!(worker.wait_latest(Duration::from_secs(30)).unwrap().is_some());
    }

    #[test]
    fn worker_output_matches_synchronous_relaxation() {
        let graph = graph();
        let config = LayoutConfig::default();
        let topology = topology_for(&graph, 1);
        let expected = relax(LayoutRequest::new(1, &graph, &topology, &config));

        let mut worker = LayoutWorker::spawn();
        worker.submit(&graph, &topology, &config).unwrap();
        let response = worker.wait_latest(Duration::from_secs(30)).unwrap().unwrap();
        assert_eq!(response, expected);
    }
}

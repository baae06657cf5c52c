//! Test helpers and builder patterns for orchestrator tests

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use orchestrator::{FileSystem, MockFileSystem, Orchestrator, PipelineConfig};
use shared::{TaskId, TaskOutcome};

use super::fixtures::TestFixtures;

/// Builder for orchestrators running on a mocked file system
pub struct OrchestratorBuilder {
    workers: usize,
    batch_size: usize,
    file_system: MockFileSystem,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            workers: TestFixtures::DEFAULT_WORKERS,
            batch_size: TestFixtures::DEFAULT_BATCH_SIZE,
            file_system: MockFileSystem::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_file_system(mut self, file_system: MockFileSystem) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn start(self) -> Orchestrator<MockFileSystem> {
        let config = PipelineConfig::default()
            .with_workers(self.workers)
            .with_batch_size(self.batch_size);
        Orchestrator::start(self.file_system, &config).unwrap()
    }
}

/// Writer whose bytes stay observable after the pipeline drops it
#[derive(Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Collection of test helper functions
pub struct TestHelpers;

impl TestHelpers {
    pub const POLL_TIMEOUT: Duration = Duration::from_secs(120);

    /// Mock file system that serves `input` and captures output in `sink`
    pub fn in_memory_file_system(input: &'static str, sink: SharedSink) -> MockFileSystem {
        let mut file_system = MockFileSystem::new();
        file_system.expect_store_input().returning(|_, _| Ok(0));
        file_system
            .expect_open_input()
            .returning(move |_| Ok(Box::new(input.as_bytes())));
        file_system
            .expect_create_staging_output()
            .returning(move |_| Ok(Box::new(sink.clone())));
        file_system
            .expect_publish_output()
            .returning(|id| Ok(PathBuf::from(format!("/published/{id}_output.csv"))));
        file_system.expect_discard_output().returning(|_| Ok(()));
        file_system
    }

    /// Poll until the task reaches a terminal state
    pub async fn wait_for_terminal<F>(orchestrator: &Orchestrator<F>, task_id: &TaskId) -> TaskOutcome
    where
        F: FileSystem + 'static,
    {
        let poll = async {
            loop {
                let outcome = orchestrator.result(task_id).await;
                if outcome.is_terminal() {
                    return outcome;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };

        tokio::time::timeout(Self::POLL_TIMEOUT, poll)
            .await
            .expect("task did not reach a terminal state in time")
    }
}

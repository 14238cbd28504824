//! Integration tests for the job runner
//!
//! Jobs are stored in an in-memory SQLite store, queued, and run against
//! wiremock servers.

use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sumi_harvest::config::{Config, CrawlerConfig, WorkerConfig};
use sumi_harvest::jobs::{job_queue, JobQueue, JobRunner, JobSpec, JobStatus, SelectorSpec, NO_DATA_MESSAGE};
use sumi_harvest::safety::StaticResolver;
use sumi_harvest::storage::{JobStore, SqliteJobStore};
use sumi_harvest::CrawlController;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUBLIC_ADDR: &str = "93.184.216.34";

const CARDS: &str = r#"<html><body>
    <div class="card product"><h3>Red Mug</h3><span class="price">$10</span></div>
    <div class="card product"><h3>Blue Mug</h3><span class="price">$11</span></div>
    <div class="card product"><h3>Gold Mug</h3><span class="price">$12</span></div>
    <div class="card product"><h3>Jade Mug</h3><span class="price">$13</span></div>
    <div class="card product"><h3>Pink Mug</h3><span class="price">$14</span></div>
</body></html>"#;

struct Harness {
    store: Arc<Mutex<SqliteJobStore>>,
    queue: JobQueue,
    runner: JobRunner<SqliteJobStore>,
}

fn worker_config() -> WorkerConfig {
    WorkerConfig {
        dequeue_timeout_ms: 20,
        idle_delay_ms: 10,
    }
}

fn harness(resolve_to: &str) -> Harness {
    let config = Config {
        crawler: CrawlerConfig {
            request_timeout_secs: 5,
            request_delay_ms: 0,
            max_pagination_links: 5,
        },
        ..Config::default()
    };
    let addr: IpAddr = resolve_to.parse().expect("valid address");
    let controller = CrawlController::new(&config)
        .expect("Failed to build controller")
        .with_resolver(Arc::new(StaticResolver::always(addr)));

    let store = Arc::new(Mutex::new(
        SqliteJobStore::new_in_memory().expect("Failed to open store"),
    ));
    let (queue, receiver) = job_queue();
    let runner = JobRunner::new(
        Arc::clone(&store),
        Arc::new(controller),
        receiver,
        worker_config(),
    );

    Harness {
        store,
        queue,
        runner,
    }
}

impl Harness {
    fn submit(&self, spec: JobSpec) -> String {
        let job = self.store.lock().unwrap().create_job(&spec).unwrap();
        self.queue.enqueue(job.id.clone());
        job.id
    }

    fn status(&self, id: &str) -> (JobStatus, Option<String>) {
        let job = self.store.lock().unwrap().get_job(id).unwrap().unwrap();
        (job.status, job.error_message)
    }
}

async fn mount(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_successful_job_completes_with_results() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "/mugs", CARDS).await;

    let mut h = harness(PUBLIC_ADDR);
    let id = h.submit(JobSpec::new(format!("{}/mugs", mock_server.uri()), "u1"));

    assert_eq!(h.runner.run_until_idle().await, 1);

    let (status, error) = h.status(&id);
    assert_eq!(status, JobStatus::Completed);
    assert!(error.is_none());

    let store = h.store.lock().unwrap();
    let job = store.get_job(&id).unwrap().unwrap();
    assert!(job.completed_at.is_some());

    let records = store.get_results(&id).unwrap();
    assert_eq!(records.len(), 5);
    assert!(records
        .iter()
        .all(|r| r.text("title").is_some() && r.text("price").is_some()));
}

#[tokio::test]
async fn test_private_target_fails_with_safety_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CARDS))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut h = harness("127.0.0.1");
    let id = h.submit(JobSpec::new(format!("{}/mugs", mock_server.uri()), "u1"));

    h.runner.run_until_idle().await;

    let (status, error) = h.status(&id);
    assert_eq!(status, JobStatus::Failed);
    assert!(error.unwrap().contains("private or local IP address"));
    assert!(h.store.lock().unwrap().get_results(&id).unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_extraction_fails_with_no_data() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "/mugs", CARDS).await;

    let mut h = harness(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/mugs", mock_server.uri()), "u1")
        .with_selectors(SelectorSpec::new().with_field("author", ".byline"));
    let id = h.submit(spec);

    h.runner.run_until_idle().await;

    let (status, error) = h.status(&id);
    assert_eq!(status, JobStatus::Failed);
    assert_eq!(error.as_deref(), Some(NO_DATA_MESSAGE));
}

#[tokio::test]
async fn test_loop_survives_failing_jobs() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "/mugs", CARDS).await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let mut h = harness(PUBLIC_ADDR);
    let failing = h.submit(JobSpec::new(format!("{}/down", mock_server.uri()), "u1"));
    h.queue.enqueue("no-such-job");
    let passing = h.submit(JobSpec::new(format!("{}/mugs", mock_server.uri()), "u1"));

    assert_eq!(h.runner.run_until_idle().await, 3);

    let (status, error) = h.status(&failing);
    assert_eq!(status, JobStatus::Failed);
    assert!(error.unwrap().contains("HTTP 503"));
    assert_eq!(h.status(&passing).0, JobStatus::Completed);
}

#[tokio::test]
async fn test_finished_job_is_not_rerun() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mugs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CARDS))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut h = harness(PUBLIC_ADDR);
    let id = h.submit(JobSpec::new(format!("{}/mugs", mock_server.uri()), "u1"));
    h.runner.run_until_idle().await;

    assert_eq!(h.runner.process_job(&id).await, None);
    assert_eq!(h.status(&id).0, JobStatus::Completed);
}

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "/mugs", CARDS).await;

    let h = harness(PUBLIC_ADDR);
    let id = h.submit(JobSpec::new(format!("{}/mugs", mock_server.uri()), "u1"));
    let Harness {
        store,
        queue,
        runner,
    } = h;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(runner.run(shutdown_rx));

    let mut completed = false;
    for _ in 0..200 {
        if store.lock().unwrap().get_job(&id).unwrap().unwrap().status == JobStatus::Completed {
            completed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(completed, "job should complete while the runner is live");

    shutdown_tx.send(true).unwrap();
    let processed = tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("runner should stop after shutdown")
        .unwrap();

    assert_eq!(processed, 1);
    drop(queue);
}

#[tokio::test]
async fn test_run_stops_when_queue_closes() {
    let h = harness(PUBLIC_ADDR);
    let Harness { queue, runner, .. } = h;
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    drop(queue);
    let processed = tokio::time::timeout(Duration::from_secs(5), runner.run(shutdown_rx))
        .await
        .expect("runner should stop once the queue closes");

    assert_eq!(processed, 0);
}

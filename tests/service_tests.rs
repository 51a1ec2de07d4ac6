//! End-to-end tests against a real listener and the compiled binary.
//!
//! In-process tests bind 127.0.0.1:0 and talk to the server with reqwest.
//! Binary tests spawn `argos-oracle` in an empty temporary directory with an
//! explicit environment.
//!
//! Run with: cargo test --test service_tests
use std::net::{SocketAddr, TcpListener};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use argos_oracle::http::{self, ServerError};
use argos_oracle::routes::status::StatusPayload;
use argos_oracle::{create_router, AppConfig, AppState, EnvSnapshot};
use axum_server::Handle;
use tempfile::TempDir;
use tokio::task::JoinHandle;

const BIN: &str = env!("CARGO_BIN_EXE_argos-oracle");
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A server running on the test runtime
struct TestServer {
    addr: SocketAddr,
    handle: Handle,
    task: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    async fn start(extra_env: &[(&str, &str)]) -> Self {
        let mut env = EnvSnapshot::new();
        env.insert("HOST".into(), "127.0.0.1".into());
        env.insert("PORT".into(), "0".into());
        for (k, v) in extra_env {
            env.insert(k.to_string(), v.to_string());
        }

        let config = AppConfig::from_env(&env).unwrap();
        let listener = http::bind(&config.http).unwrap();
        let addr = listener.local_addr();

        let handle = Handle::new();
        let app = create_router(AppState::new(config));
        let task = tokio::spawn(listener.serve(app, handle.clone()));

        Self { addr, handle, task }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.handle.graceful_shutdown(Some(Duration::from_secs(1)));
        let result = tokio::time::timeout(STARTUP_TIMEOUT, self.task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked");
        assert!(result.is_ok(), "server returned {result:?}");
    }
}

/// The compiled binary running in its own working directory
struct ServiceProcess {
    child: Child,
    // Held until the process is reaped so the directory outlives it
    _workdir: TempDir,
}

impl ServiceProcess {
    /// Spawn with `HOST=127.0.0.1` and the given `PORT`. The working
    /// directory is empty, so no stray .env is picked up.
    fn spawn(port: &str) -> Self {
        let workdir = tempfile::tempdir().unwrap();
        let child = Command::new(BIN)
            .current_dir(workdir.path())
            .env("HOST", "127.0.0.1")
            .env("PORT", port)
            .env_remove("APP_TITLE")
            .env_remove("LOG_FORMAT")
            .env_remove("SHUTDOWN_TIMEOUT_SECS")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn binary");

        Self {
            child,
            _workdir: workdir,
        }
    }

    /// Block until the process exits; kills it and returns `None` on timeout.
    fn wait_for_exit(&mut self, timeout: Duration) -> Option<ExitStatus> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait().unwrap() {
                return Some(status);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        self.kill();
        None
    }

    /// Async counterpart of [`Self::wait_for_exit`] for use on the test runtime.
    async fn exited_within(&mut self, timeout: Duration) -> Option<ExitStatus> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait().unwrap() {
                return Some(status);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        self.kill();
        None
    }

    /// Poll `GET /` until the service answers.
    async fn wait_until_serving(&mut self, port: u16) -> StatusPayload {
        let url = format!("http://127.0.0.1:{}/", port);
        let deadline = Instant::now() + STARTUP_TIMEOUT;

        loop {
            match reqwest::get(&url).await {
                Ok(response) if response.status().is_success() => {
                    return response.json::<StatusPayload>().await.unwrap();
                }
                _ if Instant::now() < deadline => {
                    if let Ok(Some(status)) = self.child.try_wait() {
                        panic!("binary exited early with {status}");
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                other => {
                    self.kill();
                    panic!("binary did not come up: {other:?}");
                }
            }
        }
    }

    fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for ServiceProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            self.kill();
        }
    }
}

/// A port that was free a moment ago.
fn free_port() -> u16 {
    let probe = TcpListener::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap().port()
}

#[tokio::test]
async fn root_returns_active_status() {
    let server = TestServer::start(&[]).await;

    let response = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let payload: StatusPayload = response.json().await.unwrap();
    assert_eq!(payload.status, "ARGOS Oracle (AI) is active");

    server.stop().await;
}

#[tokio::test]
async fn status_is_stable_across_concurrent_requests() {
    let server = TestServer::start(&[("APP_TITLE", "Load Oracle")]).await;
    let client = reqwest::Client::new();

    let requests = (0..16).map(|_| {
        let request = client.get(server.url("/"));
        async move {
            let response = request.send().await?;
            let status = response.status();
            let payload = response.json::<StatusPayload>().await?;
            Ok::<_, reqwest::Error>((status, payload))
        }
    });

    for result in futures::future::join_all(requests).await {
        let (status, payload) = result.unwrap();
        assert!(status.is_success());
        assert!(!payload.status.is_empty());
        assert_eq!(payload, StatusPayload::active("Load Oracle"));
    }

    server.stop().await;
}

#[tokio::test]
async fn undefined_path_is_a_client_error() {
    let server = TestServer::start(&[]).await;

    let response = reqwest::get(server.url("/v1/oracle/query")).await.unwrap();
    assert!(response.status().is_client_error());

    // The server is still healthy afterwards
    let response = reqwest::get(server.url("/")).await.unwrap();
    assert!(response.status().is_success());

    server.stop().await;
}

#[tokio::test]
async fn second_instance_cannot_bind_the_same_port() {
    let server = TestServer::start(&[]).await;

    let mut env = EnvSnapshot::new();
    env.insert("HOST".into(), "127.0.0.1".into());
    env.insert("PORT".into(), server.addr.port().to_string());
    let config = AppConfig::from_env(&env).unwrap();

    assert!(matches!(
        http::bind(&config.http),
        Err(ServerError::Bind { .. })
    ));

    server.stop().await;
}

#[test]
fn binary_exits_non_zero_when_port_is_taken() {
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut service = ServiceProcess::spawn(&port.to_string());
    let status = service
        .wait_for_exit(STARTUP_TIMEOUT)
        .expect("binary kept running on an occupied port");

    assert!(!status.success());
    drop(occupied);
}

#[test]
fn binary_exits_non_zero_on_invalid_port() {
    let mut service = ServiceProcess::spawn("not-a-port");
    let status = service
        .wait_for_exit(STARTUP_TIMEOUT)
        .expect("binary did not exit");

    assert!(!status.success());
}

#[tokio::test]
async fn binary_serves_status_on_configured_port() {
    let port = free_port();
    let mut service = ServiceProcess::spawn(&port.to_string());

    let payload = service.wait_until_serving(port).await;
    assert_eq!(payload.status, "ARGOS Oracle (AI) is active");
}

#[cfg(unix)]
#[tokio::test]
async fn binary_exits_zero_after_sigterm() {
    let port = free_port();
    let mut service = ServiceProcess::spawn(&port.to_string());
    service.wait_until_serving(port).await;

    let sent = Command::new("kill")
        .args(["-TERM", &service.child.id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(sent.success());

    let status = service
        .exited_within(STARTUP_TIMEOUT)
        .await
        .expect("binary did not stop after SIGTERM");
    assert!(status.success(), "exit status after SIGTERM: {status}");
}

use {
    crate::service::{ErrorMapper, SigningService},
    hyper_util::{
        rt::{TokioExecutor, TokioIo},
        server::{conn::auto::Builder as HttpConnBuilder, graceful::GracefulShutdown},
    },
    log::{error, info, warn},
    std::{future::Future, time::Duration},
    tokio::{net::TcpListener, time::sleep},
};

/// Pause after the first failed accept.
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);

/// Longest pause between failed accepts.
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Serve `service` on `listener` until `shutdown` resolves, then wait for in-flight connections to
/// drain.
///
/// Each connection runs on its own task and may speak HTTP/1.1 or HTTP/2. Accept errors (such as
/// running out of file descriptors) are logged, and accepting resumes after a pause that doubles
/// with each consecutive failure.
pub async fn serve<E, F>(listener: TcpListener, service: SigningService<E>, shutdown: F)
where
    E: ErrorMapper,
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let mut accept_failures = 0u32;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => {
                        accept_failures = 0;
                        conn
                    }
                    Err(e) => {
                        let backoff = accept_backoff(accept_failures);
                        accept_failures = accept_failures.saturating_add(1);
                        warn!("Failed to accept connection: {}; retrying in {:?}", e, backoff);
                        sleep(backoff).await;
                        continue;
                    }
                };

                let conn = http.serve_connection(TokioIo::new(stream), service.clone());
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!("Connection error from {}: {}", peer_addr, e);
                    }
                });
            }

            () = &mut shutdown => {
                info!("Shutdown requested; draining connections");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("All connections drained");
}

/// How long to wait before accepting again after `failures` consecutive failed accepts.
fn accept_backoff(failures: u32) -> Duration {
    ACCEPT_BACKOFF_MIN.saturating_mul(1 << failures.min(8)).min(ACCEPT_BACKOFF_MAX)
}

#[cfg(test)]
mod tests {
    use {
        super::{accept_backoff, ACCEPT_BACKOFF_MAX},
        pretty_assertions::assert_eq,
        std::time::Duration,
    };

    #[test_log::test]
    fn accept_backoff_doubles_then_caps() {
        assert_eq!(accept_backoff(0), Duration::from_millis(5));
        assert_eq!(accept_backoff(1), Duration::from_millis(10));
        assert_eq!(accept_backoff(7), Duration::from_millis(640));
        assert_eq!(accept_backoff(8), ACCEPT_BACKOFF_MAX);
        assert_eq!(accept_backoff(u32::MAX), ACCEPT_BACKOFF_MAX);

        for failures in 0..16 {
            assert!(accept_backoff(failures) > Duration::ZERO);
            assert!(accept_backoff(failures) <= accept_backoff(failures + 1));
        }
    }
}

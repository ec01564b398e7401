use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::*;
use ssg_runner::config::PortSetting;
use ssg_runner::error::{Error, Result};
use ssg_runner::port::{LocalPortFinder, PortFinder, PortResolver};
use std::net::TcpListener;
use std::sync::Arc;

// Define a mock for the PortFinder trait
mock! {
    pub Finder {}

    #[async_trait]
    impl PortFinder for Finder {
        async fn find_free_port(&self, range: Option<(u16, u16)>) -> Result<u16>;
    }
}

fn resolver(finder: MockFinder) -> PortResolver {
    PortResolver::new(Arc::new(finder))
}

/// Holds `len` consecutive loopback ports open and returns the first one.
fn occupy_block(len: u16) -> (u16, Vec<TcpListener>) {
    for base in (20000..60000).step_by(usize::from(len) + 7) {
        let listeners: Vec<TcpListener> = (base..base + len)
            .map_while(|port| TcpListener::bind(("127.0.0.1", port)).ok())
            .collect();
        if listeners.len() == usize::from(len) {
            return (base, listeners);
        }
    }
    panic!("no block of {} free ports to occupy", len);
}

#[tokio::test]
async fn test_fixed_port_skips_search() -> Result<()> {
    let mut finder = MockFinder::new();
    finder.expect_find_free_port().times(0);

    let port = resolver(finder)
        .resolve(Some(PortSetting::Fixed(3000)))
        .await?;
    assert_eq!(port, 3000);

    Ok(())
}

#[tokio::test]
async fn test_range_is_searched() -> Result<()> {
    let mut finder = MockFinder::new();
    finder
        .expect_find_free_port()
        .with(eq(Some((5000, 5010))))
        .times(1)
        .returning(|_| Ok(5003));

    let port = resolver(finder)
        .resolve(Some(PortSetting::Range(5000, 5010)))
        .await?;
    assert_eq!(port, 5003);

    Ok(())
}

#[tokio::test]
async fn test_absent_port_searches_everything() -> Result<()> {
    let mut finder = MockFinder::new();
    finder
        .expect_find_free_port()
        .with(eq(None))
        .times(1)
        .returning(|_| Ok(41234));

    assert_eq!(resolver(finder).resolve(None).await?, 41234);

    Ok(())
}

#[tokio::test]
async fn test_out_of_range_ports_fail() {
    for port in [0, -1, 65536, 100_000] {
        let mut finder = MockFinder::new();
        finder.expect_find_free_port().times(0);

        let result = resolver(finder).resolve(Some(PortSetting::Fixed(port))).await;
        assert!(
            matches!(result, Err(Error::PortResolution(_))),
            "port {} should be rejected",
            port
        );
    }
}

#[tokio::test]
async fn test_malformed_ranges_fail_before_search() {
    for (low, high) in [(0, 10), (70000, 80000), (5010, 5000)] {
        let mut finder = MockFinder::new();
        finder.expect_find_free_port().times(0);

        let result = resolver(finder)
            .resolve(Some(PortSetting::Range(low, high)))
            .await;
        assert!(matches!(result, Err(Error::PortResolution(_))));
    }
}

#[tokio::test]
async fn test_range_past_port_space_is_clamped() -> Result<()> {
    let mut finder = MockFinder::new();
    finder
        .expect_find_free_port()
        .with(eq(Some((65000, 65535))))
        .times(1)
        .returning(|_| Ok(65100));

    let port = resolver(finder)
        .resolve(Some(PortSetting::Range(65000, 70000)))
        .await?;
    assert_eq!(port, 65100);

    Ok(())
}

#[tokio::test]
async fn test_finder_returning_zero_is_invalid() {
    let mut finder = MockFinder::new();
    finder.expect_find_free_port().returning(|_| Ok(0));

    let result = resolver(finder).resolve(None).await;
    assert!(matches!(result, Err(Error::PortResolution(_))));
}

#[tokio::test]
async fn test_local_finder_picks_free_port_in_range() -> Result<()> {
    let (base, mut listeners) = occupy_block(2);
    // Release the second port; the first stays taken
    listeners.pop();

    let finder = LocalPortFinder::default();
    let port = finder.find_free_port(Some((base, base + 1))).await?;
    assert_eq!(port, base + 1);

    Ok(())
}

#[tokio::test]
async fn test_all_ports_in_range_occupied() {
    let (base, _listeners) = occupy_block(11);

    let result = PortResolver::default()
        .resolve(Some(PortSetting::Range(i64::from(base), i64::from(base) + 10)))
        .await;

    match result {
        Err(Error::PortResolution(msg)) => assert!(msg.contains("no available ports")),
        other => panic!("expected a port resolution error, got {:?}", other),
    }
}

//! Ctrl-C handling. Kept in its own test binary because the signal is sent
//! to the whole process.

mod common;

use common::{FakeChain, Harness, ONE, reserves};
use std::sync::atomic::Ordering;
use std::time::Duration;

#[cfg(unix)]
#[tokio::test]
async fn sigint_mid_cycle_waits_for_persist_then_stops() {
    let chain = FakeChain {
        read_delay: Some(Duration::from_millis(1500)),
        ..FakeChain::new((900, 11), ONE, 0)
    };
    let h = Harness::new(chain, true);
    h.seed(&reserves(1000, 10));

    let pid = std::process::id().to_string();
    let sender = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        std::process::Command::new("kill")
            .args(["-INT", &pid])
            .status()
            .unwrap()
    });

    tokio::time::timeout(
        Duration::from_secs(10),
        h.orchestrator.run(Duration::from_secs(3600), false),
    )
    .await
    .expect("scheduler should exit after the interrupted cycle");

    assert!(sender.await.unwrap().success());
    assert_eq!(h.chain.reads.load(Ordering::SeqCst), 1);
    assert_eq!(h.saved(), reserves(900, 11));
}

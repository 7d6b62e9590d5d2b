//! Component lifecycle tests
//!
//! Inbound message handling, the periodic membership sweep and the debounced
//! cache refresh, all driven through a started component on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use profilesync_core::sync::encode_profile_info;
use profilesync_core::{
    ConnectedPeer, HostServices, InvalidationCounter, MemoryStorage, MemoryTransport, PeerAddress,
    ProfileInfo, ProfileSyncComponent, ProfileSyncConfig, ProfileSyncError, RefreshState,
    SessionFlags, StaticIdentity, TokioScheduler, UserId, PROFILE_INFO_TAG,
};

// ============================================================================
// Test Utilities
// ============================================================================

struct Session {
    transport: Arc<MemoryTransport>,
    flags: Arc<SessionFlags>,
    cache: Arc<InvalidationCounter>,
    profiles: ProfileSyncComponent,
}

fn start_session(local_id: u64, flags: SessionFlags) -> Session {
    let transport = Arc::new(MemoryTransport::new());
    let flags = Arc::new(flags);
    let cache = Arc::new(InvalidationCounter::new());

    let services = HostServices {
        identity: Arc::new(StaticIdentity(UserId(local_id))),
        role: flags.clone(),
        transport: transport.clone(),
        scheduler: Arc::new(TokioScheduler::current().unwrap()),
        storage: Arc::new(MemoryStorage::new()),
        cache: cache.clone(),
    };
    let profiles = ProfileSyncComponent::start(services, &ProfileSyncConfig::default()).unwrap();

    Session {
        transport,
        flags,
        cache,
        profiles,
    }
}

fn host_addr() -> PeerAddress {
    "203.0.113.5:28960".parse().unwrap()
}

fn peer_addr(port: u16) -> PeerAddress {
    format!("192.168.1.10:{}", port).parse().unwrap()
}

fn message(user_id: u64, version: i32, payload: &'static str) -> Vec<u8> {
    encode_profile_info(UserId(user_id), &ProfileInfo::new(version, payload.as_bytes()))
        .unwrap()
        .to_vec()
}

// ============================================================================
// Handler Registration
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_participant_registers_handler() {
    let session = start_session(100, SessionFlags::joined(host_addr()));
    assert!(session.transport.has_handler(PROFILE_INFO_TAG));
}

#[tokio::test(start_paused = true)]
async fn test_host_registers_no_handler() {
    let session = start_session(1, SessionFlags::hosting());
    assert!(!session.transport.has_handler(PROFILE_INFO_TAG));
}

// ============================================================================
// Inbound Messages
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_message_from_host_is_ingested() {
    let session = start_session(100, SessionFlags::joined(host_addr()));

    session
        .transport
        .deliver(host_addr(), PROFILE_INFO_TAG, &message(101, 2, "remote"));

    assert_eq!(
        session.profiles.get_profile_info(UserId(101)),
        Some(ProfileInfo::new(2, &b"remote"[..]))
    );
}

#[tokio::test(start_paused = true)]
async fn test_message_from_non_host_is_dropped() {
    let session = start_session(100, SessionFlags::joined(host_addr()));

    session
        .transport
        .deliver(peer_addr(4000), PROFILE_INFO_TAG, &message(101, 2, "spoofed"));

    assert!(session.profiles.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_own_profile_from_host_is_ignored() {
    let session = start_session(100, SessionFlags::joined(host_addr()));

    session
        .transport
        .deliver(host_addr(), PROFILE_INFO_TAG, &message(100, 1, "echo"));

    assert!(session.profiles.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_message_is_rejected() {
    let session = start_session(100, SessionFlags::joined(host_addr()));

    let mut truncated = message(101, 2, "remote");
    truncated.truncate(14);

    let err = session
        .profiles
        .handle_message(host_addr(), &truncated)
        .unwrap_err();
    assert!(matches!(err, ProfileSyncError::Decode(_)));

    // Through the registered handler the failure is logged, not propagated
    session
        .transport
        .deliver(host_addr(), PROFILE_INFO_TAG, &truncated);
    assert!(session.profiles.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_handler_outlives_component_safely() {
    let session = start_session(100, SessionFlags::joined(host_addr()));
    let transport = session.transport.clone();
    drop(session);

    // The component is gone; the handler must be a no-op
    assert!(transport.deliver(host_addr(), PROFILE_INFO_TAG, &message(101, 1, "late")));
}

// ============================================================================
// Debounced Cache Refresh
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_of_ingests_refreshes_cache_once() {
    let session = start_session(100, SessionFlags::joined(host_addr()));

    for id in 101..121u64 {
        session
            .transport
            .deliver(host_addr(), PROFILE_INFO_TAG, &message(id, 1, "burst"));
    }
    assert_eq!(session.profiles.registry().len(), 20);
    assert_eq!(session.profiles.cache_refresh().state(), RefreshState::Pending);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(session.cache.count(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(session.cache.count(), 1);
    assert_eq!(session.profiles.cache_refresh().state(), RefreshState::Idle);

    // A later burst refreshes again
    session
        .transport
        .deliver(host_addr(), PROFILE_INFO_TAG, &message(200, 1, "later"));
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(session.cache.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_ignored_messages_do_not_refresh_cache() {
    let session = start_session(100, SessionFlags::joined(host_addr()));

    session
        .transport
        .deliver(host_addr(), PROFILE_INFO_TAG, &message(100, 1, "self"));
    session
        .transport
        .deliver(peer_addr(4000), PROFILE_INFO_TAG, &message(101, 1, "spoofed"));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(session.cache.count(), 0);
}

// ============================================================================
// Membership Sweep
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_periodic_sweep_removes_disconnected() {
    let session = start_session(1, SessionFlags::hosting());
    session
        .transport
        .connect(ConnectedPeer::new(peer_addr(1000), UserId(100)));
    session
        .transport
        .connect(ConnectedPeer::new(peer_addr(1001), UserId(101)));

    session.profiles.add_profile_info(UserId(100), ProfileInfo::new(1, &b"a"[..]));
    session.profiles.add_profile_info(UserId(101), ProfileInfo::new(1, &b"b"[..]));

    session.transport.disconnect(UserId(101));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(session.profiles.registry().len(), 2);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(session.profiles.registry().len(), 1);
    assert!(session.profiles.get_profile_info(UserId(100)).is_some());
    assert!(session.profiles.get_profile_info(UserId(101)).is_none());

    // The sweep never talks to the network
    assert!(session.transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_waits_for_active_session() {
    let session = start_session(1, SessionFlags::hosting());
    session.flags.set_session_active(false);
    session.profiles.add_profile_info(UserId(100), ProfileInfo::default());

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(session.profiles.registry().len(), 1);

    session.flags.set_session_active(true);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(session.profiles.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_participant_never_sweeps() {
    let session = start_session(100, SessionFlags::joined(host_addr()));
    session
        .transport
        .deliver(host_addr(), PROFILE_INFO_TAG, &message(101, 1, "remote"));

    assert_eq!(session.profiles.sweep_now(), 0);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(session.profiles.registry().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_sweep() {
    let session = start_session(1, SessionFlags::hosting());
    session.profiles.add_profile_info(UserId(100), ProfileInfo::default());

    session.profiles.shutdown();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(session.profiles.registry().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_rejected() {
    let config = ProfileSyncConfig {
        reconcile_interval_secs: 0,
        ..ProfileSyncConfig::default()
    };

    let services = HostServices {
        identity: Arc::new(StaticIdentity(UserId(1))),
        role: Arc::new(SessionFlags::hosting()),
        transport: Arc::new(MemoryTransport::new()),
        scheduler: Arc::new(TokioScheduler::current().unwrap()),
        storage: Arc::new(MemoryStorage::new()),
        cache: Arc::new(InvalidationCounter::new()),
    };

    let err = ProfileSyncComponent::start(services, &config).unwrap_err();
    assert!(matches!(err, ProfileSyncError::Config(_)));
}

//! End-to-end scenarios: notifications, correlation, timeouts, dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use pebblelink::{
    BlobCommand, BlobDatabase, BlobResponse, BlobStatus, ChannelSink, DevConnectionSink,
    NotificationSource, PebbleClient, PebblePacket, PingPong, ProtocolConfig, PushNotification,
    RELAY_FRAME_TYPE, ReplyError, TimelineAttributeId, TimelineItem, TimelineItemType,
    unwrap_relay,
};

use super::WatchHarness;

fn test_notification() -> PushNotification {
    PushNotification::new("Test Notif", "This is the notification body")
        .with_subject("This is a test notification!")
        .with_background_color(0xF3)
        .with_source(NotificationSource::Email)
}

#[tokio::test(start_paused = true)]
async fn test_notification_insert_resolves_success() {
    let mut watch = WatchHarness::start(ProtocolConfig::default(), 1);
    let client = watch.client.clone();
    let push = tokio::spawn(async move { client.push_notification(&test_notification()).await });

    let packet = watch.next_command().await;
    let BlobCommand::Insert {
        database,
        key,
        value,
    } = &packet.command
    else {
        panic!("expected insert, got {:?}", packet.command);
    };
    assert_eq!(*database, BlobDatabase::Notification);
    assert_eq!(key.len(), 16);

    let item = TimelineItem::decode(value).expect("timeline item");
    assert_eq!(item.item_id.as_bytes(), key.as_ref());
    assert_eq!(item.item_type, TimelineItemType::Notification);
    let text = |id| item.attribute(id).and_then(|a| a.as_str());
    assert_eq!(text(TimelineAttributeId::TITLE), Some("Test Notif"));
    assert_eq!(
        text(TimelineAttributeId::SUBTITLE),
        Some("This is a test notification!")
    );
    assert_eq!(
        text(TimelineAttributeId::BODY),
        Some("This is the notification body")
    );
    assert_eq!(
        item.attribute(TimelineAttributeId::TINY_ICON)
            .and_then(|a| a.as_u32()),
        Some(0x8000_0000 | 19)
    );
    assert_eq!(
        item.attribute(TimelineAttributeId::BACKGROUND_COLOR)
            .map(|a| a.content.as_ref()),
        Some(&[0xF3][..])
    );

    watch.respond(packet.token, BlobStatus::Success).await;
    assert_eq!(push.await.expect("join"), Ok(BlobStatus::Success));
}

#[tokio::test(start_paused = true)]
async fn test_responses_correlate_by_token() {
    const REQUESTS: usize = 8;
    let mut watch = WatchHarness::start(ProtocolConfig::default(), 2);

    let mut tasks = Vec::new();
    for i in 0..REQUESTS {
        let blobdb = watch.client.blobdb().clone();
        tasks.push(tokio::spawn(async move {
            blobdb
                .insert(BlobDatabase::Pin, vec![i as u8 + 1], &b"v"[..])
                .await
        }));
    }

    let mut sent = Vec::new();
    for _ in 0..REQUESTS {
        let packet = watch.next_command().await;
        let key = packet.command.key().expect("insert has key")[0];
        sent.push((packet.token, key));
    }
    assert_eq!(watch.client.blobdb().pending_count(), REQUESTS);

    // Answer out of order; odd keys fail, even keys succeed.
    let status_for = |key: u8| {
        if key % 2 == 0 {
            BlobStatus::Success
        } else {
            BlobStatus::InvalidData
        }
    };
    for (answered, (token, key)) in sent.iter().rev().enumerate() {
        watch.respond(*token, status_for(*key)).await;
        let expected = REQUESTS - answered - 1;
        for _ in 0..16 {
            if watch.client.blobdb().pending_count() == expected {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(watch.client.blobdb().pending_count(), expected);
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let key = i as u8 + 1;
        assert_eq!(task.await.expect("join"), Ok(status_for(key)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_late_response_after_timeout_is_unsolicited() {
    let config = ProtocolConfig::default().with_blobdb_timeout(Duration::from_millis(300));
    let mut watch = WatchHarness::start(config, 3);
    let blobdb = watch.client.blobdb().clone();
    let request = tokio::spawn(async move { blobdb.clear(BlobDatabase::Reminder).await });

    let token = watch.next_command().await.token;
    let result = request.await.expect("join");
    assert_eq!(result, Err(ReplyError::Timeout.into()));

    watch.respond(token, BlobStatus::Success).await;
    let forwarded = watch.unsolicited.recv().await.expect("forwarded");
    assert_eq!(
        forwarded,
        PebblePacket::BlobResponse(BlobResponse {
            token,
            status: BlobStatus::Success,
        })
    );
    assert_eq!(watch.client.blobdb().pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_callback_runs_exactly_once() {
    let config = ProtocolConfig::default().with_blobdb_timeout(Duration::from_millis(500));
    let mut watch = WatchHarness::start(config, 4);
    let calls = Arc::new(AtomicUsize::new(0));
    let outcomes = Arc::new(std::sync::Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for database in [BlobDatabase::App, BlobDatabase::Weather] {
        let calls = Arc::clone(&calls);
        let outcomes = Arc::clone(&outcomes);
        handles.push(watch.client.blobdb().send(
            BlobCommand::clear(database),
            move |result| {
                calls.fetch_add(1, Ordering::SeqCst);
                outcomes.lock().expect("lock").push((database, result));
            },
        ));
    }

    // Answer the first database only; the other one times out.
    let mut answered = None;
    for _ in 0..2 {
        let packet = watch.next_command().await;
        if packet.command.database() == BlobDatabase::App {
            answered = Some(packet.token);
        }
    }
    watch
        .respond(answered.expect("app command sent"), BlobStatus::Success)
        .await;

    for handle in handles {
        handle.await.expect("join");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let outcomes = outcomes.lock().expect("lock");
    for (database, result) in outcomes.iter() {
        match database {
            BlobDatabase::App => assert_eq!(result, &Ok(BlobStatus::Success)),
            _ => assert!(matches!(result, Err(err) if err.is_timeout())),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_ping_matched_by_cookie() {
    let mut watch = WatchHarness::start(ProtocolConfig::default(), 5);
    let client = watch.client.clone();
    let ping = tokio::spawn(async move { client.ping(1337).await });

    let frame = watch.next_frame().await;
    assert_eq!(
        frame.as_ref(),
        &[0x00, 0x05, 0x07, 0xD1, 0x00, 0x00, 0x00, 0x05, 0x39]
    );

    watch.pong(1337).await;
    assert_eq!(ping.await.expect("join"), Ok(1337));
}

#[tokio::test(start_paused = true)]
async fn test_ping_without_pong_times_out() {
    let mut watch = WatchHarness::start(ProtocolConfig::default(), 6);
    let start = tokio::time::Instant::now();

    let client = watch.client.clone();
    let ping = tokio::spawn(async move { client.ping(1337).await });
    let _ = watch.next_frame().await;

    let result = ping.await.expect("join");
    assert!(matches!(result, Err(ref err) if err.is_timeout()));
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_survives_bad_frames() {
    let mut watch = WatchHarness::start(ProtocolConfig::default(), 7);
    let client = watch.client.clone();
    let ping = tokio::spawn(async move { client.ping(42).await });
    let _ = watch.next_frame().await;

    // Truncated header, unknown endpoint, bad status byte.
    watch.deliver(Bytes::from_static(&[0x00])).await;
    watch
        .deliver(Bytes::from_static(&[0x00, 0x01, 0x12, 0x34, 0x00]))
        .await;
    watch
        .deliver(Bytes::from_static(&[0x00, 0x03, 0xB1, 0xDB, 0x01, 0x00, 0xEE]))
        .await;

    watch.pong(42).await;
    assert_eq!(ping.await.expect("join"), Ok(42));
    assert!(!watch.dispatcher.is_finished());
    assert!(watch.unsolicited.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_watch_ping_answered_with_pong() {
    let mut watch = WatchHarness::start(ProtocolConfig::default(), 8);
    let ping = PebblePacket::from(PingPong::Ping { cookie: 9 })
        .serialize()
        .expect("serialize");
    watch.deliver(ping).await;

    let reply = watch.next_frame().await;
    assert_eq!(
        reply.as_ref(),
        &[0x00, 0x05, 0x07, 0xD1, 0x01, 0x00, 0x00, 0x00, 0x09]
    );
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_stops_when_inbound_closes() {
    let watch = WatchHarness::start(ProtocolConfig::default(), 9);
    let WatchHarness {
        inbound,
        dispatcher,
        ..
    } = watch;
    drop(inbound);
    dispatcher.await.expect("dispatcher exits cleanly");
}

#[tokio::test(start_paused = true)]
async fn test_dev_connection_relay() {
    super::init_tracing();
    let (inner, mut outbound) = ChannelSink::channel();
    let (client, dispatcher, _unsolicited) =
        PebbleClient::new(ProtocolConfig::local_network(), DevConnectionSink::new(inner));
    let (inbound, inbound_rx) = client.config().inbound_channel();
    tokio::spawn(dispatcher.run(inbound_rx));

    let pinger = client.clone();
    let ping = tokio::spawn(async move { pinger.ping(77).await });

    let message = outbound.recv().await.expect("relayed message");
    assert_eq!(message[0], RELAY_FRAME_TYPE);
    let frame = unwrap_relay(&message).expect("relay frame");
    assert_eq!(&frame[2..4], &[0x07, 0xD1]);

    let pong = PebblePacket::from(PingPong::Pong { cookie: 77 })
        .serialize()
        .expect("serialize");
    inbound.send(pong).await.expect("dispatcher running");
    assert_eq!(ping.await.expect("join"), Ok(77));
}

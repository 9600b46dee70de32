//! End-to-end tests of the core API against the loopback engine

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use parking_lot::Mutex;
use peerlink_core::{
    force_codecs, CodecFilter, DataChannelInit, EngineFactory, IceConnectionState,
    PeerConnectionConfiguration, SdpMessageType, StatsObject, TrackKind,
    VideoDeviceConfiguration, VideoSource,
};

fn factory() -> EngineFactory {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    EngineFactory::loopback().expect("loopback factory")
}

#[tokio::test]
async fn offer_answer_handshake_reaches_connected() -> Result<()> {
    let factory = factory();
    let caller = factory.create_peer_connection(&PeerConnectionConfiguration::default())?;
    let callee = factory.create_peer_connection(&PeerConnectionConfiguration::default())?;

    // Capture both sides' local descriptions as they become ready
    let caller_sdp = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&caller_sdp);
    caller
        .events()
        .local_description_ready
        .set(Some(Box::new(move |description| {
            *sink.lock() = Some(description.clone());
        })));
    let callee_sdp = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&callee_sdp);
    callee
        .events()
        .local_description_ready
        .set(Some(Box::new(move |description| {
            *sink.lock() = Some(description.clone());
        })));

    let ice_states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ice_states);
    callee
        .events()
        .ice_state_changed
        .set(Some(Box::new(move |state: &IceConnectionState| {
            sink.lock().push(*state);
        })));

    caller.add_local_audio_track().await?;
    caller.create_offer().await?;
    let offer = caller_sdp.lock().clone().expect("offer ready");
    assert_eq!(offer.kind, SdpMessageType::Offer);
    assert!(offer.sdp.contains("m=audio"));

    callee
        .set_remote_description(SdpMessageType::Offer, &offer.sdp)
        .await?;
    callee.create_answer().await?;
    let answer = callee_sdp.lock().clone().expect("answer ready");
    assert_eq!(answer.kind, SdpMessageType::Answer);

    caller
        .set_remote_description(SdpMessageType::Answer, &answer.sdp)
        .await?;

    let states = ice_states.lock().clone();
    assert!(states.contains(&IceConnectionState::Connected));

    caller.close().await?;
    callee.close().await?;
    Ok(())
}

#[tokio::test]
async fn remote_media_sections_surface_as_track_events() -> Result<()> {
    let factory = factory();
    let connection = factory.create_peer_connection(&PeerConnectionConfiguration::default())?;

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&kinds);
    connection
        .events()
        .track_added
        .set(Some(Box::new(move |kind: &TrackKind| {
            sink.lock().push(*kind);
        })));

    connection
        .set_remote_description(
            SdpMessageType::Offer,
            "v=0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\nm=video 9 UDP/TLS/RTP/SAVPF 96\r\n",
        )
        .await?;

    assert_eq!(*kinds.lock(), vec![TrackKind::Audio, TrackKind::Video]);
    connection.close().await?;
    Ok(())
}

#[tokio::test]
async fn device_track_produces_frames_and_sender_stats() -> Result<()> {
    let factory = factory();
    let connection = factory.create_peer_connection(&PeerConnectionConfiguration::default())?;

    let track = connection
        .add_local_video_track(
            "camera",
            &VideoDeviceConfiguration {
                width: 640,
                height: 480,
                framerate: 30.0,
                ..Default::default()
            },
        )
        .await?;

    // Attach our own consumer next to the engine's; fan-out reaches both
    let frames = Arc::new(AtomicUsize::new(0));
    struct Counter(Arc<AtomicUsize>);
    impl peerlink_core::FrameSink for Counter {
        fn on_frame(&self, frame: &peerlink_core::VideoFrame) {
            assert_eq!(frame.width, 640);
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
    let sink: Arc<dyn peerlink_core::FrameSink> = Arc::new(Counter(Arc::clone(&frames)));
    track.source().add_sink(sink);

    // 30 fps: a few frames arrive quickly
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(frames.load(Ordering::SeqCst) > 0);

    let report = connection.get_stats().await?;
    let mut senders = Vec::new();
    report.get_objects("VideoSenderStats", |object| senders.push(object));
    assert_eq!(senders.len(), 1);
    let StatsObject::VideoSender(stats) = &senders[0] else {
        panic!("wrong variant");
    };
    assert_eq!(stats.track_identifier, "camera");
    assert!(stats.frames_encoded > 0);
    assert_eq!(stats.frames_encoded, stats.frames_sent);

    connection.remove_local_video_track(&track).await?;
    connection.close().await?;
    Ok(())
}

#[tokio::test]
async fn data_channel_echo_reaches_message_callback() -> Result<()> {
    let factory = factory();
    let connection = factory.create_peer_connection(&PeerConnectionConfiguration::default())?;

    let channel = connection
        .add_data_channel(
            &DataChannelInit {
                id: -1,
                label: "chat".into(),
                ordered: true,
                reliable: true,
            },
            0,
        )
        .await?;

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    channel
        .callbacks()
        .message
        .set(Some(Box::new(move |data: &[u8]| {
            sink.lock().push(data.to_vec());
        })));

    channel.send(Bytes::from_static(b"over the wire")).await?;

    // Echo delivery is asynchronous
    let mut waited = Duration::ZERO;
    while received.lock().is_empty() && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }
    assert_eq!(*received.lock(), vec![b"over the wire".to_vec()]);

    connection.remove_data_channel(&channel).await?;
    connection.close().await?;
    Ok(())
}

#[tokio::test]
async fn shared_source_feeds_multiple_tracks() -> Result<()> {
    let factory = factory();
    let connection = factory.create_peer_connection(&PeerConnectionConfiguration::default())?;

    let source = VideoSource::external();
    let first = connection
        .add_local_video_track_from_source("first", Arc::clone(&source))
        .await?;
    let _second = connection
        .add_local_video_track_from_source("second", Arc::clone(&source))
        .await?;

    // Both engine-side consumers are attached to the one source
    assert_eq!(source.sink_count(), 2);

    connection
        .remove_local_video_tracks_from_source(&source)
        .await?;
    assert_eq!(source.sink_count(), 0);

    // The track handles stay alive but are detached
    assert!(connection.remove_local_video_track(&first).await.is_err());
    connection.close().await?;
    Ok(())
}

#[test]
fn loopback_offer_survives_codec_filtering() {
    // The loopback offer carries multiple audio codecs; restricting it to
    // opus must keep the audio section negotiable and stay idempotent
    let factory = factory();
    let connection = factory
        .create_peer_connection(&PeerConnectionConfiguration::default())
        .expect("connection");

    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    connection
        .events()
        .local_description_ready
        .set(Some(Box::new(move |description| {
            *sink.lock() = Some(description.sdp.clone());
        })));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    runtime.block_on(async {
        connection.add_local_audio_track().await.expect("audio");
        connection.create_offer().await.expect("offer");
    });

    let sdp = captured.lock().clone().expect("sdp");
    let audio = CodecFilter::new("opus").with_param("stereo", "1");
    let once = force_codecs(&sdp, &audio, &CodecFilter::default());
    assert!(once.contains("m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n"));
    assert!(!once.contains("PCMU"));
    assert!(once.contains("stereo=1"));
    let twice = force_codecs(&once, &audio, &CodecFilter::default());
    assert_eq!(once, twice);
}

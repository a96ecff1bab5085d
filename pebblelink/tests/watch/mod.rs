//! Scripted watch harness shared by the end-to-end scenarios.

pub mod scenarios;

use bytes::Bytes;
use pebblelink::{
    BlobCommandPacket, BlobResponse, BlobStatus, ByteReader, ChannelSink, PacketPayload,
    PebbleClient, PebblePacket, PingPong, ProtocolConfig, ProtocolEndpoint, SeededRandomProvider,
    TokioTimeProvider, deserialize_frame,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Client type used by the scenarios: tokio time, seeded tokens.
pub type TestClient = PebbleClient<TokioTimeProvider, SeededRandomProvider>;

/// Install a test-writer subscriber once per binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A running client plus the watch side of its transport.
pub struct WatchHarness {
    /// The phone-side client under test.
    pub client: TestClient,
    /// Frames the client sent to the watch.
    pub outbound: mpsc::UnboundedReceiver<Bytes>,
    /// Frames the watch sends to the client.
    pub inbound: mpsc::Sender<Bytes>,
    /// Packets the dispatcher could not route.
    pub unsolicited: mpsc::UnboundedReceiver<PebblePacket>,
    /// The dispatcher task.
    pub dispatcher: JoinHandle<()>,
}

impl WatchHarness {
    /// Start a client with `config` and a dispatcher task.
    pub fn start(config: ProtocolConfig, seed: u64) -> Self {
        init_tracing();
        let (sink, outbound) = ChannelSink::channel();
        let (inbound, inbound_rx) = config.inbound_channel();
        let (client, dispatcher, unsolicited) = PebbleClient::with_providers(
            config,
            sink,
            TokioTimeProvider::new(),
            SeededRandomProvider::new(seed),
        );
        let dispatcher = tokio::spawn(dispatcher.run(inbound_rx));
        Self {
            client,
            outbound,
            inbound,
            unsolicited,
            dispatcher,
        }
    }

    /// Next frame the client sent.
    pub async fn next_frame(&mut self) -> Bytes {
        self.outbound.recv().await.expect("client sent a frame")
    }

    /// Next frame the client sent, decoded as a BlobDB command.
    pub async fn next_command(&mut self) -> BlobCommandPacket {
        let frame = self.next_frame().await;
        decode_command(&frame)
    }

    /// Inject a raw frame from the watch.
    pub async fn deliver(&self, frame: Bytes) {
        self.inbound.send(frame).await.expect("dispatcher running");
    }

    /// Answer a BlobDB command.
    pub async fn respond(&self, token: u16, status: BlobStatus) {
        let frame = PebblePacket::from(BlobResponse { token, status })
            .serialize()
            .expect("serialize response");
        self.deliver(frame).await;
    }

    /// Send a pong for `cookie`.
    pub async fn pong(&self, cookie: u32) {
        let frame = PebblePacket::from(PingPong::Pong { cookie })
            .serialize()
            .expect("serialize pong");
        self.deliver(frame).await;
    }
}

/// Decode an outbound BlobDB command frame.
pub fn decode_command(frame: &[u8]) -> BlobCommandPacket {
    let (header, payload) = deserialize_frame(frame).expect("well-formed frame");
    assert_eq!(header.endpoint, ProtocolEndpoint::BLOB_DB);
    let mut reader = ByteReader::new(payload);
    let packet = BlobCommandPacket::decode(&mut reader).expect("blobdb command");
    reader.finish().expect("no trailing bytes");
    packet
}

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{PeerTransport, TrackKind, TransportConfig, TransportEvent, local_track};
use chrono::{DateTime, Utc};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use huddle_core::mesh::{self, LinkState, Mesh, MeshCommand, SdpKind};
use huddle_core::{
    ClientMessage, ErrorCode, ParticipantId, ParticipantInfo, RoomId, ServerMessage,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TIMEOUT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// What the application sees of the room.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Joined {
        room_id: RoomId,
        participants: Vec<ParticipantInfo>,
    },
    ParticipantJoined(ParticipantInfo),
    ParticipantLeft(ParticipantInfo),
    LinkStateChanged {
        remote_id: ParticipantId,
        state: LinkState,
    },
    /// An offer toward `remote_id` went out through signaling.
    OfferSent {
        remote_id: ParticipantId,
        ice_restart: bool,
    },
    Chat {
        sender_id: ParticipantId,
        sender_name: String,
        text: String,
        timestamp: DateTime<Utc>,
        /// Our own message echoed back by the server.
        local: bool,
    },
    ServerError {
        code: ErrorCode,
        message: String,
    },
}

enum ClientCommand {
    Chat(String),
    AddTrack(TrackKind),
    Leave,
}

/// Cheap, cloneable control surface for a running client.
#[derive(Clone)]
pub struct ClientHandle {
    participant_id: ParticipantId,
    tx: mpsc::UnboundedSender<ClientCommand>,
}

impl ClientHandle {
    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    pub fn chat(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.tx
            .send(ClientCommand::Chat(text.into()))
            .map_err(|_| ClientError::ChannelClosed)
    }

    /// Publishes a local track on every current and future link. Links this
    /// side initiated are renegotiated right away.
    pub fn add_track(&self, kind: TrackKind) -> Result<(), ClientError> {
        self.tx
            .send(ClientCommand::AddTrack(kind))
            .map_err(|_| ClientError::ChannelClosed)
    }

    /// Closes every link, leaves the room and stops the client loop.
    pub fn leave(&self) -> Result<(), ClientError> {
        self.tx
            .send(ClientCommand::Leave)
            .map_err(|_| ClientError::ChannelClosed)
    }
}

pub struct ClientSession {
    pub handle: ClientHandle,
    pub events: mpsc::UnboundedReceiver<ClientEvent>,
    pub task: JoinHandle<Result<(), ClientError>>,
}

/// Native participant: runs the [`Mesh`] state machine against a signaling
/// socket and one [`PeerTransport`] per remote.
pub struct MeshClient {
    config: ClientConfig,
    mesh: Mesh,
    transport_config: TransportConfig,
    links: HashMap<ParticipantId, PeerTransport>,
    local_tracks: Vec<(TrackKind, Arc<TrackLocalStaticRTP>)>,
    next_generation: u64,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    sink: SplitSink<WsStream, Message>,
    events: mpsc::UnboundedSender<ClientEvent>,
    started: Instant,
}

impl MeshClient {
    /// Connects to the coordinator and spawns the client loop. The room is
    /// joined as soon as the ICE configuration arrives.
    pub async fn connect(config: ClientConfig) -> Result<ClientSession, ClientError> {
        let (socket, _) = connect_async(config.server_url.as_str()).await?;
        info!("Connected to signaling server {}", config.server_url);

        let (sink, stream) = socket.split();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let local = ParticipantInfo::new(config.participant_id.clone(), &config.display_name);
        let handle = ClientHandle {
            participant_id: local.id.clone(),
            tx: command_tx,
        };

        let client = Self {
            mesh: Mesh::new(local, config.mesh),
            transport_config: TransportConfig {
                ice_servers: config.ice_servers.clone().unwrap_or_default(),
                include_loopback_candidates: config.include_loopback_candidates,
            },
            links: HashMap::new(),
            local_tracks: Vec::new(),
            next_generation: 0,
            transport_tx,
            sink,
            events: event_tx,
            started: Instant::now(),
            config,
        };

        let task = tokio::spawn(client.run(stream, transport_rx, command_rx));

        Ok(ClientSession {
            handle,
            events: event_rx,
            task,
        })
    }

    async fn run(
        mut self,
        mut stream: SplitStream<WsStream>,
        mut transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
        mut command_rx: mpsc::UnboundedReceiver<ClientCommand>,
    ) -> Result<(), ClientError> {
        let mut tick = tokio::time::interval(TIMEOUT_POLL_INTERVAL);

        let result = loop {
            let step = tokio::select! {
                frame = stream.next() => self.on_frame(frame).await,
                Some(event) = transport_rx.recv() => self.on_transport_event(event).await.map(|_| true),
                command = command_rx.recv() => self.on_command(command).await,
                _ = tick.tick() => {
                    let now = self.now_ms();
                    let commands = self.mesh.poll_timeouts(now);
                    self.execute(commands).await.map(|_| true)
                }
            };

            match step {
                Ok(true) => continue,
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        for (_, link) in self.links.drain() {
            if let Err(e) = link.close().await {
                debug!("Closing link to {} failed: {:#}", link.remote_id, e);
            }
        }
        info!("Client {} stopped", self.mesh.local().id);
        result
    }

    async fn on_frame(
        &mut self,
        frame: Option<Result<Message, tungstenite::Error>>,
    ) -> Result<bool, ClientError> {
        match frame {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(msg) => self.on_server_message(msg).await?,
                    Err(e) => warn!("Ignoring malformed server frame: {}", e),
                }
                Ok(true)
            }
            Some(Ok(Message::Close(_))) | None => {
                info!("Signaling socket closed by server");
                Ok(false)
            }
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(e.into()),
        }
    }

    async fn on_command(&mut self, command: Option<ClientCommand>) -> Result<bool, ClientError> {
        match command {
            Some(ClientCommand::Chat(text)) => {
                let command = self.mesh.chat(text);
                self.execute(vec![command]).await?;
                Ok(true)
            }
            Some(ClientCommand::AddTrack(kind)) => {
                self.add_local_track(kind).await?;
                Ok(true)
            }
            // Every handle dropped counts as leaving.
            Some(ClientCommand::Leave) | None => {
                let commands = self.mesh.leave();
                self.execute(commands).await?;
                self.sink.close().await?;
                Ok(false)
            }
        }
    }

    async fn on_server_message(&mut self, msg: ServerMessage) -> Result<(), ClientError> {
        match &msg {
            ServerMessage::IceConfig { ice_servers } => {
                if self.config.ice_servers.is_none() {
                    self.transport_config.ice_servers = ice_servers.clone();
                }
                if self.mesh.room_id().is_none() {
                    let commands = self.mesh.join(self.config.room_id.clone());
                    self.execute(commands).await?;
                }
            }
            ServerMessage::CurrentUsers { users } => self.emit(ClientEvent::Joined {
                room_id: self.config.room_id.clone(),
                participants: users.clone(),
            }),
            ServerMessage::UserConnected {
                participant_id,
                display_name,
            } => self.emit(ClientEvent::ParticipantJoined(ParticipantInfo::new(
                participant_id.clone(),
                display_name,
            ))),
            ServerMessage::UserDisconnected {
                participant_id,
                display_name,
            } => self.emit(ClientEvent::ParticipantLeft(ParticipantInfo::new(
                participant_id.clone(),
                display_name,
            ))),
            ServerMessage::ReceiveMessage {
                sender_id,
                sender_name,
                text,
                timestamp,
            } => self.emit(ClientEvent::Chat {
                local: sender_id == &self.mesh.local().id,
                sender_id: sender_id.clone(),
                sender_name: sender_name.clone(),
                text: text.clone(),
                timestamp: *timestamp,
            }),
            ServerMessage::Error { code, message } => self.emit(ClientEvent::ServerError {
                code: *code,
                message: message.clone(),
            }),
            ServerMessage::ReceiveOffer { .. }
            | ServerMessage::ReceiveAnswer { .. }
            | ServerMessage::ReceiveIceCandidate { .. } => {}
        }

        let now = self.now_ms();
        let commands = self.mesh.handle_server_message(&msg, now);
        self.execute(commands).await
    }

    async fn on_transport_event(&mut self, event: TransportEvent) -> Result<(), ClientError> {
        let (remote_id, generation) = event.source();
        if self.links.get(remote_id).map(|link| link.generation) != Some(generation) {
            debug!("Dropping event from a replaced transport for {}", remote_id);
            return Ok(());
        }

        let now = self.now_ms();
        let commands = match event {
            TransportEvent::StateChanged {
                remote_id, state, ..
            } => {
                self.emit(ClientEvent::LinkStateChanged {
                    remote_id: remote_id.clone(),
                    state,
                });
                self.mesh.on_connection_state(&remote_id, state, now)
            }
            TransportEvent::CandidateGenerated {
                remote_id,
                candidate,
                ..
            } => self.mesh.on_local_candidate(&remote_id, candidate),
            TransportEvent::DataChannelOpen { remote_id, .. } => {
                debug!("Data channel with {} is open", remote_id);
                Vec::new()
            }
        };

        self.execute(commands).await
    }

    /// Runs commands in order, including the follow-ups each one yields.
    async fn execute(&mut self, commands: Vec<MeshCommand>) -> Result<(), ClientError> {
        let mut queue = VecDeque::from(commands);
        while let Some(command) = queue.pop_front() {
            queue.extend(self.execute_one(command).await?);
        }
        Ok(())
    }

    async fn execute_one(&mut self, command: MeshCommand) -> Result<Vec<MeshCommand>, ClientError> {
        let now = self.now_ms();

        match command {
            MeshCommand::Send(msg) => {
                self.send(&msg).await?;
                Ok(Vec::new())
            }

            MeshCommand::OpenLink { remote_id, .. } => {
                self.open_link(remote_id).await;
                Ok(Vec::new())
            }

            MeshCommand::CreateOffer {
                remote_id,
                ice_restart,
            } => {
                let Some(link) = self.links.get(&remote_id) else {
                    return Ok(Vec::new());
                };
                let offer = link.create_offer(ice_restart).await;
                match offer {
                    Ok(sdp) => {
                        let sent = self.mesh.on_local_description(&remote_id, SdpKind::Offer, sdp);
                        self.emit(ClientEvent::OfferSent {
                            remote_id,
                            ice_restart,
                        });
                        Ok(sent)
                    }
                    Err(e) => {
                        self.negotiation_failed(remote_id, e);
                        Ok(Vec::new())
                    }
                }
            }

            MeshCommand::AcceptOffer { remote_id, sdp } => {
                let Some(link) = self.links.get(&remote_id) else {
                    return Ok(Vec::new());
                };
                let applied = link.set_remote_offer(sdp).await;
                if let Err(e) = applied {
                    self.negotiation_failed(remote_id, e);
                    return Ok(Vec::new());
                }

                let mut follow_up = self.mesh.on_remote_description_applied(&remote_id, now);
                let answer = link.create_answer().await;
                match answer {
                    Ok(sdp) => follow_up.extend(self.mesh.on_local_description(
                        &remote_id,
                        SdpKind::Answer,
                        sdp,
                    )),
                    Err(e) => self.negotiation_failed(remote_id, e),
                }
                Ok(follow_up)
            }

            MeshCommand::ApplyAnswer { remote_id, sdp } => {
                let Some(link) = self.links.get(&remote_id) else {
                    return Ok(Vec::new());
                };
                let applied = link.set_remote_answer(sdp).await;
                match applied {
                    Ok(()) => Ok(self.mesh.on_remote_description_applied(&remote_id, now)),
                    Err(e) => {
                        self.negotiation_failed(remote_id, e);
                        Ok(Vec::new())
                    }
                }
            }

            MeshCommand::AddIceCandidate {
                remote_id,
                candidate,
            } => {
                if let Some(link) = self.links.get(&remote_id)
                    && let Err(e) = link.add_ice_candidate(candidate).await
                {
                    warn!("Remote candidate from {} rejected: {:#}", remote_id, e);
                }
                Ok(Vec::new())
            }

            MeshCommand::CloseLink { remote_id } => {
                if let Some(link) = self.links.remove(&remote_id) {
                    info!("Closing link to {}", remote_id);
                    if let Err(e) = link.close().await {
                        warn!("Closing link to {} failed: {:#}", remote_id, e);
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    async fn open_link(&mut self, remote_id: ParticipantId) {
        let Some(role) = self.mesh.link(&remote_id).map(|link| link.role()) else {
            return;
        };

        self.next_generation += 1;
        let created = PeerTransport::new(
            remote_id.clone(),
            self.next_generation,
            role,
            &self.transport_config,
            self.transport_tx.clone(),
        )
        .await;

        match created {
            Ok(transport) => {
                for (kind, track) in &self.local_tracks {
                    if let Err(e) = transport.add_track(track).await {
                        warn!("Could not add {} track for {}: {:#}", kind.as_str(), remote_id, e);
                    }
                }
                if let Some(previous) = self.links.insert(remote_id, transport)
                    && let Err(e) = previous.close().await
                {
                    debug!("Closing replaced link failed: {:#}", e);
                }
            }
            Err(e) => self.negotiation_failed(remote_id, e),
        }
    }

    async fn add_local_track(&mut self, kind: TrackKind) -> Result<(), ClientError> {
        if self.local_tracks.iter().any(|(k, _)| *k == kind) {
            debug!("A local {} track is already published", kind.as_str());
            return Ok(());
        }

        let track = local_track(kind, self.mesh.local().id.as_str());
        info!("Publishing local {} track", kind.as_str());

        let now = self.now_ms();
        let mut commands = Vec::new();
        let mut failed = Vec::new();
        for (remote_id, link) in &self.links {
            match link.add_track(&track).await {
                Ok(()) => commands.extend(self.mesh.renegotiate(remote_id, now)),
                Err(e) => failed.push((remote_id.clone(), e)),
            }
        }
        self.local_tracks.push((kind, track));

        for (remote_id, e) in failed {
            self.negotiation_failed(remote_id, e);
        }
        self.execute(commands).await
    }

    /// Only the affected link is marked failed; the client keeps running.
    fn negotiation_failed(&mut self, remote_id: ParticipantId, err: anyhow::Error) {
        let failure = mesh::ClientError::NegotiationFailure {
            remote_id: remote_id.clone(),
            reason: format!("{err:#}"),
        };
        self.mesh.on_negotiation_error(&failure);
        self.emit(ClientEvent::LinkStateChanged {
            remote_id,
            state: LinkState::Failed,
        });
    }

    async fn send(&mut self, msg: &ClientMessage) -> Result<(), ClientError> {
        let json = serde_json::to_string(msg)?;
        self.sink.send(Message::text(json)).await?;
        Ok(())
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

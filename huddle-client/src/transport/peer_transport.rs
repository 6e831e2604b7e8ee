use crate::transport::{TransportConfig, TransportEvent};
use anyhow::{Context, Result};
use huddle_core::mesh::{LinkState, Role};
use huddle_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

pub const DATA_CHANNEL_LABEL: &str = "huddle";

/// One WebRTC peer connection toward a single remote participant.
///
/// Callbacks never touch client state directly: they push
/// [`TransportEvent`]s onto `event_tx` for the client loop.
pub struct PeerTransport {
    pub remote_id: ParticipantId,
    pub generation: u64,
    pub peer_connection: Arc<RTCPeerConnection>,
    /// Created by the initiator so the offer carries an application m-line.
    data_channel: Option<Arc<RTCDataChannel>>,
}

impl PeerTransport {
    pub async fn new(
        remote_id: ParticipantId,
        generation: u64,
        role: Role,
        config: &TransportConfig,
        event_tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let mut settings = SettingEngine::default();
        settings.set_include_loopback_candidate(config.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .with_setting_engine(settings)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.rtc_ice_servers(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = event_tx.clone();
        let state_remote = remote_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let remote_id = state_remote.clone();

                Box::pin(async move {
                    info!("Peer connection state with {} changed: {}", remote_id, s);
                    if let Some(state) = link_state(s) {
                        let _ = tx.send(TransportEvent::StateChanged {
                            remote_id,
                            generation,
                            state,
                        });
                    }
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let ice_remote = remote_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let remote_id = ice_remote.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(TransportEvent::CandidateGenerated {
                    remote_id,
                    generation,
                    candidate: from_rtc_candidate(init),
                });
            })
        }));

        let dc_tx = event_tx.clone();
        let dc_remote = remote_id.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let remote_id = dc_remote.clone();

            Box::pin(async move {
                debug!("DataChannel '{}' announced by {}", dc.label(), remote_id);
                watch_open(&dc, remote_id, generation, tx);
            })
        }));

        let data_channel = match role {
            Role::Initiator => {
                let dc = peer_connection
                    .create_data_channel(DATA_CHANNEL_LABEL, None)
                    .await
                    .context("Failed to create data channel")?;
                watch_open(&dc, remote_id.clone(), generation, event_tx);
                Some(dc)
            }
            Role::Responder => None,
        };

        Ok(Self {
            remote_id,
            generation,
            peer_connection,
            data_channel,
        })
    }

    pub fn has_data_channel(&self) -> bool {
        self.data_channel.is_some()
    }

    /// Creates an offer and sets it as local description.
    pub async fn create_offer(&self, ice_restart: bool) -> Result<String> {
        let options = ice_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });
        let offer = self
            .peer_connection
            .create_offer(options)
            .await
            .context("Failed to create offer")?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("Failed to set local offer")?;
        Ok(offer.sdp)
    }

    pub async fn set_remote_offer(&self, sdp: String) -> Result<()> {
        let desc = RTCSessionDescription::offer(sdp)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote offer")?;
        Ok(())
    }

    /// Creates an answer to the applied remote offer and sets it locally.
    pub async fn create_answer(&self) -> Result<String> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local answer")?;
        Ok(answer.sdp)
    }

    pub async fn set_remote_answer(&self, sdp: String) -> Result<()> {
        let desc = RTCSessionDescription::answer(sdp)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote answer")?;
        Ok(())
    }

    pub async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    /// Adds a local track. The caller renegotiates afterwards.
    pub async fn add_track(&self, track: &Arc<TrackLocalStaticRTP>) -> Result<()> {
        let sender = self
            .peer_connection
            .add_track(Arc::clone(track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add local track")?;

        // Interceptors only run while RTCP is being read.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while sender.read(&mut rtcp_buf).await.is_ok() {}
        });
        Ok(())
    }

    pub async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn watch_open(
    dc: &Arc<RTCDataChannel>,
    remote_id: ParticipantId,
    generation: u64,
    tx: mpsc::UnboundedSender<TransportEvent>,
) {
    dc.on_open(Box::new(move || {
        Box::pin(async move {
            debug!("DataChannel with {} open", remote_id);
            let _ = tx.send(TransportEvent::DataChannelOpen {
                remote_id,
                generation,
            });
        })
    }));
}

pub fn link_state(state: RTCPeerConnectionState) -> Option<LinkState> {
    match state {
        RTCPeerConnectionState::New => Some(LinkState::New),
        RTCPeerConnectionState::Connecting => Some(LinkState::Negotiating),
        RTCPeerConnectionState::Connected => Some(LinkState::Connected),
        RTCPeerConnectionState::Disconnected => Some(LinkState::Disconnected),
        RTCPeerConnectionState::Failed => Some(LinkState::Failed),
        RTCPeerConnectionState::Closed => Some(LinkState::Closed),
        RTCPeerConnectionState::Unspecified => None,
    }
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

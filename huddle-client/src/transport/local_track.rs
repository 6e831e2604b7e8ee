use std::sync::Arc;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }

    fn codec(self) -> RTCRtpCodecCapability {
        let mime_type = match self {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        };
        RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            ..Default::default()
        }
    }
}

/// A locally published track shared by every peer connection. Packets
/// written to it fan out to all links it was added to.
pub fn local_track(kind: TrackKind, stream_id: &str) -> Arc<TrackLocalStaticRTP> {
    Arc::new(TrackLocalStaticRTP::new(
        kind.codec(),
        kind.as_str().to_owned(),
        stream_id.to_owned(),
    ))
}

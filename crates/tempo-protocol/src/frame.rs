use tempo_core::id::ID_LEN;
use tempo_core::RecordId;

use crate::error::{ProtocolError, Result};

/// Frame without a payload: `[target][function]`.
pub const FRAME_LEN_BARE: usize = 2;
/// Frame carrying a record id: `[target][function][id; 12]`.
pub const FRAME_LEN_WITH_ID: usize = FRAME_LEN_BARE + ID_LEN;

/// Who a frame is addressed to. The code is the first wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Server,
    Ui,
    Notifier,
}

impl Endpoint {
    pub const fn code(self) -> u8 {
        match self {
            Endpoint::Server => 0,
            Endpoint::Ui => 1,
            Endpoint::Notifier => 2,
        }
    }
}

impl TryFrom<u8> for Endpoint {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Endpoint::Server),
            1 => Ok(Endpoint::Ui),
            2 => Ok(Endpoint::Notifier),
            other => Err(ProtocolError::UnknownEndpoint(other)),
        }
    }
}

/// One decoded wire frame. The function code stays raw here; the per-endpoint
/// enums in [`crate::functions`] give it meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub target: Endpoint,
    pub function: u8,
    pub id: Option<RecordId>,
}

impl Frame {
    pub const fn bare(target: Endpoint, function: u8) -> Self {
        Self {
            target,
            function,
            id: None,
        }
    }

    pub const fn with_id(target: Endpoint, function: u8, id: RecordId) -> Self {
        Self {
            target,
            function,
            id: Some(id),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FRAME_LEN_WITH_ID);
        bytes.push(self.target.code());
        bytes.push(self.function);
        if let Some(id) = &self.id {
            bytes.extend_from_slice(id.as_bytes());
        }
        bytes
    }

    /// Decode a frame addressed to `receiver`. Frames of illegal length, for
    /// another endpoint, or with a mangled id are rejected outright.
    pub fn decode(bytes: &[u8], receiver: Endpoint) -> Result<Self> {
        let id = match bytes.len() {
            FRAME_LEN_BARE => None,
            FRAME_LEN_WITH_ID => Some(RecordId::from_slice(&bytes[FRAME_LEN_BARE..])?),
            other => return Err(ProtocolError::BadLength(other)),
        };
        let target = Endpoint::try_from(bytes[0])?;
        if target != receiver {
            return Err(ProtocolError::WrongTarget { target, receiver });
        }
        Ok(Self {
            target,
            function: bytes[1],
            id,
        })
    }

    /// Decode every frame in one socket read. Back-to-back writes can
    /// coalesce into a single read; each function code fixes its frame's
    /// length, so the buffer splits greedily. Any malformed prefix rejects
    /// the whole read: past it there is no trustworthy frame boundary.
    pub fn decode_all(bytes: &[u8], receiver: Endpoint) -> Result<Vec<Self>> {
        let mut frames = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            if rest.len() < FRAME_LEN_BARE {
                return Err(ProtocolError::BadLength(rest.len()));
            }
            let target = Endpoint::try_from(rest[0])?;
            if target != receiver {
                return Err(ProtocolError::WrongTarget { target, receiver });
            }
            let len = crate::functions::wire_len(receiver, rest[1])?;
            if rest.len() < len {
                return Err(ProtocolError::BadLength(rest.len()));
            }
            frames.push(Self::decode(&rest[..len], receiver)?);
            rest = &rest[len..];
        }
        Ok(frames)
    }

    /// The id this frame must carry for function codes that need one.
    pub fn require_id(&self) -> Result<RecordId> {
        self.id.ok_or(ProtocolError::MissingId {
            target: self.target,
            function: self.function,
        })
    }
}

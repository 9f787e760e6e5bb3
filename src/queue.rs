//! ZeroMQ publisher used by the API to hand jobs to the notifier, and by the
//! notifier to forward rendered emails to the emailer.

use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

use crate::models::zmq::NotificationJob;
use crate::services::notifications::NotificationQueue;
use crate::services::{ServiceError, ServiceResult};

#[derive(Debug, Error)]
pub enum ZmqSenderError {
    #[error("zmq error: {0}")]
    Socket(#[from] zmq::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("socket lock poisoned")]
    Poisoned,
}

impl From<ZmqSenderError> for ServiceError {
    fn from(err: ZmqSenderError) -> Self {
        log::error!("Failed to publish message: {err}");
        ServiceError::Internal
    }
}

/// PUB socket guarded by a mutex, since zmq sockets are not `Sync`.
pub struct ZmqSender {
    socket: Mutex<zmq::Socket>,
    _context: zmq::Context,
}

impl ZmqSender {
    /// Binds a PUB socket on `endpoint`.
    pub fn bind(endpoint: &str) -> Result<Self, ZmqSenderError> {
        let context = zmq::Context::new();
        let socket = context.socket(zmq::PUB)?;
        socket.bind(endpoint)?;
        Ok(Self {
            socket: Mutex::new(socket),
            _context: context,
        })
    }

    /// Connects a PUB socket to a subscriber bound on `endpoint`.
    pub fn connect(endpoint: &str) -> Result<Self, ZmqSenderError> {
        let context = zmq::Context::new();
        let socket = context.socket(zmq::PUB)?;
        socket.connect(endpoint)?;
        Ok(Self {
            socket: Mutex::new(socket),
            _context: context,
        })
    }

    pub fn send_json<T: Serialize>(&self, message: &T) -> Result<(), ZmqSenderError> {
        let payload = serde_json::to_vec(message)?;
        let socket = self.socket.lock().map_err(|_| ZmqSenderError::Poisoned)?;
        socket.send(payload, 0)?;
        Ok(())
    }
}

impl NotificationQueue for ZmqSender {
    fn enqueue(&self, job: &NotificationJob) -> ServiceResult<()> {
        Ok(self.send_json(job)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_job_reaches_subscriber() {
        let endpoint = "inproc://advwell-notifications";
        let sender = ZmqSender::bind(endpoint).unwrap();
        let subscriber = sender._context.socket(zmq::SUB).unwrap();
        subscriber.connect(endpoint).unwrap();
        subscriber.set_subscribe(b"").unwrap();
        subscriber.set_rcvtimeo(2_000).unwrap();

        let job = NotificationJob::Telegram {
            chat_id: "42".into(),
            text: "Olá".into(),
        };
        // PUB drops messages until the subscription propagates.
        let mut received = None;
        for _ in 0..20 {
            sender.enqueue(&job).unwrap();
            if let Ok(bytes) = subscriber.recv_bytes(zmq::DONTWAIT) {
                received = Some(bytes);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        let bytes = received.expect("subscriber received nothing");
        let parsed: NotificationJob = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, job);
    }
}

//! HTTP output: a bounded worker pool reading from a bounded queue, so a
//! slow or unreachable collector never blocks the ingest path. `write`
//! does a non-blocking channel send; workers POST in a loop. Optional
//! mutual TLS is supported via client certificate and CA configuration.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;

use reqwest::blocking::Client;
use reqwest::{Certificate, Identity};

use crate::config::HttpOutputConfig;
use crate::error::SinkError;
use crate::event::AuditEventGroup;
use crate::sink::json_sink::retry;
use crate::sink::traits::Sink;

fn build_identity(cert_path: &str, key_path: &str) -> Result<Identity, SinkError> {
    let mut pem = std::fs::read(cert_path)
        .map_err(|err| SinkError::Open(format!("failed to read client cert {}: {}", cert_path, err)))?;
    let mut key = std::fs::read(key_path)
        .map_err(|err| SinkError::Open(format!("failed to read client key {}: {}", key_path, err)))?;
    pem.append(&mut key);
    Identity::from_pem(&pem).map_err(|err| SinkError::Open(format!("failed to build client identity: {}", err)))
}

fn load_ca_cert(path: &str) -> Result<Certificate, SinkError> {
    let pem =
        std::fs::read(path).map_err(|err| SinkError::Open(format!("failed to read ca cert {}: {}", path, err)))?;
    Certificate::from_pem(&pem).map_err(|err| SinkError::Open(format!("failed to parse ca cert: {}", err)))
}

fn http_worker(worker_id: usize, receiver: Arc<Mutex<Receiver<Vec<u8>>>>, client: Client, url: String, attempts: u32) {
    loop {
        let received = {
            let receiver = receiver.lock().unwrap();
            receiver.recv()
        };
        let Ok(body) = received else {
            return; // sender dropped, sink is shutting down
        };

        let result = retry(attempts, || {
            let response = client
                .post(&url)
                .header("content-type", "application/json")
                .body(body.clone())
                .send()
                .map_err(|err| SinkError::Open(err.to_string()))?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(SinkError::HttpStatus(response.status()))
            }
        });

        if let Err(err) = result {
            log::warn!("http sink worker {} dropped an event after exhausting retries: {}", worker_id, err);
        }
    }
}

/// Enqueues JSON-encoded events for a pool of background workers; never
/// blocks the caller. A full queue drops the newest event rather than
/// applying backpressure to the ingest loop.
pub struct HttpSink {
    sender: SyncSender<Vec<u8>>,
}

impl HttpSink {
    pub fn open(config: &HttpOutputConfig) -> Result<Self, SinkError> {
        if config.url.is_empty() {
            return Err(SinkError::Open("output http url must be set".to_string()));
        }
        if config.worker_count == 0 {
            return Err(SinkError::Open("output http worker_count must be at least 1".to_string()));
        }

        let mut builder = Client::builder();
        if let (Some(cert), Some(key)) = (&config.client_cert, &config.client_key) {
            builder = builder.identity(build_identity(cert, key)?);
        }
        if let Some(ca) = &config.ca_cert {
            builder = builder.add_root_certificate(load_ca_cert(ca)?);
        }
        let client = builder
            .build()
            .map_err(|err| SinkError::Open(format!("failed to build http client: {}", err)))?;

        let (sender, receiver) = mpsc::sync_channel::<Vec<u8>>(config.queue_size);
        let receiver = Arc::new(Mutex::new(receiver));

        for worker_id in 0..config.worker_count {
            let receiver = Arc::clone(&receiver);
            let client = client.clone();
            let url = config.url.clone();
            let attempts = config.attempts;
            thread::spawn(move || http_worker(worker_id, receiver, client, url, attempts));
        }

        Ok(Self { sender })
    }
}

impl Sink for HttpSink {
    fn write(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        let body = serde_json::to_vec(group).map_err(SinkError::Encode)?;
        match self.sender.try_send(body) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                log::warn!("http sink queue full, dropping event");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(SinkError::Open("http sink worker pool is gone".to_string())),
        }
    }
}

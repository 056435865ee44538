use std::sync::Arc;
use tracing::{info, warn};

use crate::app::ports::{CredentialValidator, ProbePort, PublishPort};
use crate::error::{RelayError, Result};
use crate::infra::auth::parse_apikey;
use crate::metrics::PublisherMetrics;
use crate::publisher::MessageId;
use crate::transcode::{decode, encode, Format};

/// Second hop: authenticate, decode, probe, then hand the JSON record to the publisher.
pub struct PublishUseCase {
    validator: Box<dyn CredentialValidator>,
    probe: Box<dyn ProbePort>,
    publisher: Arc<dyn PublishPort>,
    topic: String,
}

impl PublishUseCase {
    pub fn new(
        validator: Box<dyn CredentialValidator>,
        probe: Box<dyn ProbePort>,
        publisher: Arc<dyn PublishPort>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            validator,
            probe,
            publisher,
            topic: topic.into(),
        }
    }

    /// Returns the correlation id of the queued message. Delivery is not awaited.
    pub async fn handle(
        &self,
        authorization: Option<&str>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<MessageId> {
        let authorized = parse_apikey(authorization)
            .map(|key| self.validator.validate(key))
            .unwrap_or(false);
        if !authorized {
            PublisherMetrics::record_auth_rejected();
            warn!("rejected request with missing or invalid api key");
            return Err(RelayError::Auth);
        }

        let format = Format::from_content_type(content_type)?;
        let user = decode(body, format)?;

        self.probe.probe().await.map_err(|e| {
            PublisherMetrics::record_probe_failure();
            warn!(error = %e, "probe call failed");
            RelayError::from(e)
        })?;

        let payload = encode(&user, Format::Json);
        let id = self.publisher.publish(&self.topic, payload).await?;
        info!(message_id = %id, topic = %self.topic, "record submitted for publishing");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::error::{ProbeError, SubmitError};
    use crate::infra::auth::StaticKeyValidator;
    use crate::transcode::EncodedPayload;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct CountingProbe {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ProbePort for CountingProbe {
        async fn probe(&self) -> std::result::Result<(), ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.fail {
                return Ok(());
            }
            // A real transport error: nothing listens on a just-released port.
            let port = {
                let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
                l.local_addr().unwrap().port()
            };
            let uri = format!("http://127.0.0.1:{port}/");
            let source = reqwest::get(&uri).await.unwrap_err();
            Err(ProbeError::Transport { uri, source })
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, EncodedPayload)>>,
        reject: Option<SubmitError>,
    }

    #[async_trait]
    impl PublishPort for RecordingPublisher {
        async fn publish(
            &self,
            topic: &str,
            payload: EncodedPayload,
        ) -> std::result::Result<MessageId, SubmitError> {
            if let Some(e) = &self.reject {
                return Err(e.clone());
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
            Ok(MessageId::new())
        }
    }

    fn use_case(probe: CountingProbe, publisher: Arc<RecordingPublisher>) -> PublishUseCase {
        PublishUseCase::new(
            Box::new(StaticKeyValidator::new("123456")),
            Box::new(probe),
            publisher,
            "people",
        )
    }

    fn ada_protobuf() -> Vec<u8> {
        encode(&User::new("Ada", "Lovelace"), Format::Protobuf).bytes
    }

    #[tokio::test]
    async fn valid_key_publishes_json() {
        let probe = CountingProbe::default();
        let publisher = Arc::new(RecordingPublisher::default());
        let uc = use_case(probe.clone(), publisher.clone());

        uc.handle(
            Some("Apikey 123456"),
            Some("application/x-protobuf"),
            &ada_protobuf(),
        )
        .await
        .unwrap();

        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "people");
        assert_eq!(published[0].1.format, Format::Json);
        let user: User = serde_json::from_slice(&published[0].1.bytes).unwrap();
        assert_eq!(user, User::new("Ada", "Lovelace"));
    }

    #[tokio::test]
    async fn wrong_key_is_rejected_before_any_work() {
        let probe = CountingProbe::default();
        let publisher = Arc::new(RecordingPublisher::default());
        let uc = use_case(probe.clone(), publisher.clone());

        for header in [Some("Apikey 1234560"), Some("Bearer 123456"), None] {
            // Garbage body: a decode attempt would fail with a different error.
            let err = uc
                .handle(header, Some("application/x-protobuf"), b"\xff\xff")
                .await
                .unwrap_err();
            assert!(matches!(err, RelayError::Auth));
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert!(publisher.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let probe = CountingProbe::default();
        let publisher = Arc::new(RecordingPublisher::default());
        let uc = use_case(probe.clone(), publisher.clone());

        let err = uc
            .handle(Some("Apikey 123456"), Some("application/x-protobuf"), b"\xff\xff")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn probe_failure_is_fatal() {
        let probe = CountingProbe {
            fail: true,
            ..CountingProbe::default()
        };
        let publisher = Arc::new(RecordingPublisher::default());
        let uc = use_case(probe, publisher.clone());

        let err = uc
            .handle(Some("Apikey 123456"), None, br#"{"firstname":"Ada","lastname":"Lovelace"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::SideCall(_)));
        assert!(publisher.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_rejection_surfaces_to_the_caller() {
        let publisher = Arc::new(RecordingPublisher {
            reject: Some(SubmitError::Closed),
            ..RecordingPublisher::default()
        });
        let uc = use_case(CountingProbe::default(), publisher);

        let err = uc
            .handle(
                Some("Apikey 123456"),
                Some("application/x-protobuf"),
                &ada_protobuf(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::PublishSubmit(SubmitError::Closed)));
    }
}

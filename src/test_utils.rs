#[cfg(test)]
pub mod test_helpers {
    use crate::error::{RemoteError, Result};
    use crate::transport::{OutboundRequest, Transport, TransportResponse};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Reply used once the scripted queue runs dry
    #[derive(Clone)]
    enum Fallback {
        Readable { status: u16, body: String },
        Opaque,
        Fail(String),
    }

    /// Transport that records every request and answers from a script
    pub struct MockTransport {
        requests: Mutex<Vec<OutboundRequest>>,
        script: Mutex<VecDeque<Result<TransportResponse>>>,
        fallback: Fallback,
    }

    impl MockTransport {
        fn with_fallback(fallback: Fallback) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                script: Mutex::new(VecDeque::new()),
                fallback,
            }
        }

        pub fn readable(status: u16, body: &str) -> Self {
            Self::with_fallback(Fallback::Readable {
                status,
                body: body.to_string(),
            })
        }

        pub fn opaque() -> Self {
            Self::with_fallback(Fallback::Opaque)
        }

        pub fn failing(message: &str) -> Self {
            Self::with_fallback(Fallback::Fail(message.to_string()))
        }

        /// Answer in order, then fall back to opaque responses
        pub fn scripted(replies: Vec<Result<TransportResponse>>) -> Self {
            let mock = Self::opaque();
            *mock.script.lock().unwrap() = replies.into();
            mock
        }

        pub fn requests(&self) -> Vec<OutboundRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Transport for MockTransport {
        async fn send(&self, request: OutboundRequest) -> Result<TransportResponse> {
            self.requests.lock().unwrap().push(request);

            if let Some(reply) = self.script.lock().unwrap().pop_front() {
                return reply;
            }

            match self.fallback.clone() {
                Fallback::Readable { status, body } => {
                    Ok(TransportResponse::Readable { status, body })
                },
                Fallback::Opaque => Ok(TransportResponse::Opaque),
                Fallback::Fail(message) => Err(RemoteError::Network(message)),
            }
        }
    }
}

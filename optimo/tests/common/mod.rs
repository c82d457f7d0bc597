#![allow(dead_code)]

use async_trait::async_trait;
use optimo::config::SessionConfig;
use optimo::document::{ControlKind, CssPosition};
use optimo::{
    ElementId, ElementSpec, Entitlement, EntitlementSource, HostDocument, MemoryDocument,
    OptimizationService, OptimizeRequest, OptimoError, OptimoResult, Rect, ServiceReply, Session,
    Tier,
};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// What the mock answers.
#[derive(Debug, Clone)]
pub enum MockReply {
    Success(String),
    Failure(Option<String>),
    Disconnected,
}

/// Records every request and answers with a fixed reply.
pub struct RecordingService {
    requests: Mutex<Vec<OptimizeRequest>>,
    reply: MockReply,
    gate: Option<Arc<Notify>>,
}

impl RecordingService {
    pub fn new(reply: MockReply) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply,
            gate: None,
        })
    }

    /// A service that waits for `gate` before answering.
    pub fn gated(reply: MockReply, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply,
            gate: Some(gate),
        })
    }

    pub fn requests(&self) -> Vec<OptimizeRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl OptimizationService for RecordingService {
    async fn optimize(&self, request: &OptimizeRequest) -> OptimoResult<ServiceReply> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.reply {
            MockReply::Success(text) => Ok(ServiceReply::success(text.clone())),
            MockReply::Failure(Some(message)) => Ok(ServiceReply::failure(message.clone())),
            MockReply::Failure(None) => Ok(ServiceReply {
                success: false,
                ..Default::default()
            }),
            MockReply::Disconnected => Err(OptimoError::Disconnected),
        }
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A chat page: one composer inside a positioned wrapper, one address field
/// and one search box that should be left alone.
pub struct ChatPage {
    pub doc: MemoryDocument,
    pub wrapper: ElementId,
    pub composer: ElementId,
    pub notes: ElementId,
    pub address: ElementId,
}

pub fn chat_page(composer_text: &str) -> ChatPage {
    let mut doc = MemoryDocument::new();
    let body = doc.body();
    let wrapper = doc
        .append(
            body,
            ElementSpec::div()
                .class("thread")
                .position(CssPosition::Relative)
                .rect(Rect::new(100.0, 50.0, 800.0, 600.0)),
        )
        .unwrap();
    let composer = doc
        .append(
            wrapper,
            ElementSpec::textarea()
                .placeholder("Message ChatBot")
                .rect(Rect::new(120.0, 500.0, 600.0, 48.0))
                .value(composer_text),
        )
        .unwrap();
    let notes = doc
        .append(
            wrapper,
            ElementSpec::textarea()
                .rows(8)
                .rect(Rect::new(120.0, 100.0, 600.0, 160.0))
                .value("meeting notes"),
        )
        .unwrap();
    let form = doc.append(body, ElementSpec::new("form").class("checkout")).unwrap();
    let address = doc
        .append(
            form,
            ElementSpec::textarea()
                .rows(2)
                .rect(Rect::new(0.0, 700.0, 300.0, 40.0)),
        )
        .unwrap();

    ChatPage {
        doc,
        wrapper,
        composer,
        notes,
        address,
    }
}

pub fn session_with(
    doc: MemoryDocument,
    service: Arc<RecordingService>,
    tier: Tier,
) -> (Session<MemoryDocument>, EntitlementSource) {
    let _ = env_logger::builder().is_test(true).try_init();
    let source = EntitlementSource::new(Entitlement::new(tier).with_user_id("user-7"));
    let session = Session::new(doc, SessionConfig::default(), service, source.subscribe());
    (session, source)
}

pub fn trigger_of(session: &Session<MemoryDocument>, surface: ElementId) -> ElementId {
    session
        .tracker()
        .attachment(surface)
        .map(|a| a.trigger)
        .expect("surface has a trigger")
}

pub fn panel_count(session: &Session<MemoryDocument>) -> usize {
    session.document().controls(ControlKind::Panel).len()
}

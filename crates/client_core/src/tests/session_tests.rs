use super::*;
use crate::{
    dialogue::{replies, StepKind},
    error::ComplaintServiceError,
    transcript::Sender,
    ComplaintService, StatusLookup,
};
use async_trait::async_trait;
use shared::{domain::ComplaintId, protocol::NewComplaint};
use tokio::{sync::broadcast::error::TryRecvError, time::timeout};

struct StaticComplaintService;

#[async_trait]
impl ComplaintService for StaticComplaintService {
    async fn create_complaint(
        &self,
        _complaint: &NewComplaint,
    ) -> Result<ComplaintId, ComplaintServiceError> {
        Ok(ComplaintId::new("c0ffee12"))
    }

    async fn complaint_status(
        &self,
        _complaint_id: &str,
    ) -> Result<StatusLookup, ComplaintServiceError> {
        Ok(StatusLookup::NotFound)
    }
}

fn session(typing_delay: Duration, overlap: OverlapPolicy) -> ChatSession {
    let controller = DialogueController::new(Arc::new(StaticComplaintService));
    ChatSession::spawn(
        controller,
        SessionOptions {
            typing_delay,
            queue_capacity: 8,
            overlap,
        },
    )
}

async fn next_event(events: &mut broadcast::Receiver<ChatEvent>) -> ChatEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event before timeout")
        .expect("event channel open")
}

async fn next_bot_message(events: &mut broadcast::Receiver<ChatEvent>) -> Message {
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event before timeout")
            .expect("event channel open");
        if let ChatEvent::BotMessage(message) = event {
            return message;
        }
    }
}

#[tokio::test]
async fn rapid_submissions_are_handled_in_order() {
    let session = session(Duration::from_millis(20), OverlapPolicy::Queue);
    let mut events = session.subscribe();

    for input in ["register", "yes", "Jane", "notanumber"] {
        session.submit(input).expect("queued");
    }

    assert_eq!(next_bot_message(&mut events).await.text, replies::CONFIRM_REGISTER);
    assert_eq!(next_bot_message(&mut events).await.text, replies::ASK_NAME);
    assert_eq!(next_bot_message(&mut events).await.text, replies::ASK_MOBILE);
    assert_eq!(next_bot_message(&mut events).await.text, replies::INVALID_MOBILE);

    let transcript = session.transcript().await;
    let senders: Vec<_> = transcript.iter().map(|m| m.sender).collect();
    assert_eq!(
        senders,
        vec![
            Sender::Bot,
            Sender::User,
            Sender::Bot,
            Sender::User,
            Sender::Bot,
            Sender::User,
            Sender::Bot,
            Sender::User,
            Sender::Bot,
        ]
    );
    assert_eq!(session.step().await.kind(), StepKind::AskMobile);
    session.close().await;
}

#[tokio::test]
async fn worker_emits_typing_before_reply() {
    let session = session(Duration::ZERO, OverlapPolicy::Queue);
    let mut events = session.subscribe();
    session.submit("hi").expect("queued");

    let mut seen = Vec::new();
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event before timeout")
            .expect("event channel open");
        let done = event == ChatEvent::Idle;
        seen.push(event);
        if done {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            ChatEvent::UserMessage(Message::user("hi")),
            ChatEvent::Typing,
            ChatEvent::BotMessage(Message::bot("Hey there! 😊 How can I assist you today?")),
            ChatEvent::Idle,
        ]
    );
    assert!(!session.is_busy());
    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn user_message_is_in_transcript_while_bot_types() {
    let session = session(Duration::from_millis(300), OverlapPolicy::Queue);
    let mut events = session.subscribe();
    session.submit("register").expect("queued");

    assert_eq!(
        next_event(&mut events).await,
        ChatEvent::UserMessage(Message::user("register"))
    );
    assert_eq!(next_event(&mut events).await, ChatEvent::Typing);
    tokio::time::advance(Duration::from_millis(100)).await;

    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript.last(), Some(&Message::user("register")));

    assert_eq!(next_bot_message(&mut events).await.text, replies::CONFIRM_REGISTER);
    assert_eq!(session.transcript().await.len(), 3);
    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn reply_waits_for_full_typing_delay() {
    let delay = Duration::from_secs(1);
    let session = session(delay, OverlapPolicy::Queue);
    let mut events = session.subscribe();
    let started = tokio::time::Instant::now();
    session.submit("hi").expect("queued");

    assert_eq!(next_event(&mut events).await, ChatEvent::UserMessage(Message::user("hi")));
    assert_eq!(next_event(&mut events).await, ChatEvent::Typing);

    tokio::time::advance(delay - Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert!(session.is_busy());

    tokio::time::advance(Duration::from_millis(1)).await;
    let reply = next_bot_message(&mut events).await;
    assert_eq!(reply.sender, Sender::Bot);
    assert!(started.elapsed() >= delay);
    session.close().await;
}

#[tokio::test]
async fn reject_policy_refuses_input_while_typing() {
    let session = session(Duration::from_millis(200), OverlapPolicy::Reject);
    let mut events = session.subscribe();

    session.submit("status").expect("first accepted");
    assert!(session.is_busy());
    assert_eq!(session.submit("yes"), Err(SubmitError::Busy));

    assert_eq!(next_bot_message(&mut events).await.text, replies::CONFIRM_STATUS);
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event before timeout")
            .expect("event channel open");
        if event == ChatEvent::Idle {
            break;
        }
    }

    session.submit("yes").expect("accepted once idle");
    assert_eq!(next_bot_message(&mut events).await.text, replies::ASK_COMPLAINT_ID);
    session.close().await;
}

#[tokio::test]
async fn blank_submission_is_dropped() {
    let session = session(Duration::ZERO, OverlapPolicy::Reject);
    session.submit("   ").expect("blank accepted");
    assert!(!session.is_busy());
    assert_eq!(session.transcript().await.len(), 1);
    session.close().await;
}

#[tokio::test]
async fn close_drains_pending_queue() {
    let session = session(Duration::from_millis(5), OverlapPolicy::Queue);
    let mut events = session.subscribe();
    session.submit("status").expect("queued");
    session.submit("yes").expect("queued");
    session.submit("zz999999").expect("queued");
    session.close().await;

    let mut replies_seen = Vec::new();
    while let Ok(event) = events.recv().await {
        if let ChatEvent::BotMessage(message) = event {
            replies_seen.push(message.text);
        }
    }
    assert_eq!(
        replies_seen,
        vec![
            replies::CONFIRM_STATUS.to_string(),
            replies::ASK_COMPLAINT_ID.to_string(),
            replies::NOT_FOUND.to_string(),
        ]
    );
}

#[test]
fn overlap_policy_parses_config_values() {
    assert_eq!("queue".parse::<OverlapPolicy>(), Ok(OverlapPolicy::Queue));
    assert_eq!(" Reject ".parse::<OverlapPolicy>(), Ok(OverlapPolicy::Reject));
    assert!("drop".parse::<OverlapPolicy>().is_err());
}

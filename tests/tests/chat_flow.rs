use application::chat_service::{ChatService, Phase, SubmitOutcome};
use domain::attachment::{LocalAttachment, MAX_ATTACHMENT_BYTES};
use domain::error::ChatError;
use domain::message::Role;
use domain::prompt::{PromptPart, HISTORY_WINDOW};
use tests::{RecordingBucket, ScriptedProvider};

fn harness() -> (
    ScriptedProvider,
    RecordingBucket,
    ChatService<ScriptedProvider, RecordingBucket>,
) {
    let provider = ScriptedProvider::new();
    let bucket = RecordingBucket::new();
    let service = ChatService::new(provider.clone(), bucket.clone());
    (provider, bucket, service)
}

fn png(bytes: usize) -> LocalAttachment {
    LocalAttachment {
        file_name: "kitten.png".to_string(),
        mime_type: "image/png".to_string(),
        bytes: vec![7; bytes],
    }
}

#[tokio::test]
async fn five_exchanges_land_ten_messages() {
    let (provider, _bucket, mut service) = harness();
    for i in 0..5 {
        provider.reply_with(&format!("reply {i}"));
    }

    for i in 0..5 {
        service
            .submit(&format!("message {i}"), None)
            .await
            .expect("submit");
    }

    let transcript = service.transcript();
    assert_eq!(transcript.len(), 10);
    for (i, pair) in transcript.chunks(2).enumerate() {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[0].content, format!("message {i}"));
        assert_eq!(pair[1].role, Role::Assistant);
        assert_eq!(pair[1].content, format!("reply {i}"));
    }
    assert_eq!(service.sessions().len(), 1);
}

#[tokio::test]
async fn prompt_window_caps_at_twenty_messages() {
    let (provider, _bucket, mut service) = harness();

    // 13 exchanges leave 26 messages in the transcript, 6 past the window.
    for i in 0..13 {
        service
            .submit(&format!("turn {i}"), None)
            .await
            .expect("submit");
    }
    service.submit("one more", None).await.expect("submit");

    let prompts = provider.seen_prompts();
    let last = prompts.last().expect("prompts recorded");
    let PromptPart::Text(text) = &last.parts[0] else {
        panic!("expected a text part");
    };

    let role_lines = text
        .lines()
        .filter(|line| line.starts_with("user: ") || line.starts_with("assistant: "))
        .count();
    assert_eq!(role_lines, HISTORY_WINDOW);
    assert!(!text.contains("user: turn 2\n"));
    assert!(text.contains("user: turn 3\n"));
    assert!(text.ends_with("one more"));
}

#[tokio::test]
async fn hello_starts_a_session_titled_hello() {
    let (provider, _bucket, mut service) = harness();
    provider.reply_with("Hi! How can I help?");

    let outcome = service.submit("Hello", None).await.expect("submit");
    let SubmitOutcome::Replied { session_id, reply } = outcome else {
        panic!("expected a reply");
    };

    assert_eq!(reply, "Hi! How can I help?");
    assert_eq!(service.sessions().len(), 1);
    assert_eq!(service.sessions()[0].id, session_id);
    assert_eq!(service.sessions()[0].title, "Hello");
    assert_eq!(service.transcript().len(), 2);
    assert_eq!(service.phase(), Phase::Idle);
}

#[tokio::test]
async fn empty_submission_is_skipped() {
    let (_provider, _bucket, mut service) = harness();

    let outcome = service.submit("   \n", None).await.expect("submit");

    assert!(matches!(outcome, SubmitOutcome::Skipped));
    assert!(service.sessions().is_empty());
}

#[tokio::test]
async fn image_upload_flows_into_message_and_prompt() {
    let (provider, bucket, mut service) = harness();
    provider.reply_with("That is a kitten.");
    let attachment = png(2 * 1024 * 1024);

    let outcome = service
        .submit("", Some(&attachment))
        .await
        .expect("submit");
    assert!(matches!(outcome, SubmitOutcome::Replied { .. }));

    let uploads = bucket.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].mime_type, "image/png");
    assert_eq!(uploads[0].size, 2 * 1024 * 1024);
    assert!(uploads[0].name.ends_with(".png"));

    // Attachment-only submits carry the image as the sole prompt part.
    let prompts = provider.seen_prompts();
    assert_eq!(prompts[0].parts.len(), 1);
    match &prompts[0].parts[0] {
        PromptPart::Image { mime_type, .. } => assert_eq!(mime_type, "image/png"),
        other => panic!("unexpected part: {other:?}"),
    }

    let message = &service.transcript()[0];
    let expected = format!("https://bucket.test/public/{}", uploads[0].name);
    assert_eq!(message.file_url.as_deref(), Some(expected.as_str()));
    assert_eq!(message.file_type.as_deref(), Some("image/png"));
    assert_eq!(service.sessions()[0].title, "kitten.png");
}

#[tokio::test]
async fn text_file_contents_are_inlined_into_the_prompt() {
    let (provider, bucket, mut service) = harness();
    provider.reply_with("The meeting is at noon.");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "Standup moved to noon on Friday.").expect("write");
    let attachment = infrastructure::attachment::load(&path).await.expect("load");

    service
        .submit("summarize this", Some(&attachment))
        .await
        .expect("submit");

    assert_eq!(bucket.uploads()[0].mime_type, "text/plain");

    let prompts = provider.seen_prompts();
    assert_eq!(prompts[0].parts.len(), 2);
    let PromptPart::Text(body) = &prompts[0].parts[0] else {
        panic!("expected the message text first");
    };
    assert!(body.contains("summarize this"));
    let PromptPart::Text(file_part) = &prompts[0].parts[1] else {
        panic!("expected the file contents second");
    };
    assert!(file_part.starts_with("File content:"));
    assert!(file_part.contains("Standup moved to noon on Friday."));
}

#[tokio::test]
async fn failed_request_keeps_the_user_message() {
    let (provider, _bucket, mut service) = harness();
    provider.fail_with_status(500);

    let err = service
        .submit("does this work?", None)
        .await
        .expect_err("request should fail");
    match err.downcast::<ChatError>().expect("chat error") {
        ChatError::InferenceFailed { status, .. } => assert_eq!(status, Some(500)),
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(service.transcript().len(), 1);
    assert_eq!(service.transcript()[0].role, Role::User);
    assert_eq!(service.phase(), Phase::Idle);

    // The next attempt goes through and lands after the stranded message.
    provider.reply_with("yes, it does");
    service.submit("retry", None).await.expect("submit");
    assert_eq!(service.transcript().len(), 3);
    assert_eq!(service.transcript()[2].content, "yes, it does");
}

#[tokio::test]
async fn oversized_attachment_never_reaches_the_bucket() {
    let (provider, bucket, mut service) = harness();
    let attachment = png(6 * 1024 * 1024);

    let err = service
        .submit("look at this", Some(&attachment))
        .await
        .expect_err("should be rejected");
    match err.downcast::<ChatError>().expect("chat error") {
        ChatError::FileTooLarge { size, limit } => {
            assert_eq!(size, 6 * 1024 * 1024);
            assert_eq!(limit, MAX_ATTACHMENT_BYTES);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(bucket.uploads().is_empty());
    assert!(provider.seen_prompts().is_empty());
    assert!(service.sessions().is_empty());
    assert_eq!(service.phase(), Phase::Idle);
}

#[tokio::test]
async fn upload_failure_aborts_the_turn() {
    let (provider, bucket, mut service) = harness();
    bucket.go_offline();

    let err = service
        .submit("look at this", Some(&png(1024)))
        .await
        .expect_err("upload should fail");
    match err.downcast::<ChatError>().expect("chat error") {
        ChatError::UploadFailed { .. } => {}
        other => panic!("unexpected error: {other}"),
    }

    // Nothing was staged and no request went out.
    assert!(service.sessions().is_empty());
    assert!(provider.seen_prompts().is_empty());
    assert_eq!(service.phase(), Phase::Idle);
}

#[tokio::test]
async fn deleting_the_active_session_leaves_none_open() {
    let (_provider, _bucket, mut service) = harness();
    service.submit("first chat", None).await.expect("submit");
    service.new_chat();
    service.submit("second chat", None).await.expect("submit");
    assert_eq!(service.sessions().len(), 2);

    let active = service.active_session().expect("active session");
    service.delete_session(active).expect("delete");

    assert!(service.active_session().is_none());
    assert_eq!(service.sessions().len(), 1);
    assert_eq!(service.sessions()[0].title, "first chat");
    assert!(service.transcript().is_empty());

    let err = service
        .delete_session(active)
        .expect_err("already deleted");
    match err.downcast::<ChatError>().expect("chat error") {
        ChatError::SessionNotFound { id } => assert_eq!(id, active),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn opening_a_session_replays_its_transcript() {
    let (provider, _bucket, mut service) = harness();
    provider.reply_with("alpha answer");
    provider.reply_with("bravo answer");
    service.submit("alpha question", None).await.expect("submit");
    service.new_chat();
    service.submit("bravo question", None).await.expect("submit");

    let first = service.sessions()[0].id;
    let second = service.sessions()[1].id;

    service.open_session(first).expect("open");
    assert_eq!(service.transcript().len(), 2);
    assert_eq!(service.transcript()[0].content, "alpha question");
    assert_eq!(service.transcript()[1].content, "alpha answer");

    // Reading a transcript does not change it.
    service.open_session(first).expect("open again");
    assert_eq!(service.transcript().len(), 2);

    // New turns land in the re-opened session, not the most recent one.
    provider.reply_with("alpha again");
    service.submit("followup", None).await.expect("submit");
    assert_eq!(service.transcript().len(), 4);
    assert_eq!(service.active_session(), Some(first));

    service.open_session(second).expect("open");
    assert_eq!(service.transcript().len(), 2);
}

#[test]
fn cli_flags_parse() {
    use clap::Parser;
    use presentation::cli::Cli;

    let cli = Cli::try_parse_from([
        "banter", "--copy", "--attach", "notes.txt", "hello", "there",
    ])
    .expect("parse");
    assert!(cli.copy);
    assert_eq!(cli.attach.as_deref(), Some("notes.txt"));
    assert_eq!(cli.prompt, ["hello", "there"]);

    let bare = Cli::try_parse_from(["banter"]).expect("parse");
    assert!(!bare.copy);
    assert!(bare.attach.is_none());
    assert!(bare.prompt.is_empty());
}

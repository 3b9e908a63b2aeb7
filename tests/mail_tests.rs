use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::json;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use runcall::console::Console;
use runcall::mail::{
    authorize, AuthorizedUser, CredentialStore, GmailClient, MailError, Mailbox, OAuthClient,
};
use runcall::options::TransportOptions;

#[derive(Clone, Default)]
struct ScriptedConsole {
    answers: Arc<Mutex<VecDeque<String>>>,
    shown: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConsole {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.iter().map(|a| a.to_string()).collect())),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn ask(&self, _question: &str) -> io::Result<String> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    async fn say(&self, text: &str) -> io::Result<()> {
        self.shown.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn gmail(server: &MockServer) -> GmailClient {
    GmailClient::with_base_url(
        "ya29.token".to_string(),
        server.base_url(),
        TransportOptions::default(),
    )
}

#[tokio::test]
async fn list_unread_fetches_snippets() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/messages")
            .query_param("maxResults", "2")
            .query_param("q", "is:unread")
            .header("authorization", "Bearer ya29.token");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "messages": [{"id": "a", "threadId": "ta"}, {"id": "b", "threadId": "tb"}],
                "resultSizeEstimate": 2
            }));
    });
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/messages/a")
            .query_param("format", "minimal");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": "a", "threadId": "ta", "snippet": "buy bitcoin now"}));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/messages/b");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": "b", "threadId": "tb", "snippet": "meeting at 3pm"}));
    });

    let unread = gmail(&server).list_unread(2).await.unwrap();

    let snippets: Vec<&str> = unread.iter().map(|m| m.snippet.as_str()).collect();
    assert_eq!(snippets, vec!["buy bitcoin now", "meeting at 3pm"]);
    list.assert();
    first.assert();
    second.assert();
}

#[tokio::test]
async fn empty_inbox_lists_nothing() {
    let server = MockServer::start();
    let _list = server.mock(|when, then| {
        when.method(GET).path("/messages");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"resultSizeEstimate": 0}));
    });

    let unread = gmail(&server).list_unread(3).await.unwrap();

    assert!(unread.is_empty());
}

#[tokio::test]
async fn bulk_operations_post_ids() {
    let server = MockServer::start();
    let delete = server.mock(|when, then| {
        when.method(POST)
            .path("/messages/batchDelete")
            .json_body(json!({"ids": ["a", "c"]}));
        then.status(204);
    });
    let modify = server.mock(|when, then| {
        when.method(POST)
            .path("/messages/batchModify")
            .json_body(json!({"ids": ["b"], "removeLabelIds": ["UNREAD"]}));
        then.status(204);
    });

    let client = gmail(&server);
    client
        .batch_delete(&["a".to_string(), "c".to_string()])
        .await
        .unwrap();
    client.batch_mark_read(&["b".to_string()]).await.unwrap();

    delete.assert();
    modify.assert();
}

#[tokio::test]
async fn mailbox_errors_carry_status() {
    let server = MockServer::start();
    let _delete = server.mock(|when, then| {
        when.method(POST).path("/messages/batchDelete");
        then.status(403)
            .header("content-type", "application/json")
            .json_body(json!({"error": {"code": 403, "message": "Insufficient Permission"}}));
    });

    let err = gmail(&server)
        .batch_delete(&["a".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, MailError::Api { status: 403, ref message } if message == "Insufficient Permission"));
}

#[tokio::test]
async fn saved_credentials_are_refreshed() {
    let server = MockServer::start();
    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .body_contains("grant_type=refresh_token")
            .body_contains("refresh_token=1%2F%2Fsaved");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"access_token": "ya29.fresh", "expires_in": 3599, "token_type": "Bearer"}));
    });

    let dir = tempdir().expect("tmp");
    let token_path = dir.path().join("token.json");
    let saved = json!({
        "type": "authorized_user",
        "client_id": "cid",
        "client_secret": "csecret",
        "refresh_token": "1//saved",
        "token_uri": server.url("/token")
    });
    std::fs::write(&token_path, saved.to_string()).expect("write token");

    let store = CredentialStore::new(dir.path().join("credentials.json"), &token_path);
    let console = ScriptedConsole::default();
    let access = authorize(&store, &OAuthClient::default(), &console)
        .await
        .unwrap();

    assert_eq!(access, "ya29.fresh");
    assert!(console.shown.lock().unwrap().is_empty());
    token.assert();
}

#[tokio::test]
async fn first_run_consent_saves_refresh_token() {
    let server = MockServer::start();
    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .body_contains("grant_type=authorization_code")
            .body_contains("code=4%2F0Ab");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"access_token": "ya29.new", "refresh_token": "1//new", "expires_in": 3599}));
    });

    let dir = tempdir().expect("tmp");
    let credentials_path = dir.path().join("credentials.json");
    let credentials = json!({
        "installed": {
            "client_id": "cid",
            "client_secret": "csecret",
            "redirect_uris": ["http://localhost"],
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": server.url("/token")
        }
    });
    std::fs::write(&credentials_path, credentials.to_string()).expect("write credentials");

    let store = CredentialStore::new(&credentials_path, dir.path().join("token.json"));
    let console = ScriptedConsole::new(&["http://localhost/?code=4%2F0Ab&scope=https://mail.google.com/"]);
    let access = authorize(&store, &OAuthClient::default(), &console)
        .await
        .unwrap();

    assert_eq!(access, "ya29.new");
    assert!(console.shown.lock().unwrap()[0].contains("accounts.google.com"));
    token.assert();

    let saved: AuthorizedUser =
        serde_json::from_slice(&std::fs::read(store.token_path()).expect("read token")).unwrap();
    assert_eq!(saved.kind, "authorized_user");
    assert_eq!(saved.refresh_token, "1//new");
    assert_eq!(saved.client_id, "cid");
}

#[tokio::test]
async fn malformed_saved_credentials_are_ignored() {
    let dir = tempdir().expect("tmp");
    let token_path = dir.path().join("token.json");
    std::fs::write(&token_path, "{ not json").expect("write token");

    let store = CredentialStore::new(dir.path().join("credentials.json"), &token_path);

    assert!(store.load_saved().await.is_none());
}

#[tokio::test]
async fn missing_client_secrets_is_an_auth_error() {
    let dir = tempdir().expect("tmp");
    let store = CredentialStore::new(
        dir.path().join("credentials.json"),
        dir.path().join("token.json"),
    );

    let err = authorize(&store, &OAuthClient::default(), &ScriptedConsole::default())
        .await
        .unwrap_err();

    assert!(matches!(err, MailError::Auth(_)));
}

#[tokio::test]
async fn rejected_refresh_is_an_auth_error() {
    let server = MockServer::start();
    let _token = server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(400)
            .header("content-type", "application/json")
            .json_body(json!({"error": "invalid_grant", "error_description": "Token has been expired or revoked."}));
    });

    let user = AuthorizedUser {
        kind: "authorized_user".to_string(),
        client_id: "cid".to_string(),
        client_secret: "csecret".to_string(),
        refresh_token: "1//revoked".to_string(),
        token_uri: server.url("/token"),
    };
    let err = OAuthClient::default().refresh(&user).await.unwrap_err();

    match err {
        MailError::Auth(message) => assert!(message.contains("invalid_grant")),
        other => panic!("expected auth error, got {:?}", other),
    }
}

//! 会话集成测试：登录流程、资料拉取与持久化恢复

mod common;

use common::{setup, FixedCode};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use miniapp_client::{RequestError, SessionState, SessionStore};

fn envelope(code: i64, data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": code,
        "msg": "",
        "data": data,
        "show": false,
    }))
}

async fn mount_login_flow(ctx: &common::TestContext, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/login/auto_login"))
        .and(body_json(json!({"code": "code-123"})))
        .respond_with(envelope(1, json!({"access_token": token})))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/userinfo"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(envelope(
            1,
            json!({
                "user_id": 7,
                "nickname": "小明",
                "avatar": "https://cdn.example/avatar.png",
                "sex": 1,
                "invite_code": "INV7"
            }),
        ))
        .mount(&ctx.server)
        .await;
}

#[tokio::test]
async fn test_auto_login_success() {
    let ctx = setup().await;
    mount_login_flow(&ctx, "tok-1").await;

    ctx.session.auto_login(&ctx.client).await.unwrap();

    assert!(ctx.session.is_logged_in());
    assert_eq!(ctx.session.state(), SessionState::Authenticated);
    assert_eq!(ctx.session.token(), "tok-1");

    let user = ctx.session.current_user();
    assert_eq!(user.user_id, 7);
    assert_eq!(user.nickname, "小明");
    assert_eq!(user.invite_code, "INV7");

    // 会话已落盘
    let content = std::fs::read_to_string(ctx.dir.path().join("session.json")).unwrap();
    assert!(content.contains("tok-1"));
    assert!(content.contains("小明"));
}

#[tokio::test]
async fn test_auto_login_failure_clears_session() {
    let ctx = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login/auto_login"))
        .respond_with(envelope(0, json!(null)))
        .mount(&ctx.server)
        .await;

    let err = ctx.session.auto_login(&ctx.client).await.unwrap_err();
    assert!(matches!(err, RequestError::Business { .. }));
    assert!(!ctx.session.is_logged_in());
    assert_eq!(ctx.session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_profile_failure_logs_out() {
    let ctx = setup().await;
    ctx.session.set_token("tok-1");

    Mock::given(method("GET"))
        .and(path("/api/user/userinfo"))
        .respond_with(envelope(0, json!(null)))
        .mount(&ctx.server)
        .await;

    let err = ctx.session.get_user_info(&ctx.client).await.unwrap_err();
    assert!(matches!(err, RequestError::Business { .. }));

    // 资料拉取失败连带清除令牌：整个会话回到未登录
    assert!(!ctx.session.is_logged_in());
    assert_eq!(ctx.session.current_user(), Default::default());
    assert_eq!(ctx.session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_login_with_profile_failure_clears_token() {
    let ctx = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/login/auto_login"))
        .respond_with(envelope(1, json!({"access_token": "tok-1"})))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/userinfo"))
        .respond_with(envelope(0, json!(null)))
        .mount(&ctx.server)
        .await;

    ctx.session.auto_login(&ctx.client).await.unwrap_err();
    assert!(!ctx.session.is_logged_in());
    assert_eq!(ctx.session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_token_invalid_triggers_reauth_once_and_still_fails() {
    let ctx = setup().await;
    mount_login_flow(&ctx, "tok-2").await;

    // 业务接口返回 token 失效
    Mock::given(method("GET"))
        .and(path("/api/order/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": -1,
            "msg": "请重新登录",
            "data": null,
        })))
        .mount(&ctx.server)
        .await;

    let err = ctx
        .client
        .get(miniapp_client::RequestOptions::new("order/list"), None)
        .await
        .unwrap_err();
    // 原请求仍以失败返回，调用方自行重试
    assert!(matches!(err, RequestError::TokenInvalid(ref msg) if msg == "请重新登录"));

    // 重登流程已完成：登录 + 资料各一次
    assert!(ctx.session.is_logged_in());
    assert_eq!(ctx.session.token(), "tok-2");
    let requests = ctx.server.received_requests().await.unwrap();
    let login_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/api/login/auto_login")
        .count();
    let userinfo_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/api/user/userinfo")
        .count();
    assert_eq!(login_calls, 1);
    assert_eq!(userinfo_calls, 1);
}

#[tokio::test]
async fn test_restore_reruns_login_flow() {
    let ctx = setup().await;
    mount_login_flow(&ctx, "tok-fresh").await;

    // 上一次运行留下的会话文件
    let previous = SessionStore::new(
        ctx.dir.path().join("session.json"),
        Arc::new(FixedCode("unused".to_string())),
    );
    previous.set_token("tok-stale");

    ctx.session.restore(&ctx.client).await.unwrap();

    // 恢复会话会重新执行完整登录流程，令牌被新登录结果替换
    assert_eq!(ctx.session.token(), "tok-fresh");
    assert_eq!(ctx.session.state(), SessionState::Authenticated);
    let requests = ctx.server.received_requests().await.unwrap();
    assert_eq!(
        requests
            .iter()
            .filter(|r| r.url.path() == "/api/login/auto_login")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_restore_without_file_is_noop() {
    let ctx = setup().await;
    ctx.session.restore(&ctx.client).await.unwrap();
    assert!(!ctx.session.is_logged_in());
    assert_eq!(ctx.session.state(), SessionState::Anonymous);
    assert!(ctx.server.received_requests().await.unwrap().is_empty());
}

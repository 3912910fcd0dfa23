// 接口封装
//
// 薄封装：每个函数对应一个服务端接口，请求行为（地址补全、token、
// 信封解析）都由请求层完成

use serde::Deserialize;
use serde_json::json;

use crate::error::RequestError;
use crate::request::client::HttpClient;
use crate::request::types::RequestOptions;
use crate::session::UserInfo;

/// 登录接口返回数据
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    /// 访问令牌
    pub access_token: String,
}

/// 登录：以平台 code 换取访问令牌
///
/// POST login/auto_login
pub async fn auto_login(http: &HttpClient, code: &str) -> Result<LoginData, RequestError> {
    http.post(
        RequestOptions::new("login/auto_login").data(json!({ "code": code })),
        None,
    )
    .await?
    .json()
}

/// 获取用户资料
///
/// GET user/userinfo
pub async fn get_user(http: &HttpClient) -> Result<UserInfo, RequestError> {
    http.get(RequestOptions::new("user/userinfo"), None)
        .await?
        .json()
}

// 业务响应信封
//
// 传输层成功之上的业务结果载体，服务端约定的线上格式

use serde::{Deserialize, Serialize};

/// 业务响应信封 {code, msg, data, show}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// 业务码
    pub code: i64,
    /// 提示信息
    #[serde(default)]
    pub msg: String,
    /// 业务数据
    #[serde(default)]
    pub data: serde_json::Value,
    /// 成功时是否向用户展示 msg
    #[serde(default)]
    pub show: bool,
}

/// 业务码分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    /// 成功
    Success,
    /// 业务失败
    Failed,
    /// 登录态失效
    TokenInvalid,
    /// 未识别的业务码，数据原样放行
    Other(i64),
}

impl ResponseCode {
    pub const SUCCESS: i64 = 1;
    pub const FAILED: i64 = 0;
    pub const TOKEN_INVALID: i64 = -1;

    /// 从业务码分类
    pub fn from_code(code: i64) -> Self {
        match code {
            Self::SUCCESS => ResponseCode::Success,
            Self::FAILED => ResponseCode::Failed,
            Self::TOKEN_INVALID => ResponseCode::TokenInvalid,
            other => ResponseCode::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_code() {
        assert_eq!(ResponseCode::from_code(1), ResponseCode::Success);
        assert_eq!(ResponseCode::from_code(0), ResponseCode::Failed);
        assert_eq!(ResponseCode::from_code(-1), ResponseCode::TokenInvalid);
        assert_eq!(ResponseCode::from_code(404), ResponseCode::Other(404));
    }

    #[test]
    fn test_parse_envelope() {
        let body = r#"{"code":1,"msg":"ok","data":{"user_id":7},"show":true}"#;
        let resp: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.code, 1);
        assert_eq!(resp.msg, "ok");
        assert_eq!(resp.data, json!({"user_id": 7}));
        assert!(resp.show);
    }

    #[test]
    fn test_parse_envelope_defaults() {
        // msg / data / show 缺省，未知字段忽略
        let body = r#"{"code":0,"trace_id":"abc"}"#;
        let resp: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.code, 0);
        assert_eq!(resp.msg, "");
        assert!(resp.data.is_null());
        assert!(!resp.show);
    }
}

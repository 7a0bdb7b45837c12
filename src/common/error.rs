use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // 未知错误
    UnknownError = 1000,
    // 配置文件错误
    ConfigError = 1001,
    // mqtt 连接或收发错误
    MqttError = 1002,
    // 网络链路错误
    NetworkError = 1003,
    // http 管理页面错误
    HttpError = 1004,
    // 已经请求重启设备，调用方不应再继续操作
    FatalRestart = 1005,
}

#[derive(Debug, Clone)]
pub struct PropError {
    pub code: ErrorCode,
    pub msg: String,
}

impl PropError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        PropError {
            code,
            msg: msg.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.code == ErrorCode::FatalRestart
    }
}

impl Display for PropError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "prop error code: {}, msg: {}", self.code as u16, self.msg)
    }
}

impl Error for PropError {}

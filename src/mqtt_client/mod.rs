//! mqtt 客户端模块
//! - 由设备身份推导 topic
//! - 维护与 broker 的连接，断线重连，遗嘱消息
//! - 分发收到的指令

pub mod client;
pub mod message_listener;
pub mod protocol;

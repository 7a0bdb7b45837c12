pub mod inbound_message_dto;
pub mod status_dto;

// Core age check module - decides whether a message declares an adult age.

pub mod age_check_models;
pub mod age_check_service;
pub mod attachment_gate;
pub mod heuristic;
pub mod inbound;
pub mod patterns;

pub use age_check_models::*;
pub use age_check_service::*;
pub use attachment_gate::AttachmentInfo;
pub use inbound::{ChannelPolicy, InboundEvent};

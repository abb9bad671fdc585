pub mod booking_service;
pub mod event_service;
pub mod slug;
pub mod upload;
